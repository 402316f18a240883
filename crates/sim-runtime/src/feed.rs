//! Outbound messages for the presentation layer.
//!
//! The simulation never animates anything itself. It queues short notices,
//! transient visual cues and UI requests that the driver drains once per frame.
//! Each queue holds at most [`MAX_QUEUED`] entries; a driver that stops
//! draining loses the oldest ones first.

use serde::Serialize;
use tracing::debug;

/// Capacity of each queue between drains.
pub const MAX_QUEUED: usize = 256;

/// Kind of transient visual cue the UI may play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CueKind {
    Grow,
    Shake,
    Bite,
    Splash,
    Catch,
    Bake,
    Sparkle,
    Celebrate,
}

/// A cosmetic effect request: play `kind` on `tile` for `duration_secs`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cue {
    pub tile: Option<usize>,
    pub kind: CueKind,
    pub duration_secs: f64,
}

/// A short, non-blocking message for the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub tile: Option<usize>,
    pub text: String,
}

/// Interactions the simulation hands back to the UI layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UiRequest {
    ChooseRecipe { tile: usize },
    ChooseProduct { tile: usize },
    BuyTile { tile: usize },
    Battle { tile: usize },
}

/// Everything queued since the last drain.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FeedBatch {
    pub notices: Vec<Notice>,
    pub cues: Vec<Cue>,
    pub requests: Vec<UiRequest>,
}

/// Queue of notices, cues and requests. Cues are dropped while the feed is
/// quiet (long catch-up ticks). Notices and requests are only dropped once
/// their queue is full.
#[derive(Clone, Debug, Default)]
pub struct Feed {
    batch: FeedBatch,
    focus: Option<usize>,
    quiet: bool,
}

impl Feed {
    pub fn notice(&mut self, text: impl Into<String>) {
        let notice = Notice {
            tile: self.focus,
            text: text.into(),
        };
        push_capped(&mut self.batch.notices, notice, "notice");
    }

    pub fn cue(&mut self, kind: CueKind, duration_secs: f64) {
        if self.quiet {
            return;
        }
        let cue = Cue {
            tile: self.focus,
            kind,
            duration_secs,
        };
        push_capped(&mut self.batch.cues, cue, "cue");
    }

    pub fn request(&mut self, request: UiRequest) {
        push_capped(&mut self.batch.requests, request, "request");
    }

    /// Attribute subsequent messages to a grid index.
    pub fn focus(&mut self, tile: Option<usize>) {
        self.focus = tile;
    }

    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    pub fn notices(&self) -> &[Notice] {
        &self.batch.notices
    }

    pub fn cues(&self) -> &[Cue] {
        &self.batch.cues
    }

    pub fn requests(&self) -> &[UiRequest] {
        &self.batch.requests
    }

    pub fn drain(&mut self) -> FeedBatch {
        std::mem::take(&mut self.batch)
    }
}

fn push_capped<T>(queue: &mut Vec<T>, item: T, what: &'static str) {
    if queue.len() >= MAX_QUEUED {
        let excess = queue.len() + 1 - MAX_QUEUED;
        queue.drain(..excess);
        debug!(what, "feed full, oldest entry dropped");
    }
    queue.push(item);
}
