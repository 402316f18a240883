//! Automators turn an owned automation upgrade into a steady stream of
//! invocations.
//!
//! Each tick adds `speed × elapsed` to a saturation accumulator and every whole
//! unit becomes one call of the automator's logic, so throughput does not
//! depend on how the driver slices time. Energy-gated automators pay for the
//! elapsed time up front and run at most once per tick.

use crate::state::SimState;
use crate::upgrade::AutomationSpec;
use serde::Serialize;
use sim_core::EPSILON;
use tracing::debug;

pub type AutomatorFn = fn(&mut SimState, u32);

/// Logic bound to an automation upgrade by name.
#[derive(Clone, Copy, Debug)]
pub struct AutomatorDef {
    pub upgrade: &'static str,
    pub logic: AutomatorFn,
}

impl AutomatorDef {
    pub fn new(upgrade: &'static str, logic: AutomatorFn) -> Self {
        Self { upgrade, logic }
    }
}

/// Runtime state of one automator. Only `enabled` and `saturation` persist.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AutomatorState {
    pub enabled: bool,
    /// Fraction of the next invocation already earned, in [0, 1).
    pub saturation: f64,
    /// Invocations per second at the current owned count.
    pub speed: f64,
    pub no_power: bool,
}

impl Default for AutomatorState {
    fn default() -> Self {
        Self {
            enabled: true,
            saturation: 0.0,
            speed: 0.0,
            no_power: false,
        }
    }
}

impl AutomatorState {
    pub fn with_saturation(enabled: bool, saturation: f64) -> Self {
        let saturation = if saturation.is_finite() {
            saturation.clamp(0.0, 1.0 - EPSILON)
        } else {
            0.0
        };
        Self {
            enabled,
            saturation,
            ..Self::default()
        }
    }
}

/// Advance one automator by `elapsed` seconds. Returns how many times its
/// logic ran.
pub fn run(
    def: &AutomatorDef,
    spec: AutomationSpec,
    auto: &mut AutomatorState,
    state: &mut SimState,
    elapsed: f64,
) -> u32 {
    let owned = state.owned(def.upgrade);
    if !auto.enabled || owned == 0 || !(elapsed > 0.0) {
        return 0;
    }
    auto.speed = spec.ticks_per_unit_speed * f64::from(owned);

    if let Some(per_unit) = spec.energy_per_unit_speed {
        let needed = per_unit * f64::from(owned) * elapsed;
        if !state.ledger.incur("energy", needed) {
            if !auto.no_power {
                debug!(automator = def.upgrade, needed, "automator out of power");
            }
            auto.no_power = true;
            return 0;
        }
        auto.no_power = false;
        auto.saturation += auto.speed * elapsed;
        if auto.saturation < 1.0 - EPSILON {
            return 0;
        }
        // whole units beyond the first are dropped
        auto.saturation = (auto.saturation - 1.0).max(0.0).fract();
        (def.logic)(state, owned);
        state.stats.automator_runs += 1;
        return 1;
    }

    auto.saturation += auto.speed * elapsed;
    let mut runs = 0;
    while auto.saturation >= 1.0 - EPSILON {
        auto.saturation = (auto.saturation - 1.0).max(0.0);
        (def.logic)(state, owned);
        runs += 1;
    }
    state.stats.automator_runs += u64::from(runs);
    runs
}
