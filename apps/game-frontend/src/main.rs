#![deny(warnings)]

//! Headless HUD over the simulation: the game lives in an ECS world and a
//! schedule ticks it once per frame.

use bevy_ecs::prelude::*;
use sim_core::SimConfig;
use sim_runtime::{Game, TileKind};

#[derive(Resource)]
struct Sim(Game);

/// Simulated seconds per frame.
#[derive(Resource)]
struct FrameTime(f64);

#[derive(Resource, Default)]
struct HudState {
    frames: u32,
    last_notice: String,
    pending_requests: usize,
}

fn tick_system(mut sim: ResMut<Sim>, frame: Res<FrameTime>) {
    sim.0.tick(frame.0);
}

fn hud_system(mut sim: ResMut<Sim>, mut hud: ResMut<HudState>) {
    let batch = sim.0.drain_feed();
    hud.frames = hud.frames.saturating_add(1);
    hud.pending_requests += batch.requests.len();
    if let Some(notice) = batch.notices.last() {
        hud.last_notice = notice.text.clone();
    }
}

fn build(game: Game, frame_secs: f64) -> (World, Schedule) {
    let mut world = World::new();
    world.insert_resource(Sim(game));
    world.insert_resource(FrameTime(frame_secs));
    world.insert_resource(HudState::default());
    let mut schedule = Schedule::default();
    schedule.add_systems((tick_system, hud_system).chain());
    (world, schedule)
}

fn main() {
    let (mut world, mut schedule) = build(Game::new(SimConfig::default()), 1.0 / 60.0);
    for _ in 0..60 {
        schedule.run(&mut world);
    }
    let hud = world.resource::<HudState>();
    let sim = world.resource::<Sim>();
    let forests = sim.0.land().tiles.iter().filter(|t| t.kind == TileKind::Forest).count();
    println!(
        "game-frontend: HUD ready | frames={} forests={} balance={} notice={:?}",
        hud.frames,
        forests,
        sim.0.balance(),
        hud.last_notice
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_initializes_and_ticks() {
        let (mut world, mut schedule) = build(Game::new(SimConfig::default()), 0.5);
        {
            let mut sim = world.resource_mut::<Sim>();
            sim.0.click_tile(2, true);
        }
        schedule.run(&mut world);
        schedule.run(&mut world);
        let hud = world.resource::<HudState>();
        assert_eq!(hud.frames, 2);
        assert_eq!(hud.pending_requests, 1);
        assert!(!hud.last_notice.is_empty());
        assert_eq!(world.resource::<Sim>().0.state().clock, 1.0);
    }
}
