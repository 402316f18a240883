use criterion::{criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use sim_core::SimConfig;
use sim_runtime::Game;

fn busy_game() -> Game {
    let mut game = Game::new(SimConfig {
        starting_currency: Decimal::new(10_000_000, 2),
        ..SimConfig::default()
    });
    for name in ["land_column", "land_row", "pond", "forest_plot", "auto_planter", "auto_chopper", "auto_fisher"] {
        game.purchase_upgrade(name);
    }
    game
}

fn bench_ticks(c: &mut Criterion) {
    let mut game = busy_game();
    c.bench_function("tick_frame", |b| {
        b.iter(|| {
            game.tick(1.0 / 60.0);
            game.drain_feed();
        })
    });
    let mut game = busy_game();
    c.bench_function("tick_catch_up_hour", |b| b.iter(|| game.tick(3600.0)));
}

criterion_group!(benches, bench_ticks);
criterion_main!(benches);
