//! Windmills produce continuously while switched on.

use crate::calculator::{Calculator, WINDMILL_RATE};
use crate::catalog::Catalog;
use crate::state::SimState;
use crate::tile::{Neighbor, Reaction, TileCtx, TileKind};
use crate::upgrade::{Category, Effect, TileTemplate, Upgrade};
use serde::{Deserialize, Serialize};
use sim_core::ResourceDef;

/// Output bonus per adjacent windmill.
pub const NEIGHBOR_BONUS: f64 = 0.1;

/// Selectable products and their base rates per second.
pub const PRODUCTS: &[(&str, f64)] = &[("energy", 0.5), ("flour", 0.1)];

pub fn product_rate(id: &str) -> Option<f64> {
    PRODUCTS.iter().find(|(p, _)| *p == id).map(|(_, rate)| *rate)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Windmill {
    pub(crate) active: bool,
    pub(crate) product: String,
    #[serde(skip)]
    pub(crate) neighbor_bonus: f64,
}

impl Default for Windmill {
    fn default() -> Self {
        Self {
            active: true,
            product: "energy".to_string(),
            neighbor_bonus: 0.0,
        }
    }
}

impl Windmill {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn neighbor_bonus(&self) -> f64 {
        self.neighbor_bonus
    }

    pub fn select_product(&mut self, id: &str) -> bool {
        if product_rate(id).is_none() {
            return false;
        }
        self.product = id.to_string();
        true
    }

    /// Flip between working and idle; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    pub fn on_neighbors_changed(&mut self, neighbors: &[Neighbor]) {
        let mills = neighbors.iter().filter(|n| n.kind == TileKind::Windmill).count();
        self.neighbor_bonus = NEIGHBOR_BONUS * mills as f64;
    }

    pub fn update(&mut self, dt: f64, ctx: &mut TileCtx<'_>) {
        if !self.active || dt <= 0.0 {
            return;
        }
        let Some(rate) = product_rate(&self.product) else {
            return;
        };
        let amount = rate * ctx.derived.get(WINDMILL_RATE) * dt * (1.0 + self.neighbor_bonus);
        ctx.ledger.gain(&self.product, amount);
    }

    pub fn click(&mut self, _ctx: &mut TileCtx<'_>) -> Reaction {
        Reaction::ChooseProduct
    }

    pub fn tooltip(&self) -> String {
        let state = if self.active { "making" } else { "idle, set to" };
        format!(
            "Windmill {} {} (+{:.0}% from neighbours).",
            state,
            self.product,
            self.neighbor_bonus * 100.0
        )
    }
}

fn windmill_rate(s: &SimState) -> f64 {
    1.0 + 0.25 * f64::from(s.owned("gearbox"))
}

fn has_windmill(s: &SimState) -> bool {
    s.land.count(TileKind::Windmill) > 0
}

pub fn register(catalog: &mut Catalog) {
    catalog.add_resource(ResourceDef::new("energy", "Energy", "⚡", 100.0, 0).no_overflow().unsellable());
    catalog.add_resource(ResourceDef::new("flour", "Flour", "🌾", 20.0, 300).auto_sell());

    catalog.add_upgrade(
        Upgrade::new("windmill", "Windmill", Category::Land, 20000)
            .describe("Makes energy or flour from the wind.")
            .growth(170)
            .needs("wood", 30.0)
            .needs("bricks", 5.0)
            .effect(Effect::ClaimTile(TileTemplate::Windmill)),
    );
    catalog.add_upgrade(
        Upgrade::new("gearbox", "Gearbox", Category::Tool, 25000)
            .describe("Windmills turn 25% faster.")
            .growth(200)
            .max(4)
            .needs("ingots", 2.0)
            .visible_when(has_windmill),
    );
    catalog.add_upgrade(
        Upgrade::new("battery", "Battery", Category::Storage, 15000)
            .describe("Store more energy.")
            .growth(170)
            .needs("ingots", 1.0)
            .effect(Effect::StorageLevel("energy"))
            .visible_when(has_windmill),
    );

    catalog.add_calculator(Calculator::new(WINDMILL_RATE, windmill_rate));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::testbed::TestBed;

    #[test]
    fn produces_selected_product_with_bonus() {
        let mut bed = TestBed::new();
        let mut mill = Windmill::default();
        mill.on_neighbors_changed(&[Neighbor {
            kind: TileKind::Windmill,
            tree: None,
        }]);
        mill.update(10.0, &mut bed.ctx());
        assert!((bed.ledger.owned("energy") - 5.5).abs() < 1e-9);

        assert!(mill.select_product("flour"));
        assert!(!mill.select_product("gold"));
        mill.update(10.0, &mut bed.ctx());
        assert!((bed.ledger.owned("flour") - 1.1).abs() < 1e-9);
    }

    #[test]
    fn idle_mill_makes_nothing_and_energy_never_overflows() {
        let mut bed = TestBed::new();
        let mut mill = Windmill::default();
        assert!(!mill.toggle());
        mill.update(10.0, &mut bed.ctx());
        assert_eq!(bed.ledger.owned("energy"), 0.0);
        assert!(mill.toggle());
        mill.update(1000.0, &mut bed.ctx());
        let energy = bed.ledger.get("energy").unwrap();
        assert_eq!(energy.owned, 100.0);
        assert_eq!(energy.lost, 0.0);
    }

    #[test]
    fn click_hands_off_to_ui() {
        let mut bed = TestBed::new();
        let mut mill = Windmill::default();
        assert_eq!(mill.click(&mut bed.ctx()), Reaction::ChooseProduct);
    }
}
