//! Registry of everything a run can contain: resources, upgrades, automators
//! and calculators, merged from each tile kind's registration table.

use crate::automator::AutomatorDef;
use crate::calculator::Calculator;
use crate::forest;
use crate::kiln;
use crate::land::{COLUMN_UPGRADE, ROW_UPGRADE};
use crate::mine::{self, MineSubtype};
use crate::minor;
use crate::pond;
use crate::state::SimState;
use crate::upgrade::{Category, Effect, TileTemplate, Upgrade};
use crate::windmill;
use rust_decimal::Decimal;
use sim_core::{validate_resource_def, Ledger, ResourceDef, ValidationError};
use std::collections::BTreeSet;
use tracing::error;

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    resources: Vec<ResourceDef>,
    upgrades: Vec<Upgrade>,
    automators: Vec<AutomatorDef>,
    calculators: Vec<Calculator>,
}

impl Catalog {
    /// The full game: every tile kind plus the shared land, storage and
    /// market upgrades.
    pub fn standard() -> Self {
        let mut catalog = Catalog::default();
        forest::register(&mut catalog);
        mine::register(&mut catalog);
        pond::register(&mut catalog);
        kiln::register(&mut catalog);
        windmill::register(&mut catalog);
        minor::register(&mut catalog);
        register_shared(&mut catalog);
        catalog
    }

    pub fn add_resource(&mut self, def: ResourceDef) {
        self.resources.push(def);
    }

    pub fn add_upgrade(&mut self, upgrade: Upgrade) {
        self.upgrades.push(upgrade);
    }

    pub fn add_automator(&mut self, automator: AutomatorDef) {
        self.automators.push(automator);
    }

    pub fn add_calculator(&mut self, calculator: Calculator) {
        self.calculators.push(calculator);
    }

    pub fn resources(&self) -> &[ResourceDef] {
        &self.resources
    }

    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    pub fn automators(&self) -> &[AutomatorDef] {
        &self.automators
    }

    pub fn calculators(&self) -> &[Calculator] {
        &self.calculators
    }

    pub fn upgrade(&self, name: &str) -> Option<&Upgrade> {
        self.upgrades.iter().find(|u| u.name == name)
    }

    /// The land upgrade that claims tiles of this template.
    pub fn claim_upgrade(&self, template: TileTemplate) -> Option<&Upgrade> {
        self.upgrades
            .iter()
            .find(|u| u.effect == Effect::ClaimTile(template))
    }

    /// A ledger holding every registered resource. Invalid or duplicate
    /// registrations are logged and left out.
    pub fn new_ledger(&self) -> Ledger {
        let mut ledger = Ledger::new();
        for def in &self.resources {
            if let Err(err) = ledger.register(def.clone()) {
                error!(resource = %def.id, %err, "resource not registered");
            }
        }
        ledger
    }

    /// Cross-check the registries. Every finding is a programming error; the
    /// catalog stays usable regardless.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut findings = Vec::new();

        let mut resources = BTreeSet::new();
        for def in &self.resources {
            if let Err(err) = validate_resource_def(def) {
                findings.push(err);
            }
            if !resources.insert(def.id.as_str()) {
                findings.push(ValidationError::DuplicateResource(def.id.0.clone()));
            }
        }
        let mut check_resource = |owner: &str, resource: &str| {
            if !resources.contains(resource) {
                findings.push(ValidationError::UnknownResource {
                    owner: owner.to_string(),
                    resource: resource.to_string(),
                });
            }
        };
        for up in &self.upgrades {
            for (id, _) in &up.resource_costs {
                check_resource(up.name, id.as_str());
            }
            match up.effect {
                Effect::StorageLevel(r) | Effect::PriceMultiplier(r, _) => check_resource(up.name, r),
                _ => {}
            }
        }
        for r in kiln::RECIPES {
            for (input, _) in r.inputs {
                check_resource(r.id, *input);
            }
            check_resource(r.id, r.output);
        }
        for (product, _) in windmill::PRODUCTS {
            check_resource("windmill", *product);
        }
        for subtype in MineSubtype::ALL {
            check_resource("mine", subtype.table().resource);
        }
        for (species, _) in pond::SEA_LIFE {
            check_resource(*species, "fish");
        }
        for (icon, resource, _) in pond::RARE_FINDS {
            check_resource(*icon, *resource);
        }

        let mut names = BTreeSet::new();
        for up in &self.upgrades {
            if !names.insert(up.name) {
                findings.push(ValidationError::DuplicateUpgrade(up.name.to_string()));
            }
            if up.cost_multiplier < Decimal::ONE {
                findings.push(ValidationError::InvalidCostMultiplier(up.name.to_string()));
            }
            if up.base_cost < Decimal::ZERO {
                findings.push(ValidationError::NegativeMoney);
            }
            let bound = self.automators.iter().any(|a| a.upgrade == up.name);
            if up.automation.is_some() && !bound {
                findings.push(ValidationError::MissingAutomator(up.name.to_string()));
            }
        }
        for a in &self.automators {
            let ok = self
                .upgrade(a.upgrade)
                .is_some_and(|u| u.category == Category::Automation && u.automation.is_some());
            if !ok {
                findings.push(ValidationError::OrphanAutomator(a.upgrade.to_string()));
            }
        }

        let mut calcs = BTreeSet::new();
        for c in &self.calculators {
            if !calcs.insert(c.name) {
                findings.push(ValidationError::DuplicateCalculator(c.name.to_string()));
            }
        }
        findings
    }
}

fn auto_sell(state: &mut SimState, _owned: u32) {
    let names: Vec<String> = state
        .ledger
        .iter()
        .filter(|r| r.def.auto_sell && r.def.sellable && r.available() > 0.0)
        .map(|r| r.id().0.clone())
        .collect();
    for name in names {
        state.ledger.sell(&name);
    }
}

fn land_expanded(s: &SimState) -> bool {
    s.owned(COLUMN_UPGRADE) + s.owned(ROW_UPGRADE) > 4
}

fn register_shared(catalog: &mut Catalog) {
    catalog.add_upgrade(
        Upgrade::new(COLUMN_UPGRADE, "More land (column)", Category::Land, 2500)
            .describe("Widen your land by one column.")
            .growth(250)
            .initial(2)
            .max(8)
            .effect(Effect::AddColumn),
    );
    catalog.add_upgrade(
        Upgrade::new(ROW_UPGRADE, "More land (row)", Category::Land, 2500)
            .describe("Extend your land by one row.")
            .growth(250)
            .initial(2)
            .max(8)
            .effect(Effect::AddRow),
    );
    catalog.add_upgrade(
        Upgrade::new("warehouse", "Warehouse", Category::Storage, 50000)
            .describe("Doubles every storage.")
            .growth(300)
            .max(3)
            .needs("bricks", 20.0)
            .effect(Effect::StorageMultiplier(2.0))
            .visible_when(land_expanded),
    );
    catalog.add_upgrade(
        Upgrade::new("auto_seller", "Auto seller", Category::Automation, 8000)
            .describe("Sells market goods for you.")
            .growth(170)
            .automation(0.1, None),
    );
    catalog.add_upgrade(
        Upgrade::new("trophy", "Golden trophy", Category::Special, 1_000_000)
            .describe("Proof that you won.")
            .max(1)
            .needs("diamond", 5.0)
            .effect(Effect::Win),
    );
    catalog.add_automator(AutomatorDef::new("auto_seller", auto_sell));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_consistent() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.validate(), Vec::new());
        assert_eq!(catalog.calculators().len(), 12);
        assert!(catalog.upgrade("auto_miner").is_some());
        let claim = catalog.claim_upgrade(TileTemplate::Forest).unwrap();
        assert_eq!(claim.name, "forest_plot");
    }

    #[test]
    fn validation_reports_gaps() {
        let mut catalog = Catalog::standard();
        catalog.add_upgrade(
            Upgrade::new("auto_nothing", "Nothing", Category::Automation, 100).automation(1.0, None),
        );
        catalog.add_automator(AutomatorDef::new("ghost", |_, _| {}));
        catalog.add_upgrade(Upgrade::new("bad", "Bad", Category::Tool, 100).needs("moonrock", 1.0));
        catalog.add_resource(ResourceDef::new("wood", "Wood", "🪵", 50.0, 100));
        let findings = catalog.validate();
        assert!(findings.contains(&ValidationError::MissingAutomator("auto_nothing".into())));
        assert!(findings.contains(&ValidationError::OrphanAutomator("ghost".into())));
        assert!(findings.contains(&ValidationError::DuplicateResource("wood".into())));
        assert!(findings.contains(&ValidationError::UnknownResource {
            owner: "bad".into(),
            resource: "moonrock".into(),
        }));
    }

    #[test]
    fn ledger_has_every_resource_once() {
        let catalog = Catalog::standard();
        let ledger = catalog.new_ledger();
        assert_eq!(ledger.iter().count(), catalog.resources().len());
        assert_eq!(ledger.get("seeds").unwrap().def.minimum_reserve, 1.0);
    }
}
