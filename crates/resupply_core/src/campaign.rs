//! Campaign-side implementations of the collaborator traits, plus the roster
//! lookups the resupply pipeline needs.

use tracing::info;

use crate::collaborators::{DeliverySink, ForceQuery};
use crate::convoy::unit_can_haul;
use crate::{
    AmmoTypeId, Campaign, Contract, ContractId, Force, ForceId, InventoryItem, Money, Part,
    PartDef, PartKind, Person, PersonId, PersonnelRole, PersonnelStatus, Unit, UnitId,
};

impl Campaign {
    pub fn force(&self, id: &ForceId) -> Option<&Force> {
        self.forces.iter().find(|force| force.id == *id)
    }

    pub fn contract(&self, id: &ContractId) -> Option<&Contract> {
        self.contracts.iter().find(|contract| contract.id == *id)
    }

    /// Units of a force that still exist in the roster.
    pub fn force_units(&self, id: &ForceId) -> Vec<&Unit> {
        self.force(id)
            .map(|force| {
                force
                    .units
                    .iter()
                    .filter_map(|unit_id| self.units.get(unit_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn in_convoy_force(&self, unit_id: &UnitId) -> bool {
        self.forces
            .iter()
            .any(|force| force.convoy && force.units.contains(unit_id))
    }

    /// Eligible units outside carrying forces, sorted by id.
    pub fn combat_units(&self) -> Vec<&Unit> {
        self.eligible_units()
            .into_iter()
            .filter(|unit| !self.in_convoy_force(&unit.id))
            .collect()
    }

    /// Best negotiator among active logistics staff; ties go to the lowest id.
    pub fn best_negotiator(&self) -> Option<&Person> {
        self.personnel
            .values()
            .filter(|person| {
                person.status == PersonnelStatus::Active && person.role == PersonnelRole::Logistics
            })
            .max_by(|a, b| a.negotiation.cmp(&b.negotiation).then_with(|| b.id.cmp(&a.id)))
    }

    /// Highest-ranked active person; ties go to the lowest id.
    pub fn ranking_officer(&self) -> Option<&Person> {
        self.personnel
            .values()
            .filter(|person| person.status == PersonnelStatus::Active)
            .max_by(|a, b| a.rank.cmp(&b.rank).then_with(|| b.id.cmp(&a.id)))
    }

    /// Summed mass of the force's units.
    pub fn force_mass(&self, id: &ForceId) -> f64 {
        self.force_units(id).iter().map(|unit| unit.mass).sum()
    }

    /// True when every unit of the force moves on the ground.
    pub fn force_is_ground(&self, id: &ForceId) -> bool {
        self.force_units(id)
            .iter()
            .all(|unit| unit.unit_type.is_ground())
    }

    /// Removes a unit from the roster and from every force.
    pub fn remove_unit(&mut self, id: &UnitId) -> Option<Unit> {
        for force in &mut self.forces {
            force.units.retain(|unit_id| unit_id != id);
        }
        self.units.remove(id)
    }

    pub fn set_person_status(&mut self, id: &PersonId, status: PersonnelStatus) {
        if let Some(person) = self.personnel.get_mut(id) {
            person.status = status;
        }
    }

    fn spare_count(&self, def: &PartDef) -> u32 {
        self.inventory
            .iter()
            .filter_map(|item| match item {
                InventoryItem::Part { def_id, count, .. } if *def_id == def.id => Some(*count),
                _ => None,
            })
            .sum()
    }

    fn armor_points(&self, def: &PartDef) -> u32 {
        self.inventory
            .iter()
            .filter_map(|item| match item {
                InventoryItem::Armor { def_id, points, .. } if *def_id == def.id => Some(*points),
                _ => None,
            })
            .sum()
    }

    fn ammo_shots(&self, ammo_type: &AmmoTypeId) -> u32 {
        self.inventory
            .iter()
            .filter_map(|item| match item {
                InventoryItem::Ammo {
                    ammo_type: held,
                    shots,
                } if held == ammo_type => Some(*shots),
                _ => None,
            })
            .sum()
    }
}

impl ForceQuery for Campaign {
    fn eligible_units(&self) -> Vec<&Unit> {
        let mut units: Vec<&Unit> = self
            .units
            .values()
            .filter(|unit| !unit.is_eligible_for_salvage() && unit.is_available())
            .collect();
        units.sort_by(|a, b| a.id.cmp(&b.id));
        units
    }

    fn held_spare_quantity(&self, def: &PartDef) -> u32 {
        match &def.kind {
            PartKind::Armor { points_per_ton } if *points_per_ton > 0 => {
                self.armor_points(def) / points_per_ton
            }
            PartKind::AmmoBin {
                ammo_type,
                shots_per_ton,
            } if *shots_per_ton > 0 => self.ammo_shots(ammo_type) / shots_per_ton,
            _ => self.spare_count(def),
        }
    }

    fn carrying_forces(&self) -> Vec<(ForceId, f64)> {
        self.forces
            .iter()
            .filter(|force| force.convoy)
            .map(|force| {
                let capacity: f64 = self
                    .force_units(&force.id)
                    .into_iter()
                    .filter(|unit| unit_can_haul(unit))
                    .map(|unit| unit.cargo_capacity)
                    .sum();
                (force.id.clone(), capacity)
            })
            .filter(|(_, capacity)| *capacity > 0.0)
            .collect()
    }
}

impl DeliverySink for Campaign {
    fn add_to_inventory(&mut self, part: Part, quantity: u32) {
        if let PartKind::Armor { .. } = part.kind {
            let existing = self.inventory.iter_mut().find(|item| {
                matches!(item, InventoryItem::Armor { def_id, .. } if *def_id == part.def_id)
            });
            if let Some(InventoryItem::Armor { points, .. }) = existing {
                *points += quantity;
            } else {
                self.inventory.push(InventoryItem::Armor {
                    def_id: part.def_id,
                    name: part.name,
                    points: quantity,
                });
            }
            return;
        }

        let existing = self.inventory.iter_mut().find(|item| {
            matches!(item, InventoryItem::Part { def_id, quality, .. }
                if *def_id == part.def_id && *quality == part.quality)
        });
        if let Some(InventoryItem::Part { count, .. }) = existing {
            *count += quantity;
        } else {
            self.inventory.push(InventoryItem::Part {
                def_id: part.def_id,
                name: part.name,
                quality: part.quality,
                count: quantity,
            });
        }
    }

    fn add_ammo(&mut self, ammo_type: &AmmoTypeId, shots: u32) {
        let existing = self.inventory.iter_mut().find(|item| {
            matches!(item, InventoryItem::Ammo { ammo_type: held, .. } if held == ammo_type)
        });
        if let Some(InventoryItem::Ammo { shots: held, .. }) = existing {
            *held += shots;
        } else {
            self.inventory.push(InventoryItem::Ammo {
                ammo_type: ammo_type.clone(),
                shots,
            });
        }
    }

    fn debit(&mut self, amount: Money, reason: &str) {
        self.funds = self.funds - amount;
        info!(amount = %amount, funds = %self.funds, reason, "funds debited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{base_campaign, base_content};
    use crate::PartDefId;

    #[test]
    fn held_quantity_converts_batched_stock_to_tons() {
        let content = base_content();
        let mut campaign = base_campaign(&content);
        campaign.inventory = vec![
            InventoryItem::Armor {
                def_id: PartDefId("standard_armor".to_string()),
                name: "Standard Armor".to_string(),
                points: 40,
            },
            InventoryItem::Ammo {
                ammo_type: AmmoTypeId("ac10".to_string()),
                shots: 25,
            },
        ];
        let armor = content
            .part_def(&PartDefId("standard_armor".to_string()))
            .unwrap();
        let ammo = content.part_def(&PartDefId("ac10_ammo".to_string())).unwrap();
        assert_eq!(campaign.held_spare_quantity(armor), 2);
        assert_eq!(campaign.held_spare_quantity(ammo), 2);
    }

    #[test]
    fn carrying_forces_skip_damaged_and_undercrewed_haulers() {
        let content = base_content();
        let mut campaign = base_campaign(&content);
        let before = campaign.carrying_forces();
        assert_eq!(before.len(), 1);
        assert!((before[0].1 - 40.0).abs() < 1e-9);

        campaign
            .units
            .get_mut(&UnitId("truck_1".to_string()))
            .unwrap()
            .damaged = true;
        campaign
            .units
            .get_mut(&UnitId("truck_2".to_string()))
            .unwrap()
            .crew
            .clear();
        assert!(campaign.carrying_forces().is_empty());
    }

    #[test]
    fn deliveries_merge_into_existing_stock() {
        let content = base_content();
        let mut campaign = base_campaign(&content);
        campaign.inventory.clear();
        let def = content
            .part_def(&PartDefId("medium_laser".to_string()))
            .unwrap();
        campaign.add_to_inventory(Part::brand_new(def), 1);
        campaign.add_to_inventory(Part::brand_new(def), 2);
        let ammo = AmmoTypeId("ac10".to_string());
        campaign.add_ammo(&ammo, 50);
        campaign.add_ammo(&ammo, 50);
        assert_eq!(campaign.inventory.len(), 2);
        assert_eq!(campaign.held_spare_quantity(def), 3);
        assert!(matches!(
            &campaign.inventory[1],
            InventoryItem::Ammo { shots: 100, .. }
        ));
    }

    #[test]
    fn removing_a_unit_clears_force_membership() {
        let content = base_content();
        let mut campaign = base_campaign(&content);
        let truck = UnitId("truck_1".to_string());
        assert!(campaign.remove_unit(&truck).is_some());
        assert!(campaign.forces.iter().all(|force| !force.units.contains(&truck)));
        assert!(campaign.units.get(&truck).is_none());
    }
}
