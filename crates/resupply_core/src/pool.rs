//! Candidate pool construction.
//!
//! Demand is accumulated per part type across the force, spares already in
//! stock are netted out, and what is left is expanded into one independent,
//! brand-new copy per unit of weight. The copies are then split by category,
//! run through procurement, and shuffled.

use ahash::AHashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::collaborators::{ForceQuery, ProcurementFilter};
use crate::{
    CandidateItem, Constants, FactionId, MekLocation, Part, PartDef, PartDefId, PartKind,
    ResupplyContent, SkillLevel, SupplyCategory, VehicleLocation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartClass {
    Standard,
    HeatRadiating,
    Motive,
    Batched,
}

/// How much one held spare offsets demand, indexed by `PartClass`.
const HELD_QUANTITY_MULTIPLIER: [f64; 4] = [1.0, 2.5, 0.5, 5.0];

impl PartClass {
    fn of(kind: &PartKind) -> Self {
        match kind {
            PartKind::HeatSink => Self::HeatRadiating,
            PartKind::Drive => Self::Motive,
            PartKind::Armor { .. } | PartKind::AmmoBin { .. } => Self::Batched,
            PartKind::Equipment
            | PartKind::MekLocation { .. }
            | PartKind::VehicleLocation { .. }
            | PartKind::TransportBay => Self::Standard,
        }
    }

    fn held_multiplier(self) -> f64 {
        HELD_QUANTITY_MULTIPLIER[self as usize]
    }
}

/// Whether a part type may ever be offered in a resupply.
pub fn is_eligible_component(def: &PartDef, constants: &Constants) -> bool {
    if constants.excluded_parts.iter().any(|name| *name == def.name) {
        return false;
    }
    match &def.kind {
        PartKind::MekLocation { location } => *location != MekLocation::CenterTorso,
        PartKind::VehicleLocation { location } => {
            matches!(location, VehicleLocation::Rotor | VehicleLocation::Turret)
        }
        PartKind::TransportBay => false,
        PartKind::Equipment
        | PartKind::HeatSink
        | PartKind::Drive
        | PartKind::Armor { .. }
        | PartKind::AmmoBin { .. } => true,
    }
}

/// The three consumable pools of one drop.
#[derive(Debug, Clone, Default)]
pub struct CandidatePools {
    pools: [Vec<CandidateItem>; 3],
}

impl CandidatePools {
    pub fn pool(&self, category: SupplyCategory) -> &[CandidateItem] {
        &self.pools[category.index()]
    }

    pub fn pool_mut(&mut self, category: SupplyCategory) -> &mut Vec<CandidateItem> {
        &mut self.pools[category.index()]
    }

    pub fn len(&self) -> usize {
        self.pools.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.iter().all(Vec::is_empty)
    }

    /// Sorts candidates into pools by category. Order within a pool follows
    /// the input.
    pub fn from_candidates(candidates: Vec<CandidateItem>) -> Self {
        let mut pools = Self::default();
        for candidate in candidates {
            let category = candidate.part.kind.category();
            pools.pool_mut(category).push(candidate);
        }
        pools
    }
}

/// Accumulated draw weight per part type across every eligible unit.
pub(crate) fn accumulate_demand(
    query: &impl ForceQuery,
    content: &ResupplyContent,
) -> AHashMap<PartDefId, f64> {
    let constants = &content.constants;
    let mut demand: AHashMap<PartDefId, f64> = AHashMap::new();
    for unit in query.eligible_units() {
        if unit.is_eligible_for_salvage() || !unit.is_available() {
            continue;
        }
        for component in query.components_of(unit) {
            let Some(def) = content.part_def(&component.def_id) else {
                warn!(
                    unit = %unit.id,
                    part = %component.def_id,
                    "component missing from parts catalog, skipping"
                );
                continue;
            };
            if !is_eligible_component(def, constants) {
                continue;
            }
            let weight = if component.missing {
                constants.missing_part_weight
            } else {
                constants.present_part_weight
            };
            *demand.entry(def.id.clone()).or_insert(0.0) += weight;
        }
    }
    demand
}

/// Subtracts spares already in stock; types fully covered by stock are dropped.
pub(crate) fn net_out_spares(
    demand: &mut AHashMap<PartDefId, f64>,
    query: &impl ForceQuery,
    content: &ResupplyContent,
) {
    for (def_id, weight) in demand.iter_mut() {
        let Some(def) = content.part_def(def_id) else {
            continue;
        };
        let held = query.held_spare_quantity(def);
        if held > 0 {
            *weight -= f64::from(held) * PartClass::of(&def.kind).held_multiplier();
        }
    }
    demand.retain(|_, weight| *weight > 0.0);
}

/// One brand-new copy per rounded unit of weight, in part-id order.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn expand_demand(
    demand: &AHashMap<PartDefId, f64>,
    content: &ResupplyContent,
) -> Vec<CandidateItem> {
    let mut def_ids: Vec<&PartDefId> = demand.keys().collect();
    def_ids.sort();

    let mut candidates = Vec::new();
    for def_id in def_ids {
        let Some(def) = content.part_def(def_id) else {
            continue;
        };
        let weight = demand[def_id].round() as u32;
        let template = Part::brand_new(def);
        candidates.extend((0..weight).map(|_| CandidateItem {
            part: template.clone(),
            weight,
        }));
    }
    candidates
}

fn copies_by_def(pool: &[CandidateItem]) -> AHashMap<PartDefId, usize> {
    let mut copies = AHashMap::new();
    for item in pool {
        *copies.entry(item.part.def_id.clone()).or_insert(0) += 1;
    }
    copies
}

/// Builds the three shuffled, procurement-filtered pools for one drop.
pub fn build_pools(
    query: &impl ForceQuery,
    content: &ResupplyContent,
    procurement: &impl ProcurementFilter,
    skill: SkillLevel,
    year: u32,
    faction: &FactionId,
    rng: &mut impl Rng,
) -> CandidatePools {
    let mut demand = accumulate_demand(query, content);
    net_out_spares(&mut demand, query, content);
    let mut pools = CandidatePools::from_candidates(expand_demand(&demand, content));

    for category in SupplyCategory::ALL {
        let raw = std::mem::take(pools.pool_mut(category));
        let raw_len = raw.len();
        let raw_counts = copies_by_def(&raw);
        let mut filtered = procurement.filter(raw, skill, year, faction, rng);
        let duplicated = copies_by_def(&filtered)
            .into_iter()
            .find(|(def_id, copies)| *copies > raw_counts.get(def_id).copied().unwrap_or(0));
        assert!(
            duplicated.is_none(),
            "procurement filter duplicated {duplicated:?} in the {category:?} pool",
        );
        filtered.shuffle(rng);
        debug!(?category, before = raw_len, after = filtered.len(), "pool built");
        *pools.pool_mut(category) = filtered;
    }
    pools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::base_content;

    fn def_named<'a>(content: &'a ResupplyContent, id: &str) -> &'a PartDef {
        content
            .part_def(&PartDefId(id.to_string()))
            .expect("fixture part exists")
    }

    #[test]
    fn center_torso_and_hull_locations_are_ineligible() {
        let content = base_content();
        let constants = &content.constants;
        assert!(!is_eligible_component(def_named(&content, "mek_ct"), constants));
        assert!(is_eligible_component(def_named(&content, "mek_arm"), constants));
        assert!(!is_eligible_component(def_named(&content, "tank_front"), constants));
        assert!(is_eligible_component(def_named(&content, "tank_turret"), constants));
        assert!(!is_eligible_component(def_named(&content, "cargo_bay"), constants));
    }

    #[test]
    fn excluded_names_are_ineligible() {
        let mut content = base_content();
        content.constants.excluded_parts = vec!["Medium Laser".to_string()];
        assert!(!is_eligible_component(
            def_named(&content, "medium_laser"),
            &content.constants
        ));
    }

    #[test]
    fn class_multipliers_follow_install_complexity() {
        assert!((PartClass::of(&PartKind::HeatSink).held_multiplier() - 2.5).abs() < 1e-9);
        assert!((PartClass::of(&PartKind::Drive).held_multiplier() - 0.5).abs() < 1e-9);
        let armor = PartKind::Armor { points_per_ton: 16 };
        assert!((PartClass::of(&armor).held_multiplier() - 5.0).abs() < 1e-9);
        assert!((PartClass::of(&PartKind::Equipment).held_multiplier() - 1.0).abs() < 1e-9);
    }
}
