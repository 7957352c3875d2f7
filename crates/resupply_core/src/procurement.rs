//! Stock procurement filters.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use crate::collaborators::ProcurementFilter;
use crate::dice::roll_2d6;
use crate::{CandidateItem, FactionId, PartDef, PartDefId, ResupplyContent, SkillLevel};

/// Keeps every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughProcurement;

impl ProcurementFilter for PassThroughProcurement {
    fn filter(
        &self,
        pool: Vec<CandidateItem>,
        _skill: SkillLevel,
        _year: u32,
        _faction: &FactionId,
        _rng: &mut impl Rng,
    ) -> Vec<CandidateItem> {
        pool
    }
}

/// Era, faction and availability checks against the parts catalog.
#[derive(Debug, Clone)]
pub struct AvailabilityProcurement<'a> {
    content: &'a ResupplyContent,
}

impl<'a> AvailabilityProcurement<'a> {
    pub fn new(content: &'a ResupplyContent) -> Self {
        Self { content }
    }

    fn in_era_for(def: &PartDef, year: u32, faction: &FactionId) -> bool {
        if def.introduced_year > year {
            return false;
        }
        if def.extinct_year.is_some_and(|extinct| extinct <= year) {
            return false;
        }
        def.restricted_to.is_empty() || def.restricted_to.contains(faction)
    }
}

/// 2d6 plus half the negotiation tier against 4 plus the rating.
pub fn availability_check(availability: u8, skill: SkillLevel, rng: &mut impl Rng) -> bool {
    let roll = roll_2d6(rng) + skill.ordinal() / 2;
    roll >= 4 + u32::from(availability)
}

impl ProcurementFilter for AvailabilityProcurement<'_> {
    fn filter(
        &self,
        pool: Vec<CandidateItem>,
        skill: SkillLevel,
        year: u32,
        faction: &FactionId,
        rng: &mut impl Rng,
    ) -> Vec<CandidateItem> {
        let mut def_ids: Vec<&PartDefId> = pool.iter().map(|item| &item.part.def_id).collect();
        def_ids.sort();
        def_ids.dedup();

        let mut obtainable: BTreeMap<PartDefId, bool> = BTreeMap::new();
        for def_id in def_ids {
            let ok = match self.content.part_def(def_id) {
                Some(def) if Self::in_era_for(def, year, faction) => {
                    availability_check(def.availability, skill, rng)
                }
                _ => false,
            };
            debug!(part = %def_id, ok, "availability rolled");
            obtainable.insert(def_id.clone(), ok);
        }

        pool.into_iter()
            .filter(|item| obtainable.get(&item.part.def_id).copied().unwrap_or(false))
            .collect()
    }
}
