//! Found caches: a company abandoned since the cutoff year, decayed by time,
//! and salvaged for whole units and spare parts.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collaborators::{ForceQuery, UnitGenerator};
use crate::delivery::{DeliveryBatch, DeliveryFault};
use crate::dice::{random_int, roll_2d6};
use crate::pool::build_pools;
use crate::procurement::PassThroughProcurement;
use crate::selector::{category_budgets, select_contents};
use crate::valuation::base_value;
use crate::{
    CacheFactionTable, Campaign, FactionId, ForceId, Money, Part, PartDef, ResupplyContent,
    SkillLevel, Unit, WeightClass,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheContents {
    pub id: Uuid,
    pub faction: FactionId,
    /// Units that survived the years and are recovered whole.
    pub intact_units: Vec<Unit>,
    /// Units too far gone to recover; they only donate parts.
    pub donor_units: Vec<Unit>,
    pub parts: Vec<Part>,
    /// Base value of `parts`.
    pub value: Money,
}

/// The abandoned company as seen by the pool builder: no spares, no haulers.
struct CacheForce<'a> {
    units: Vec<&'a Unit>,
}

impl ForceQuery for CacheForce<'_> {
    fn eligible_units(&self) -> Vec<&Unit> {
        self.units.clone()
    }

    fn held_spare_quantity(&self, _def: &PartDef) -> u32 {
        0
    }

    fn carrying_forces(&self) -> Vec<(ForceId, f64)> {
        Vec::new()
    }
}

pub fn cache_weight_class(table: &CacheFactionTable, roll: u32) -> WeightClass {
    assert!((2..=12).contains(&roll), "2d6 roll out of range: {roll}");
    table.weight_classes[(roll - 2) as usize]
}

/// Percent chance, out of 100, that a unit has decayed past recovery.
pub fn decay_chance(content: &ResupplyContent, year: u32) -> f64 {
    let years = year.saturating_sub(content.cache.cutoff_year);
    (f64::from(years) * content.cache.decay_percent_per_year).clamp(0.0, 100.0)
}

/// Rolls the company of one historical faction, decays it, and selects
/// parts from what is left under the cache mass budget.
pub fn generate_cache(
    content: &ResupplyContent,
    year: u32,
    generator: &mut impl UnitGenerator,
    rng: &mut impl Rng,
) -> Option<CacheContents> {
    let Some(table) = content.cache.factions.choose(rng) else {
        warn!("no cache faction tables, nothing to find");
        return None;
    };
    let decay = decay_chance(content, year);

    let mut intact_units = Vec::new();
    let mut donor_units = Vec::new();
    for slot in 0..content.cache.company_size {
        let weight_class = cache_weight_class(table, roll_2d6(rng));
        let Some(unit) = generator.generate_unit(&table.faction, weight_class, year, rng) else {
            debug!(slot, ?weight_class, faction = %table.faction, "no unit for cache slot");
            continue;
        };
        let roll = random_int(rng, 100) + 1;
        if f64::from(roll) <= decay {
            debug!(unit = %unit.id, roll, decay, "cache unit decayed");
            donor_units.push(unit);
        } else {
            intact_units.push(unit);
        }
    }

    let force = CacheForce {
        units: intact_units.iter().chain(donor_units.iter()).collect(),
    };
    let mut pools = build_pools(
        &force,
        content,
        &PassThroughProcurement,
        SkillLevel::Regular,
        year,
        &table.faction,
        rng,
    );
    let budgets = category_budgets(content.cache.target_mass, &content.constants.default_focus);
    let selection = select_contents(
        &mut pools,
        &budgets,
        SkillLevel::Regular,
        &content.constants,
        rng,
    );
    let parts = selection.granted;
    let value = base_value(&parts);

    info!(
        faction = %table.faction,
        intact = intact_units.len(),
        donors = donor_units.len(),
        parts = parts.len(),
        value = %value,
        "cache generated"
    );
    Some(CacheContents {
        id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid(),
        faction: table.faction.clone(),
        intact_units,
        donor_units,
        parts,
        value,
    })
}

/// Moves a found cache into the campaign: intact units join the roster,
/// parts go to inventory free of charge. Donors are left behind.
pub fn claim_cache(
    campaign: &mut Campaign,
    cache: CacheContents,
    batch_size: u32,
) -> Result<usize, DeliveryFault> {
    let batch = DeliveryBatch::prepare(&cache.parts, batch_size, Money::ZERO)?;
    let units = cache.intact_units.len();
    for unit in cache.intact_units {
        campaign.units.insert(unit.id.clone(), unit);
    }
    let items = batch.commit(campaign, "cache recovery");
    info!(cache = %cache.id, units, items, "cache claimed");
    Ok(units)
}
