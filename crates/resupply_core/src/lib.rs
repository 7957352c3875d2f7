//! `resupply_core` — mid-contract resupply for a mercenary force.
//!
//! Builds candidate pools from the force's equipment, selects contents under
//! mass budgets, values them, assigns them to convoys and resolves transit.
//! No IO. All randomness via the passed-in Rng.

mod cache;
mod campaign;
pub mod collaborators;
mod convoy;
mod delivery;
pub mod dice;
mod money;
mod pool;
pub mod procurement;
mod resupply;
mod selector;
mod transit;
mod types;
mod valuation;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use cache::{cache_weight_class, claim_cache, decay_chance, generate_cache, CacheContents};
pub use convoy::{assign_contents, cargo_mass, unit_can_haul, ConvoyCapacity, ConvoyLoad, ConvoyPlan};
pub use delivery::{DeliveryBatch, DeliveryFault};
pub use money::Money;
pub use pool::{build_pools, is_eligible_component, CandidatePools};
pub use resupply::{
    abandon_convoy, calculate_target_mass, negotiation_skill, perform_resupply,
    request_interception, resolve_interception, AbandonedConvoy, AbortReason, Collaborators,
    ConvoyResult, PendingInterception, ResupplyOperation, ResupplyOutcome, ResupplyReport,
    ResupplyRequest, SkipReason,
};
pub use selector::{category_budgets, quality_for_skill, select_category, select_contents, Selection};
pub use transit::{
    crew_fate, interception_chance, mass_risk_term, pick_narrative_event, resolve_crew_fates,
    roll_crew_fates, roll_transit, smuggler_swindled, ConvoyKind, CrewFate, TransitRoll,
};
pub use types::*;
pub use valuation::{
    adjusted_value, base_value, is_friendly_resupply, manifest, morale_value_multiplier,
    value_contents, ManifestLine, Valuation,
};

pub(crate) fn emit(counters: &mut Counters, day: u64, event: ResupplyEvent) -> EventEnvelope {
    counters.next_event_id += 1;
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    EventEnvelope { id, day, event }
}

#[cfg(test)]
mod tests;
