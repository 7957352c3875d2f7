//! Seams to the rest of the campaign.
//!
//! The resupply pipeline reads force data, filters candidates, requests
//! encounters, writes inventory and asks the player questions only through
//! these traits.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    AmmoTypeId, CandidateItem, Contract, FactionId, FocusAllocation, ForceId, Money, Part,
    PartDef, ScenarioId, SkillLevel, StrategicTrack, TrackId, Unit, UnitComponent, WeightClass,
};

/// Read access to the force being resupplied.
pub trait ForceQuery {
    /// Non-salvage, available units whose parts drive demand.
    fn eligible_units(&self) -> Vec<&Unit>;

    fn components_of<'a>(&'a self, unit: &'a Unit) -> &'a [UnitComponent] {
        &unit.components
    }

    /// Spare stock of a part type, in whole tons for armor and ammunition.
    fn held_spare_quantity(&self, def: &PartDef) -> u32;

    /// Carrying forces and their usable mass ceiling, zero-capacity forces omitted.
    fn carrying_forces(&self) -> Vec<(ForceId, f64)>;
}

/// Decides which candidates are actually obtainable this cycle.
///
/// Implementations may reorder or drop entries but must never duplicate one;
/// `build_pools` panics on a pool that gains copies of any part type.
pub trait ProcurementFilter {
    fn filter(
        &self,
        pool: Vec<CandidateItem>,
        skill: SkillLevel,
        year: u32,
        faction: &FactionId,
        rng: &mut impl Rng,
    ) -> Vec<CandidateItem>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioHandle {
    pub id: ScenarioId,
    pub template: String,
    pub track: TrackId,
    pub force: Option<ForceId>,
}

/// Turns an interception into a playable scenario.
pub trait EncounterSystem {
    /// `None` when the template is unknown or the track cannot host it.
    fn generate_interception(
        &mut self,
        contract: &Contract,
        track: &StrategicTrack,
        template: &str,
        force: Option<&ForceId>,
    ) -> Option<ScenarioHandle>;
}

/// Receives delivered contents.
pub trait DeliverySink {
    /// `quantity` is a part count, or armor points for armor plating.
    fn add_to_inventory(&mut self, part: Part, quantity: u32);

    fn add_ammo(&mut self, ammo_type: &AmmoTypeId, shots: u32);

    fn debit(&mut self, amount: Money, reason: &str);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecisionPrompt {
    UsePlayerConvoy {
        mandatory: bool,
        capacity: f64,
        target_mass: u32,
    },
    ConfirmItinerary {
        items: usize,
        mass: f64,
        price: Money,
        player_convoy: bool,
    },
    SmugglerOffer {
        items: usize,
        price: Money,
    },
}

/// Synchronous questions to the player.
pub trait DecisionChannel {
    fn ask_yes_no(&mut self, prompt: &DecisionPrompt) -> bool;

    /// Returns the split to use, given the one currently set.
    fn ask_focus_allocation(&mut self, current: &FocusAllocation) -> FocusAllocation;
}

/// Produces concrete units for a notional force composition.
pub trait UnitGenerator {
    fn generate_unit(
        &mut self,
        faction: &FactionId,
        weight_class: WeightClass,
        year: u32,
        rng: &mut impl Rng,
    ) -> Option<Unit>;
}
