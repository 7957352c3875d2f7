//! Transit risk: interception, smuggler swindles, and convoy loss.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dice::{random_int, roll_2d6};
use crate::{Constants, MoraleLevel, NarrativeEventKind, PersonId};

/// What is carrying a load, which decides the scenario template and whether
/// flavor events can happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvoyKind {
    PlayerGround,
    PlayerAir,
    Npc,
}

impl ConvoyKind {
    pub fn allows_narrative_events(self) -> bool {
        matches!(self, Self::PlayerGround)
    }

    pub fn scenario_template(self, constants: &Constants) -> &str {
        match self {
            Self::PlayerGround => &constants.ground_convoy_template,
            Self::PlayerAir => &constants.air_convoy_template,
            Self::Npc => &constants.npc_convoy_template,
        }
    }
}

/// `ceil((mass - base) / step)`; negative for light convoys.
#[allow(clippy::cast_possible_truncation)]
pub fn mass_risk_term(convoy_mass: f64, constants: &Constants) -> i32 {
    assert!(
        convoy_mass.is_finite() && convoy_mass >= 0.0,
        "convoy mass must be non-negative, got {convoy_mass}",
    );
    ((convoy_mass - constants.interception_base_mass) / constants.interception_mass_step).ceil()
        as i32
}

/// Morale tier plus the mass term, clamped at zero only here.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
pub fn interception_chance(morale: MoraleLevel, convoy_mass: f64, constants: &Constants) -> u32 {
    let chance = morale.ordinal() as i32 + mass_risk_term(convoy_mass, constants);
    chance.max(0) as u32
}

/// Result of the transit dice, before any scenario is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitRoll {
    Clear,
    Flavor,
    Ambush,
}

/// Resolves one transit given the interception chance out of 10.
///
/// A d10 below the chance triggers the interception branch, where a second
/// d10 below `narrative_event_chance` turns it into a flavor event. Convoys
/// that cannot have flavor events get through clear on that second roll.
pub fn roll_transit(
    kind: ConvoyKind,
    chance: u32,
    constants: &Constants,
    rng: &mut impl Rng,
) -> TransitRoll {
    let roll = random_int(rng, 10);
    if roll >= chance {
        debug!(?kind, chance, roll, "transit clear");
        return TransitRoll::Clear;
    }
    let event_roll = random_int(rng, 10);
    debug!(?kind, chance, roll, event_roll, "transit contact");
    if event_roll >= constants.narrative_event_chance {
        TransitRoll::Ambush
    } else if kind.allows_narrative_events() {
        TransitRoll::Flavor
    } else {
        TransitRoll::Clear
    }
}

/// Smugglers run off with the goods on a d10 below the morale tier.
pub fn smuggler_swindled(morale: MoraleLevel, rng: &mut impl Rng) -> bool {
    random_int(rng, 10) < morale.ordinal()
}

pub fn pick_narrative_event(rng: &mut impl Rng) -> NarrativeEventKind {
    *NarrativeEventKind::ALL
        .choose(rng)
        .unwrap_or(&NarrativeEventKind::AmbushEvaded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrewFate {
    Captured,
    KilledInAction,
}

pub fn crew_fate(roll: u32, constants: &Constants) -> CrewFate {
    if roll > constants.capture_threshold {
        CrewFate::Captured
    } else {
        CrewFate::KilledInAction
    }
}

/// Pairs each crew member with the fate of the matching 2d6 roll.
pub fn resolve_crew_fates(
    crew: &[PersonId],
    rolls: impl IntoIterator<Item = u32>,
    constants: &Constants,
) -> Vec<(PersonId, CrewFate)> {
    crew.iter()
        .cloned()
        .zip(rolls)
        .map(|(person, roll)| (person, crew_fate(roll, constants)))
        .collect()
}

pub fn roll_crew_fates(
    crew: &[PersonId],
    constants: &Constants,
    rng: &mut impl Rng,
) -> Vec<(PersonId, CrewFate)> {
    let rolls: Vec<u32> = crew.iter().map(|_| roll_2d6(rng)).collect();
    resolve_crew_fates(crew, rolls, constants)
}
