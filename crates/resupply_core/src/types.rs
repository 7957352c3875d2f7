//! Type definitions for `resupply_core`.
//!
//! Campaign data, content definitions, events, and ID newtypes used by the
//! resupply pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::Money;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(UnitId);
string_id!(ForceId);
string_id!(PersonId);
string_id!(PartDefId);
string_id!(AmmoTypeId);
string_id!(FactionId);
string_id!(ContractId);
string_id!(TrackId);
string_id!(ScenarioId);
string_id!(UnitTemplateId);
string_id!(EventId);

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

/// Economic mode of a resupply. Decides prompting, transit and pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResupplyMode {
    Normal,
    Loot,
    ContractEnd,
    Smuggler,
}

impl ResupplyMode {
    /// Loot and contract-end drops never ask about convoys or focus.
    pub fn allows_player_choices(self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// Contract-side battlefield momentum, ordered from routed enemy to
/// overwhelming enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoraleLevel {
    Routed,
    Critical,
    Weakened,
    Stalemate,
    Advancing,
    Dominating,
    Overwhelming,
}

impl MoraleLevel {
    pub const ALL: [Self; 7] = [
        Self::Routed,
        Self::Critical,
        Self::Weakened,
        Self::Stalemate,
        Self::Advancing,
        Self::Dominating,
        Self::Overwhelming,
    ];

    /// Tier 0-6.
    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SkillLevel {
    #[default]
    None,
    UltraGreen,
    Green,
    Regular,
    Veteran,
    Elite,
    Heroic,
    Legendary,
}

impl SkillLevel {
    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

/// Part condition grade. `A` is the worst, `F` the best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PartQuality {
    A,
    B,
    C,
    D,
    E,
    F,
}

/// The three physical categories a resupply budget is split across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplyCategory {
    General,
    Armor,
    Ammo,
}

impl SupplyCategory {
    pub const ALL: [Self; 3] = [Self::General, Self::Armor, Self::Ammo];

    /// Armor and ammunition ship in fixed batches.
    pub fn is_batched(self) -> bool {
        matches!(self, Self::Armor | Self::Ammo)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeightClass {
    Light,
    Medium,
    Heavy,
    Assault,
    SuperHeavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    Mek,
    Tank,
    Infantry,
    Vtol,
    Aerospace,
}

impl UnitType {
    pub fn is_ground(self) -> bool {
        matches!(self, Self::Mek | Self::Tank | Self::Infantry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MekLocation {
    Head,
    CenterTorso,
    LeftTorso,
    RightTorso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleLocation {
    Front,
    Left,
    Right,
    Rear,
    Body,
    Rotor,
    Turret,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PartKind {
    Equipment,
    HeatSink,
    /// Engines, gyros and vehicle motive systems.
    Drive,
    Armor {
        points_per_ton: u32,
    },
    AmmoBin {
        ammo_type: AmmoTypeId,
        shots_per_ton: u32,
    },
    MekLocation {
        location: MekLocation,
    },
    VehicleLocation {
        location: VehicleLocation,
    },
    TransportBay,
}

impl PartKind {
    pub fn category(&self) -> SupplyCategory {
        match self {
            Self::Armor { .. } => SupplyCategory::Armor,
            Self::AmmoBin { .. } => SupplyCategory::Ammo,
            _ => SupplyCategory::General,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    GarrisonDuty,
    CadreDuty,
    ReliefDuty,
    Raid,
    PlanetaryAssault,
    PirateHunting,
    GuerrillaWarfare,
}

impl ContractType {
    /// Guerrilla work is supplied through smugglers rather than the employer.
    pub fn uses_smugglers(self) -> bool {
        matches!(self, Self::GuerrillaWarfare)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandRights {
    Integrated,
    House,
    Liaison,
    Independent,
}

impl CommandRights {
    /// Independent commands haul their own supplies.
    pub fn mandates_player_convoy(self) -> bool {
        matches!(self, Self::Independent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonnelRole {
    Logistics,
    MekWarrior,
    VehicleCrew,
    Pilot,
    Tech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonnelStatus {
    Active,
    PrisonerOfWar,
    KilledInAction,
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

/// Read-only view of anything that occupies cargo mass in a resupply.
pub trait Payload {
    fn mass(&self) -> f64;
    fn category(&self) -> SupplyCategory;

    /// Mass counted against budgets and convoy capacity; batched categories
    /// count `batch_size` times.
    fn mass_equivalent(&self, batch_size: u32) -> f64 {
        if self.category().is_batched() {
            self.mass() * f64::from(batch_size)
        } else {
            self.mass()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartDef {
    pub id: PartDefId,
    pub name: String,
    pub kind: PartKind,
    pub tonnage: f64,
    pub value: Money,
    /// Availability rating 0 (everywhere) to 5 (nearly unobtainable).
    #[serde(default)]
    pub availability: u8,
    #[serde(default)]
    pub introduced_year: u32,
    #[serde(default)]
    pub extinct_year: Option<u32>,
    /// Empty means every faction can source it.
    #[serde(default)]
    pub restricted_to: Vec<FactionId>,
}

/// A concrete, deliverable part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub def_id: PartDefId,
    pub name: String,
    pub kind: PartKind,
    pub tonnage: f64,
    pub value: Money,
    pub quality: PartQuality,
    pub brand_new: bool,
}

impl Part {
    /// Fresh, fully repaired copy of a catalog part.
    pub fn brand_new(def: &PartDef) -> Self {
        assert!(
            def.tonnage.is_finite() && def.tonnage >= 0.0,
            "part '{}' has invalid tonnage {}",
            def.id,
            def.tonnage,
        );
        Self {
            def_id: def.id.clone(),
            name: def.name.clone(),
            kind: def.kind.clone(),
            tonnage: def.tonnage,
            value: def.value,
            quality: PartQuality::D,
            brand_new: true,
        }
    }
}

impl Payload for Part {
    fn mass(&self) -> f64 {
        self.tonnage
    }

    fn category(&self) -> SupplyCategory {
        self.kind.category()
    }
}

/// One pool entry: an independent part copy and the draw weight of its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub part: Part,
    pub weight: u32,
}

impl Payload for CandidateItem {
    fn mass(&self) -> f64 {
        self.part.mass()
    }

    fn category(&self) -> SupplyCategory {
        self.part.category()
    }
}

// ---------------------------------------------------------------------------
// Campaign state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitComponent {
    pub def_id: PartDefId,
    /// Destroyed or removed; weighs heavier when building pools.
    #[serde(default)]
    pub missing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub unit_type: UnitType,
    pub weight_class: WeightClass,
    pub mass: f64,
    #[serde(default)]
    pub cargo_capacity: f64,
    pub components: Vec<UnitComponent>,
    #[serde(default)]
    pub crew: SmallVec<[PersonId; 4]>,
    #[serde(default)]
    pub required_crew: u32,
    #[serde(default)]
    pub damaged: bool,
    #[serde(default)]
    pub salvage: bool,
    #[serde(default)]
    pub deployed: bool,
    #[serde(default)]
    pub mothballed: bool,
}

impl Unit {
    /// Salvage hulks are stripped for parts and never drive demand.
    pub fn is_eligible_for_salvage(&self) -> bool {
        self.salvage
    }

    pub fn is_available(&self) -> bool {
        !self.deployed && !self.mothballed
    }

    pub fn is_fully_crewed(&self) -> bool {
        self.crew.len() >= self.required_crew as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub role: PersonnelRole,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub negotiation: SkillLevel,
    pub status: PersonnelStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Force {
    pub id: ForceId,
    pub name: String,
    pub units: Vec<UnitId>,
    /// Carrying force available for supply runs.
    #[serde(default)]
    pub convoy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategicTrack {
    pub id: TrackId,
    pub name: String,
    /// Number of valid deployment locations on the track.
    pub deployment_locations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub name: String,
    pub contract_type: ContractType,
    pub employer: FactionId,
    pub enemy: FactionId,
    pub morale: MoraleLevel,
    pub command_rights: CommandRights,
    /// Multiplies the force-derived target mass.
    pub resupply_scale: f64,
    #[serde(default)]
    pub tracks: Vec<StrategicTrack>,
    pub start_day: u64,
    pub end_day: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InventoryItem {
    Part {
        def_id: PartDefId,
        name: String,
        quality: PartQuality,
        count: u32,
    },
    Armor {
        def_id: PartDefId,
        name: String,
        points: u32,
    },
    Ammo {
        ammo_type: AmmoTypeId,
        shots: u32,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub faction: FactionId,
    pub year: u32,
    pub day: u64,
    pub funds: Money,
    pub units: HashMap<UnitId, Unit>,
    pub forces: Vec<Force>,
    pub personnel: HashMap<PersonId, Person>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub counters: Counters,
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResupplyContent {
    pub content_version: String,
    pub parts: Vec<PartDef>,
    pub factions: Vec<FactionDef>,
    pub unit_templates: Vec<UnitTemplate>,
    pub cache: CacheTables,
    pub constants: Constants,
}

impl ResupplyContent {
    pub fn part_def(&self, id: &PartDefId) -> Option<&PartDef> {
        self.parts.iter().find(|def| def.id == *id)
    }

    pub fn faction(&self, id: &FactionId) -> Option<&FactionDef> {
        self.factions.iter().find(|faction| faction.id == *id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionDef {
    pub id: FactionId,
    pub name: String,
    #[serde(default)]
    pub mercenary: bool,
    #[serde(default)]
    pub pirate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub id: UnitTemplateId,
    pub name: String,
    pub unit_type: UnitType,
    pub weight_class: WeightClass,
    pub mass: f64,
    #[serde(default)]
    pub cargo_capacity: f64,
    pub required_crew: u32,
    pub introduced_year: u32,
    pub factions: Vec<FactionId>,
    pub components: Vec<PartDefId>,
}

/// Weight-class lookup for one historical faction, indexed by a 2d6 roll
/// (entry 0 is a roll of 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFactionTable {
    pub faction: FactionId,
    pub weight_classes: [WeightClass; 11],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTables {
    pub cutoff_year: u32,
    pub decay_percent_per_year: f64,
    pub company_size: u32,
    pub target_mass: u32,
    pub factions: Vec<CacheFactionTable>,
}

/// Fractions of the mass budget spent on each category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusAllocation {
    pub general: f64,
    pub armor: f64,
    pub ammo: f64,
}

impl FocusAllocation {
    pub fn fraction(&self, category: SupplyCategory) -> f64 {
        match category {
            SupplyCategory::General => self.general,
            SupplyCategory::Armor => self.armor,
            SupplyCategory::Ammo => self.ammo,
        }
    }

    /// Panics when a fraction is negative or non-finite, or the split
    /// exceeds the whole budget.
    pub fn assert_valid(&self) {
        for category in SupplyCategory::ALL {
            let fraction = self.fraction(category);
            assert!(
                fraction.is_finite() && fraction >= 0.0,
                "focus fraction for {category:?} must be non-negative, got {fraction}",
            );
        }
        let total = self.general + self.armor + self.ammo;
        assert!(total <= 1.0 + 1e-9, "focus fractions sum to {total}, above 1.0");
    }
}

impl Default for FocusAllocation {
    fn default() -> Self {
        Self {
            general: 0.5,
            armor: 0.25,
            ammo: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constants {
    /// Pool weight contributed by each missing or destroyed component.
    pub missing_part_weight: f64,
    /// Pool weight contributed by each intact component.
    pub present_part_weight: f64,
    /// Part names never offered in a resupply.
    pub excluded_parts: Vec<String>,
    /// Parts worth more than this go through the scarcity roll.
    pub high_value_threshold: Money,
    /// Minimum d6 face that grants a high-value part.
    pub scarcity_grant_roll: u32,
    /// Armor and ammunition ship in batches of this many tons.
    pub batch_size: u32,
    pub default_focus: FocusAllocation,
    /// Tons of target mass per eligible combat unit.
    pub weight_class_allowance: HashMap<WeightClass, f64>,
    pub interception_base_mass: f64,
    pub interception_mass_step: f64,
    /// Out of 10: an interception roll turns into a flavor event instead.
    pub narrative_event_chance: u32,
    pub npc_convoy_mass_multiplier: f64,
    /// 2d6 strictly above this captures a crew member instead of killing them.
    pub capture_threshold: u32,
    pub ground_convoy_template: String,
    pub air_convoy_template: String,
    pub npc_convoy_template: String,
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResupplyStage {
    Init,
    ConvoyChoice,
    FocusSelection,
    ContentGeneration,
    ItineraryConfirmation,
    Transit,
    Finished,
}

/// The transport a batch of contents travels with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvoyRef {
    Player(ForceId),
    Npc,
}

impl std::fmt::Display for ConvoyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player(force) => write!(f, "convoy {force}"),
            Self::Npc => f.write_str("employer convoy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NarrativeEventKind {
    AmbushEvaded,
    BanditToll,
    WashedOutRoad,
    LocalGuide,
    Breakdown,
}

impl NarrativeEventKind {
    pub const ALL: [Self; 5] = [
        Self::AmbushEvaded,
        Self::BanditToll,
        Self::WashedOutRoad,
        Self::LocalGuide,
        Self::Breakdown,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterceptionOutcome {
    Delivered,
    Intercepted,
    NarrativeEvent,
    Abandoned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub day: u64,
    pub event: ResupplyEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResupplyEvent {
    StageEntered {
        stage: ResupplyStage,
    },
    Skipped {
        reason: String,
    },
    Aborted {
        reason: String,
    },
    HighValueDeclined {
        part: String,
        value: Money,
    },
    DropGenerated {
        drop: u32,
        items: usize,
        mass: f64,
    },
    ContentsValued {
        base: Money,
        adjusted: Money,
    },
    ConvoyDispatched {
        convoy: ConvoyRef,
        items: usize,
        convoy_mass: f64,
        interception_chance: u32,
    },
    Delivered {
        convoy: ConvoyRef,
        items: usize,
        charged: Money,
    },
    Intercepted {
        convoy: ConvoyRef,
        scenario: ScenarioId,
    },
    InterceptionFallback {
        convoy: ConvoyRef,
        reason: String,
    },
    NarrativeEvent {
        convoy: ConvoyRef,
        kind: NarrativeEventKind,
    },
    Swindled {
        lost_value: Money,
    },
    ConvoyAbandoned {
        convoy: ConvoyRef,
        units_lost: usize,
        captured: usize,
        killed: usize,
    },
    Undeliverable {
        items: usize,
    },
    DeliveryFailed {
        convoy: ConvoyRef,
        reason: String,
    },
}
