//! World generation and content loading shared between resupply_cli and resupply_bench.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use resupply_core::collaborators::{EncounterSystem, ScenarioHandle, UnitGenerator};
use resupply_core::{
    CacheTables, Campaign, CommandRights, Constants, Contract, ContractId, ContractType,
    Counters, FactionDef, FactionId, Force, ForceId, Money, MoraleLevel, PartDef, PartKind,
    Person, PersonId, PersonnelRole, PersonnelStatus, ResupplyContent, ScenarioId, SkillLevel,
    StrategicTrack, TrackId, Unit, UnitComponent, UnitId, UnitTemplate, UnitType, WeightClass,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct PartsFile {
    content_version: String,
    parts: Vec<PartDef>,
}

#[derive(Deserialize)]
struct FactionsFile {
    factions: Vec<FactionDef>,
}

#[derive(Deserialize)]
struct UnitTemplatesFile {
    templates: Vec<UnitTemplate>,
}

const WEIGHT_CLASSES: [WeightClass; 5] = [
    WeightClass::Light,
    WeightClass::Medium,
    WeightClass::Heavy,
    WeightClass::Assault,
    WeightClass::SuperHeavy,
];

/// Validates cross-references in loaded content, panicking on any authoring error.
///
/// Catches mistakes like: a unit template built from a part that doesn't
/// exist, a cache table for an unknown faction, or armor with no points per ton.
pub fn validate_content(content: &ResupplyContent) {
    let faction_ids: HashSet<&FactionId> = content.factions.iter().map(|f| &f.id).collect();
    let mut part_ids = HashSet::new();

    for part in &content.parts {
        assert!(!part.id.0.is_empty(), "part '{}' has an empty id", part.name);
        assert!(part_ids.insert(&part.id), "part id '{}' is defined twice", part.id);
        assert!(
            part.tonnage.is_finite() && part.tonnage >= 0.0,
            "part '{}' has invalid tonnage {}",
            part.id,
            part.tonnage,
        );
        match &part.kind {
            PartKind::Armor { points_per_ton } => assert!(
                *points_per_ton > 0,
                "armor part '{}' has zero points per ton",
                part.id,
            ),
            PartKind::AmmoBin { shots_per_ton, .. } => assert!(
                *shots_per_ton > 0,
                "ammo part '{}' has zero shots per ton",
                part.id,
            ),
            _ => {}
        }
        for faction in &part.restricted_to {
            assert!(
                faction_ids.contains(faction),
                "part '{}' is restricted to '{}', which is not a known faction",
                part.id,
                faction,
            );
        }
    }

    for template in &content.unit_templates {
        for component in &template.components {
            assert!(
                part_ids.contains(component),
                "template '{}' component '{}' is not a known part",
                template.id,
                component,
            );
        }
        for faction in &template.factions {
            assert!(
                faction_ids.contains(faction),
                "template '{}' faction '{}' is not a known faction",
                template.id,
                faction,
            );
        }
    }

    for table in &content.cache.factions {
        assert!(
            faction_ids.contains(&table.faction),
            "cache table faction '{}' is not a known faction",
            table.faction,
        );
    }

    let c = &content.constants;
    assert!(c.batch_size > 0, "batch_size must be positive");
    assert!(
        c.narrative_event_chance <= 10,
        "narrative_event_chance is out of 10, got {}",
        c.narrative_event_chance,
    );
    c.default_focus.assert_valid();
    for class in WEIGHT_CLASSES {
        assert!(
            c.weight_class_allowance.contains_key(&class),
            "weight class {class:?} has no allowance",
        );
    }
    assert!(
        content.factions.iter().any(|f| f.mercenary),
        "content defines no mercenary faction",
    );
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let text =
        std::fs::read_to_string(dir.join(file)).with_context(|| format!("reading {file}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {file}"))
}

pub fn load_content(content_dir: &str) -> Result<ResupplyContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = read_json(dir, "constants.json")?;
    let parts_file: PartsFile = read_json(dir, "parts.json")?;
    let factions_file: FactionsFile = read_json(dir, "factions.json")?;
    let templates_file: UnitTemplatesFile = read_json(dir, "unit_templates.json")?;
    let cache: CacheTables = read_json(dir, "cache_tables.json")?;
    let content = ResupplyContent {
        content_version: parts_file.content_version,
        parts: parts_file.parts,
        factions: factions_file.factions,
        unit_templates: templates_file.templates,
        cache,
        constants,
    };
    validate_content(&content);
    Ok(content)
}

pub fn load_campaign(path: &str) -> Result<Campaign> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

pub fn save_campaign(path: &str, campaign: &Campaign) -> Result<()> {
    let json = serde_json::to_string_pretty(campaign).context("serializing campaign")?;
    std::fs::write(path, json).with_context(|| format!("writing {path}"))
}

// ---------------------------------------------------------------------------
// Units from templates
// ---------------------------------------------------------------------------

fn generate_uuid(rng: &mut impl Rng) -> uuid::Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

fn template_available(template: &UnitTemplate, faction: &FactionId, year: u32) -> bool {
    template.introduced_year <= year
        && (template.factions.is_empty() || template.factions.contains(faction))
}

/// A factory-fresh unit built from `template`, crewed by `crew`.
pub fn instantiate(template: &UnitTemplate, id: UnitId, crew: &[PersonId]) -> Unit {
    Unit {
        id,
        name: template.name.clone(),
        unit_type: template.unit_type,
        weight_class: template.weight_class,
        mass: template.mass,
        cargo_capacity: template.cargo_capacity,
        components: template
            .components
            .iter()
            .map(|def_id| UnitComponent {
                def_id: def_id.clone(),
                missing: false,
            })
            .collect(),
        crew: crew.iter().cloned().collect(),
        required_crew: template.required_crew,
        damaged: false,
        salvage: false,
        deployed: false,
        mothballed: false,
    }
}

/// Draws uncrewed meks from the content's unit templates.
pub struct TemplateUnitGenerator<'a> {
    content: &'a ResupplyContent,
}

impl<'a> TemplateUnitGenerator<'a> {
    pub fn new(content: &'a ResupplyContent) -> Self {
        Self { content }
    }
}

impl UnitGenerator for TemplateUnitGenerator<'_> {
    fn generate_unit(
        &mut self,
        faction: &FactionId,
        weight_class: WeightClass,
        year: u32,
        rng: &mut impl Rng,
    ) -> Option<Unit> {
        let candidates: Vec<&UnitTemplate> = self
            .content
            .unit_templates
            .iter()
            .filter(|t| t.unit_type == UnitType::Mek && t.weight_class == weight_class)
            .filter(|t| template_available(t, faction, year))
            .collect();
        let Some(template) = candidates.choose(rng) else {
            debug!(%faction, ?weight_class, year, "no template fits");
            return None;
        };
        let id = UnitId(format!("unit_{}", generate_uuid(rng)));
        Some(instantiate(template, id, &[]))
    }
}

// ---------------------------------------------------------------------------
// Encounters
// ---------------------------------------------------------------------------

/// Issues numbered convoy scenarios for the templates named in `Constants`.
pub struct ContentEncounterSystem {
    templates: Vec<String>,
    issued: u32,
}

impl ContentEncounterSystem {
    pub fn new(constants: &Constants) -> Self {
        Self {
            templates: vec![
                constants.ground_convoy_template.clone(),
                constants.air_convoy_template.clone(),
                constants.npc_convoy_template.clone(),
            ],
            issued: 0,
        }
    }

    pub fn issued(&self) -> u32 {
        self.issued
    }
}

impl EncounterSystem for ContentEncounterSystem {
    fn generate_interception(
        &mut self,
        contract: &Contract,
        track: &StrategicTrack,
        template: &str,
        force: Option<&ForceId>,
    ) -> Option<ScenarioHandle> {
        if !self.templates.iter().any(|known| known == template) {
            warn!(template, "unknown scenario template");
            return None;
        }
        if track.deployment_locations == 0 {
            return None;
        }
        self.issued += 1;
        let id = ScenarioId(format!("scn_{}_{:04}", contract.id, self.issued));
        debug!(scenario = %id, track = %track.id, template, "scenario generated");
        Some(ScenarioHandle {
            id,
            template: template.to_string(),
            track: track.id.clone(),
            force: force.cloned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Initial campaign
// ---------------------------------------------------------------------------

const START_YEAR: u32 = 3025;
const START_FUNDS: Money = Money(5_000_000);
const CONTRACT_DAYS: u64 = 180;
const CONVOY_SIZE: usize = 2;
const TRACK_NAMES: [&str; 3] = ["Northern Approach", "River Crossing", "Spaceport Road"];
const CONTRACT_TYPES: [ContractType; 5] = [
    ContractType::GarrisonDuty,
    ContractType::CadreDuty,
    ContractType::ReliefDuty,
    ContractType::PlanetaryAssault,
    ContractType::PirateHunting,
];
const COMMAND_RIGHTS: [CommandRights; 4] = [
    CommandRights::Integrated,
    CommandRights::House,
    CommandRights::Liaison,
    CommandRights::Independent,
];

fn crew_role(unit_type: UnitType) -> PersonnelRole {
    match unit_type {
        UnitType::Mek => PersonnelRole::MekWarrior,
        UnitType::Tank | UnitType::Infantry => PersonnelRole::VehicleCrew,
        UnitType::Vtol | UnitType::Aerospace => PersonnelRole::Pilot,
    }
}

struct Roster<'r, R: Rng> {
    rng: &'r mut R,
    units: HashMap<UnitId, Unit>,
    personnel: HashMap<PersonId, Person>,
}

impl<R: Rng> Roster<'_, R> {
    fn hire(&mut self, role: PersonnelRole, rank: u32, negotiation: SkillLevel) -> PersonId {
        let id = PersonId(format!("person_{}", generate_uuid(&mut *self.rng)));
        let name = format!("{role:?} {}", self.personnel.len() + 1);
        self.personnel.insert(
            id.clone(),
            Person {
                id: id.clone(),
                name,
                role,
                rank,
                negotiation,
                status: PersonnelStatus::Active,
            },
        );
        id
    }

    fn field(&mut self, template: &UnitTemplate, rank: u32) -> UnitId {
        let role = crew_role(template.unit_type);
        let crew: Vec<PersonId> = (0..template.required_crew.max(1))
            .map(|_| self.hire(role, rank, SkillLevel::None))
            .collect();
        let id = UnitId(format!("unit_{}", generate_uuid(&mut *self.rng)));
        self.units
            .insert(id.clone(), instantiate(template, id.clone(), &crew));
        id
    }
}

fn build_contract(content: &ResupplyContent, rng: &mut impl Rng) -> Contract {
    let mut employers: Vec<&FactionDef> = content
        .factions
        .iter()
        .filter(|f| !f.mercenary && !f.pirate)
        .collect();
    employers.shuffle(rng);
    let Some(&employer) = employers.first() else {
        panic!("content defines no faction that can hire mercenaries");
    };
    let enemy = employers
        .get(1)
        .copied()
        .or_else(|| content.factions.iter().find(|f| f.pirate))
        .unwrap_or(employer);
    let contract_type = CONTRACT_TYPES[rng.gen_range(0..CONTRACT_TYPES.len())];
    let command_rights = COMMAND_RIGHTS[rng.gen_range(0..COMMAND_RIGHTS.len())];
    let tracks = TRACK_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| StrategicTrack {
            id: TrackId(format!("track_{}", index + 1)),
            name: (*name).to_string(),
            deployment_locations: rng.gen_range(0..=3),
        })
        .collect();
    Contract {
        id: ContractId("contract_1".to_string()),
        name: format!("{contract_type:?} for {}", employer.name),
        contract_type,
        employer: employer.id.clone(),
        enemy: enemy.id.clone(),
        morale: MoraleLevel::Stalemate,
        command_rights,
        resupply_scale: 1.0,
        tracks,
        start_day: 0,
        end_day: CONTRACT_DAYS,
    }
}

/// A mercenary company: one combat lance (a mek per weight class where the
/// era allows), a convoy of cargo haulers, a logistics officer, and a single
/// contract.
pub fn build_initial_campaign(
    content: &ResupplyContent,
    seed: u64,
    rng: &mut impl Rng,
) -> Campaign {
    let Some(faction) = content.factions.iter().find(|f| f.mercenary) else {
        panic!("content defines no mercenary faction");
    };
    let contract = build_contract(content, rng);
    let mut roster = Roster {
        rng,
        units: HashMap::new(),
        personnel: HashMap::new(),
    };

    let mut lance = Vec::new();
    for (slot, class) in WEIGHT_CLASSES[..4].iter().enumerate() {
        let candidates: Vec<&UnitTemplate> = content
            .unit_templates
            .iter()
            .filter(|t| t.weight_class == *class && t.cargo_capacity <= 0.0)
            .filter(|t| template_available(t, &faction.id, START_YEAR))
            .collect();
        if let Some(template) = candidates.choose(&mut *roster.rng) {
            let rank = if slot == 0 { 6 } else { 3 };
            lance.push(roster.field(template, rank));
        }
    }

    let haulers: Vec<&UnitTemplate> = content
        .unit_templates
        .iter()
        .filter(|t| t.cargo_capacity > 0.0 && template_available(t, &faction.id, START_YEAR))
        .collect();
    let mut convoy = Vec::new();
    for _ in 0..CONVOY_SIZE {
        if let Some(template) = haulers.choose(&mut *roster.rng) {
            convoy.push(roster.field(template, 1));
        }
    }

    let negotiation = [SkillLevel::Green, SkillLevel::Regular, SkillLevel::Veteran]
        [roster.rng.gen_range(0..3)];
    roster.hire(PersonnelRole::Logistics, 2, negotiation);
    roster.hire(PersonnelRole::Tech, 1, SkillLevel::None);

    debug!(
        seed,
        lance = lance.len(),
        convoy = convoy.len(),
        contract = ?contract.contract_type,
        "initial campaign built"
    );

    Campaign {
        name: format!("{} Company {seed}", faction.name),
        faction: faction.id.clone(),
        year: START_YEAR,
        day: 0,
        funds: START_FUNDS,
        units: roster.units,
        forces: vec![
            Force {
                id: ForceId("force_lance".to_string()),
                name: "Command Lance".to_string(),
                units: lance,
                convoy: false,
            },
            Force {
                id: ForceId("force_convoy".to_string()),
                name: "Supply Train".to_string(),
                units: convoy,
                convoy: true,
            },
        ],
        personnel: roster.personnel,
        inventory: vec![],
        contracts: vec![contract],
        counters: Counters::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use resupply_core::test_fixtures::{base_campaign, base_content};
    use resupply_core::{calculate_target_mass, PartDefId};

    #[test]
    fn test_valid_content_passes_validation() {
        validate_content(&base_content()); // should not panic
    }

    #[test]
    #[should_panic(expected = "is not a known part")]
    fn test_template_unknown_component_panics() {
        let mut content = base_content();
        content.unit_templates[0]
            .components
            .push(PartDefId("part_missing".to_string()));
        validate_content(&content);
    }

    #[test]
    #[should_panic(expected = "not a known faction")]
    fn test_cache_table_unknown_faction_panics() {
        let mut content = base_content();
        content.cache.factions[0].faction = FactionId("ComStar".to_string());
        validate_content(&content);
    }

    #[test]
    #[should_panic(expected = "zero points per ton")]
    fn test_pointless_armor_panics() {
        let mut content = base_content();
        for part in &mut content.parts {
            if let PartKind::Armor { points_per_ton } = &mut part.kind {
                *points_per_ton = 0;
            }
        }
        validate_content(&content);
    }

    #[test]
    #[should_panic(expected = "defined twice")]
    fn test_duplicate_part_panics() {
        let mut content = base_content();
        let copy = content.parts[0].clone();
        content.parts.push(copy);
        validate_content(&content);
    }

    #[test]
    fn test_initial_campaign_fields_a_lance_and_a_convoy() {
        let content = base_content();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let campaign = build_initial_campaign(&content, 42, &mut rng);

        assert_eq!(campaign.faction, FactionId("MERC".to_string()));
        assert_eq!(campaign.forces[0].units.len(), 4);
        assert_eq!(campaign.forces[1].units.len(), CONVOY_SIZE);
        assert!(campaign.units.values().all(Unit::is_fully_crewed));
        assert!(campaign
            .personnel
            .values()
            .any(|p| p.role == PersonnelRole::Logistics));

        let contract = &campaign.contracts[0];
        assert_ne!(contract.employer, contract.enemy);
        // Locust 1 + Shadow Hawk 2 + Warhammer 3 + Atlas 4.
        assert_eq!(calculate_target_mass(&campaign, contract, &content.constants), 10);
    }

    #[test]
    fn test_initial_campaign_is_seed_deterministic() {
        let content = base_content();
        let build = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let campaign = build_initial_campaign(&content, seed, &mut rng);
            let mut ids: Vec<String> = campaign.units.keys().map(|id| id.0.clone()).collect();
            ids.sort();
            (ids, campaign.contracts[0].employer.clone())
        };
        assert_eq!(build(9), build(9));
        assert_ne!(build(9).0, build(10).0);
    }

    #[test]
    fn test_generator_respects_era() {
        let content = base_content();
        let mut generator = TemplateUnitGenerator::new(&content);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let sldf = FactionId("SLDF".to_string());

        let unit = generator
            .generate_unit(&sldf, WeightClass::Heavy, 2780, &mut rng)
            .unwrap();
        assert_eq!(unit.name, "Warhammer");
        assert!(unit.crew.is_empty());
        assert!(unit.id.0.starts_with("unit_"));
        assert!(generator
            .generate_unit(&sldf, WeightClass::Heavy, 2400, &mut rng)
            .is_none());
        assert!(generator
            .generate_unit(&sldf, WeightClass::SuperHeavy, 2780, &mut rng)
            .is_none());
    }

    #[test]
    fn test_encounters_need_a_known_template_and_a_deployment_zone() {
        let content = base_content();
        let contract = resupply_core::test_fixtures::base_contract();
        let mut encounters = ContentEncounterSystem::new(&content.constants);
        let north = &contract.tracks[0];
        let coast = &contract.tracks[1];

        assert!(encounters
            .generate_interception(&contract, north, "Garden Party", None)
            .is_none());
        assert!(encounters
            .generate_interception(&contract, coast, "Employer Convoy Raid", None)
            .is_none());
        let handle = encounters
            .generate_interception(&contract, north, "Employer Convoy Raid", None)
            .unwrap();
        assert_eq!(handle.id, ScenarioId("scn_contract_1_0001".to_string()));
        assert_eq!(encounters.issued(), 1);
    }

    #[test]
    fn test_campaign_round_trips_through_disk() {
        let content = base_content();
        let campaign = base_campaign(&content);
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("campaign.json");
        let path = path.to_str().unwrap();

        save_campaign(path, &campaign).unwrap();
        let loaded = load_campaign(path).unwrap();
        assert_eq!(loaded.funds, campaign.funds);
        assert_eq!(loaded.units.len(), campaign.units.len());
        assert!(load_campaign("/nonexistent/campaign.json").is_err());
    }
}
