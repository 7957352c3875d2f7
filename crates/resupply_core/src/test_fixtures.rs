//! Shared test fixtures for resupply_core and downstream crates.
//!
//! `base_content()` carries a small parts catalog covering every part kind,
//! a handful of unit templates and one cache table. `base_campaign()` is a
//! mercenary company on a garrison contract: a combat lance of four units
//! and a convoy force of two 20-ton trucks.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    AmmoTypeId, CacheFactionTable, CacheTables, Campaign, CommandRights, Constants, Contract,
    ContractId, ContractType, Counters, FactionDef, FactionId, FocusAllocation, Force, ForceId,
    InventoryItem, MekLocation, Money, MoraleLevel, PartDef, PartDefId, PartKind, Person,
    PersonId, PersonnelRole, PersonnelStatus, ResupplyContent, SkillLevel, StrategicTrack,
    TrackId, Unit, UnitComponent, UnitId, UnitTemplate, UnitTemplateId, UnitType,
    VehicleLocation, WeightClass,
};

fn part(id: &str, name: &str, kind: PartKind, tonnage: f64, value: i64) -> PartDef {
    PartDef {
        id: PartDefId(id.to_string()),
        name: name.to_string(),
        kind,
        tonnage,
        value: Money(value),
        availability: 1,
        introduced_year: 2300,
        extinct_year: None,
        restricted_to: vec![],
    }
}

fn faction(id: &str, name: &str, mercenary: bool, pirate: bool) -> FactionDef {
    FactionDef {
        id: FactionId(id.to_string()),
        name: name.to_string(),
        mercenary,
        pirate,
    }
}

fn parts_catalog() -> Vec<PartDef> {
    let mut gauss = part("gauss_rifle", "Gauss Rifle", PartKind::Equipment, 15.0, 300_000);
    gauss.availability = 3;
    gauss.introduced_year = 2590;
    gauss.extinct_year = Some(2865);

    vec![
        part("medium_laser", "Medium Laser", PartKind::Equipment, 1.0, 40_000),
        part("heat_sink", "Heat Sink", PartKind::HeatSink, 1.0, 2_000),
        part("fusion_engine", "Fusion Engine", PartKind::Drive, 4.0, 100_000),
        part(
            "standard_armor",
            "Standard Armor",
            PartKind::Armor { points_per_ton: 16 },
            1.0,
            10_000,
        ),
        part(
            "ac10_ammo",
            "AC/10 Ammo",
            PartKind::AmmoBin {
                ammo_type: AmmoTypeId("ac10".to_string()),
                shots_per_ton: 10,
            },
            1.0,
            6_000,
        ),
        gauss,
        part(
            "mek_ct",
            "Mek Center Torso",
            PartKind::MekLocation {
                location: MekLocation::CenterTorso,
            },
            5.0,
            50_000,
        ),
        part(
            "mek_arm",
            "Mek Arm",
            PartKind::MekLocation {
                location: MekLocation::LeftArm,
            },
            2.0,
            20_000,
        ),
        part(
            "tank_front",
            "Tank Front Hull",
            PartKind::VehicleLocation {
                location: VehicleLocation::Front,
            },
            3.0,
            15_000,
        ),
        part(
            "tank_turret",
            "Tank Turret",
            PartKind::VehicleLocation {
                location: VehicleLocation::Turret,
            },
            2.0,
            18_000,
        ),
        part("cargo_bay", "Cargo Bay", PartKind::TransportBay, 0.5, 5_000),
    ]
}

fn template(
    id: &str,
    name: &str,
    unit_type: UnitType,
    weight_class: WeightClass,
    mass: f64,
    components: &[&str],
) -> UnitTemplate {
    UnitTemplate {
        id: UnitTemplateId(id.to_string()),
        name: name.to_string(),
        unit_type,
        weight_class,
        mass,
        cargo_capacity: 0.0,
        required_crew: 1,
        introduced_year: 2450,
        factions: vec![],
        components: components
            .iter()
            .map(|part| PartDefId((*part).to_string()))
            .collect(),
    }
}

fn unit_templates() -> Vec<UnitTemplate> {
    let mut truck = template(
        "tmpl_cargo_truck",
        "Cargo Truck",
        UnitType::Tank,
        WeightClass::Light,
        20.0,
        &["tank_front", "cargo_bay"],
    );
    truck.cargo_capacity = 20.0;
    truck.required_crew = 2;

    vec![
        template(
            "tmpl_locust",
            "Locust",
            UnitType::Mek,
            WeightClass::Light,
            20.0,
            &["mek_ct", "mek_arm", "medium_laser", "standard_armor", "heat_sink"],
        ),
        template(
            "tmpl_shadow_hawk",
            "Shadow Hawk",
            UnitType::Mek,
            WeightClass::Medium,
            55.0,
            &["mek_ct", "mek_arm", "mek_arm", "medium_laser", "ac10_ammo", "fusion_engine"],
        ),
        template(
            "tmpl_warhammer",
            "Warhammer",
            UnitType::Mek,
            WeightClass::Heavy,
            70.0,
            &["mek_ct", "mek_arm", "mek_arm", "medium_laser", "heat_sink", "heat_sink"],
        ),
        template(
            "tmpl_atlas",
            "Atlas",
            UnitType::Mek,
            WeightClass::Assault,
            100.0,
            &["mek_ct", "mek_arm", "ac10_ammo", "standard_armor", "standard_armor"],
        ),
        truck,
    ]
}

/// Full content: every part kind, four mek templates plus a cargo truck, one
/// cache table.
pub fn base_content() -> ResupplyContent {
    ResupplyContent {
        content_version: "test".to_string(),
        parts: parts_catalog(),
        factions: vec![
            faction("LC", "Lyran Commonwealth", false, false),
            faction("FS", "Federated Suns", false, false),
            faction("MERC", "Mercenary", true, false),
            faction("PIR", "Pirates", false, true),
            faction("SLDF", "Star League Defense Force", false, false),
        ],
        unit_templates: unit_templates(),
        cache: CacheTables {
            cutoff_year: 2781,
            decay_percent_per_year: 0.1,
            company_size: 12,
            target_mass: 60,
            factions: vec![CacheFactionTable {
                faction: FactionId("SLDF".to_string()),
                weight_classes: [
                    WeightClass::Light,
                    WeightClass::Light,
                    WeightClass::Medium,
                    WeightClass::Medium,
                    WeightClass::Medium,
                    WeightClass::Heavy,
                    WeightClass::Medium,
                    WeightClass::Heavy,
                    WeightClass::Heavy,
                    WeightClass::Assault,
                    WeightClass::Assault,
                ],
            }],
        },
        constants: Constants {
            missing_part_weight: 10.0,
            present_part_weight: 1.0,
            excluded_parts: vec![],
            high_value_threshold: Money(250_000),
            scarcity_grant_roll: 6,
            batch_size: 5,
            default_focus: FocusAllocation::default(),
            weight_class_allowance: HashMap::from([
                (WeightClass::Light, 1.0),
                (WeightClass::Medium, 2.0),
                (WeightClass::Heavy, 3.0),
                (WeightClass::Assault, 4.0),
                (WeightClass::SuperHeavy, 5.0),
            ]),
            interception_base_mass: 200.0,
            interception_mass_step: 50.0,
            narrative_event_chance: 3,
            npc_convoy_mass_multiplier: 10.0,
            capture_threshold: 7,
            ground_convoy_template: "Convoy Ambush (Ground)".to_string(),
            air_convoy_template: "Convoy Ambush (Air)".to_string(),
            npc_convoy_template: "Employer Convoy Raid".to_string(),
        },
    }
}

/// Builds a unit from a template in `content`, crewed by `crew`.
pub fn unit_from_template(
    content: &ResupplyContent,
    template_id: &str,
    unit_id: &str,
    crew: &[&str],
) -> Unit {
    let template = content
        .unit_templates
        .iter()
        .find(|t| t.id.0 == template_id)
        .expect("fixture template exists");
    Unit {
        id: UnitId(unit_id.to_string()),
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
        crew: crew.iter().map(|id| PersonId((*id).to_string())).collect(),
        required_crew: template.required_crew,
        damaged: false,
        salvage: false,
        deployed: false,
        mothballed: false,
    }
}

fn person(id: &str, role: PersonnelRole, rank: u32, negotiation: SkillLevel) -> Person {
    Person {
        id: PersonId(id.to_string()),
        name: id.replace('_', " "),
        role,
        rank,
        negotiation,
        status: PersonnelStatus::Active,
    }
}

/// The garrison contract the fixture campaign holds: House command rights,
/// stalemate morale, one track that can host a deployment and one that cannot.
pub fn base_contract() -> Contract {
    Contract {
        id: ContractId("contract_1".to_string()),
        name: "Garrison of Hesperus II".to_string(),
        contract_type: ContractType::GarrisonDuty,
        employer: FactionId("LC".to_string()),
        enemy: FactionId("FS".to_string()),
        morale: MoraleLevel::Stalemate,
        command_rights: CommandRights::House,
        resupply_scale: 1.0,
        tracks: vec![
            StrategicTrack {
                id: TrackId("track_north".to_string()),
                name: "Northern Approach".to_string(),
                deployment_locations: 2,
            },
            StrategicTrack {
                id: TrackId("track_coast".to_string()),
                name: "Coastal Road".to_string(),
                deployment_locations: 0,
            },
        ],
        start_day: 0,
        end_day: 180,
    }
}

/// Mercenary company in 3025: a Locust, Shadow Hawk, Warhammer and Atlas
/// (target mass 10 at scale 1.0) plus two crewed cargo trucks (40 t).
pub fn base_campaign(content: &ResupplyContent) -> Campaign {
    let lance = [
        unit_from_template(content, "tmpl_locust", "mek_locust", &["mw_1"]),
        unit_from_template(content, "tmpl_shadow_hawk", "mek_shadow_hawk", &["mw_2"]),
        unit_from_template(content, "tmpl_warhammer", "mek_warhammer", &["mw_3"]),
        unit_from_template(content, "tmpl_atlas", "mek_atlas", &["mw_4"]),
    ];
    let trucks = [
        unit_from_template(content, "tmpl_cargo_truck", "truck_1", &["drv_1", "drv_2"]),
        unit_from_template(content, "tmpl_cargo_truck", "truck_2", &["drv_3", "drv_4"]),
    ];

    let mut personnel = vec![
        person("logistics_chief", PersonnelRole::Logistics, 3, SkillLevel::Veteran),
        person("clerk", PersonnelRole::Logistics, 1, SkillLevel::Green),
        person("tech_1", PersonnelRole::Tech, 2, SkillLevel::None),
    ];
    for (index, id) in ["mw_1", "mw_2", "mw_3", "mw_4"].iter().enumerate() {
        let rank = if index == 3 { 8 } else { 4 };
        personnel.push(person(id, PersonnelRole::MekWarrior, rank, SkillLevel::Regular));
    }
    for id in ["drv_1", "drv_2", "drv_3", "drv_4"] {
        personnel.push(person(id, PersonnelRole::VehicleCrew, 2, SkillLevel::None));
    }

    Campaign {
        name: "Test Company".to_string(),
        faction: FactionId("MERC".to_string()),
        year: 3025,
        day: 0,
        funds: Money(10_000_000),
        forces: vec![
            Force {
                id: ForceId("force_lance".to_string()),
                name: "Command Lance".to_string(),
                units: lance.iter().map(|unit| unit.id.clone()).collect(),
                convoy: false,
            },
            Force {
                id: ForceId("force_convoy".to_string()),
                name: "Supply Train".to_string(),
                units: trucks.iter().map(|unit| unit.id.clone()).collect(),
                convoy: true,
            },
        ],
        units: lance
            .into_iter()
            .chain(trucks)
            .map(|unit| (unit.id.clone(), unit))
            .collect(),
        personnel: personnel
            .into_iter()
            .map(|person| (person.id.clone(), person))
            .collect(),
        inventory: vec![InventoryItem::Part {
            def_id: PartDefId("heat_sink".to_string()),
            name: "Heat Sink".to_string(),
            quality: crate::PartQuality::D,
            count: 1,
        }],
        contracts: vec![base_contract()],
        counters: Counters::default(),
    }
}

/// Deterministic RNG seeded with 42.
pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}
