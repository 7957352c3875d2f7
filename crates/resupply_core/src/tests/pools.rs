use super::*;
use crate::collaborators::ProcurementFilter;
use crate::pool::{accumulate_demand, expand_demand, net_out_spares};

fn weight_of(demand: &ahash::AHashMap<PartDefId, f64>, id: &str) -> f64 {
    demand
        .get(&PartDefId(id.to_string()))
        .copied()
        .unwrap_or(0.0)
}

#[test]
fn test_demand_sums_identical_parts_across_units() {
    let content = base_content();
    let campaign = base_campaign(&content);
    let demand = accumulate_demand(&campaign, &content);
    // Locust 1, Shadow Hawk 2, Warhammer 2, Atlas 1.
    assert!((weight_of(&demand, "mek_arm") - 6.0).abs() < 1e-9);
    assert!((weight_of(&demand, "medium_laser") - 3.0).abs() < 1e-9);
    // Never offered: center torsos, hull sections, cargo bays.
    assert!(!demand.contains_key(&PartDefId("mek_ct".to_string())));
    assert!(!demand.contains_key(&PartDefId("tank_front".to_string())));
    assert!(!demand.contains_key(&PartDefId("cargo_bay".to_string())));
}

#[test]
fn test_missing_components_weigh_more() {
    let content = base_content();
    let mut campaign = base_campaign(&content);
    let atlas = campaign
        .units
        .get_mut(&UnitId("mek_atlas".to_string()))
        .unwrap();
    for component in &mut atlas.components {
        if component.def_id.0 == "ac10_ammo" {
            component.missing = true;
        }
    }
    let demand = accumulate_demand(&campaign, &content);
    // Shadow Hawk present (1) + Atlas missing (10).
    assert!((weight_of(&demand, "ac10_ammo") - 11.0).abs() < 1e-9);
}

#[test]
fn test_salvage_and_deployed_units_drive_no_demand() {
    let content = base_content();
    let mut campaign = base_campaign(&content);
    campaign
        .units
        .get_mut(&UnitId("mek_shadow_hawk".to_string()))
        .unwrap()
        .salvage = true;
    campaign
        .units
        .get_mut(&UnitId("mek_warhammer".to_string()))
        .unwrap()
        .deployed = true;
    let demand = accumulate_demand(&campaign, &content);
    assert!((weight_of(&demand, "mek_arm") - 2.0).abs() < 1e-9);
    assert!(!demand.contains_key(&PartDefId("fusion_engine".to_string())));
}

#[test]
fn test_unknown_component_is_skipped() {
    let content = base_content();
    let mut campaign = base_campaign(&content);
    campaign
        .units
        .get_mut(&UnitId("mek_locust".to_string()))
        .unwrap()
        .components
        .push(UnitComponent {
            def_id: PartDefId("flux_capacitor".to_string()),
            missing: true,
        });
    let demand = accumulate_demand(&campaign, &content);
    assert!(!demand.contains_key(&PartDefId("flux_capacitor".to_string())));
}

#[test]
fn test_held_spares_offset_demand_by_class() {
    let content = base_content();
    let mut campaign = base_campaign(&content);
    campaign.inventory = vec![
        InventoryItem::Part {
            def_id: PartDefId("heat_sink".to_string()),
            name: "Heat Sink".to_string(),
            quality: PartQuality::D,
            count: 1,
        },
        InventoryItem::Part {
            def_id: PartDefId("medium_laser".to_string()),
            name: "Medium Laser".to_string(),
            quality: PartQuality::D,
            count: 5,
        },
    ];
    let mut demand = accumulate_demand(&campaign, &content);
    net_out_spares(&mut demand, &campaign, &content);
    // Three heat sinks less one spare at 2.5.
    assert!((weight_of(&demand, "heat_sink") - 0.5).abs() < 1e-9);
    // Five spare lasers cover all three installed.
    assert!(!demand.contains_key(&PartDefId("medium_laser".to_string())));
}

#[test]
fn test_expansion_creates_independent_copies() {
    let content = base_content();
    let campaign = base_campaign(&content);
    let demand = accumulate_demand(&campaign, &content);
    let mut candidates = expand_demand(&demand, &content);
    let arms: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.part.def_id.0 == "mek_arm")
        .map(|(index, _)| index)
        .collect();
    assert_eq!(arms.len(), 6);
    assert!(candidates.iter().all(|c| c.part.brand_new));

    candidates[arms[0]].part.quality = PartQuality::F;
    assert_eq!(candidates[arms[1]].part.quality, PartQuality::D);
}

#[test]
fn test_pools_split_by_category() {
    let content = base_content();
    let campaign = base_campaign(&content);
    let pools = build_pools(
        &campaign,
        &content,
        &PassThroughProcurement,
        SkillLevel::Regular,
        campaign.year,
        &campaign.faction,
        &mut make_rng(),
    );
    // One spare heat sink leaves 0.5, which rounds to a single copy.
    assert_eq!(pools.pool(SupplyCategory::General).len(), 11);
    assert_eq!(pools.pool(SupplyCategory::Armor).len(), 3);
    assert_eq!(pools.pool(SupplyCategory::Ammo).len(), 2);
    for category in SupplyCategory::ALL {
        assert!(pools
            .pool(category)
            .iter()
            .all(|c| c.part.kind.category() == category));
    }
}

/// Swaps one entry for a second copy of a different part type, keeping the
/// pool the same length.
struct SwappingProcurement;

impl ProcurementFilter for SwappingProcurement {
    fn filter(
        &self,
        mut pool: Vec<CandidateItem>,
        _skill: SkillLevel,
        _year: u32,
        _faction: &FactionId,
        _rng: &mut impl Rng,
    ) -> Vec<CandidateItem> {
        let Some(first) = pool.first().cloned() else {
            return pool;
        };
        if let Some(other) = pool
            .iter()
            .position(|item| item.part.def_id != first.part.def_id)
        {
            pool[other] = first;
        }
        pool
    }
}

#[test]
#[should_panic(expected = "duplicated")]
fn test_same_length_filter_that_duplicates_is_caught() {
    let content = base_content();
    let campaign = base_campaign(&content);
    build_pools(
        &campaign,
        &content,
        &SwappingProcurement,
        SkillLevel::Regular,
        campaign.year,
        &campaign.faction,
        &mut make_rng(),
    );
}

/// Keeps every other entry.
struct HalvingProcurement;

impl ProcurementFilter for HalvingProcurement {
    fn filter(
        &self,
        pool: Vec<CandidateItem>,
        _skill: SkillLevel,
        _year: u32,
        _faction: &FactionId,
        _rng: &mut impl Rng,
    ) -> Vec<CandidateItem> {
        pool.into_iter().step_by(2).collect()
    }
}

#[test]
fn test_dropping_filter_is_accepted() {
    let content = base_content();
    let campaign = base_campaign(&content);
    let pools = build_pools(
        &campaign,
        &content,
        &HalvingProcurement,
        SkillLevel::Regular,
        campaign.year,
        &campaign.faction,
        &mut make_rng(),
    );
    assert_eq!(pools.pool(SupplyCategory::General).len(), 6);
    assert_eq!(pools.pool(SupplyCategory::Armor).len(), 2);
    assert_eq!(pools.pool(SupplyCategory::Ammo).len(), 1);
}
