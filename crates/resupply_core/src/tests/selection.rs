use super::*;

fn candidate(content: &ResupplyContent, id: &str) -> CandidateItem {
    let def = content.part_def(&PartDefId(id.to_string())).unwrap();
    CandidateItem {
        part: Part::brand_new(def),
        weight: 1,
    }
}

fn pool_of(content: &ResupplyContent, id: &str, count: usize) -> Vec<CandidateItem> {
    (0..count).map(|_| candidate(content, id)).collect()
}

#[test]
fn test_one_ton_general_part_leaves_budget_for_more() {
    let content = base_content();
    let mut pool = pool_of(&content, "medium_laser", 1);
    let selection = select_category(
        &mut pool,
        5.0,
        SkillLevel::Regular,
        &content.constants,
        &mut make_rng(),
    );
    // 5 - 1 = 4 left, but the pool ran dry.
    assert_eq!(selection.granted.len(), 1);
    assert!(pool.is_empty());
}

#[test]
fn test_one_armor_ton_overdraws_and_stops() {
    let content = base_content();
    let mut pool = pool_of(&content, "standard_armor", 3);
    let selection = select_category(
        &mut pool,
        2.5,
        SkillLevel::Regular,
        &content.constants,
        &mut make_rng(),
    );
    // 2.5 - 1 * 5 = -2.5 ends the loop after one draw.
    assert_eq!(selection.granted.len(), 1);
    assert_eq!(selection.draws, 1);
    assert_eq!(pool.len(), 2);
}

#[test]
fn test_granted_mass_stays_within_budget_plus_last_item() {
    let content = base_content();
    let campaign = base_campaign(&content);
    let batch = content.constants.batch_size;
    for seed in 0..25 {
        let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(seed);
        let mut pools = build_pools(
            &campaign,
            &content,
            &PassThroughProcurement,
            SkillLevel::Regular,
            campaign.year,
            &campaign.faction,
            &mut rng,
        );
        let budget = 5.0;
        let selection = select_category(
            pools.pool_mut(SupplyCategory::General),
            budget,
            SkillLevel::Regular,
            &content.constants,
            &mut rng,
        );
        let total = cargo_mass(&selection.granted, batch);
        let last = selection
            .granted
            .last()
            .map_or(0.0, |part| part.mass_equivalent(batch));
        assert!(total - last < budget, "seed {seed}: {total} - {last} >= {budget}");
    }
}

#[test]
fn test_every_draw_leaves_the_pool() {
    let content = base_content();
    let campaign = base_campaign(&content);
    let mut pools = build_pools(
        &campaign,
        &content,
        &PassThroughProcurement,
        SkillLevel::Regular,
        campaign.year,
        &campaign.faction,
        &mut make_rng(),
    );
    let before = pools.len();
    let selection = select_contents(
        &mut pools,
        &[100.0, 100.0, 100.0],
        SkillLevel::Regular,
        &content.constants,
        &mut make_rng(),
    );
    assert_eq!(selection.draws, before);
    assert_eq!(selection.granted.len() + selection.declined.len(), before);
    assert!(pools.is_empty());
}

#[test]
fn test_zero_budget_skips_category() {
    let content = base_content();
    let campaign = base_campaign(&content);
    let mut pools = build_pools(
        &campaign,
        &content,
        &PassThroughProcurement,
        SkillLevel::Regular,
        campaign.year,
        &campaign.faction,
        &mut make_rng(),
    );
    let armor_before = pools.pool(SupplyCategory::Armor).len();
    let selection = select_contents(
        &mut pools,
        &[5.0, 0.0, 2.5],
        SkillLevel::Regular,
        &content.constants,
        &mut make_rng(),
    );
    assert_eq!(pools.pool(SupplyCategory::Armor).len(), armor_before);
    assert!(selection
        .granted
        .iter()
        .all(|part| part.kind.category() != SupplyCategory::Armor));
}

#[test]
fn test_declined_high_value_part_is_consumed_for_free() {
    let mut content = base_content();
    // No d6 face reaches 7: every high-value draw is declined.
    content.constants.scarcity_grant_roll = 7;
    let mut pool = pool_of(&content, "gauss_rifle", 2);
    pool.push(candidate(&content, "medium_laser"));

    let selection = select_category(
        &mut pool,
        100.0,
        SkillLevel::Regular,
        &content.constants,
        &mut make_rng(),
    );
    assert_eq!(selection.declined.len(), 2);
    assert_eq!(selection.granted.len(), 1);
    assert_eq!(selection.granted[0].name, "Medium Laser");
    assert!(pool.is_empty());
}

#[test]
fn test_granted_parts_carry_skill_quality() {
    let content = base_content();
    let mut pool = pool_of(&content, "medium_laser", 4);
    let selection = select_category(
        &mut pool,
        10.0,
        SkillLevel::Elite,
        &content.constants,
        &mut make_rng(),
    );
    assert!(selection
        .granted
        .iter()
        .all(|part| part.quality == PartQuality::E && part.brand_new));
}
