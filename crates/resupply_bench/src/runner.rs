use crate::run_result::{self, ResupplyRow, RunResult, SummaryMetrics};
use crate::scenario::Scenario;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use resupply_control::ResupplyScheduler;
use resupply_core::{Campaign, Money, ResupplyContent};
use resupply_world::ContentEncounterSystem;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

pub struct SeedResult {
    pub seed: u64,
    pub metrics: SummaryMetrics,
    #[allow(dead_code)]
    pub wall_time_ms: u64,
    pub run_id: String,
}

pub fn run_seed(
    content: &ResupplyContent,
    scenario: &Scenario,
    seed: u64,
    seed_dir: &Path,
    scenario_params: &serde_json::Value,
    base_campaign: Option<&Campaign>,
) -> Result<SeedResult> {
    let run_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut campaign = match base_campaign {
        Some(campaign) => campaign.clone(),
        None => resupply_world::build_initial_campaign(content, seed, &mut rng),
    };
    if let Some(scale) = scenario.resupply_scale {
        for contract in &mut campaign.contracts {
            contract.resupply_scale = scale;
        }
    }

    std::fs::create_dir_all(seed_dir)
        .with_context(|| format!("creating seed directory: {}", seed_dir.display()))?;
    let resupplies_path = seed_dir.join("resupplies.csv");
    let mut writer = csv::Writer::from_path(&resupplies_path)
        .with_context(|| format!("opening {}", resupplies_path.display()))?;

    let mut scheduler = ResupplyScheduler::new(scenario.interval, scenario.drops);
    scheduler.decisions.spending_limit = scenario.spending_limit.map(Money);
    let mut encounters = ContentEncounterSystem::new(&content.constants);
    let mut metrics = SummaryMetrics {
        funds_start: campaign.funds,
        ..SummaryMetrics::default()
    };
    let day_start = campaign.day;

    for _ in 0..scenario.days {
        let reports = scheduler.advance_day(&mut campaign, content, &mut encounters, &mut rng);
        for report in &reports {
            metrics.record(report);
            writer
                .serialize(ResupplyRow::from_report(report, campaign.funds))
                .context("writing resupply row")?;
        }
    }
    writer.flush().context("flushing resupplies")?;
    metrics.funds_end = campaign.funds;

    #[allow(clippy::cast_possible_truncation)]
    let wall_time_ms = start.elapsed().as_millis() as u64;
    let (starved, starved_reason) = run_result::detect_starvation(&metrics);

    let run_result = RunResult {
        run_schema_version: 1,
        run_status: "completed".to_string(),
        run_id: run_id.clone(),
        seed,
        scenario_name: scenario.name.clone(),
        scenario_params: scenario_params.clone(),
        day_start,
        day_end: campaign.day,
        total_days: scenario.days,
        wall_time_ms,
        summary_metrics: metrics.clone(),
        starved,
        starved_reason,
        resupplies_path: "resupplies.csv".to_string(),
    };
    run_result
        .write_atomic(&seed_dir.join("run_result.json"))
        .context("writing run_result.json")?;

    Ok(SeedResult {
        seed,
        metrics,
        wall_time_ms,
        run_id,
    })
}
