use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use resupply_core::{Campaign, ResupplyContent};
use std::path::{Path, PathBuf};
use uuid::Uuid;

mod overrides;
mod run_result;
mod runner;
mod scenario;
mod summary;

use runner::SeedResult;
use scenario::Scenario;

#[derive(Parser)]
#[command(
    name = "resupply_bench",
    about = "Works a resupply scenario across many seeds and aggregates the outcomes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every seed of a scenario in parallel.
    Run {
        #[arg(long)]
        scenario: PathBuf,
        /// Batch directories are created under this one.
        #[arg(long, default_value = "runs")]
        output_dir: PathBuf,
    },
    /// Load and validate a scenario with its overrides, without running it.
    Check {
        #[arg(long)]
        scenario: PathBuf,
    },
}

/// Everything a seed needs that is shared across the batch.
struct Batch {
    scenario: Scenario,
    content: ResupplyContent,
    base_campaign: Option<Campaign>,
    params: serde_json::Value,
}

impl Batch {
    fn load(scenario_path: &Path) -> Result<Self> {
        let scenario = scenario::load_scenario(scenario_path)?;
        let mut content = resupply_world::load_content(&scenario.content_dir)?;
        overrides::apply_overrides(&mut content, &scenario.overrides)
            .with_context(|| format!("applying overrides for '{}'", scenario.name))?;
        resupply_world::validate_content(&content);
        let base_campaign = scenario
            .campaign
            .as_deref()
            .map(resupply_world::load_campaign)
            .transpose()?;
        let params = scenario.params();
        Ok(Self {
            scenario,
            content,
            base_campaign,
            params,
        })
    }

    fn describe(&self) {
        let seeds = self.scenario.seeds.expand();
        println!(
            "Scenario '{}': {} seeds, {} days, resupply every {} days ({} drop(s)), content {}",
            self.scenario.name,
            seeds.len(),
            self.scenario.days,
            self.scenario.interval,
            self.scenario.drops,
            self.content.content_version,
        );
        match &self.base_campaign {
            Some(campaign) => println!("Starting campaign: '{}'", campaign.name),
            None => println!("Starting campaign: generated per seed"),
        }
        if !self.scenario.overrides.is_empty() {
            let mut keys: Vec<&String> = self.scenario.overrides.keys().collect();
            keys.sort();
            println!("Overrides: {keys:?}");
        }
    }

    fn run_all(&self, run_dir: &Path) -> Vec<SeedResult> {
        let outcomes: Vec<(u64, Result<SeedResult>)> = self
            .scenario
            .seeds
            .expand()
            .into_par_iter()
            .map(|seed| {
                let result = runner::run_seed(
                    &self.content,
                    &self.scenario,
                    seed,
                    &run_dir.join(format!("seed_{seed}")),
                    &self.params,
                    self.base_campaign.as_ref(),
                );
                (seed, result)
            })
            .collect();

        outcomes
            .into_iter()
            .filter_map(|(seed, result)| match result {
                Ok(seed_result) => Some(seed_result),
                Err(err) => {
                    eprintln!("Seed {seed} failed: {err:#}");
                    None
                }
            })
            .collect()
    }
}

fn write_reports(batch: &Batch, run_dir: &Path, results: &[SeedResult]) -> Result<()> {
    let per_seed: Vec<(u64, &run_result::SummaryMetrics)> =
        results.iter().map(|r| (r.seed, &r.metrics)).collect();
    let stats = summary::compute_summary(&per_seed);
    summary::print_summary(&batch.scenario.name, batch.scenario.days, &stats);

    let summary_path = run_dir.join("summary.json");
    let summary_json = serde_json::to_string_pretty(&stats).context("serializing summary")?;
    std::fs::write(&summary_path, summary_json)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    let batch_summary = serde_json::json!({
        "batch_schema_version": 1,
        "batch_id": Uuid::new_v4().to_string(),
        "scenario_name": batch.scenario.name,
        "scenario_params": batch.params,
        "content_version": batch.content.content_version,
        "seed_count": results.len(),
        "run_ids": results.iter().map(|r| r.run_id.as_str()).collect::<Vec<_>>(),
        "starved_count": stats.starved_count,
        "aggregated_metrics": summary::build_aggregated_metrics(&stats),
    });
    let batch_path = run_dir.join("batch_summary.json");
    run_result::write_json_atomic(&batch_path, &batch_summary)
        .with_context(|| format!("writing {}", batch_path.display()))?;

    println!("Summary written to {}", summary_path.display());
    println!("Batch summary written to {}", batch_path.display());
    Ok(())
}

fn run(scenario_path: &Path, output_dir: &Path) -> Result<()> {
    let batch = Batch::load(scenario_path)?;
    batch.describe();

    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_dir = output_dir.join(format!("{}_{stamp}", batch.scenario.name));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating output directory: {}", run_dir.display()))?;
    std::fs::copy(scenario_path, run_dir.join("scenario.json")).context("copying scenario file")?;
    println!("Output: {}", run_dir.display());

    let results = batch.run_all(&run_dir);
    if results.is_empty() {
        bail!("every seed of '{}' failed", batch.scenario.name);
    }
    write_reports(&batch, &run_dir, &results)
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Run {
            scenario,
            output_dir,
        } => run(&scenario, &output_dir),
        Commands::Check { scenario } => {
            Batch::load(&scenario)?.describe();
            println!("Scenario OK.");
            Ok(())
        }
    }
}
