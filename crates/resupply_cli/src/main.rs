use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use resupply_control::{DayReport, ResupplyScheduler};
use resupply_core::{
    claim_cache, generate_cache, manifest, Campaign, EventEnvelope, InterceptionOutcome, Money,
    ResupplyContent, ResupplyEvent, ResupplyOutcome,
};
use resupply_world::{
    build_initial_campaign, load_campaign, load_content, save_campaign, ContentEncounterSystem,
    TemplateUnitGenerator,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "resupply_cli", about = "Mercenary resupply logistics CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance a campaign day by day, resupplying on a fixed interval.
    Run {
        #[arg(long)]
        days: u64,
        /// Seeds the RNG, and the generated company when no --campaign is given.
        #[arg(long)]
        seed: Option<u64>,
        /// Load the campaign from a JSON file instead of generating one.
        #[arg(long)]
        campaign: Option<String>,
        #[arg(long, default_value = "./content")]
        content_dir: String,
        /// Days between resupplies.
        #[arg(long, default_value_t = 30)]
        interval: u64,
        #[arg(long, default_value_t = 1)]
        drops: u32,
        /// Decline itineraries priced above this many C-bills.
        #[arg(long)]
        spending_limit: Option<i64>,
        /// Write the final campaign here.
        #[arg(long)]
        save: Option<String>,
        /// Write a JSON run summary here.
        #[arg(long)]
        summary: Option<String>,
    },
    /// Roll up one abandoned Star League cache.
    Cache {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 3025)]
        year: u32,
        #[arg(long, default_value = "./content")]
        content_dir: String,
        /// Claim the cache into this campaign file, rewriting it in place.
        #[arg(long)]
        claim: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    seed: u64,
    days: u64,
    resupplies: u32,
    completed: u32,
    skipped: u32,
    aborted: u32,
    interceptions_won: u32,
    interceptions_lost: u32,
    starting_funds: Money,
    final_funds: Money,
}

struct RunOptions {
    days: u64,
    interval: u64,
    drops: u32,
    spending_limit: Option<Money>,
}

fn print_notable(events: &[EventEnvelope]) {
    for envelope in events {
        match &envelope.event {
            ResupplyEvent::Intercepted { convoy, scenario } => {
                println!("*** {convoy} INTERCEPTED: scenario {scenario} ***");
            }
            ResupplyEvent::ConvoyAbandoned {
                convoy,
                units_lost,
                captured,
                killed,
            } => println!(
                "*** {convoy} ABANDONED: {units_lost} units lost, {captured} captured, {killed} killed ***"
            ),
            ResupplyEvent::Swindled { lost_value } => {
                println!("*** SWINDLED by smugglers: {lost_value} lost ***");
            }
            ResupplyEvent::NarrativeEvent { convoy, kind } => {
                println!("    {convoy}: {kind:?}");
            }
            _ => {}
        }
    }
}

fn record(report: &DayReport, summary: &mut RunSummary) {
    summary.resupplies += 1;
    let mode = report.mode;
    match &report.outcome {
        ResupplyOutcome::Completed { convoys, .. } => {
            summary.completed += 1;
            println!(
                "[day={:03}] {mode:?} resupply: {} items in {} convoys, {} (base {})",
                report.day,
                report.items,
                convoys.len(),
                report.valuation.adjusted,
                report.valuation.base,
            );
        }
        ResupplyOutcome::Skipped(reason) => {
            summary.skipped += 1;
            println!("[day={:03}] {mode:?} resupply skipped: {reason:?}", report.day);
        }
        ResupplyOutcome::Aborted(reason) => {
            summary.aborted += 1;
            println!("[day={:03}] {mode:?} resupply aborted: {reason:?}", report.day);
        }
    }
    for outcome in &report.interceptions {
        if *outcome == InterceptionOutcome::Delivered {
            summary.interceptions_won += 1;
        } else {
            summary.interceptions_lost += 1;
        }
    }
    print_notable(&report.events);
}

fn print_status(campaign: &Campaign) {
    println!(
        "[day={:03}]  funds={}  units={}  personnel={}  inventory_lines={}",
        campaign.day,
        campaign.funds,
        campaign.units.len(),
        campaign.personnel.len(),
        campaign.inventory.len(),
    );
}

fn run(
    mut campaign: Campaign,
    content: &ResupplyContent,
    seed: u64,
    options: &RunOptions,
) -> Result<(Campaign, RunSummary)> {
    if options.interval == 0 {
        bail!("--interval must be at least 1");
    }
    let Some(contract) = campaign.contracts.first() else {
        bail!("campaign '{}' holds no contract", campaign.name);
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut summary = RunSummary {
        seed,
        days: options.days,
        starting_funds: campaign.funds,
        ..RunSummary::default()
    };

    println!(
        "Starting campaign '{}': contract={} ({:?}) days={} seed={seed} content_version={}",
        campaign.name,
        contract.name,
        contract.contract_type,
        options.days,
        content.content_version,
    );
    println!("{}", "-".repeat(80));

    let mut scheduler = ResupplyScheduler::new(options.interval, options.drops);
    scheduler.decisions.spending_limit = options.spending_limit;
    info!(
        interval = options.interval,
        drops = options.drops,
        limit = ?options.spending_limit,
        "scheduler configured"
    );
    let mut encounters = ContentEncounterSystem::new(&content.constants);
    for _ in 0..options.days {
        let reports = scheduler.advance_day(&mut campaign, content, &mut encounters, &mut rng);
        for report in &reports {
            record(report, &mut summary);
        }
        if !reports.is_empty() {
            print_status(&campaign);
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final state on day {}:", campaign.day);
    print_status(&campaign);
    summary.final_funds = campaign.funds;
    Ok((campaign, summary))
}

fn write_summary(path: &str, summary: &RunSummary) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    serde_json::to_writer_pretty(file, summary).with_context(|| format!("writing {path}"))
}

fn cache(seed: u64, year: u32, content: &ResupplyContent, claim: Option<String>) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut generator = TemplateUnitGenerator::new(content);
    let Some(found) = generate_cache(content, year, &mut generator, &mut rng) else {
        bail!("content has no cache tables");
    };

    println!(
        "Cache {} ({}): {} intact units, {} stripped for parts, worth {}",
        found.id,
        found.faction,
        found.intact_units.len(),
        found.donor_units.len(),
        found.value,
    );
    for unit in &found.intact_units {
        println!("  unit  {} ({:?}, {} t)", unit.name, unit.weight_class, unit.mass);
    }
    for line in manifest(&found.parts) {
        println!(
            "  part  {:>3} x {} [{:?}] {}",
            line.count, line.name, line.quality, line.value
        );
    }

    if let Some(path) = claim {
        let mut campaign = load_campaign(&path)?;
        let cache_id = found.id;
        let units = claim_cache(&mut campaign, found, content.constants.batch_size)
            .with_context(|| format!("claiming cache into {path}"))?;
        save_campaign(&path, &campaign)?;
        info!(cache = %cache_id, units, path = %path, "cache claimed");
        println!("Claimed {units} units into {path}.");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            days,
            seed,
            campaign,
            content_dir,
            interval,
            drops,
            spending_limit,
            save,
            summary,
        } => {
            let content = load_content(&content_dir)?;
            let seed = seed.unwrap_or_else(rand::random);
            let initial = match campaign {
                Some(path) => load_campaign(&path)?,
                None => {
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    build_initial_campaign(&content, seed, &mut rng)
                }
            };
            let options = RunOptions {
                days,
                interval,
                drops,
                spending_limit: spending_limit.map(Money),
            };
            let (final_campaign, run_summary) = run(initial, &content, seed, &options)?;
            if let Some(path) = save {
                save_campaign(&path, &final_campaign)?;
                println!("Campaign written to {path}.");
            }
            if let Some(path) = summary {
                write_summary(&path, &run_summary)?;
            }
        }
        Commands::Cache {
            seed,
            year,
            content_dir,
            claim,
        } => {
            let content = load_content(&content_dir)?;
            cache(seed.unwrap_or_else(rand::random), year, &content, claim)?;
        }
    }
    Ok(())
}
