use resupply_control::DayReport;
use resupply_core::{InterceptionOutcome, Money, ResupplyEvent, ResupplyOutcome};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub run_schema_version: u32,
    pub run_status: String,
    pub run_id: String,
    pub seed: u64,
    pub scenario_name: String,
    pub scenario_params: serde_json::Value,
    pub day_start: u64,
    pub day_end: u64,
    pub total_days: u64,
    pub wall_time_ms: u64,
    pub summary_metrics: SummaryMetrics,
    pub starved: bool,
    pub starved_reason: Option<String>,
    pub resupplies_path: String,
}

/// Per-seed totals folded from every day report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryMetrics {
    pub resupplies: u32,
    pub completed: u32,
    pub skipped: u32,
    pub aborted: u32,
    pub convoys_dispatched: u32,
    pub items_delivered: u64,
    pub interceptions_won: u32,
    pub interceptions_lost: u32,
    pub narrative_events: u32,
    pub swindles: u32,
    pub units_lost: u64,
    pub crew_captured: u64,
    pub crew_killed: u64,
    pub value_delivered: Money,
    pub funds_start: Money,
    pub funds_end: Money,
}

impl SummaryMetrics {
    pub fn record(&mut self, report: &DayReport) {
        self.resupplies += 1;
        match report.outcome {
            ResupplyOutcome::Completed { .. } => self.completed += 1,
            ResupplyOutcome::Skipped(_) => self.skipped += 1,
            ResupplyOutcome::Aborted(_) => self.aborted += 1,
        }
        for outcome in &report.interceptions {
            if *outcome == InterceptionOutcome::Delivered {
                self.interceptions_won += 1;
            } else {
                self.interceptions_lost += 1;
            }
        }
        for envelope in &report.events {
            match &envelope.event {
                ResupplyEvent::ConvoyDispatched { .. } => self.convoys_dispatched += 1,
                ResupplyEvent::Delivered { items, .. } => self.items_delivered += *items as u64,
                ResupplyEvent::NarrativeEvent { .. } => self.narrative_events += 1,
                ResupplyEvent::Swindled { .. } => self.swindles += 1,
                ResupplyEvent::ConvoyAbandoned {
                    units_lost,
                    captured,
                    killed,
                    ..
                } => {
                    self.units_lost += *units_lost as u64;
                    self.crew_captured += *captured as u64;
                    self.crew_killed += *killed as u64;
                }
                _ => {}
            }
        }
        if matches!(report.outcome, ResupplyOutcome::Completed { .. }) {
            self.value_delivered += report.valuation.base;
        }
    }

    pub fn funds_spent(&self) -> Money {
        self.funds_start - self.funds_end
    }
}

/// One CSV row per resupply.
#[derive(Debug, Serialize)]
pub struct ResupplyRow {
    pub day: u64,
    pub mode: String,
    pub outcome: String,
    pub items: usize,
    pub base_value: i64,
    pub adjusted_value: i64,
    pub interceptions: usize,
    pub funds: i64,
}

impl ResupplyRow {
    pub fn from_report(report: &DayReport, funds: Money) -> Self {
        let outcome = match &report.outcome {
            ResupplyOutcome::Completed { .. } => "completed".to_string(),
            ResupplyOutcome::Skipped(reason) => format!("skipped:{reason:?}"),
            ResupplyOutcome::Aborted(reason) => format!("aborted:{reason:?}"),
        };
        Self {
            day: report.day,
            mode: format!("{:?}", report.mode),
            outcome,
            items: report.items,
            base_value: report.valuation.base.0,
            adjusted_value: report.valuation.adjusted.0,
            interceptions: report.interceptions.len(),
            funds: funds.0,
        }
    }
}

/// Write JSON atomically: write to `.tmp` then rename.
pub fn write_json_atomic(path: &Path, value: &impl Serialize) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value)?;
    let mut file = std::fs::File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

impl RunResult {
    pub fn write_atomic(&self, path: &Path) -> anyhow::Result<()> {
        write_json_atomic(path, self)
    }
}

/// A seed starves when it asked for supplies and never received any.
pub fn detect_starvation(metrics: &SummaryMetrics) -> (bool, Option<String>) {
    if metrics.resupplies > 0 && metrics.completed == 0 {
        (true, Some("no resupply completed".to_string()))
    } else {
        (false, None)
    }
}
