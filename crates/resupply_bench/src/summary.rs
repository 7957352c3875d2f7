use crate::run_result::{detect_starvation, SummaryMetrics};
use serde::Serialize;

type Extractor = (&'static str, Box<dyn Fn(&SummaryMetrics) -> f64>);

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub seed_count: usize,
    pub starved_count: usize,
    pub metrics: Vec<MetricSummary>,
}

#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

fn extractors() -> Vec<Extractor> {
    vec![
        ("resupplies", Box::new(|m| f64::from(m.resupplies))),
        (
            "completion_rate",
            Box::new(|m| ratio(m.completed, m.resupplies)),
        ),
        ("skipped", Box::new(|m| f64::from(m.skipped))),
        ("aborted", Box::new(|m| f64::from(m.aborted))),
        (
            "convoys_dispatched",
            Box::new(|m| f64::from(m.convoys_dispatched)),
        ),
        ("items_delivered", Box::new(|m| m.items_delivered as f64)),
        (
            "interception_win_rate",
            Box::new(|m| {
                ratio(
                    m.interceptions_won,
                    m.interceptions_won + m.interceptions_lost,
                )
            }),
        ),
        (
            "interceptions_lost",
            Box::new(|m| f64::from(m.interceptions_lost)),
        ),
        (
            "narrative_events",
            Box::new(|m| f64::from(m.narrative_events)),
        ),
        ("swindles", Box::new(|m| f64::from(m.swindles))),
        ("units_lost", Box::new(|m| m.units_lost as f64)),
        ("crew_captured", Box::new(|m| m.crew_captured as f64)),
        ("crew_killed", Box::new(|m| m.crew_killed as f64)),
        ("value_delivered", Box::new(|m| m.value_delivered.0 as f64)),
        ("funds_spent", Box::new(|m| m.funds_spent().0 as f64)),
        ("funds_end", Box::new(|m| m.funds_end.0 as f64)),
    ]
}

pub fn compute_summary(runs: &[(u64, &SummaryMetrics)]) -> SummaryStats {
    let starved_count = runs
        .iter()
        .filter(|(_, metrics)| detect_starvation(metrics).0)
        .count();

    let metrics = extractors()
        .iter()
        .map(|(name, extract)| {
            let values: Vec<f64> = runs.iter().map(|(_, m)| extract(m)).collect();
            compute_metric_summary(name, &values)
        })
        .collect();

    SummaryStats {
        seed_count: runs.len(),
        starved_count,
        metrics,
    }
}

fn compute_metric_summary(name: &str, values: &[f64]) -> MetricSummary {
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let stddev = variance.sqrt();

    MetricSummary {
        name: name.to_string(),
        mean,
        min,
        max,
        stddev,
    }
}

/// `{ "metric": { "mean": ..., "min": ..., "max": ..., "stddev": ... }, ... }`
pub fn build_aggregated_metrics(stats: &SummaryStats) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for metric in &stats.metrics {
        map.insert(
            metric.name.clone(),
            serde_json::json!({
                "mean": metric.mean,
                "min": metric.min,
                "max": metric.max,
                "stddev": metric.stddev,
            }),
        );
    }
    serde_json::Value::Object(map)
}

pub fn print_summary(scenario_name: &str, days: u64, stats: &SummaryStats) {
    println!(
        "\n=== {} ({} seeds, {} days each) ===\n",
        scenario_name, stats.seed_count, days
    );
    println!(
        "{:<24} {:>14} {:>14} {:>14} {:>14}",
        "Metric", "Mean", "Min", "Max", "StdDev"
    );
    println!("{}", "-".repeat(84));
    for metric in &stats.metrics {
        println!(
            "{:<24} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            metric.name, metric.mean, metric.min, metric.max, metric.stddev
        );
    }
    println!(
        "{:<24} {}/{}",
        "starvation_rate", stats.starved_count, stats.seed_count
    );
}
