use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A batch of contract runs: one company per seed, each worked for `days`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub days: u64,
    /// Days between scheduled resupplies.
    #[serde(default = "Scenario::default_interval")]
    pub interval: u64,
    /// Drops per scheduled resupply.
    #[serde(default = "Scenario::default_drops")]
    pub drops: u32,
    pub seeds: SeedSpec,
    #[serde(default = "Scenario::default_content_dir")]
    pub content_dir: String,
    /// Start every seed from this campaign file instead of a generated company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    /// Replaces each contract's resupply scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resupply_scale: Option<f64>,
    /// Itineraries and smuggler offers above this many C-bills are declined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_limit: Option<i64>,
    #[serde(default)]
    pub overrides: HashMap<String, serde_json::Value>,
}

/// Seeds as an explicit list, an inclusive range, or a count from a start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedSpec {
    List(Vec<u64>),
    Range { range: [u64; 2] },
    Count { first: u64, count: u64 },
}

impl SeedSpec {
    pub fn expand(&self) -> Vec<u64> {
        match self {
            Self::List(seeds) => seeds.clone(),
            Self::Range { range: [low, high] } => (*low..=*high).collect(),
            Self::Count { first, count } => (*first..first.saturating_add(*count)).collect(),
        }
    }
}

impl Scenario {
    fn default_interval() -> u64 {
        30
    }

    fn default_drops() -> u32 {
        1
    }

    fn default_content_dir() -> String {
        "./content".to_string()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.name.is_empty(), "scenario 'name' must not be empty");
        ensure!(self.days > 0, "scenario 'days' must be > 0");
        ensure!(self.interval > 0, "scenario 'interval' must be > 0");
        if let Some(scale) = self.resupply_scale {
            ensure!(
                scale.is_finite() && scale >= 0.0,
                "scenario 'resupply_scale' must be a non-negative number, got {scale}"
            );
        }
        if let Some(limit) = self.spending_limit {
            ensure!(limit >= 0, "scenario 'spending_limit' must not be negative");
        }
        ensure!(
            !self.seeds.expand().is_empty(),
            "scenario '{}' expands to no seeds",
            self.name
        );
        Ok(())
    }

    /// The scenario as recorded alongside every run.
    pub fn params(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario file: {}", path.display()))?;
    Scenario::from_json(&json).with_context(|| format!("loading scenario: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_scenario_takes_monthly_defaults() {
        let scenario =
            Scenario::from_json(r#"{"name": "garrison", "days": 180, "seeds": [1, 2, 3]}"#)
                .unwrap();
        assert_eq!(scenario.interval, 30);
        assert_eq!(scenario.drops, 1);
        assert_eq!(scenario.seeds.expand(), vec![1, 2, 3]);
        assert_eq!(scenario.content_dir, "./content");
        assert!(scenario.campaign.is_none());
        assert!(scenario.spending_limit.is_none());
        assert!(scenario.overrides.is_empty());
    }

    #[test]
    fn test_seed_specs_expand() {
        let range: SeedSpec = serde_json::from_str(r#"{"range": [4, 7]}"#).unwrap();
        assert_eq!(range.expand(), vec![4, 5, 6, 7]);
        let count: SeedSpec = serde_json::from_str(r#"{"first": 100, "count": 3}"#).unwrap();
        assert_eq!(count.expand(), vec![100, 101, 102]);
        let empty: SeedSpec = serde_json::from_str(r#"{"first": 1, "count": 0}"#).unwrap();
        assert!(empty.expand().is_empty());
    }

    #[test]
    fn test_scale_and_limit_parse() {
        let scenario = Scenario::from_json(
            r#"{
            "name": "lean",
            "days": 60,
            "seeds": [42],
            "resupply_scale": 0.5,
            "spending_limit": 250000,
            "overrides": {"narrative_event_chance": 0}
        }"#,
        )
        .unwrap();
        assert!(scenario
            .resupply_scale
            .is_some_and(|scale| (scale - 0.5).abs() < 1e-9));
        assert_eq!(scenario.spending_limit, Some(250_000));
        assert_eq!(scenario.overrides.len(), 1);
    }

    #[test]
    fn test_params_record_the_schedule() {
        let scenario =
            Scenario::from_json(r#"{"name": "p", "days": 90, "interval": 15, "seeds": [1]}"#)
                .unwrap();
        let params = scenario.params();
        assert_eq!(params["interval"], 15);
        assert_eq!(params["days"], 90);
        assert!(params.get("campaign").is_none());
    }

    #[test]
    fn test_invalid_scenarios_are_rejected() {
        let cases = [
            (r#"{"name": "", "days": 100, "seeds": [1]}"#, "name"),
            (r#"{"name": "x", "days": 0, "seeds": [1]}"#, "days"),
            (r#"{"name": "x", "days": 9, "interval": 0, "seeds": [1]}"#, "interval"),
            (r#"{"name": "x", "days": 9, "resupply_scale": -1.0, "seeds": [1]}"#, "resupply_scale"),
            (r#"{"name": "x", "days": 9, "spending_limit": -5, "seeds": [1]}"#, "spending_limit"),
            (r#"{"name": "x", "days": 9, "seeds": []}"#, "no seeds"),
        ];
        for (json, needle) in cases {
            let err = Scenario::from_json(json).unwrap_err().to_string();
            assert!(err.contains(needle), "{json}: {err}");
        }
    }

    #[test]
    fn test_load_scenario_names_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        let err = format!("{:#}", load_scenario(&path).unwrap_err());
        assert!(err.contains("broken.json"));
    }
}
