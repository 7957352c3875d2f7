use anyhow::{bail, Result};
use resupply_core::{Money, ResupplyContent};
use std::collections::HashMap;

const VALID_KEYS: &[&str] = &[
    "missing_part_weight",
    "present_part_weight",
    "high_value_threshold",
    "scarcity_grant_roll",
    "batch_size",
    "interception_base_mass",
    "interception_mass_step",
    "narrative_event_chance",
    "npc_convoy_mass_multiplier",
    "capture_threshold",
    "cache_decay_percent_per_year",
    "cache_target_mass",
];

/// Applies scenario overrides to the loaded content. Keys name `Constants`
/// fields; `cache_`-prefixed keys reach into the cache tables.
pub fn apply_overrides(
    content: &mut ResupplyContent,
    overrides: &HashMap<String, serde_json::Value>,
) -> Result<()> {
    let constants = &mut content.constants;
    for (key, value) in overrides {
        match key.as_str() {
            "missing_part_weight" => constants.missing_part_weight = as_f64(key, value)?,
            "present_part_weight" => constants.present_part_weight = as_f64(key, value)?,
            "high_value_threshold" => constants.high_value_threshold = Money(as_i64(key, value)?),
            "scarcity_grant_roll" => constants.scarcity_grant_roll = as_u32(key, value)?,
            "batch_size" => constants.batch_size = as_u32(key, value)?,
            "interception_base_mass" => constants.interception_base_mass = as_f64(key, value)?,
            "interception_mass_step" => constants.interception_mass_step = as_f64(key, value)?,
            "narrative_event_chance" => {
                let chance = as_u32(key, value)?;
                if chance > 10 {
                    bail!("override '{key}': chance is out of 10, got {chance}");
                }
                constants.narrative_event_chance = chance;
            }
            "npc_convoy_mass_multiplier" => {
                constants.npc_convoy_mass_multiplier = as_f64(key, value)?;
            }
            "capture_threshold" => constants.capture_threshold = as_u32(key, value)?,
            "cache_decay_percent_per_year" => {
                content.cache.decay_percent_per_year = as_f64(key, value)?;
            }
            "cache_target_mass" => content.cache.target_mass = as_u32(key, value)?,
            _ => bail!(
                "unknown override key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        }
    }
    Ok(())
}

fn as_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| anyhow::anyhow!("override '{key}': expected a non-negative number, got {value}"))
}

fn as_i64(key: &str, value: &serde_json::Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("override '{key}': expected an integer, got {value}"))
}

fn as_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    let val = value.as_u64().ok_or_else(|| {
        anyhow::anyhow!("override '{key}': expected a positive integer, got {value}")
    })?;
    u32::try_from(val)
        .map_err(|_| anyhow::anyhow!("override '{key}': value {val} exceeds u32 range"))
}
