//! Valuation of resupply contents.

use serde::{Deserialize, Serialize};

use crate::{
    FactionDef, FactionId, MoraleLevel, Money, Part, PartQuality, ResupplyMode, SupplyCategory,
};

/// Price multiplier per morale tier, indexed by `MoraleLevel`.
const MORALE_VALUE_MULTIPLIER: [f64; 7] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75];

pub fn morale_value_multiplier(morale: MoraleLevel) -> f64 {
    MORALE_VALUE_MULTIPLIER[morale.ordinal() as usize]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    pub base: Money,
    pub adjusted: Money,
}

pub fn base_value(contents: &[Part]) -> Money {
    contents.iter().map(|part| part.value).sum()
}

/// A house unit supplied by its own government pays nothing.
pub fn is_friendly_resupply(campaign_faction: &FactionId, employer: &FactionDef) -> bool {
    employer.id == *campaign_faction && !employer.mercenary && !employer.pirate
}

pub fn adjusted_value(base: Money, mode: ResupplyMode, morale: MoraleLevel, friendly: bool) -> Money {
    match mode {
        ResupplyMode::Loot => Money::ZERO,
        ResupplyMode::Smuggler => base.scaled(2.0),
        ResupplyMode::Normal | ResupplyMode::ContractEnd => {
            if friendly {
                Money::ZERO
            } else {
                base.scaled(morale_value_multiplier(morale))
            }
        }
    }
}

pub fn value_contents(
    contents: &[Part],
    mode: ResupplyMode,
    morale: MoraleLevel,
    friendly: bool,
) -> Valuation {
    let base = base_value(contents);
    Valuation {
        base,
        adjusted: adjusted_value(base, mode, morale, friendly),
    }
}

/// One line of an itemised manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestLine {
    pub name: String,
    pub category: SupplyCategory,
    pub quality: PartQuality,
    pub count: u32,
    pub value: Money,
}

/// Groups contents by name and quality, sorted by name. Works on a sorted
/// copy; `contents` keeps its order.
pub fn manifest(contents: &[Part]) -> Vec<ManifestLine> {
    let mut sorted: Vec<&Part> = contents.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name).then(a.quality.cmp(&b.quality)));

    let mut lines: Vec<ManifestLine> = Vec::new();
    for part in sorted {
        match lines.last_mut() {
            Some(line) if line.name == part.name && line.quality == part.quality => {
                line.count += 1;
                line.value += part.value;
            }
            _ => lines.push(ManifestLine {
                name: part.name.clone(),
                category: part.kind.category(),
                quality: part.quality,
                count: 1,
                value: part.value,
            }),
        }
    }
    lines
}
