//! Convoy capacity and cargo assignment.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collaborators::ForceQuery;
use crate::{ForceId, Part, Payload, Unit};

/// A unit can haul cargo when intact, crewed, and not committed elsewhere.
pub fn unit_can_haul(unit: &Unit) -> bool {
    !unit.damaged && unit.is_fully_crewed() && unit.is_available() && !unit.salvage
}

/// Mass ceiling per carrying force.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvoyCapacity(BTreeMap<ForceId, f64>);

impl ConvoyCapacity {
    pub fn from_forces(query: &impl ForceQuery) -> Self {
        Self::from_entries(query.carrying_forces())
    }

    /// Forces without positive capacity are left out.
    pub fn from_entries(entries: impl IntoIterator<Item = (ForceId, f64)>) -> Self {
        Self(
            entries
                .into_iter()
                .filter(|(_, capacity)| *capacity > 0.0)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn get(&self, force: &ForceId) -> Option<f64> {
        self.0.get(force).copied()
    }

    /// Largest first; equal capacities fall back to force id order.
    pub fn by_capacity_desc(&self) -> Vec<(ForceId, f64)> {
        let mut forces: Vec<(ForceId, f64)> =
            self.0.iter().map(|(id, cap)| (id.clone(), *cap)).collect();
        forces.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        forces
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvoyLoad {
    pub force: ForceId,
    pub capacity: f64,
    pub contents: Vec<Part>,
}

impl ConvoyLoad {
    pub fn mass_equivalent(&self, batch_size: u32) -> f64 {
        cargo_mass(&self.contents, batch_size)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvoyPlan {
    pub loads: Vec<ConvoyLoad>,
    /// Contents no convoy had room for this cycle.
    pub undeliverable: Vec<Part>,
}

pub fn cargo_mass(contents: &[Part], batch_size: u32) -> f64 {
    contents
        .iter()
        .map(|part| part.mass_equivalent(batch_size))
        .sum()
}

/// Spreads contents over carrying forces, biggest force first.
///
/// Contents are shuffled, then each force takes every remaining item that
/// still fits under its ceiling. Forces that end up empty are not listed.
pub fn assign_contents(
    contents: &[Part],
    capacity: &ConvoyCapacity,
    batch_size: u32,
    rng: &mut impl Rng,
) -> ConvoyPlan {
    let mut remaining: Vec<Part> = contents.to_vec();
    remaining.shuffle(rng);

    let mut loads = Vec::new();
    for (force, ceiling) in capacity.by_capacity_desc() {
        if remaining.is_empty() {
            break;
        }
        let mut loaded = 0.0;
        let mut taken = Vec::new();
        let mut left = Vec::with_capacity(remaining.len());
        for part in remaining {
            let mass = part.mass_equivalent(batch_size);
            if loaded + mass <= ceiling {
                loaded += mass;
                taken.push(part);
            } else {
                left.push(part);
            }
        }
        remaining = left;
        debug!(force = %force, items = taken.len(), loaded, ceiling, "convoy loaded");
        if !taken.is_empty() {
            loads.push(ConvoyLoad {
                force,
                capacity: ceiling,
                contents: taken,
            });
        }
    }

    ConvoyPlan {
        loads,
        undeliverable: remaining,
    }
}
