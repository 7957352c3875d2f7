//! Content selection under per-category mass budgets.

use rand::Rng;
use tracing::debug;

use crate::dice::d6;
use crate::pool::CandidatePools;
use crate::{
    CandidateItem, Constants, FocusAllocation, Part, PartQuality, Payload, SkillLevel,
    SupplyCategory,
};

/// Delivered quality per negotiation tier, indexed by `SkillLevel`.
const QUALITY_BY_SKILL: [PartQuality; 8] = [
    PartQuality::A,
    PartQuality::B,
    PartQuality::C,
    PartQuality::C,
    PartQuality::D,
    PartQuality::E,
    PartQuality::F,
    PartQuality::F,
];

pub fn quality_for_skill(skill: SkillLevel) -> PartQuality {
    QUALITY_BY_SKILL[skill.ordinal() as usize]
}

/// Mass budget per category, indexed by `SupplyCategory`.
pub fn category_budgets(target_mass: u32, focus: &FocusAllocation) -> [f64; 3] {
    focus.assert_valid();
    SupplyCategory::ALL.map(|category| f64::from(target_mass) * focus.fraction(category))
}

/// Parts granted and declined by one or more selection loops.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub granted: Vec<Part>,
    /// High-value parts that lost the scarcity roll.
    pub declined: Vec<Part>,
    pub draws: usize,
}

impl Selection {
    fn absorb(&mut self, other: Self) {
        self.granted.extend(other.granted);
        self.declined.extend(other.declined);
        self.draws += other.draws;
    }
}

/// Draws one entry uniformly and removes it from the pool. `None` once the
/// pool is exhausted.
fn draw(pool: &mut Vec<CandidateItem>, rng: &mut impl Rng) -> Option<CandidateItem> {
    if pool.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..pool.len());
    Some(pool.swap_remove(index))
}

/// Runs the selection loop for one category.
///
/// Every draw leaves the pool, granted or not. High-value entries are only
/// granted on a favorable d6; declined entries cost no budget.
pub fn select_category(
    pool: &mut Vec<CandidateItem>,
    budget: f64,
    skill: SkillLevel,
    constants: &Constants,
    rng: &mut impl Rng,
) -> Selection {
    let mut selection = Selection::default();
    let mut remaining = budget;
    let quality = quality_for_skill(skill);

    while remaining > 0.0 {
        let Some(candidate) = draw(pool, rng) else {
            break;
        };
        selection.draws += 1;

        let mut part = candidate.part;
        part.quality = quality;

        if part.value > constants.high_value_threshold {
            let roll = d6(rng);
            if roll < constants.scarcity_grant_roll {
                debug!(part = %part.name, value = %part.value, roll, "high-value part declined");
                selection.declined.push(part);
                continue;
            }
        }

        let mass = part.mass_equivalent(constants.batch_size);
        assert!(
            mass.is_finite() && mass >= 0.0,
            "part '{}' has invalid mass {mass}",
            part.def_id,
        );
        remaining -= mass;
        selection.granted.push(part);
    }
    selection
}

/// Runs the selection loop over all three pools of one drop.
pub fn select_contents(
    pools: &mut CandidatePools,
    budgets: &[f64; 3],
    skill: SkillLevel,
    constants: &Constants,
    rng: &mut impl Rng,
) -> Selection {
    let mut selection = Selection::default();
    for category in SupplyCategory::ALL {
        let budget = budgets[category.index()];
        if budget <= 0.0 {
            continue;
        }
        let drawn = select_category(pools.pool_mut(category), budget, skill, constants, rng);
        debug!(
            ?category,
            budget,
            granted = drawn.granted.len(),
            declined = drawn.declined.len(),
            "category selected"
        );
        selection.absorb(drawn);
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budgets_split_by_focus() {
        let budgets = category_budgets(10, &FocusAllocation::default());
        assert!((budgets[SupplyCategory::General.index()] - 5.0).abs() < 1e-9);
        assert!((budgets[SupplyCategory::Armor.index()] - 2.5).abs() < 1e-9);
        assert!((budgets[SupplyCategory::Ammo.index()] - 2.5).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "must be non-negative")]
    fn negative_focus_panics() {
        let focus = FocusAllocation {
            general: -0.1,
            armor: 0.5,
            ammo: 0.5,
        };
        category_budgets(10, &focus);
    }

    #[test]
    fn quality_improves_with_skill() {
        assert_eq!(quality_for_skill(SkillLevel::None), PartQuality::A);
        assert_eq!(quality_for_skill(SkillLevel::Regular), PartQuality::C);
        assert_eq!(quality_for_skill(SkillLevel::Legendary), PartQuality::F);
        let mut previous = PartQuality::A;
        for skill in [
            SkillLevel::UltraGreen,
            SkillLevel::Green,
            SkillLevel::Regular,
            SkillLevel::Veteran,
            SkillLevel::Elite,
            SkillLevel::Heroic,
        ] {
            let quality = quality_for_skill(skill);
            assert!(quality >= previous);
            previous = quality;
        }
    }
}
