//! Currency amounts.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Whole C-bills. Additive, comparable and scalable; nothing more is needed
/// by the resupply pipeline.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Self = Self(0);

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiply by a factor, rounding to the nearest whole C-bill.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn scaled(self, factor: f64) -> Self {
        assert!(factor.is_finite(), "money scale factor must be finite");
        Self((self.0 as f64 * factor).round() as i64)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} C-bills", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_rounds_to_nearest() {
        assert_eq!(Money(1_000).scaled(0.25), Money(250));
        assert_eq!(Money(3).scaled(0.5), Money(2));
        assert_eq!(Money(10).scaled(0.0), Money::ZERO);
    }

    #[test]
    fn sums_and_orders() {
        let total: Money = [Money(5), Money(7), Money(11)].iter().sum();
        assert_eq!(total, Money(23));
        assert!(Money(1) < Money(2));
        assert_eq!(Money(9) - Money(4), Money(5));
    }
}
