//! # Money Module
//!
//! Provides the `Money` type for rounded document totals and the
//! `RoundingPolicy` that produces it.
//!
//! ## Where Rounding Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FULL PRECISION                         ROUNDED (exactly once)          │
//! │                                                                         │
//! │  line 1: TAXABLE = 2352000.0 ──┐                                        │
//! │  line 2: TAXABLE =     33.335 ─┼──► Σ = 2352033.335 ──► 235203334 minor │
//! │  line 3: TAXABLE =     10.005 ─┘                                        │
//! │                                                                         │
//! │  Rounding each line first would drift by up to half a minor unit per   │
//! │  line; rounding the sum drifts by at most half a minor unit in total.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use folio_core::money::{Money, RoundingPolicy};
//!
//! let policy = RoundingPolicy::default(); // 2 decimals, half up
//! let total = policy.round(1234.125);
//! assert_eq!(total.minor_units(), 123413);
//! assert_eq!(total.format(2), "1234.13");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise, cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: round-off adjustments can be negative
/// - **No precision inside**: the number of decimals belongs to the
///   `RoundingPolicy` that produced the value
/// - Only the aggregator creates `Money`; per-line values stay `f64`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Rounds to whole major units (rupees, dollars).
    ///
    /// ## Example
    /// ```rust
    /// use folio_core::money::{Money, RoundingMode};
    ///
    /// let total = Money::from_minor(123450); // 1234.50
    /// assert_eq!(total.round_to_whole(2, RoundingMode::HalfUp).minor_units(), 123500);
    /// assert_eq!(total.round_to_whole(2, RoundingMode::HalfEven).minor_units(), 123400);
    /// ```
    pub fn round_to_whole(&self, decimals: u32, mode: RoundingMode) -> Money {
        // i128 keeps the intermediate product safe for large totals
        let unit = scale(decimals) as i128;
        let magnitude = (self.0 as i128).abs();
        let quotient = magnitude / unit;
        let remainder = magnitude % unit;

        let rounded = match (2 * remainder).cmp(&unit) {
            std::cmp::Ordering::Less => quotient,
            std::cmp::Ordering::Greater => quotient + 1,
            std::cmp::Ordering::Equal => match mode {
                RoundingMode::HalfUp => quotient + 1,
                RoundingMode::HalfEven => quotient + (quotient % 2),
            },
        };

        let signed = if self.0 < 0 { -rounded } else { rounded };
        Money((signed * unit) as i64)
    }

    /// Formats with a fixed number of decimals, e.g. `"2775360.00"`.
    pub fn format(&self, decimals: u32) -> String {
        let unit = scale(decimals);
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = (self.0 / unit).abs();
        if decimals == 0 {
            return format!("{}{}", sign, whole);
        }
        let frac = (self.0 % unit).abs();
        format!(
            "{}{}.{:0width$}",
            sign,
            whole,
            frac,
            width = decimals as usize
        )
    }
}

fn scale(decimals: u32) -> i64 {
    10_i64.pow(decimals)
}

/// Debug display in minor units; use `format` for user-facing output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minor", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Rounding Policy
// =============================================================================

/// How a value exactly halfway between two minor units is rounded.
///
/// ```text
/// value   HalfUp   HalfEven
/// 0.5  →  1        0
/// 1.5  →  2        2
/// 2.5  →  3        2
/// -2.5 → -3       -2
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Half away from zero on the binary value, like the ERP screens'
    /// `toFixed`.
    #[default]
    HalfUp,
    /// Bankers rounding: half to the nearest even digit.
    HalfEven,
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::HalfUp => write!(f, "half_up"),
            RoundingMode::HalfEven => write!(f, "half_even"),
        }
    }
}

impl std::str::FromStr for RoundingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "half_up" | "commercial" => Ok(RoundingMode::HalfUp),
            "half_even" | "bankers" => Ok(RoundingMode::HalfEven),
            other => Err(ValidationError::InvalidFormat {
                field: "rounding".to_string(),
                reason: format!("unknown mode '{}', expected half_up or half_even", other),
            }),
        }
    }
}

/// The document's currency precision and rounding rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundingPolicy {
    /// Number of minor-unit decimals (2 for INR/USD, 0 for JPY).
    pub decimals: u32,

    /// Tie-breaking rule.
    #[serde(default)]
    pub mode: RoundingMode,

    /// Round the grand total to whole units and record the round-off.
    #[serde(default)]
    pub round_off: bool,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        RoundingPolicy {
            decimals: 2,
            mode: RoundingMode::HalfUp,
            round_off: false,
        }
    }
}

impl RoundingPolicy {
    /// Rounds a full-precision amount (major units) to `Money`.
    ///
    /// Ties are broken on the binary `f64`, not on its decimal spelling.
    /// `1.005` is stored as `1.00499999999999989...` and rounds to `1.00`
    /// in either mode; exact binary ties such as `0.125` follow `mode`.
    pub fn round(&self, value: f64) -> Money {
        let scaled = value * scale(self.decimals) as f64;
        let rounded = match self.mode {
            RoundingMode::HalfUp => scaled.round(),
            RoundingMode::HalfEven => scaled.round_ties_even(),
        };
        Money(rounded as i64)
    }

    /// Size of one minor unit in major units (0.01 for 2 decimals).
    pub fn minor_unit(&self) -> f64 {
        1.0 / scale(self.decimals) as f64
    }

    /// Allowed drift of the balance invariant: half a minor unit per line.
    pub fn tolerance(&self, line_count: usize) -> f64 {
        self.minor_unit() * 0.5 * line_count.max(1) as f64
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up_and_half_even() {
        let up = RoundingPolicy::default();
        assert_eq!(up.round(0.125).minor_units(), 13);
        assert_eq!(up.round(-0.125).minor_units(), -13);

        let even = RoundingPolicy {
            mode: RoundingMode::HalfEven,
            ..RoundingPolicy::default()
        };
        assert_eq!(even.round(0.125).minor_units(), 12);
        assert_eq!(even.round(0.375).minor_units(), 38);
    }

    #[test]
    fn test_decimal_tie_rounds_on_binary_value() {
        let up = RoundingPolicy::default();
        assert_eq!(up.round(1.005).minor_units(), 100);
        assert_eq!(up.round(1.0050001).minor_units(), 101);
        assert_eq!(up.round(2.675).minor_units(), 267);
    }

    #[test]
    fn test_rounding_mode_parsing() {
        assert_eq!("half_up".parse::<RoundingMode>().unwrap(), RoundingMode::HalfUp);
        assert_eq!("Half-Even".parse::<RoundingMode>().unwrap(), RoundingMode::HalfEven);
        assert_eq!("bankers".parse::<RoundingMode>().unwrap(), RoundingMode::HalfEven);
        assert!("ceiling".parse::<RoundingMode>().is_err());
        assert_eq!(RoundingMode::HalfEven.to_string(), "half_even");
    }

    #[test]
    fn test_round_zero_decimals() {
        let policy = RoundingPolicy {
            decimals: 0,
            ..RoundingPolicy::default()
        };
        assert_eq!(policy.round(1499.5).minor_units(), 1500);
        assert_eq!(policy.minor_unit(), 1.0);
    }

    #[test]
    fn test_round_to_whole() {
        let total = Money::from_minor(277_536_049); // 2775360.49
        assert_eq!(
            total.round_to_whole(2, RoundingMode::HalfUp).minor_units(),
            277_536_000
        );

        let negative = Money::from_minor(-250); // -2.50
        assert_eq!(
            negative.round_to_whole(2, RoundingMode::HalfUp).minor_units(),
            -300
        );
        assert_eq!(
            negative.round_to_whole(2, RoundingMode::HalfEven).minor_units(),
            -200
        );
    }

    #[test]
    fn test_format() {
        assert_eq!(Money::from_minor(277_536_000).format(2), "2775360.00");
        assert_eq!(Money::from_minor(-5).format(2), "-0.05");
        assert_eq!(Money::from_minor(1500).format(0), "1500");
        assert_eq!(Money::from_minor(1234).format(3), "1.234");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(250);
        assert_eq!((a + b).minor_units(), 1250);
        assert_eq!((a - b).minor_units(), 750);
        assert_eq!((-b).minor_units(), -250);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.minor_units(), 1500);
    }

    #[test]
    fn test_tolerance_scales_with_lines() {
        let policy = RoundingPolicy::default();
        assert!((policy.tolerance(0) - 0.005).abs() < 1e-12);
        assert!((policy.tolerance(10) - 0.05).abs() < 1e-12);
    }
}
