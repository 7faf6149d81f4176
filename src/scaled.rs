use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use thiserror::Error;

/// Ratio by which the flexible material of a boxed list has been stretched
/// (positive) or shrunk (negative).
pub type GlueRatio = f64;

/// The number of scaled points in one printer's point.
pub const FACTOR: ScaledPoint = ScaledPoint(0x10000);

/// The largest finite badness; anything worse is clamped here.
pub const INF_BAD: i32 = 10_000;

/// A length in scaled points, the fixed-point unit used for all geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScaledPoint(pub i64);

impl ScaledPoint {
    pub fn from_points(points: f64) -> Self {
        ScaledPoint((points * FACTOR.0 as f64).round() as i64)
    }

    pub fn to_points(self) -> f64 {
        self.0 as f64 / FACTOR.0 as f64
    }
}

impl Add for ScaledPoint {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        ScaledPoint(self.0 + rhs.0)
    }
}

impl AddAssign for ScaledPoint {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for ScaledPoint {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        ScaledPoint(self.0 - rhs.0)
    }
}

impl SubAssign for ScaledPoint {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for ScaledPoint {
    type Output = Self;
    fn neg(self) -> Self {
        ScaledPoint(-self.0)
    }
}

impl Mul<i64> for ScaledPoint {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        ScaledPoint(self.0 * rhs)
    }
}

impl Mul<ScaledPoint> for i64 {
    type Output = ScaledPoint;
    fn mul(self, rhs: ScaledPoint) -> ScaledPoint {
        ScaledPoint(self * rhs.0)
    }
}

impl Sum for ScaledPoint {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ScaledPoint(0), Add::add)
    }
}

impl fmt::Display for ScaledPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = format!("{:.5}", self.to_points());
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{trimmed}pt")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseUnitError {
    #[error("dimension `{0}` has no number")]
    MissingNumber(String),
    #[error("dimension `{0}` has no unit")]
    MissingUnit(String),
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
}

impl FromStr for ScaledPoint {
    type Err = ParseUnitError;

    /// Parses a dimension such as `12pt`, `-0.5cm` or `65536sp`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| ParseUnitError::MissingUnit(s.to_string()))?;
        let (number, unit) = s.split_at(split);
        let number = number.trim_end();
        if number.is_empty() {
            return Err(ParseUnitError::MissingNumber(s.to_string()));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| ParseUnitError::InvalidNumber(number.to_string()))?;
        let points_per_unit = match unit {
            "sp" => return Ok(ScaledPoint(value.round() as i64)),
            "pt" => 1.0,
            "pc" => 12.0,
            "in" => 72.27,
            "bp" => 72.27 / 72.0,
            "cm" => 72.27 / 2.54,
            "mm" => 72.27 / 25.4,
            _ => return Err(ParseUnitError::UnknownUnit(unit.to_string())),
        };
        Ok(ScaledPoint::from_points(value * points_per_unit))
    }
}

/// The badness of setting a list at adjustment ratio `r`: 100 |r|^3 rounded,
/// clamped to `INF_BAD`.
pub fn badness(r: GlueRatio) -> i32 {
    let b = (100.0 * r.abs().powi(3)).round();
    if b > INF_BAD as f64 {
        INF_BAD
    } else {
        b as i32
    }
}
