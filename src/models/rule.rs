//! Adjustment rule table data models

use serde::{Deserialize, Serialize};

/// How a deviation from baseline is normalized before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalizer {
    /// `value - baseline`
    Absolute,
    /// `(value - baseline) / baseline`
    Relative,
    /// `(value - baseline) / k`
    DivideByConstant { k: f64 },
}

/// Sign applied to a rule's contribution.
///
/// `Raises` means a reading above baseline pushes the unemployment forecast up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    Raises,
    Lowers,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Raises => 1.0,
            Direction::Lowers => -1.0,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Raises),
            -1 => Ok(Direction::Lowers),
            other => Err(format!("direction must be 1 or -1, got {}", other)),
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Raises => 1,
            Direction::Lowers => -1,
        }
    }
}

/// Static mapping from one indicator's deviation to a percentage-point contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    pub indicator_name: String,
    pub baseline: f64,
    pub scale: f64,
    pub direction: Direction,
    pub weight: f64,
    pub normalizer: Normalizer,
    /// Value substituted when the indicator is missing or unusable.
    pub fallback: f64,
}

impl AdjustmentRule {
    pub fn new(
        indicator_name: &str,
        baseline: f64,
        scale: f64,
        direction: Direction,
        weight: f64,
        normalizer: Normalizer,
        fallback: f64,
    ) -> Self {
        Self {
            indicator_name: indicator_name.to_string(),
            baseline,
            scale,
            direction,
            weight,
            normalizer,
            fallback,
        }
    }
}
