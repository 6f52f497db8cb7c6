//! Base rate + contributions -> clamped point estimate

use crate::models::Adjustment;

pub use crate::models::ClampBand;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    pub total_adjustment: f64,
    pub unclamped_rate: f64,
    pub forecast_rate: f64,
}

/// Sum of every contribution. Order does not matter beyond float rounding.
pub fn total(adjustments: &[Adjustment]) -> f64 {
    adjustments.iter().map(|a| a.value).sum()
}

/// Clamping is always applied; an out-of-band sum is not an error.
pub fn blend(base_rate: f64, adjustments: &[Adjustment], band: &ClampBand) -> Blend {
    let total_adjustment = total(adjustments);
    let unclamped_rate = base_rate + total_adjustment;
    Blend {
        total_adjustment,
        unclamped_rate,
        forecast_rate: band.clamp(unclamped_rate),
    }
}
