//! Power-law wind shear: rescales wind speed from the measurement height to
//! hub height.
//!
//! v_hub = v_ref * (z_to / z_from) ^ alpha
//!
//! No stability class, roughness length or diurnal dependence is modelled.

use crate::errors::AppError;

/// Validated height pair and shear exponent.
///
/// Heights are checked once at construction so that `extrapolate` is total
/// over every finite non-negative wind speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShearProfile {
    factor: f64,
}

impl ShearProfile {
    pub fn new(z_from_m: f64, z_to_m: f64, alpha: f64) -> Result<Self, AppError> {
        if !(z_from_m.is_finite() && z_from_m > 0.0) {
            return Err(AppError::InvalidConfiguration(format!(
                "reference height must be > 0, got {}",
                z_from_m
            )));
        }
        if !(z_to_m.is_finite() && z_to_m > 0.0) {
            return Err(AppError::InvalidConfiguration(format!(
                "hub height must be > 0, got {}",
                z_to_m
            )));
        }
        if !alpha.is_finite() {
            return Err(AppError::InvalidConfiguration(format!(
                "shear exponent must be finite, got {}",
                alpha
            )));
        }
        Ok(Self {
            factor: scale_factor(z_from_m, z_to_m, alpha),
        })
    }

    /// Multiplier applied to every reference-height wind speed.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn extrapolate(&self, wind_ref_m_s: f64) -> f64 {
        wind_ref_m_s * self.factor
    }

    pub fn extrapolate_all(&self, winds_ref_m_s: &[f64]) -> Vec<f64> {
        winds_ref_m_s.iter().map(|&v| self.extrapolate(v)).collect()
    }
}

/// (z_to / z_from) ^ alpha. Non-negative for positive heights.
pub fn scale_factor(z_from_m: f64, z_to_m: f64, alpha: f64) -> f64 {
    (z_to_m / z_from_m).powf(alpha)
}
