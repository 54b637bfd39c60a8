use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;

/// Height above ground at which the upstream wind speed is measured (metres).
pub const REFERENCE_HEIGHT_M: f64 = 10.0;

/// A geographic point (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside the WGS84 ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AppError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::InvalidConfiguration(format!(
                "latitude must be within [-90, 90], got {}",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::InvalidConfiguration(format!(
                "longitude must be within [-180, 180], got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Provenance of a wind sample. Display only; never affects the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    History,
    Forecast,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::History => "history",
            Source::Forecast => "forecast",
        }
    }
}

/// One hourly wind-speed observation or forecast at reference height.
#[derive(Debug, Clone, PartialEq)]
pub struct WindSample {
    pub timestamp: DateTime<Utc>,
    /// Wind speed at 10 m in m/s (never negative).
    pub wind_speed_ref: f64,
    pub source: Source,
}

/// Hourly samples with strictly increasing timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindSeries {
    samples: Vec<WindSample>,
}

impl WindSeries {
    /// Sort by timestamp and drop repeated timestamps (first one wins).
    pub fn from_samples(mut samples: Vec<WindSample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        samples.dedup_by_key(|s| s.timestamp);
        Self { samples }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[WindSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Turbine and site parameters for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TurbineConfig {
    /// Rotor diameter in metres
    pub rotor_diameter_m: f64,
    /// Nameplate (rated) power in kW
    pub rated_power_kw: f64,
    /// Hub height above ground in metres
    pub hub_height_m: f64,
    /// Aerodynamic power coefficient Cp
    pub power_coefficient: f64,
    /// Cut-in wind speed in m/s
    pub cut_in_m_s: f64,
    /// Cut-out wind speed in m/s
    pub cut_out_m_s: f64,
    /// Rated wind speed in m/s. Validated but not used by the power curve.
    pub rated_wind_m_s: f64,
    /// Air density in kg/m³
    pub air_density_kg_m3: f64,
    /// Power-law wind shear exponent α
    pub shear_exponent: f64,
}

impl Default for TurbineConfig {
    fn default() -> Self {
        Self {
            rotor_diameter_m: 77.0,
            rated_power_kw: 1500.0,
            hub_height_m: 80.0,
            power_coefficient: 0.4,
            cut_in_m_s: 3.5,
            cut_out_m_s: 25.0,
            rated_wind_m_s: 12.0,
            air_density_kg_m3: 1.225,
            shear_exponent: 0.14,
        }
    }
}

impl TurbineConfig {
    /// Check every field against its allowed range.
    ///
    /// Must be called before any fetch is issued; the pipeline does not
    /// re-check mid-run.
    pub fn validate(&self) -> Result<(), AppError> {
        fn positive(name: &str, v: f64) -> Result<(), AppError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(AppError::InvalidConfiguration(format!(
                    "{} must be > 0, got {}",
                    name, v
                )))
            }
        }

        positive("rotor_diameter_m", self.rotor_diameter_m)?;
        positive("rated_power_kw", self.rated_power_kw)?;
        positive("hub_height_m", self.hub_height_m)?;
        positive("air_density_kg_m3", self.air_density_kg_m3)?;

        if !(self.power_coefficient > 0.0 && self.power_coefficient <= 1.0) {
            return Err(AppError::InvalidConfiguration(format!(
                "power_coefficient must be within (0, 1], got {}",
                self.power_coefficient
            )));
        }
        if !(self.shear_exponent > 0.0 && self.shear_exponent < 1.0) {
            return Err(AppError::InvalidConfiguration(format!(
                "shear_exponent must be within (0, 1), got {}",
                self.shear_exponent
            )));
        }
        if !(self.cut_in_m_s.is_finite() && self.cut_in_m_s >= 0.0) {
            return Err(AppError::InvalidConfiguration(format!(
                "cut_in_m_s must be >= 0, got {}",
                self.cut_in_m_s
            )));
        }
        if !(self.cut_out_m_s.is_finite() && self.cut_out_m_s > self.cut_in_m_s) {
            return Err(AppError::InvalidConfiguration(format!(
                "cut_out_m_s ({}) must be greater than cut_in_m_s ({})",
                self.cut_out_m_s, self.cut_in_m_s
            )));
        }
        if !(self.rated_wind_m_s.is_finite() && self.rated_wind_m_s > self.cut_in_m_s) {
            return Err(AppError::InvalidConfiguration(format!(
                "rated_wind_m_s ({}) must be greater than cut_in_m_s ({})",
                self.rated_wind_m_s, self.cut_in_m_s
            )));
        }
        Ok(())
    }
}

/// A wind sample with its derived hub wind, power and energy.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EnrichedRecord {
    /// Sample time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Wind speed at 10 m in m/s
    pub wind_ref_m_s: f64,
    /// Wind speed at hub height in m/s
    pub wind_hub_m_s: f64,
    /// Turbine power in kW
    pub power_kw: f64,
    /// Energy over the hour in kWh (numerically equal to `power_kw`)
    pub energy_kwh: f64,
    /// "history" or "forecast"
    pub source: Source,
}
