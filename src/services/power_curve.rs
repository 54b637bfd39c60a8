//! Simplified turbine power curve.
//!
//! 1. Swept area:       A = π (D/2)²
//! 2. Aerodynamic power: P = ½ ρ A Cp v³
//! 3. Zero below cut-in and above cut-out
//! 4. Clamp to rated power
//!
//! `rated_wind_m_s` does not bend the curve: there is no ramp or knee near
//! rated speed, only the hard clamp in step 4.

use std::f64::consts::PI;

use crate::models::TurbineConfig;

/// Swept rotor area in m².
pub fn swept_area_m2(rotor_diameter_m: f64) -> f64 {
    let radius = rotor_diameter_m / 2.0;
    PI * radius * radius
}

/// Unclamped aerodynamic power in kW.
pub fn aerodynamic_power_kw(wind_hub_m_s: f64, turbine: &TurbineConfig) -> f64 {
    let watts = 0.5
        * turbine.air_density_kg_m3
        * swept_area_m2(turbine.rotor_diameter_m)
        * turbine.power_coefficient
        * wind_hub_m_s.powi(3);
    watts / 1000.0
}

/// Electrical power in kW for a hub-height wind speed.
///
/// Total over all real inputs: negative or NaN speeds yield 0. The result is
/// always within `[0, rated_power_kw]`.
pub fn turbine_power_kw(wind_hub_m_s: f64, turbine: &TurbineConfig) -> f64 {
    // Written so that NaN falls into the zero branch.
    let operating = wind_hub_m_s >= turbine.cut_in_m_s && wind_hub_m_s <= turbine.cut_out_m_s;
    if !operating {
        return 0.0;
    }
    aerodynamic_power_kw(wind_hub_m_s, turbine)
        .min(turbine.rated_power_kw)
        .max(0.0)
}

pub fn turbine_power_all(winds_hub_m_s: &[f64], turbine: &TurbineConfig) -> Vec<f64> {
    winds_hub_m_s
        .iter()
        .map(|&v| turbine_power_kw(v, turbine))
        .collect()
}
