pub mod aggregate;
pub mod estimate;
pub mod geocoding;
pub mod open_meteo;
pub mod power_curve;
pub mod shear;
