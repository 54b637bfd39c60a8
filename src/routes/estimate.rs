//! Estimate HTTP endpoints.
//!
//! - GET /api/v1/estimate?place=&lat=&lon=&history_days=&<turbine fields>
//! - GET /api/v1/estimate/csv?<same parameters>

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{AppError, ErrorResponse};
use crate::models::{Coordinate, TurbineConfig};
use crate::services::aggregate::export_csv;
use crate::services::estimate::{
    run_estimate, EstimateReport, RunConfiguration, DEFAULT_HISTORY_DAYS, FORECAST_DAYS,
};
use crate::services::geocoding::GeocodingClient;
use crate::services::open_meteo::OpenMeteoClient;

/// File name suggested to browsers for the CSV export.
const EXPORT_FILE_NAME: &str = "wind_hourly_estimates.csv";

/// Shared application state. Holds only immutable clients and defaults.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) geocoder: GeocodingClient,
    pub(crate) weather: OpenMeteoClient,
    pub(crate) default_coordinate: Coordinate,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Run parameters. Every field is optional and falls back to the defaults.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EstimateQuery {
    /// Free-text place name (e.g. "Hyderabad, India"); overrides lat/lon when it resolves
    pub place: Option<String>,
    /// Latitude used when no place is given or it does not resolve
    pub lat: Option<f64>,
    /// Longitude used when no place is given or it does not resolve
    pub lon: Option<f64>,
    /// Look-back window in days (1–30, default 14)
    pub history_days: Option<u32>,
    /// Rotor diameter in metres (default 77)
    pub rotor_diameter_m: Option<f64>,
    /// Rated power in kW (default 1500)
    pub rated_power_kw: Option<f64>,
    /// Hub height in metres (default 80)
    pub hub_height_m: Option<f64>,
    /// Power coefficient Cp (default 0.4)
    pub power_coefficient: Option<f64>,
    /// Cut-in wind speed in m/s (default 3.5)
    pub cut_in_m_s: Option<f64>,
    /// Cut-out wind speed in m/s (default 25)
    pub cut_out_m_s: Option<f64>,
    /// Rated wind speed in m/s (default 12)
    pub rated_wind_m_s: Option<f64>,
    /// Air density in kg/m³ (default 1.225)
    pub air_density_kg_m3: Option<f64>,
    /// Wind shear exponent α (default 0.14)
    pub shear_exponent: Option<f64>,
}

impl EstimateQuery {
    /// Build the run configuration, filling gaps from the defaults.
    pub(crate) fn into_run(
        self,
        default_coordinate: Coordinate,
        now: DateTime<Utc>,
    ) -> Result<RunConfiguration, AppError> {
        let defaults = TurbineConfig::default();
        let coordinate = Coordinate::new(
            self.lat.unwrap_or(default_coordinate.latitude),
            self.lon.unwrap_or(default_coordinate.longitude),
        )?;

        Ok(RunConfiguration {
            place: self.place,
            coordinate,
            turbine: TurbineConfig {
                rotor_diameter_m: self.rotor_diameter_m.unwrap_or(defaults.rotor_diameter_m),
                rated_power_kw: self.rated_power_kw.unwrap_or(defaults.rated_power_kw),
                hub_height_m: self.hub_height_m.unwrap_or(defaults.hub_height_m),
                power_coefficient: self.power_coefficient.unwrap_or(defaults.power_coefficient),
                cut_in_m_s: self.cut_in_m_s.unwrap_or(defaults.cut_in_m_s),
                cut_out_m_s: self.cut_out_m_s.unwrap_or(defaults.cut_out_m_s),
                rated_wind_m_s: self.rated_wind_m_s.unwrap_or(defaults.rated_wind_m_s),
                air_density_kg_m3: self.air_density_kg_m3.unwrap_or(defaults.air_density_kg_m3),
                shear_exponent: self.shear_exponent.unwrap_or(defaults.shear_exponent),
            },
            history_days: self.history_days.unwrap_or(DEFAULT_HISTORY_DAYS),
            forecast_days: FORECAST_DAYS,
            now,
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Estimate turbine power and energy for a location.
///
/// Fetches the history window (ending yesterday) and the 7-day forecast
/// window, extrapolates wind to hub height, applies the power curve and
/// returns summary metrics, the next 48 hours and the full hourly series.
#[utoipa::path(
    get,
    path = "/api/v1/estimate",
    tag = "Estimate",
    params(EstimateQuery),
    responses(
        (status = 200, description = "Estimate for the location", body = EstimateReport),
        (status = 400, description = "Invalid turbine or run configuration", body = ErrorResponse),
        (status = 404, description = "No wind data for the location and period", body = ErrorResponse),
        (status = 502, description = "Weather service unreachable or malformed", body = ErrorResponse),
    )
)]
pub async fn get_estimate(
    State(state): State<AppState>,
    Query(params): Query<EstimateQuery>,
) -> Result<Json<EstimateReport>, AppError> {
    let run = params.into_run(state.default_coordinate, Utc::now())?;
    let report = run_estimate(&state.geocoder, &state.weather, &run).await?;
    Ok(Json(report))
}

/// Download the full hourly series as CSV.
///
/// Columns: timestamp, wind_ref_m_s, wind_hub_m_s, power_kw, energy_kwh, source.
#[utoipa::path(
    get,
    path = "/api/v1/estimate/csv",
    tag = "Estimate",
    params(EstimateQuery),
    responses(
        (status = 200, description = "Hourly series as CSV", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid turbine or run configuration", body = ErrorResponse),
        (status = 404, description = "No wind data for the location and period", body = ErrorResponse),
        (status = 502, description = "Weather service unreachable or malformed", body = ErrorResponse),
    )
)]
pub async fn get_estimate_csv(
    State(state): State<AppState>,
    Query(params): Query<EstimateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let run = params.into_run(state.default_coordinate, Utc::now())?;
    let report = run_estimate(&state.geocoder, &state.weather, &run).await?;
    let body = export_csv(&report.records)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        body,
    ))
}
