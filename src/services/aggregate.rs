//! Merging, enrichment and summary of wind series.
//!
//! Everything here is a pure function of the input samples and the turbine
//! configuration. Records are built once and never updated in place.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::helpers::{mean, round_1dp};
use crate::models::{EnrichedRecord, Source, TurbineConfig, WindSample};
use crate::services::power_curve::turbine_power_all;
use crate::services::shear::ShearProfile;

/// Length of the short-term display window.
pub const SHORT_TERM_WINDOW_HOURS: i64 = 48;

/// Column order of the delimited export.
pub const EXPORT_COLUMNS: [&str; 6] = [
    "timestamp",
    "wind_ref_m_s",
    "wind_hub_m_s",
    "power_kw",
    "energy_kwh",
    "source",
];

/// Concatenate history and forecast samples and stable-sort by timestamp.
///
/// Each side keeps its source tag. Coinciding timestamps across the two sides
/// are both kept; the caller guarantees the ranges are disjoint.
pub fn merge(history: &[WindSample], forecast: &[WindSample]) -> Vec<WindSample> {
    let mut merged = Vec::with_capacity(history.len() + forecast.len());
    merged.extend_from_slice(history);
    merged.extend_from_slice(forecast);
    merged.sort_by_key(|s| s.timestamp);
    merged
}

/// Attach hub wind, power and energy to every sample.
pub fn enrich(
    samples: &[WindSample],
    shear: &ShearProfile,
    turbine: &TurbineConfig,
) -> Vec<EnrichedRecord> {
    let winds_ref: Vec<f64> = samples.iter().map(|s| s.wind_speed_ref).collect();
    let winds_hub = shear.extrapolate_all(&winds_ref);
    let powers = turbine_power_all(&winds_hub, turbine);

    samples
        .iter()
        .zip(winds_hub)
        .zip(powers)
        .map(|((sample, wind_hub_m_s), power_kw)| EnrichedRecord {
            timestamp: sample.timestamp,
            wind_ref_m_s: sample.wind_speed_ref,
            wind_hub_m_s,
            power_kw,
            // One hour of sustained power.
            energy_kwh: power_kw,
            source: sample.source,
        })
        .collect()
}

/// Headline metrics for a merged, enriched series.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Summary {
    /// Sum of hourly energy over forecast rows (kWh)
    pub total_forecast_energy_kwh: f64,
    /// Mean power over all rows divided by rated power (0..=1)
    pub capacity_factor: f64,
    /// Mean hub-height wind speed over all rows (m/s)
    pub mean_hub_wind_m_s: f64,
    /// Highest hourly power in the series (kW)
    pub peak_power_kw: f64,
    /// Number of rows producing at the rated power ceiling
    pub hours_at_rated_power: usize,
    pub history_rows: usize,
    pub forecast_rows: usize,
    /// Values rounded for the three metric tiles
    pub tiles: SummaryTiles,
}

/// Rounded values for display.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SummaryTiles {
    /// Forecast energy in kWh, 1 decimal place
    pub forecast_energy_kwh: f64,
    /// Capacity factor in percent, 1 decimal place
    pub capacity_factor_pct: f64,
    /// Mean hub wind in m/s, 1 decimal place
    pub mean_hub_wind_m_s: f64,
}

pub fn summarize(records: &[EnrichedRecord], rated_power_kw: f64) -> Summary {
    let total_forecast_energy_kwh: f64 = records
        .iter()
        .filter(|r| r.source == Source::Forecast)
        .map(|r| r.energy_kwh)
        .sum();

    let capacity_factor = if rated_power_kw > 0.0 {
        mean(records.iter().map(|r| r.power_kw)).unwrap_or(0.0) / rated_power_kw
    } else {
        0.0
    };
    let mean_hub_wind_m_s = mean(records.iter().map(|r| r.wind_hub_m_s)).unwrap_or(0.0);
    let peak_power_kw = records.iter().map(|r| r.power_kw).fold(0.0, f64::max);
    let hours_at_rated_power = records
        .iter()
        .filter(|r| r.power_kw >= rated_power_kw)
        .count();
    let forecast_rows = records
        .iter()
        .filter(|r| r.source == Source::Forecast)
        .count();

    Summary {
        total_forecast_energy_kwh,
        capacity_factor,
        mean_hub_wind_m_s,
        peak_power_kw,
        hours_at_rated_power,
        history_rows: records.len() - forecast_rows,
        forecast_rows,
        tiles: SummaryTiles {
            forecast_energy_kwh: round_1dp(total_forecast_energy_kwh),
            capacity_factor_pct: round_1dp(capacity_factor * 100.0),
            mean_hub_wind_m_s: round_1dp(mean_hub_wind_m_s),
        },
    }
}

/// Records with `timestamp` in `[now, now + 48h]` (both ends inclusive).
///
/// Empty when `now` falls outside the fetched ranges.
pub fn short_term_window(records: &[EnrichedRecord], now: DateTime<Utc>) -> Vec<EnrichedRecord> {
    let end = now + Duration::hours(SHORT_TERM_WINDOW_HOURS);
    records
        .iter()
        .filter(|r| r.timestamp >= now && r.timestamp <= end)
        .cloned()
        .collect()
}

/// One row of the delimited export.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    timestamp: String,
    wind_ref_m_s: f64,
    wind_hub_m_s: f64,
    power_kw: f64,
    energy_kwh: f64,
    source: &'a str,
}

impl<'a> From<&'a EnrichedRecord> for ExportRow<'a> {
    fn from(r: &'a EnrichedRecord) -> Self {
        Self {
            timestamp: r.timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            wind_ref_m_s: r.wind_ref_m_s,
            wind_hub_m_s: r.wind_hub_m_s,
            power_kw: r.power_kw,
            energy_kwh: r.energy_kwh,
            source: r.source.as_str(),
        }
    }
}

/// Serialize the full series as CSV, one row per hourly sample.
///
/// The header is written even for an empty slice.
pub fn export_csv(records: &[EnrichedRecord]) -> Result<String, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    for record in records {
        writer.serialize(ExportRow::from(record))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::InternalError(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::InternalError(format!("CSV is not UTF-8: {}", e)))
}
