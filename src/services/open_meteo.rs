//! Open-Meteo hourly forecast client.
//!
//! Fetches 10 m wind speed for a coordinate and an inclusive date range.
//! The same endpoint serves recent past days and future days, so both the
//! history and the forecast window go through `fetch_wind_series`.
//! See: https://open-meteo.com/en/docs

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::errors::AppError;
use crate::models::{Coordinate, Source, WindSample, WindSeries};

/// Hourly variable requested from Open-Meteo.
const WIND_VARIABLE: &str = "wind_speed_10m";

/// Open-Meteo's hourly timestamp format when `timezone=UTC`.
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Client for the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    url: String,
}

// --- Open-Meteo JSON response types ---

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<Hourly>,
}

#[derive(Debug, Deserialize)]
struct Hourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
}

impl OpenMeteoClient {
    pub fn new(url: &str, user_agent: &str, timeout_secs: u64) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Fetch hourly 10 m wind speed for `[start_date, end_date]` (inclusive),
    /// tagging every sample with `source`.
    ///
    /// Returns an empty series when the service has no hourly data for the
    /// range. Transport, HTTP status and parse failures are `FetchFailed`.
    pub async fn fetch_wind_series(
        &self,
        coordinate: Coordinate,
        start_date: NaiveDate,
        end_date: NaiveDate,
        source: Source,
    ) -> Result<WindSeries, AppError> {
        let params = [
            ("latitude", format!("{:.4}", coordinate.latitude)),
            ("longitude", format!("{:.4}", coordinate.longitude)),
            ("hourly", WIND_VARIABLE.to_string()),
            ("wind_speed_unit", "ms".to_string()),
            ("start_date", start_date.format("%Y-%m-%d").to_string()),
            ("end_date", end_date.format("%Y-%m-%d").to_string()),
            ("timezone", "UTC".to_string()),
        ];

        let response = self
            .client
            .get(&self.url)
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::FetchFailed(format!("Open-Meteo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::FetchFailed(format!(
                "Open-Meteo returned HTTP {}",
                response.status()
            )));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| AppError::FetchFailed(format!("Open-Meteo JSON parse error: {}", e)))?;

        let series = match body.hourly {
            Some(hourly) => parse_hourly(hourly, source)?,
            None => WindSeries::empty(),
        };

        tracing::info!(
            "Fetched {} {} samples for ({:.4}, {:.4}) {}..={}",
            series.len(),
            source.as_str(),
            coordinate.latitude,
            coordinate.longitude,
            start_date,
            end_date
        );
        Ok(series)
    }
}

/// Zip the parallel `time` / `wind_speed_10m` arrays into a sorted series.
///
/// Null, negative and non-finite values are dropped. A missing values array
/// means no data; a malformed timestamp or arrays of different lengths fail
/// the whole fetch.
fn parse_hourly(hourly: Hourly, source: Source) -> Result<WindSeries, AppError> {
    if hourly.time.len() != hourly.wind_speed_10m.len() && !hourly.wind_speed_10m.is_empty() {
        return Err(AppError::FetchFailed(format!(
            "Open-Meteo returned {} timestamps but {} values",
            hourly.time.len(),
            hourly.wind_speed_10m.len()
        )));
    }

    let mut samples = Vec::with_capacity(hourly.time.len());
    for (time, value) in hourly.time.iter().zip(hourly.wind_speed_10m) {
        let naive = NaiveDateTime::parse_from_str(time, HOURLY_TIME_FORMAT).map_err(|e| {
            AppError::FetchFailed(format!("Open-Meteo timestamp '{}' invalid: {}", time, e))
        })?;

        match value {
            Some(v) if v.is_finite() && v >= 0.0 => samples.push(WindSample {
                timestamp: Utc.from_utc_datetime(&naive),
                wind_speed_ref: v,
                source,
            }),
            Some(v) => {
                tracing::warn!("Dropping invalid wind speed {} at {}", v, time);
            }
            None => {
                tracing::debug!("No wind speed at {}", time);
            }
        }
    }

    Ok(WindSeries::from_samples(samples))
}
