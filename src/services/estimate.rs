//! End-to-end estimation run.
//!
//! One run = one `RunConfiguration`:
//! 1. validate configuration (before any request is made)
//! 2. resolve the place name, falling back to the supplied coordinate
//! 3. fetch history and forecast concurrently
//! 4. merge, enrich, summarize, window
//!
//! A run either returns a complete `EstimateReport` or an error; nothing is
//! kept between runs.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::models::{Coordinate, EnrichedRecord, Source, TurbineConfig, REFERENCE_HEIGHT_M};
use crate::services::aggregate::{self, Summary};
use crate::services::geocoding::{GeocodingClient, DEFAULT_RESULT_COUNT};
use crate::services::open_meteo::OpenMeteoClient;
use crate::services::shear::ShearProfile;

/// Allowed look-back window, in days.
pub const MIN_HISTORY_DAYS: u32 = 1;
pub const MAX_HISTORY_DAYS: u32 = 30;
pub const DEFAULT_HISTORY_DAYS: u32 = 14;

/// Forecast window length, in days. Not configurable by callers.
pub const FORECAST_DAYS: u32 = 7;

/// Everything a single run needs, built once per request.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// Optional free-text place; overrides `coordinate` when it resolves.
    pub place: Option<String>,
    /// Manually entered (or default) coordinate.
    pub coordinate: Coordinate,
    pub turbine: TurbineConfig,
    pub history_days: u32,
    pub forecast_days: u32,
    /// Reference instant for the date windows and the 48 h window.
    pub now: DateTime<Utc>,
}

impl RunConfiguration {
    /// Validate the run and build the shear profile it will use.
    pub fn validate(&self) -> Result<ShearProfile, AppError> {
        Coordinate::new(self.coordinate.latitude, self.coordinate.longitude)?;
        self.turbine.validate()?;
        if !(MIN_HISTORY_DAYS..=MAX_HISTORY_DAYS).contains(&self.history_days) {
            return Err(AppError::InvalidConfiguration(format!(
                "history_days must be within [{}, {}], got {}",
                MIN_HISTORY_DAYS, MAX_HISTORY_DAYS, self.history_days
            )));
        }
        ShearProfile::new(
            REFERENCE_HEIGHT_M,
            self.turbine.hub_height_m,
            self.turbine.shear_exponent,
        )
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// `[today - history_days, today - 1]`
    pub fn history_range(&self) -> DateRange {
        let today = self.today();
        DateRange {
            start: today - Duration::days(i64::from(self.history_days)),
            end: today - Duration::days(1),
        }
    }

    /// `[today, today + forecast_days]`
    pub fn forecast_range(&self) -> DateRange {
        let today = self.today();
        DateRange {
            start: today,
            end: today + Duration::days(i64::from(self.forecast_days)),
        }
    }
}

/// Inclusive calendar date range (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The coordinate a run actually used.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    /// "Name, Country — lat, lon" when the place name resolved
    pub label: Option<String>,
    /// Whether the coordinate came from the place lookup
    pub resolved: bool,
}

/// Complete output of a run, handed to the presentation layer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EstimateReport {
    pub location: ResolvedLocation,
    pub turbine: TurbineConfig,
    pub history_window: DateRange,
    pub forecast_window: DateRange,
    /// Hub height / reference height scaling applied to every row
    pub shear_factor: f64,
    pub summary: Summary,
    /// Records within [now, now + 48h]
    pub next_48h: Vec<EnrichedRecord>,
    /// Full merged series
    pub records: Vec<EnrichedRecord>,
}

/// Resolve `run.place`, keeping `run.coordinate` when the lookup is empty or
/// fails.
pub async fn resolve_location(
    geocoder: &GeocodingClient,
    run: &RunConfiguration,
) -> ResolvedLocation {
    let fallback = ResolvedLocation {
        coordinate: run.coordinate,
        label: None,
        resolved: false,
    };

    let place = match run.place.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => return fallback,
    };

    match geocoder.search(place, DEFAULT_RESULT_COUNT).await {
        Ok(candidates) => match candidates.into_iter().next() {
            Some(chosen) => {
                tracing::info!("Location: {}", chosen.label());
                ResolvedLocation {
                    coordinate: chosen.coordinate,
                    label: Some(chosen.label()),
                    resolved: true,
                }
            }
            None => {
                tracing::warn!(
                    "No geocoding match for '{}', using ({:.4}, {:.4})",
                    place,
                    run.coordinate.latitude,
                    run.coordinate.longitude
                );
                fallback
            }
        },
        Err(e) => {
            tracing::warn!(
                "{}; using ({:.4}, {:.4})",
                e,
                run.coordinate.latitude,
                run.coordinate.longitude
            );
            fallback
        }
    }
}

/// Execute a full estimation run.
pub async fn run_estimate(
    geocoder: &GeocodingClient,
    weather: &OpenMeteoClient,
    run: &RunConfiguration,
) -> Result<EstimateReport, AppError> {
    let shear = run.validate()?;
    let location = resolve_location(geocoder, run).await;

    let history_window = run.history_range();
    let forecast_window = run.forecast_range();

    let (history, forecast) = futures::future::try_join(
        weather.fetch_wind_series(
            location.coordinate,
            history_window.start,
            history_window.end,
            Source::History,
        ),
        weather.fetch_wind_series(
            location.coordinate,
            forecast_window.start,
            forecast_window.end,
            Source::Forecast,
        ),
    )
    .await?;

    if history.is_empty() && forecast.is_empty() {
        tracing::warn!(
            "No wind data for ({:.4}, {:.4})",
            location.coordinate.latitude,
            location.coordinate.longitude
        );
        return Err(AppError::NoDataAvailable);
    }

    let merged = aggregate::merge(history.samples(), forecast.samples());
    let records = aggregate::enrich(&merged, &shear, &run.turbine);
    let summary = aggregate::summarize(&records, run.turbine.rated_power_kw);
    let next_48h = aggregate::short_term_window(&records, run.now);

    tracing::info!(
        "Estimate: {} rows ({} history, {} forecast), {:.1} kWh forecast, CF {:.1}%",
        records.len(),
        summary.history_rows,
        summary.forecast_rows,
        summary.total_forecast_energy_kwh,
        summary.capacity_factor * 100.0
    );

    Ok(EstimateReport {
        location,
        turbine: run.turbine.clone(),
        history_window,
        forecast_window,
        shear_factor: shear.factor(),
        summary,
        next_48h,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 10, 30, 0).unwrap()
    }

    fn run(place: Option<&str>) -> RunConfiguration {
        RunConfiguration {
            place: place.map(str::to_string),
            coordinate: Coordinate {
                latitude: 17.385,
                longitude: 78.4867,
            },
            turbine: TurbineConfig::default(),
            history_days: DEFAULT_HISTORY_DAYS,
            forecast_days: FORECAST_DAYS,
            now: now(),
        }
    }

    fn clients(server: &MockServer) -> (GeocodingClient, OpenMeteoClient) {
        (
            GeocodingClient::new(&format!("{}/v1/search", server.uri()), "test", 5).unwrap(),
            OpenMeteoClient::new(&format!("{}/v1/forecast", server.uri()), "test", 5).unwrap(),
        )
    }

    /// Hourly body covering `days` days starting at `start` with constant wind.
    fn hourly_body(start: NaiveDate, days: i64, wind: f64) -> serde_json::Value {
        let mut times = Vec::new();
        for d in 0..days {
            let date = start + Duration::days(d);
            for h in 0..24 {
                times.push(format!("{}T{:02}:00", date.format("%Y-%m-%d"), h));
            }
        }
        let values = vec![wind; times.len()];
        serde_json::json!({ "hourly": { "time": times, "wind_speed_10m": values } })
    }

    async fn mount_window(server: &MockServer, start: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("start_date", start))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_date_windows_are_disjoint() {
        let r = run(None);
        let history = r.history_range();
        let forecast = r.forecast_range();

        assert_eq!(history.start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(history.end, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(forecast.start, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        assert_eq!(forecast.end, NaiveDate::from_ymd_opt(2026, 3, 22).unwrap());
        assert!(history.end < forecast.start);
    }

    #[test]
    fn test_history_days_bounds() {
        let mut r = run(None);
        r.history_days = 0;
        assert!(r.validate().is_err());
        r.history_days = 31;
        assert!(r.validate().is_err());
        r.history_days = 30;
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_coordinate_rejected() {
        let mut r = run(None);
        r.coordinate = Coordinate {
            latitude: 200.0,
            longitude: 78.4867,
        };
        assert!(matches!(
            r.validate(),
            Err(AppError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_coordinate_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let (geocoder, weather) = clients(&server);

        let mut r = run(None);
        r.coordinate.longitude = -181.0;

        let err = run_estimate(&geocoder, &weather, &r).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_invalid_configuration_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let (geocoder, weather) = clients(&server);

        let mut r = run(Some("Hyderabad"));
        r.turbine.cut_out_m_s = 2.0;

        let err = run_estimate(&geocoder, &weather, &r).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_full_run_with_history_and_forecast() {
        let server = MockServer::start().await;
        let (geocoder, weather) = clients(&server);
        let r = run(None);

        mount_window(&server, "2026-03-01", hourly_body(r.history_range().start, 14, 5.0)).await;
        mount_window(&server, "2026-03-15", hourly_body(r.forecast_range().start, 8, 10.0)).await;

        let report = run_estimate(&geocoder, &weather, &r).await.unwrap();

        assert_eq!(report.records.len(), 14 * 24 + 8 * 24);
        assert_eq!(report.summary.history_rows, 14 * 24);
        assert_eq!(report.summary.forecast_rows, 8 * 24);
        // 10 m/s at 10 m is above rated at 80 m: every forecast hour at 1500 kW
        assert_eq!(report.summary.total_forecast_energy_kwh, 1500.0 * 8.0 * 24.0);
        assert!(!report.location.resolved);

        // 10:30 → 2026-03-17T10:30, hourly rows 11:00 .. 10:00 two days later
        assert_eq!(report.next_48h.len(), 48);
        assert!(report.next_48h.iter().all(|r| r.timestamp >= now()));
        assert!(report
            .records
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_history_only_run() {
        let server = MockServer::start().await;
        let (geocoder, weather) = clients(&server);
        let r = run(None);

        mount_window(&server, "2026-03-01", hourly_body(r.history_range().start, 14, 6.0)).await;
        mount_window(&server, "2026-03-15", serde_json::json!({})).await;

        let report = run_estimate(&geocoder, &weather, &r).await.unwrap();
        assert_eq!(report.records.len(), 14 * 24);
        assert_eq!(report.summary.total_forecast_energy_kwh, 0.0);
        assert!(report.next_48h.is_empty());
    }

    #[tokio::test]
    async fn test_both_empty_is_no_data() {
        let server = MockServer::start().await;
        let (geocoder, weather) = clients(&server);

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": { "time": [], "wind_speed_10m": [] }
            })))
            .expect(2)
            .mount(&server)
            .await;

        let err = run_estimate(&geocoder, &weather, &run(None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoDataAvailable));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_run() {
        let server = MockServer::start().await;
        let (geocoder, weather) = clients(&server);
        let r = run(None);

        mount_window(&server, "2026-03-01", hourly_body(r.history_range().start, 14, 6.0)).await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("start_date", "2026-03-15"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = run_estimate(&geocoder, &weather, &r).await.unwrap_err();
        assert!(matches!(err, AppError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn test_place_overrides_coordinate() {
        let server = MockServer::start().await;
        let (geocoder, weather) = clients(&server);

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "name": "Esbjerg", "country": "Denmark", "latitude": 55.47, "longitude": 8.45 }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "55.4700"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(hourly_body(
                    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
                    1,
                    7.0,
                )),
            )
            .expect(2)
            .mount(&server)
            .await;

        let report = run_estimate(&geocoder, &weather, &run(Some("Esbjerg")))
            .await
            .unwrap();
        assert!(report.location.resolved);
        assert_eq!(
            report.location.label.as_deref(),
            Some("Esbjerg, Denmark — lat 55.4700, lon 8.4500")
        );
        // Both windows got the same body; cross-source duplicates are kept
        assert_eq!(report.records.len(), 48);
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_coordinate() {
        let server = MockServer::start().await;
        let (geocoder, _) = clients(&server);

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let location = resolve_location(&geocoder, &run(Some("Hyderabad"))).await;
        assert!(!location.resolved);
        assert_eq!(location.coordinate.latitude, 17.385);
        assert_eq!(location.label, None);
    }

    #[tokio::test]
    async fn test_no_match_falls_back_to_coordinate() {
        let server = MockServer::start().await;
        let (geocoder, _) = clients(&server);

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let location = resolve_location(&geocoder, &run(Some("Qwxz"))).await;
        assert!(!location.resolved);
        assert_eq!(location.coordinate.longitude, 78.4867);
    }
}
