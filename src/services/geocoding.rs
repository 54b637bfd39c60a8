//! Open-Meteo geocoding client.
//!
//! Resolves free-text place names into ranked coordinate candidates.
//! See: https://open-meteo.com/en/docs/geocoding-api

use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::models::Coordinate;

/// Number of candidates requested when the caller does not specify one.
pub const DEFAULT_RESULT_COUNT: u8 = 5;

/// Client for the Open-Meteo geocoding search API.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    url: String,
}

/// A single geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlaceCandidate {
    /// Place name (e.g. "Hyderabad")
    pub name: String,
    /// Country name, empty when the service omits it
    pub country: String,
    pub coordinate: Coordinate,
}

impl PlaceCandidate {
    /// "Name, Country — lat 17.3850, lon 78.4867"
    pub fn label(&self) -> String {
        let place = if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        };
        format!(
            "{} — lat {:.4}, lon {:.4}",
            place, self.coordinate.latitude, self.coordinate.longitude
        )
    }
}

// --- Open-Meteo JSON response types ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Absent entirely when nothing matches.
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    name: String,
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl GeocodingClient {
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

    /// Search for `name`, returning candidates in the service's relevance order.
    ///
    /// An empty result is not an error: the caller keeps whatever coordinate
    /// it already had. A blank name returns an empty result without a request.
    pub async fn search(&self, name: &str, count: u8) -> Result<Vec<PlaceCandidate>, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }

        let count = count.max(1).to_string();
        let response = self
            .client
            .get(&self.url)
            .query(&[("name", name), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| AppError::LookupFailed(format!("geocoding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::LookupFailed(format!(
                "geocoding service returned HTTP {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::LookupFailed(format!("geocoding JSON parse error: {}", e)))?;

        let mut candidates = Vec::with_capacity(body.results.len());
        for result in body.results {
            match Coordinate::new(result.latitude, result.longitude) {
                Ok(coordinate) => candidates.push(PlaceCandidate {
                    name: result.name,
                    country: result.country.unwrap_or_default(),
                    coordinate,
                }),
                Err(e) => {
                    tracing::warn!("Skipping geocoding result '{}': {}", result.name, e);
                }
            }
        }

        tracing::debug!("Geocoding '{}' returned {} candidates", name, candidates.len());
        Ok(candidates)
    }
}
