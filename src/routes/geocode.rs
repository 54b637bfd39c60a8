//! GET /api/v1/geocode?name=...&count=N — place name search.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::estimate::AppState;
use crate::services::geocoding::{PlaceCandidate, DEFAULT_RESULT_COUNT};

/// Upper bound on `count`, matching the geocoding service's own limit.
const MAX_RESULT_COUNT: u8 = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct GeocodeQuery {
    /// Free-text place name (e.g. "Hyderabad, India")
    pub name: String,
    /// Maximum number of candidates (default 5)
    pub count: Option<u8>,
}

/// Search for a place by name.
///
/// Candidates are returned in the geocoding service's relevance order. An
/// empty list means no match; the caller keeps its current coordinate.
#[utoipa::path(
    get,
    path = "/api/v1/geocode",
    tag = "Geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Ranked candidates (possibly empty)", body = Vec<PlaceCandidate>),
        (status = 502, description = "Geocoding service unreachable or malformed", body = ErrorResponse),
    )
)]
pub async fn search_place(
    State(state): State<AppState>,
    Query(params): Query<GeocodeQuery>,
) -> Result<Json<Vec<PlaceCandidate>>, AppError> {
    let count = params
        .count
        .unwrap_or(DEFAULT_RESULT_COUNT)
        .clamp(1, MAX_RESULT_COUNT);
    let candidates = state.geocoder.search(&params.name, count).await?;
    Ok(Json(candidates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use crate::services::geocoding::GeocodingClient;
    use crate::services::open_meteo::OpenMeteoClient;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state_for(server: &MockServer) -> AppState {
        AppState {
            geocoder: GeocodingClient::new(&format!("{}/v1/search", server.uri()), "test", 5)
                .unwrap(),
            weather: OpenMeteoClient::new(&format!("{}/v1/forecast", server.uri()), "test", 5)
                .unwrap(),
            default_coordinate: Coordinate {
                latitude: 0.0,
                longitude: 0.0,
            },
        }
    }

    #[tokio::test]
    async fn test_search_place_default_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("count", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{ "name": "Chennai", "country": "India", "latitude": 13.08784, "longitude": 80.27847 }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = GeocodeQuery {
            name: "Chennai".into(),
            count: None,
        };
        let Json(candidates) = search_place(State(state_for(&server)), Query(query))
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Chennai");
    }

    #[tokio::test]
    async fn test_search_place_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let query = GeocodeQuery {
            name: "Chennai".into(),
            count: Some(3),
        };
        let err = search_place(State(state_for(&server)), Query(query))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LookupFailed(_)));
    }
}
