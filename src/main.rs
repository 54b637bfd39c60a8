// Wind Yield API v0.1
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::AppConfig;
use models::Coordinate;
use routes::estimate::AppState;
use services::geocoding::GeocodingClient;
use services::open_meteo::OpenMeteoClient;

/// Wind Yield API — OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wind Yield API",
        version = "0.1.0",
        description = "Wind turbine power and energy yield estimation. \
            Resolves a location, fetches recent and forecast 10 m wind speed from \
            Open-Meteo, extrapolates it to hub height with a power-law shear profile \
            and converts it to power through a bounded cubic power curve.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Geocode", description = "Place name search"),
        (name = "Estimate", description = "Power and energy estimates"),
    ),
    paths(
        routes::health::health_check,
        routes::geocode::search_place,
        routes::estimate::get_estimate,
        routes::estimate::get_estimate_csv,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            models::Coordinate,
            models::Source,
            models::TurbineConfig,
            models::EnrichedRecord,
            services::geocoding::PlaceCandidate,
            services::aggregate::Summary,
            services::aggregate::SummaryTiles,
            services::estimate::DateRange,
            services::estimate::ResolvedLocation,
            services::estimate::EstimateReport,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wind_yield_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let default_coordinate = Coordinate::new(config.default_latitude, config.default_longitude)
        .expect("DEFAULT_LATITUDE/DEFAULT_LONGITUDE must be a valid coordinate");

    let geocoder = GeocodingClient::new(
        &config.geocoding_url,
        &config.user_agent,
        config.geocoding_timeout_secs,
    )
    .expect("Failed to build geocoding client");
    let weather = OpenMeteoClient::new(
        &config.forecast_url,
        &config.user_agent,
        config.forecast_timeout_secs,
    )
    .expect("Failed to build forecast client");

    tracing::info!(
        "Upstreams: geocoding={} ({}s), forecast={} ({}s)",
        config.geocoding_url,
        config.geocoding_timeout_secs,
        config.forecast_url,
        config.forecast_timeout_secs
    );

    let app_state = AppState {
        geocoder,
        weather,
        default_coordinate,
    };

    // CORS — read-only API, restrict methods to GET
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/api/v1/geocode", get(routes::geocode::search_place))
        .route("/api/v1/estimate", get(routes::estimate::get_estimate))
        .route(
            "/api/v1/estimate/csv",
            get(routes::estimate::get_estimate_csv),
        )
        .with_state(app_state);

    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .merge(api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
