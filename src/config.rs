/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Open-Meteo geocoding search endpoint.
    pub geocoding_url: String,
    /// Open-Meteo hourly forecast endpoint.
    pub forecast_url: String,
    pub geocoding_timeout_secs: u64,
    pub forecast_timeout_secs: u64,
    pub user_agent: String,
    /// Coordinate used when a request supplies neither `lat`/`lon` nor a
    /// resolvable place name.
    pub default_latitude: f64,
    pub default_longitude: f64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 8080),
            geocoding_url: std::env::var("GEOCODING_URL").unwrap_or_else(|_| {
                "https://geocoding-api.open-meteo.com/v1/search".to_string()
            }),
            forecast_url: std::env::var("FORECAST_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com/v1/forecast".to_string()),
            geocoding_timeout_secs: timeout_or("GEOCODING_TIMEOUT_SECS", 15),
            forecast_timeout_secs: timeout_or("FORECAST_TIMEOUT_SECS", 20),
            user_agent: std::env::var("HTTP_USER_AGENT")
                .unwrap_or_else(|_| format!("WindYield/{}", env!("CARGO_PKG_VERSION"))),
            default_latitude: env_or("DEFAULT_LATITUDE", 17.3850),
            default_longitude: env_or("DEFAULT_LONGITUDE", 78.4867),
        }
    }
}

/// Read and parse an environment variable, falling back to `default` when it
/// is unset or unparseable.
fn env_or<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}='{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Like `env_or`, but a zero timeout is treated as invalid.
fn timeout_or(key: &str, default: u64) -> u64 {
    match env_or(key, default) {
        0 => {
            tracing::warn!("Ignoring {}=0, using {}", key, default);
            default
        }
        secs => secs,
    }
}
