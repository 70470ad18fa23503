//! Process configuration.
//!
//! Everything comes from the environment: API credentials, the tracked
//! route list, and the listen address for the read surface. Credentials
//! may be absent — the pipeline then publishes a credentials-missing
//! status instead of attempting network calls — but a malformed route
//! list is a startup error.

use std::net::SocketAddr;

use crate::domain::{Crs, Route};

/// Environment variable holding the API username.
pub const ENV_USERNAME: &str = "RTT_USERNAME";

/// Environment variable holding the API password.
pub const ENV_PASSWORD: &str = "RTT_PASSWORD";

/// Environment variable holding the route list, e.g. `"SAC-ZFD,ZFD-SAC"`.
pub const ENV_ROUTES: &str = "RTT_ROUTES";

/// Environment variable holding the read-surface listen address.
pub const ENV_LISTEN_ADDR: &str = "LISTEN_ADDR";

/// The two fixed routes tracked when none are configured.
const DEFAULT_ROUTES: &str = "SAC-ZFD,ZFD-SAC";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid route spec {0:?}: expected ORIGIN-DEST with 3-letter codes")]
    InvalidRoute(String),

    #[error("no routes configured")]
    NoRoutes,

    #[error("invalid listen address {0:?}")]
    InvalidListenAddr(String),
}

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub username: String,
    pub password: String,
    pub routes: Vec<Route>,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let username = std::env::var(ENV_USERNAME).unwrap_or_default();
        let password = std::env::var(ENV_PASSWORD).unwrap_or_default();

        let route_spec =
            std::env::var(ENV_ROUTES).unwrap_or_else(|_| DEFAULT_ROUTES.to_string());
        let routes = parse_routes(&route_spec)?;

        let listen_spec =
            std::env::var(ENV_LISTEN_ADDR).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_spec
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(listen_spec))?;

        Ok(Self {
            username,
            password,
            routes,
            listen_addr,
        })
    }

    /// True when both credential halves are present.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Parse a comma-separated list of `ORIGIN-DEST` pairs into routes.
///
/// Codes are normalized to uppercase. Route ids follow the
/// `route_a`, `route_b`, … convention of the display layer.
pub fn parse_routes(spec: &str) -> Result<Vec<Route>, ConfigError> {
    let routes: Vec<Route> = spec
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .enumerate()
        .map(|(i, pair)| {
            let (origin, dest) = pair
                .split_once('-')
                .ok_or_else(|| ConfigError::InvalidRoute(pair.to_string()))?;
            let origin = Crs::parse_normalized(origin.trim())
                .map_err(|_| ConfigError::InvalidRoute(pair.to_string()))?;
            let dest = Crs::parse_normalized(dest.trim())
                .map_err(|_| ConfigError::InvalidRoute(pair.to_string()))?;
            Ok(Route::new(route_id(i), origin, dest))
        })
        .collect::<Result<_, ConfigError>>()?;

    if routes.is_empty() {
        return Err(ConfigError::NoRoutes);
    }
    Ok(routes)
}

fn route_id(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => format!("route_{}", char::from(b'a' + i)),
        _ => format!("route_{index}"),
    }
}
