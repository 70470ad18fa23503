//! Realtime Trains HTTP client.
//!
//! Issues authenticated GETs against the JSON API with bounded retries
//! and DNS failover. The client owns two pooled transports: the primary
//! resolves names through the system resolver; the fallback resolves
//! over HTTPS and is only consulted when an attempt fails with a
//! classified name-resolution error. `invalidate` rebuilds both pools,
//! which is how connectivity transitions shed half-open connections.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDateTime;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::Crs;

use super::dns::DohResolver;
use super::error::RttError;
use super::types::{SearchResponse, ServiceDetailResponse};

/// Production base URL for the Realtime Trains JSON API.
const DEFAULT_BASE_URL: &str = "https://api.rtt.io/api/v1/json/";

/// Connect and read timeout on the primary and fallback transports.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Attempts per logical request.
const DEFAULT_ATTEMPTS: u32 = 3;

/// Linear backoff unit between attempts: attempt n sleeps n times this.
const DEFAULT_RETRY_UNIT: Duration = Duration::from_millis(250);

/// Configuration for the timetable client.
#[derive(Debug, Clone)]
pub struct RttConfig {
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Base URL for the API (defaults to production).
    pub base_url: String,
    /// Connect/read timeout.
    pub timeout: Duration,
    /// Attempts per logical request.
    pub attempts: u32,
    /// Sleep unit between attempts.
    pub retry_unit: Duration,
}

impl RttConfig {
    /// Create a config with the given credentials and defaults otherwise.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            attempts: DEFAULT_ATTEMPTS,
            retry_unit: DEFAULT_RETRY_UNIT,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry sleep unit (tests shrink this).
    pub fn with_retry_unit(mut self, unit: Duration) -> Self {
        self.retry_unit = unit;
        self
    }
}

/// The two pooled transports, rebuilt together on `invalidate`.
struct Transports {
    primary: reqwest::Client,
    fallback: reqwest::Client,
}

/// Realtime Trains API client.
pub struct RttClient {
    config: RttConfig,
    transports: RwLock<Transports>,
}

impl RttClient {
    /// Create a new client, building both transports eagerly.
    pub fn new(config: RttConfig) -> Result<Self, RttError> {
        let transports = build_transports(&config)?;
        Ok(Self {
            config,
            transports: RwLock::new(transports),
        })
    }

    /// Evict pooled connections and rebuild both transports.
    ///
    /// Called after a connectivity transition so requests do not reuse
    /// half-open connections from the previous network.
    pub async fn invalidate(&self) -> Result<(), RttError> {
        let fresh = build_transports(&self.config)?;
        *self.transports.write().await = fresh;
        Ok(())
    }

    /// Search upcoming services between two stations from "now" onward.
    pub async fn search(&self, origin: &Crs, dest: &Crs) -> Result<SearchResponse, RttError> {
        let now = chrono::Local::now().naive_local();
        self.get_json(&search_path(origin, dest, now)).await
    }

    /// Fetch the per-stop timetable for one service run.
    pub async fn service_detail(
        &self,
        uid: &str,
        run_date: &str,
    ) -> Result<ServiceDetailResponse, RttError> {
        let path = service_path(uid, run_date)?;
        self.get_json(&path).await
    }

    /// Run one logical request through the retry/failover policy.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RttError> {
        let url = format!("{}{}", self.config.base_url, path);
        retry_with_failover(
            self.config.attempts,
            self.config.retry_unit,
            || async {
                let primary = self.transports.read().await.primary.clone();
                execute::<T>(&primary, &url).await
            },
            || async {
                let fallback = self.transports.read().await.fallback.clone();
                execute::<T>(&fallback, &url).await
            },
        )
        .await
    }
}

/// Retry/failover policy for one logical request.
///
/// Up to `attempts` rounds. Each round tries the primary transport; a
/// failure classified as a DNS error re-runs the same round through the
/// fallback transport before the round counts as failed. Only transport
/// failures are retried, with a linear `retry_unit × round` sleep
/// between rounds; the last error is surfaced on exhaustion.
async fn retry_with_failover<T, P, PF, F, FF>(
    attempts: u32,
    retry_unit: Duration,
    primary: P,
    fallback: F,
) -> Result<T, RttError>
where
    P: Fn() -> PF,
    PF: Future<Output = Result<T, RttError>>,
    F: Fn() -> FF,
    FF: Future<Output = Result<T, RttError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let err = match primary().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_dns_failure() => {
                warn!(error = %err, "system DNS failed, retrying via DoH transport");
                match fallback().await {
                    Ok(value) => return Ok(value),
                    Err(fallback_err) => fallback_err,
                }
            }
            Err(err) => err,
        };

        if !err.is_transport() || attempt >= attempts {
            return Err(err);
        }

        debug!(attempt, error = %err, "request failed, retrying");
        tokio::time::sleep(retry_unit * attempt).await;
    }
}

/// Issue one GET and decode the JSON body.
async fn execute<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T, RttError> {
    let response = client.get(url).send().await.map_err(RttError::classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(RttError::Status {
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(RttError::classify)?;
    serde_json::from_str(&body).map_err(|e| RttError::Parse {
        message: e.to_string(),
        body: Some(body.chars().take(500).collect()),
    })
}

/// Build the primary (system DNS) and fallback (DoH) transports.
fn build_transports(config: &RttConfig) -> Result<Transports, RttError> {
    let headers = default_headers(config)?;

    let primary = reqwest::Client::builder()
        .default_headers(headers.clone())
        .connect_timeout(config.timeout)
        .timeout(config.timeout)
        .build()
        .map_err(RttError::Http)?;

    let doh = DohResolver::new().map_err(RttError::Http)?;
    let fallback = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.timeout)
        .timeout(config.timeout)
        .dns_resolver(Arc::new(doh))
        .build()
        .map_err(RttError::Http)?;

    Ok(Transports { primary, fallback })
}

/// Basic-auth and accept headers applied to every request.
fn default_headers(config: &RttConfig) -> Result<HeaderMap, RttError> {
    let token = BASE64.encode(format!("{}:{}", config.username, config.password));
    let mut auth = HeaderValue::from_str(&format!("Basic {token}"))
        .map_err(|_| RttError::Config("credentials cannot form an Authorization header"))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Path for a search from "now": `search/{origin}/to/{dest}/{yyyy/MM/dd/HHmm}`.
fn search_path(origin: &Crs, dest: &Crs, now: NaiveDateTime) -> String {
    format!("search/{}/to/{}/{}", origin, dest, now.format("%Y/%m/%d/%H%M"))
}

/// Path for a service detail: `service/{uid}/{yyyy}/{MM}/{dd}`.
///
/// The run date arrives as `YYYY-MM-DD` and is split, not reformatted;
/// anything that does not match that shape is rejected before a request
/// is issued.
fn service_path(uid: &str, run_date: &str) -> Result<String, RttError> {
    let bytes = run_date.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit());

    if !well_formed {
        return Err(RttError::InvalidRunDate(run_date.to_string()));
    }

    Ok(format!(
        "service/{}/{}/{}/{}",
        uid,
        &run_date[0..4],
        &run_date[5..7],
        &run_date[8..10]
    ))
}
