//! DNS-over-HTTPS fallback resolution.
//!
//! Some deployment networks (constrained home or mobile links) have
//! unreliable local DNS. When the system resolver fails, requests are
//! re-run through a transport whose resolver queries Cloudflare's
//! `dns-json` endpoint instead. The endpoints are addressed by IP
//! literal, so the bootstrap path itself never needs name resolution.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use serde::Deserialize;

/// Public resolver endpoints, tried in order.
const DOH_ENDPOINTS: &[&str] = &["https://1.1.1.1/dns-query", "https://1.0.0.1/dns-query"];

/// Connect/read timeout for resolver queries. Tighter than the main
/// request timeout: a resolver that is slower than this is not helping.
const DOH_TIMEOUT: Duration = Duration::from_secs(5);

/// DNS record types carried in `dns-json` answers.
const TYPE_A: u16 = 1;
const TYPE_AAAA: u16 = 28;

/// Error from a DoH lookup.
#[derive(Debug, thiserror::Error)]
pub enum DohError {
    #[error("DoH query failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("DoH response held no address records")]
    NoRecords,
}

/// `Answer` section of a `dns-json` response.
#[derive(Debug, Deserialize)]
struct DnsJsonResponse {
    #[serde(rename = "Answer", default)]
    answer: Vec<DnsAnswer>,
}

#[derive(Debug, Deserialize)]
struct DnsAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

/// Resolver that answers queries over HTTPS.
///
/// Plugs into `reqwest` as the fallback transport's DNS implementation.
#[derive(Clone)]
pub struct DohResolver {
    http: reqwest::Client,
}

impl DohResolver {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(DOH_TIMEOUT)
            .timeout(DOH_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Resolve a hostname to socket addresses, trying each endpoint in turn.
    async fn lookup(&self, hostname: &str) -> Result<Vec<SocketAddr>, DohError> {
        let mut last_err = DohError::NoRecords;
        for endpoint in DOH_ENDPOINTS {
            match self.query(endpoint, hostname).await {
                Ok(addrs) if !addrs.is_empty() => return Ok(addrs),
                Ok(_) => last_err = DohError::NoRecords,
                Err(e) => {
                    tracing::debug!(endpoint = %endpoint, error = %e, "DoH endpoint failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn query(&self, endpoint: &str, hostname: &str) -> Result<Vec<SocketAddr>, DohError> {
        let response = self
            .http
            .get(endpoint)
            .query(&[("name", hostname), ("type", "A")])
            .header("accept", "application/dns-json")
            .send()
            .await?
            .error_for_status()?;

        let answer: DnsJsonResponse = response.json().await?;
        Ok(collect_addresses(&answer))
    }
}

impl Resolve for DohResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let addrs = resolver.lookup(name.as_str()).await?;
            let iter: Addrs = Box::new(addrs.into_iter());
            Ok(iter)
        })
    }
}

/// Pull address records out of a `dns-json` answer section.
///
/// Ports are zero; the HTTP client substitutes the request's port.
fn collect_addresses(response: &DnsJsonResponse) -> Vec<SocketAddr> {
    response
        .answer
        .iter()
        .filter(|a| a.record_type == TYPE_A || a.record_type == TYPE_AAAA)
        .filter_map(|a| a.data.parse::<IpAddr>().ok())
        .map(|ip| SocketAddr::new(ip, 0))
        .collect()
}
