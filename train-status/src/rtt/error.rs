//! Timetable client error types.

use std::error::Error as StdError;

/// Errors from the Realtime Trains HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum RttError {
    /// Transport failure (connect, timeout, mid-body I/O).
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Name resolution failed. A sub-kind of transport failure that
    /// additionally makes the request eligible for the DoH fallback.
    #[error("DNS resolution failed: {message}")]
    Dns { message: String },

    /// The API answered with a non-2xx status.
    #[error("HTTP {status}")]
    Status { status: u16 },

    /// The body was not the JSON shape we expect.
    #[error("JSON parse error: {message}")]
    Parse {
        message: String,
        /// Truncated body excerpt for diagnostics.
        body: Option<String>,
    },

    /// A service run date that does not look like `YYYY-MM-DD`.
    #[error("invalid run date: {0}")]
    InvalidRunDate(String),

    /// Client construction failed, e.g. credentials that cannot form a
    /// request header.
    #[error("invalid client configuration: {0}")]
    Config(&'static str),
}

impl RttError {
    /// Classify a transport-level failure, separating out DNS errors so
    /// the retry loop can route them through the fallback resolver.
    pub fn classify(err: reqwest::Error) -> Self {
        if chain_mentions_dns(&err) {
            RttError::Dns {
                message: err.to_string(),
            }
        } else {
            RttError::Http(err)
        }
    }

    /// True for transport failures, the only kind the retry loop repeats.
    ///
    /// Non-2xx statuses and parse failures are answers from the server;
    /// retrying them immediately would just repeat the same answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, RttError::Http(_) | RttError::Dns { .. })
    }

    /// True when the failure is specifically a name-resolution error.
    pub fn is_dns_failure(&self) -> bool {
        matches!(self, RttError::Dns { .. })
    }
}

/// Walk an error's source chain looking for a name-resolution failure.
///
/// reqwest does not expose a typed DNS error; the resolver failure sits
/// somewhere down the chain as an I/O error whose message names dns or
/// the getaddrinfo lookup. Matching on those strings is the available
/// classification.
pub(crate) fn chain_mentions_dns(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
        {
            return true;
        }
        current = e.source();
    }
    false
}
