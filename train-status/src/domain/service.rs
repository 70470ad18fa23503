//! Extracted service records.

use std::fmt;

use super::Hhmm;

/// Status tag for an extracted service.
///
/// Precedence when classifying is Cancelled, then Live, then Scheduled,
/// using the same predicates that pick the departure time: a cancellation
/// reason wins over a realtime departure, which wins over the booked one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Scheduled,
    Live,
    Cancelled,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceStatus::Scheduled => "Scheduled",
            ServiceStatus::Live => "Live",
            ServiceStatus::Cancelled => "Cancelled",
        })
    }
}

/// One upcoming service accepted by the extractor.
///
/// Invariants: `duration_minutes` is present exactly when `arrival` is,
/// and is never negative — an arrival with a numerically earlier clock
/// value than the departure has already been wrapped to the next day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedService {
    /// Departure time; realtime when available, booked otherwise.
    pub departure: Hhmm,
    /// Arrival at the tracked destination, when a detail lookup found one.
    pub arrival: Option<Hhmm>,
    /// Journey duration in minutes, wrap-aware.
    pub duration_minutes: Option<u32>,
    /// Platform, or the `"—"` placeholder when the API left it blank.
    pub platform: String,
    /// Destination description from the search result, `"Unknown"` if absent.
    pub destination: String,
    pub status: ServiceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(ServiceStatus::Scheduled.to_string(), "Scheduled");
        assert_eq!(ServiceStatus::Live.to_string(), "Live");
        assert_eq!(ServiceStatus::Cancelled.to_string(), "Cancelled");
    }
}
