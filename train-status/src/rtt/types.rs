//! Realtime Trains API response DTOs.
//!
//! These map the subset of the search and service endpoints this crate
//! reads. Everything is `Option` because the API omits fields rather
//! than sending nulls; the extractor decides what absence means.

use serde::Deserialize;

/// Response from `search/{origin}/to/{dest}/{date}/{time}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Candidate services in the API's own order.
    pub services: Option<Vec<SearchService>>,
}

/// One candidate service from a search response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchService {
    /// Stable service identifier, needed for detail lookups.
    pub service_uid: Option<String>,

    /// Run date in `YYYY-MM-DD` form.
    pub run_date: Option<String>,

    /// Departure details at the searched origin.
    pub location_detail: Option<LocationDetail>,
}

/// Departure details of a service at the searched origin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetail {
    /// Timetabled departure, `HHMM`.
    pub gbtt_booked_departure: Option<String>,

    /// Realtime departure estimate, `HHMM`; presence marks a live service.
    pub realtime_departure: Option<String>,

    /// Cancellation code; presence alone marks the service cancelled.
    pub cancel_reason_code: Option<String>,

    /// Set when the booked departure falls on the day after the search date.
    pub gbtt_booked_departure_next_day: Option<bool>,

    /// Platform, frequently blank or absent.
    pub platform: Option<String>,

    /// Destination list; the first entry's description is displayed.
    pub destination: Option<Vec<LocationRef>>,
}

/// A named location reference inside a search result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRef {
    pub description: Option<String>,
}

/// Response from `service/{uid}/{yyyy}/{MM}/{dd}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetailResponse {
    /// Ordered stopping points of the service.
    pub locations: Option<Vec<CallLocation>>,
}

/// One stopping point in a service detail.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLocation {
    /// CRS code; occasionally absent, in which case the description is
    /// matched against the alias table instead.
    pub crs: Option<String>,

    pub description: Option<String>,

    /// Realtime arrival estimate, `HHMM`.
    pub realtime_arrival: Option<String>,

    /// Timetabled arrival, `HHMM`.
    pub gbtt_booked_arrival: Option<String>,
}
