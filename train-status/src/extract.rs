//! Service extraction.
//!
//! Turns a raw search response into the ordered list of upcoming
//! services for one route: filters out malformed and already-departed
//! entries, looks up arrivals for the leading candidates, computes
//! wrap-aware durations, and optionally prunes services dominated by a
//! later-but-faster alternative.
//!
//! Nothing here lets an error escape: every failure path collapses to
//! zero services plus an explanatory message for the display layer.

use tracing::debug;

use crate::domain::{Crs, ExtractedService, Hhmm, Route, ServiceStatus};
use crate::rtt::{SearchService, TimetableSource};

/// How many accepted candidates get a per-service detail lookup.
///
/// The display only surfaces the first few departures, and skipping the
/// extra network calls keeps refreshes reliable on weak connections
/// while still providing journey times for the most relevant services.
const DETAIL_LOOKUP_LIMIT: usize = 3;

/// Placeholder shown when the API reports no platform.
pub const PLATFORM_PLACEHOLDER: &str = "—";

/// Status shown when the process was started without API credentials.
pub const CREDENTIALS_MISSING: &str =
    "RTT credentials missing. Set RTT_USERNAME and RTT_PASSWORD.";

/// Options for one route fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum services to accept.
    pub take: usize,
    /// Apply the domination filter.
    pub fast_only: bool,
    /// False when the process has no API credentials; short-circuits
    /// before any network call.
    pub credentials_present: bool,
}

/// Outcome of extraction for one route: the accepted services, plus a
/// message explaining an empty list.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub services: Vec<ExtractedService>,
    pub message: Option<String>,
}

impl Extraction {
    fn empty(message: impl Into<String>) -> Self {
        Self {
            services: Vec::new(),
            message: Some(message.into()),
        }
    }
}

/// Result of one route's fetch within a poll cycle.
#[derive(Debug)]
pub enum RouteFetch {
    /// The pipeline ran; the extraction may still be empty with a message.
    Done(Extraction),
    /// The search request itself failed. The poller backs off and may
    /// fall back to the previous good state.
    Failed { error: String },
}

/// Run the full pipeline for one route: search, extract, filter.
pub async fn fetch_route<S: TimetableSource>(
    source: &S,
    route: &Route,
    now: Hhmm,
    options: &FetchOptions,
) -> RouteFetch {
    if !options.credentials_present {
        return RouteFetch::Done(Extraction::empty(CREDENTIALS_MISSING));
    }

    let search = match source.search(&route.origin, &route.dest).await {
        Ok(search) => search,
        Err(e) => {
            return RouteFetch::Failed {
                error: format!("Error fetching search: {e}"),
            };
        }
    };

    let candidates = search.services.unwrap_or_default();
    RouteFetch::Done(extract(source, &candidates, &route.dest, now, options).await)
}

/// Extract upcoming services from search candidates, in API order.
pub async fn extract<S: TimetableSource>(
    source: &S,
    candidates: &[SearchService],
    dest: &Crs,
    now: Hhmm,
    options: &FetchOptions,
) -> Extraction {
    if candidates.is_empty() {
        return Extraction::empty("No services returned.");
    }

    let mut accepted: Vec<ExtractedService> = Vec::new();

    for candidate in candidates {
        if accepted.len() >= options.take {
            break;
        }

        let Some(location) = candidate.location_detail.as_ref() else {
            continue;
        };
        let uid = candidate.service_uid.as_deref().map(str::trim);
        let run_date = candidate.run_date.as_deref().map(str::trim);
        let (Some(uid), Some(run_date)) = (
            uid.filter(|s| !s.is_empty()),
            run_date.filter(|s| !s.is_empty()),
        ) else {
            continue;
        };

        let cancelled = location.cancel_reason_code.is_some();
        let live = location.realtime_departure.is_some();

        // A cancelled service shows its booked slot; realtime values for
        // it describe a train that is not running.
        let departure_raw = if cancelled {
            location.gbtt_booked_departure.as_deref()
        } else if live {
            location.realtime_departure.as_deref()
        } else {
            location.gbtt_booked_departure.as_deref()
        };
        let Some(departure) = departure_raw.and_then(|s| Hhmm::parse(s).ok()) else {
            debug!(uid, "skipping service with unusable departure time");
            continue;
        };

        let next_day = location.gbtt_booked_departure_next_day.unwrap_or(false);
        if !departure.is_after(now) && !next_day {
            continue;
        }

        let destination = location
            .destination
            .as_ref()
            .and_then(|list| list.first())
            .and_then(|d| d.description.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let platform = match location.platform.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => PLATFORM_PLACEHOLDER.to_string(),
        };

        let arrival = if accepted.len() < DETAIL_LOOKUP_LIMIT {
            find_arrival(source, uid, run_date, dest).await
        } else {
            None
        };
        let duration_minutes = arrival.map(|arr| Hhmm::elapsed_minutes(departure, arr));

        let status = if cancelled {
            ServiceStatus::Cancelled
        } else if live {
            ServiceStatus::Live
        } else {
            ServiceStatus::Scheduled
        };

        accepted.push(ExtractedService {
            departure,
            arrival,
            duration_minutes,
            platform,
            destination,
            status,
        });
    }

    let services = if options.fast_only {
        filter_slower_services(accepted)
    } else {
        accepted
    };

    let message = services
        .is_empty()
        .then(|| "No matching services found.".to_string());

    Extraction { services, message }
}

/// Look up the arrival time at `dest` from a service's stopping points.
///
/// Any failure here degrades to "arrival unknown" rather than failing
/// the route.
async fn find_arrival<S: TimetableSource>(
    source: &S,
    uid: &str,
    run_date: &str,
    dest: &Crs,
) -> Option<Hhmm> {
    let detail = match source.service_detail(uid, run_date).await {
        Ok(detail) => detail,
        Err(e) => {
            debug!(uid, error = %e, "service detail lookup failed");
            return None;
        }
    };

    let alias = friendly_destination_name(dest);

    for location in detail.locations.as_deref().unwrap_or_default() {
        let matches = match location.crs.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => code.eq_ignore_ascii_case(dest.as_str()),
            None => location
                .description
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(alias)),
        };
        if !matches {
            continue;
        }

        if let Some(realtime) = location
            .realtime_arrival
            .as_deref()
            .and_then(|s| Hhmm::parse(s).ok())
        {
            return Some(realtime);
        }
        if let Some(booked) = location
            .gbtt_booked_arrival
            .as_deref()
            .and_then(|s| Hhmm::parse(s).ok())
        {
            return Some(booked);
        }
    }

    None
}

/// Station name used for description matching when a stopping point has
/// no `crs` field. Matching by code is always preferred.
fn friendly_destination_name(dest: &Crs) -> &str {
    match dest.as_str() {
        "ZFD" => "Farringdon",
        "SAC" => "St Albans City",
        _ => dest.as_str(),
    }
}

/// Domination filter: drop a service when its immediate successor departs
/// strictly later and has a strictly shorter known duration.
///
/// Only adjacent pairs are compared; a service dominated by some entry
/// further down the list is kept. Both durations must be known for a
/// drop to happen.
fn filter_slower_services(services: Vec<ExtractedService>) -> Vec<ExtractedService> {
    if services.len() <= 1 {
        return services;
    }

    let mut kept = Vec::with_capacity(services.len());
    for (i, current) in services.iter().enumerate() {
        let dominated = services.get(i + 1).is_some_and(|next| {
            match (current.duration_minutes, next.duration_minutes) {
                (Some(current_mins), Some(next_mins)) => {
                    current.departure < next.departure && current_mins > next_mins
                }
                _ => false,
            }
        });
        if !dominated {
            kept.push(current.clone());
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtt::{RttError, SearchResponse, ServiceDetailResponse};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted source: canned search result and per-uid details, with a
    /// log of every request made.
    struct MockSource {
        search: Result<Value, u16>,
        details: HashMap<String, Value>,
        search_calls: Mutex<usize>,
        detail_calls: Mutex<Vec<String>>,
    }

    impl MockSource {
        fn new(search: Value) -> Self {
            Self {
                search: Ok(search),
                details: HashMap::new(),
                search_calls: Mutex::new(0),
                detail_calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                search: Err(status),
                details: HashMap::new(),
                search_calls: Mutex::new(0),
                detail_calls: Mutex::new(Vec::new()),
            }
        }

        fn with_detail(mut self, uid: &str, detail: Value) -> Self {
            self.details.insert(uid.to_string(), detail);
            self
        }

        fn detail_lookups(&self) -> Vec<String> {
            self.detail_calls.lock().unwrap().clone()
        }

        fn search_count(&self) -> usize {
            *self.search_calls.lock().unwrap()
        }
    }

    impl TimetableSource for MockSource {
        async fn search(&self, _origin: &Crs, _dest: &Crs) -> Result<SearchResponse, RttError> {
            *self.search_calls.lock().unwrap() += 1;
            match &self.search {
                Ok(value) => Ok(serde_json::from_value(value.clone()).unwrap()),
                Err(status) => Err(RttError::Status { status: *status }),
            }
        }

        async fn service_detail(
            &self,
            uid: &str,
            _run_date: &str,
        ) -> Result<ServiceDetailResponse, RttError> {
            self.detail_calls.lock().unwrap().push(uid.to_string());
            match self.details.get(uid) {
                Some(value) => Ok(serde_json::from_value(value.clone()).unwrap()),
                None => Err(RttError::Status { status: 404 }),
            }
        }
    }

    fn crs(s: &str) -> Crs {
        Crs::parse(s).unwrap()
    }

    fn t(s: &str) -> Hhmm {
        Hhmm::parse(s).unwrap()
    }

    fn options(take: usize, fast_only: bool) -> FetchOptions {
        FetchOptions {
            take,
            fast_only,
            credentials_present: true,
        }
    }

    fn service(uid: &str, detail: Value) -> Value {
        json!({
            "serviceUid": uid,
            "runDate": "2026-08-06",
            "locationDetail": detail,
        })
    }

    fn zfd_arrival(arrival: &str) -> Value {
        json!({
            "locations": [
                {"crs": "SAC", "description": "St Albans City"},
                {"crs": "ZFD", "description": "Farringdon", "gbttBookedArrival": arrival}
            ]
        })
    }

    fn candidates(value: &Value) -> Vec<SearchService> {
        let search: SearchResponse = serde_json::from_value(value.clone()).unwrap();
        search.services.unwrap_or_default()
    }

    async fn run(source: &MockSource, value: &Value, opts: &FetchOptions) -> Extraction {
        extract(source, &candidates(value), &crs("ZFD"), t("0700"), opts).await
    }

    #[tokio::test]
    async fn end_to_end_cancelled_then_live() {
        let search = json!({"services": [
            service("C1", json!({
                "gbttBookedDeparture": "0800",
                "realtimeDeparture": "0803",
                "cancelReasonCode": "TH",
                "destination": [{"description": "Farringdon"}],
            })),
            service("L1", json!({
                "gbttBookedDeparture": "0913",
                "realtimeDeparture": "0915",
                "platform": "2",
                "destination": [{"description": "Farringdon"}],
            })),
        ]});
        let source = MockSource::new(search.clone()).with_detail("L1", zfd_arrival("0945"));

        let extraction = run(&source, &search, &options(2, false)).await;
        assert_eq!(extraction.services.len(), 2);
        assert!(extraction.message.is_none());

        let cancelled = &extraction.services[0];
        // Booked slot, not the realtime estimate, for a cancelled train
        assert_eq!(cancelled.departure, t("0800"));
        assert_eq!(cancelled.status, ServiceStatus::Cancelled);
        assert_eq!(cancelled.platform, PLATFORM_PLACEHOLDER);
        assert!(cancelled.arrival.is_none());

        let live = &extraction.services[1];
        assert_eq!(live.departure, t("0915"));
        assert_eq!(live.status, ServiceStatus::Live);
        assert_eq!(live.platform, "2");
        assert_eq!(live.arrival, Some(t("0945")));
        assert_eq!(live.duration_minutes, Some(30));
    }

    #[tokio::test]
    async fn fast_only_drops_dominated_service() {
        let search = json!({"services": [
            service("S1", json!({
                "gbttBookedDeparture": "0915",
                "realtimeDeparture": "0915",
                "destination": [{"description": "Farringdon"}],
            })),
            service("S2", json!({
                "gbttBookedDeparture": "0930",
                "realtimeDeparture": "0930",
                "destination": [{"description": "Farringdon"}],
            })),
        ]});
        let source = MockSource::new(search.clone())
            .with_detail("S1", zfd_arrival("0945")) // 30 min
            .with_detail("S2", zfd_arrival("0950")); // 20 min, later but faster

        let extraction = run(&source, &search, &options(4, true)).await;
        let departures: Vec<_> = extraction.services.iter().map(|s| s.departure).collect();
        assert_eq!(departures, vec![t("0930")]);
    }

    #[tokio::test]
    async fn fast_only_keeps_services_without_durations() {
        let search = json!({"services": [
            service("S1", json!({
                "gbttBookedDeparture": "0915",
                "destination": [{"description": "Farringdon"}],
            })),
            service("S2", json!({
                "gbttBookedDeparture": "0930",
                "destination": [{"description": "Farringdon"}],
            })),
        ]});
        // No details at all: every arrival is unknown, nothing is dropped
        let source = MockSource::new(search.clone());

        let extraction = run(&source, &search, &options(4, true)).await;
        assert_eq!(extraction.services.len(), 2);
    }

    #[tokio::test]
    async fn take_bounds_accepted_services() {
        let entries: Vec<Value> = (0..5)
            .map(|i| {
                service(
                    &format!("S{i}"),
                    json!({
                        "gbttBookedDeparture": format!("{:02}15", 9 + i),
                        "destination": [{"description": "Farringdon"}],
                    }),
                )
            })
            .collect();
        let search = json!({ "services": entries });
        let source = MockSource::new(search.clone());

        let extraction = run(&source, &search, &options(2, false)).await;
        assert_eq!(extraction.services.len(), 2);
        // Lookups stop with acceptance
        assert_eq!(source.detail_lookups().len(), 2);
    }

    #[tokio::test]
    async fn detail_lookups_capped_at_three() {
        let entries: Vec<Value> = (0..5)
            .map(|i| {
                service(
                    &format!("S{i}"),
                    json!({
                        "gbttBookedDeparture": format!("{:02}15", 9 + i),
                        "destination": [{"description": "Farringdon"}],
                    }),
                )
            })
            .collect();
        let search = json!({ "services": entries });
        let mut source = MockSource::new(search.clone());
        for i in 0..5 {
            source = source.with_detail(&format!("S{i}"), zfd_arrival("2015"));
        }

        let extraction = run(&source, &search, &options(5, false)).await;
        assert_eq!(extraction.services.len(), 5);
        assert_eq!(source.detail_lookups(), vec!["S0", "S1", "S2"]);
        assert!(extraction.services[0].arrival.is_some());
        assert!(extraction.services[2].arrival.is_some());
        assert!(extraction.services[3].arrival.is_none());
        assert!(extraction.services[4].arrival.is_none());
    }

    #[tokio::test]
    async fn past_departures_filtered_unless_next_day() {
        let search = json!({"services": [
            service("PAST", json!({
                "gbttBookedDeparture": "0650",
                "destination": [{"description": "Farringdon"}],
            })),
            service("NOW", json!({
                "gbttBookedDeparture": "0700",
                "destination": [{"description": "Farringdon"}],
            })),
            service("TOMORROW", json!({
                "gbttBookedDeparture": "0630",
                "gbttBookedDepartureNextDay": true,
                "destination": [{"description": "Farringdon"}],
            })),
        ]});
        let source = MockSource::new(search.clone());

        // now = 0700: 0650 is past, 0700 is not strictly later, 0630
        // next-day survives
        let extraction = run(&source, &search, &options(8, false)).await;
        let departures: Vec<_> = extraction.services.iter().map(|s| s.departure).collect();
        assert_eq!(departures, vec![t("0630")]);
    }

    #[tokio::test]
    async fn malformed_candidates_skipped() {
        let search = json!({"services": [
            {"runDate": "2026-08-06", "locationDetail": {"gbttBookedDeparture": "0915"}},
            {"serviceUid": "NODATE", "locationDetail": {"gbttBookedDeparture": "0916"}},
            {"serviceUid": "  ", "runDate": "2026-08-06",
             "locationDetail": {"gbttBookedDeparture": "0917"}},
            service("BADTIME", json!({"gbttBookedDeparture": "9:15"})),
            service("NOLOC", json!(null)),
            service("OK", json!({
                "gbttBookedDeparture": "0920",
                "destination": [{"description": "Farringdon"}],
            })),
        ]});
        let source = MockSource::new(search.clone());

        let extraction = run(&source, &search, &options(8, false)).await;
        assert_eq!(extraction.services.len(), 1);
        assert_eq!(extraction.services[0].departure, t("0920"));
    }

    #[tokio::test]
    async fn missing_destination_and_platform_get_placeholders() {
        let search = json!({"services": [
            service("S1", json!({"gbttBookedDeparture": "0915", "platform": "   "})),
        ]});
        let source = MockSource::new(search.clone());

        let extraction = run(&source, &search, &options(8, false)).await;
        let s = &extraction.services[0];
        assert_eq!(s.destination, "Unknown");
        assert_eq!(s.platform, PLATFORM_PLACEHOLDER);
    }

    #[tokio::test]
    async fn alias_matches_when_detail_has_no_crs() {
        let search = json!({"services": [
            service("S1", json!({
                "gbttBookedDeparture": "0915",
                "destination": [{"description": "Farringdon"}],
            })),
        ]});
        let detail = json!({
            "locations": [
                {"description": "St Albans City"},
                {"description": "FARRINGDON", "gbttBookedArrival": "0945"}
            ]
        });
        let source = MockSource::new(search.clone()).with_detail("S1", detail);

        let extraction = run(&source, &search, &options(8, false)).await;
        assert_eq!(extraction.services[0].arrival, Some(t("0945")));
    }

    #[tokio::test]
    async fn realtime_arrival_preferred_with_booked_fallback() {
        let search = json!({"services": [
            service("RT", json!({
                "gbttBookedDeparture": "0915",
                "destination": [{"description": "Farringdon"}],
            })),
            service("BOOKED", json!({
                "gbttBookedDeparture": "0930",
                "destination": [{"description": "Farringdon"}],
            })),
        ]});
        let source = MockSource::new(search.clone())
            .with_detail(
                "RT",
                json!({"locations": [
                    {"crs": "ZFD", "realtimeArrival": "0947", "gbttBookedArrival": "0944"}
                ]}),
            )
            .with_detail(
                "BOOKED",
                json!({"locations": [
                    {"crs": "ZFD", "realtimeArrival": "delayed", "gbttBookedArrival": "1001"}
                ]}),
            );

        let extraction = run(&source, &search, &options(8, false)).await;
        assert_eq!(extraction.services[0].arrival, Some(t("0947")));
        // Unusable realtime value falls back to the booked arrival
        assert_eq!(extraction.services[1].arrival, Some(t("1001")));
    }

    #[tokio::test]
    async fn overnight_duration_wraps() {
        let search = json!({"services": [
            service("N1", json!({
                "gbttBookedDeparture": "2350",
                "destination": [{"description": "Farringdon"}],
            })),
        ]});
        let source = MockSource::new(search.clone()).with_detail("N1", zfd_arrival("0010"));

        let extraction = run(&source, &search, &options(8, false)).await;
        assert_eq!(extraction.services[0].duration_minutes, Some(20));
    }

    #[tokio::test]
    async fn empty_search_yields_message() {
        let search = json!({"services": []});
        let source = MockSource::new(search.clone());

        let extraction = run(&source, &search, &options(8, false)).await;
        assert!(extraction.services.is_empty());
        assert_eq!(extraction.message.as_deref(), Some("No services returned."));
    }

    #[tokio::test]
    async fn all_filtered_yields_no_matching_message() {
        let search = json!({"services": [
            service("PAST", json!({"gbttBookedDeparture": "0600"})),
        ]});
        let source = MockSource::new(search.clone());

        let extraction = run(&source, &search, &options(8, false)).await;
        assert!(extraction.services.is_empty());
        assert_eq!(
            extraction.message.as_deref(),
            Some("No matching services found.")
        );
    }

    #[tokio::test]
    async fn detail_failure_degrades_to_unknown_arrival() {
        let search = json!({"services": [
            service("S1", json!({
                "gbttBookedDeparture": "0915",
                "destination": [{"description": "Farringdon"}],
            })),
        ]});
        // No detail registered: the lookup 404s
        let source = MockSource::new(search.clone());

        let extraction = run(&source, &search, &options(8, false)).await;
        assert_eq!(extraction.services.len(), 1);
        assert!(extraction.services[0].arrival.is_none());
        assert!(extraction.services[0].duration_minutes.is_none());
    }

    #[tokio::test]
    async fn fetch_route_failure_carries_error_message() {
        let source = MockSource::failing(503);
        let route = Route::new("route_a", crs("SAC"), crs("ZFD"));

        let fetch = fetch_route(&source, &route, t("0700"), &options(8, false)).await;
        match fetch {
            RouteFetch::Failed { error } => {
                assert!(error.starts_with("Error fetching search:"), "{error}");
                assert!(error.contains("503"), "{error}");
            }
            RouteFetch::Done(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn missing_credentials_short_circuit_before_network() {
        let source = MockSource::failing(500);
        let route = Route::new("route_a", crs("SAC"), crs("ZFD"));
        let opts = FetchOptions {
            take: 8,
            fast_only: false,
            credentials_present: false,
        };

        let fetch = fetch_route(&source, &route, t("0700"), &opts).await;
        match fetch {
            RouteFetch::Done(extraction) => {
                assert!(extraction.services.is_empty());
                assert_eq!(extraction.message.as_deref(), Some(CREDENTIALS_MISSING));
            }
            RouteFetch::Failed { .. } => panic!("expected short-circuit"),
        }
        assert_eq!(source.search_count(), 0);
        assert!(source.detail_lookups().is_empty());
    }
}
