//! Status formatting.
//!
//! Renders an extraction into the display-ready `RouteState`: one
//! two-line block per service, a bounded entry list, and a fallback
//! message when there is nothing to show.

use crate::domain::{ExtractedService, Route, RouteState, ServiceEntry};
use crate::extract::Extraction;

/// Upper bound on rendered entries per route. List-style displays only
/// have room for this many.
pub const MAX_ENTRIES: usize = 8;

/// Render one route's extraction into its display state.
pub fn format_route(route: &Route, extraction: &Extraction) -> RouteState {
    let entries: Vec<ServiceEntry> = extraction
        .services
        .iter()
        .take(MAX_ENTRIES)
        .map(format_service)
        .collect();

    let empty_message = match &extraction.message {
        Some(message) => message.clone(),
        None => "No matching services found.".to_string(),
    };

    RouteState {
        title: route.title(),
        entries,
        empty_message,
    }
}

/// Render one service as its two-line block.
///
/// Line 1 carries the times and platform; line 2 the destination and
/// status, with an explicit note when no arrival could be resolved.
fn format_service(service: &ExtractedService) -> ServiceEntry {
    let line1 = match (service.arrival, service.duration_minutes) {
        (Some(arrival), Some(duration)) => format!(
            "{} → {} ({} min) • Platform {}",
            service.departure, arrival, duration, service.platform
        ),
        _ => format!("{} • Platform {}", service.departure, service.platform),
    };

    let eta_suffix = if service.arrival.is_none() {
        " • ETA unavailable"
    } else {
        ""
    };
    let line2 = format!("{} • {}{}", service.destination, service.status, eta_suffix);

    ServiceEntry { line1, line2 }
}
