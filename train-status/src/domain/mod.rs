//! Domain types for the train status poller.
//!
//! Types here are validated at construction, so downstream code can rely
//! on their invariants: CRS codes are uppercase, times are real clock
//! values, durations are non-negative.

mod route;
mod service;
mod state;
mod station;
mod time;

pub use route::{CacheKey, Route, RouteId};
pub use service::{ExtractedService, ServiceStatus};
pub use state::{
    LOADING_TEXT, RouteState, STALE_MARKER, ServiceEntry, StatusKind, StatusSnapshot,
};
pub use station::{Crs, InvalidCrs};
pub use time::{Hhmm, TimeError};
