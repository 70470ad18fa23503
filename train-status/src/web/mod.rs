//! Read surface for display consumers.
//!
//! This is the consumed-by interface of the system: the latest combined
//! status, per-route state for list displays, and the entry points
//! through which platform integrations deliver external events
//! (connectivity restored, manual refresh, filter toggle). Rendering
//! into an actual UI happens elsewhere.

mod dto;
mod routes;
mod state;

pub use dto::{FastOnlyDto, RouteStateDto};
pub use routes::create_router;
pub use state::AppState;
