//! Application state for the read surface.

use std::sync::Arc;

use crate::cache::RouteCache;
use crate::domain::Route;
use crate::poller::PollerHandle;

/// Shared state behind every handler: the poller's front door, the
/// route cache the display reads, and the configured route list (which
/// fixes the ordering of responses).
#[derive(Clone)]
pub struct AppState {
    pub poller: PollerHandle,
    pub cache: Arc<RouteCache>,
    pub routes: Arc<Vec<Route>>,
}

impl AppState {
    pub fn new(poller: PollerHandle, cache: Arc<RouteCache>, routes: Vec<Route>) -> Self {
        Self {
            poller,
            cache,
            routes: Arc::new(routes),
        }
    }
}
