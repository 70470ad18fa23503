//! Polling state machine.
//!
//! One long-lived task per poller. Each cycle runs the
//! client→extractor→formatter pipeline for every configured route in
//! sequence, publishes the combined status, and then waits: the normal
//! refresh interval after a good cycle, an exponentially growing delay
//! (capped) after failures. External events arrive through a single
//! entry point on the handle; an Immediate trigger supersedes whatever
//! wait is in progress.
//!
//! The inter-cycle wait is a `select!` between the trigger mailbox and
//! one timer, so the scheduler replaces timers rather than stacking
//! them, and cancelling the poller task cancels the pending wait with it.

mod mailbox;

pub use mailbox::Mailbox;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::RouteCache;
use crate::domain::{Hhmm, Route, RouteState, StatusKind, StatusSnapshot};
use crate::extract::{self, FetchOptions, RouteFetch};
use crate::format;
use crate::rtt::TimetableSource;

/// Refresh interval after a successful cycle.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(30);

/// Ceiling on the failure backoff delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Services accepted per route each cycle.
const DEFAULT_TAKE: usize = 8;

/// Why a poll cycle fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTrigger {
    /// External request: run now and reset the working delay.
    Immediate,
    /// The inter-cycle wait ran out.
    Scheduled,
}

/// Events delivered into the poller from the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalEvent {
    /// Connectivity came back; rebuild transports and refetch now.
    NetworkAvailable,
    /// A consumer asked for a refresh.
    RefreshRequested,
    /// The fast-only filter was switched.
    FastOnlyToggled(bool),
}

/// Poller tuning.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub refresh: Duration,
    pub max_backoff: Duration,
    /// Services accepted per route each cycle.
    pub take: usize,
    /// False when the process started without API credentials.
    pub credentials_present: bool,
    /// Initial fast-only mode.
    pub fast_only: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            refresh: DEFAULT_REFRESH,
            max_backoff: DEFAULT_MAX_BACKOFF,
            take: DEFAULT_TAKE,
            credentials_present: true,
            fast_only: false,
        }
    }
}

/// Next delay after a failed cycle.
///
/// From a standing start the first retry waits one refresh interval;
/// repeated failures double the wait up to the ceiling.
pub fn backoff(previous: Duration, refresh: Duration, max_backoff: Duration) -> Duration {
    if previous.is_zero() {
        refresh
    } else {
        (previous * 2).min(max_backoff)
    }
}

/// State shared between the poller task and its handles.
struct Shared {
    mailbox: Mailbox<PollTrigger>,
    status: watch::Sender<StatusSnapshot>,
    fast_only: AtomicBool,
    /// Set by `NetworkAvailable`; consumed at the top of the next cycle.
    rebuild_transports: AtomicBool,
}

/// Cloneable front door to a running poller: event delivery and status
/// reads for display consumers.
#[derive(Clone)]
pub struct PollerHandle {
    shared: Arc<Shared>,
    cache: Arc<RouteCache>,
}

impl PollerHandle {
    /// Deliver an external event. This is the only way anything outside
    /// the poller influences its state machine.
    pub fn notify(&self, event: ExternalEvent) {
        match event {
            ExternalEvent::NetworkAvailable => {
                self.shared.rebuild_transports.store(true, Ordering::SeqCst);
                // An error status is optimistically reset so the display
                // shows progress while the refetch runs.
                if self.shared.status.borrow().kind == StatusKind::Error {
                    self.shared.status.send_replace(StatusSnapshot::loading());
                }
                self.shared.mailbox.send(PollTrigger::Immediate);
            }
            ExternalEvent::RefreshRequested => {
                self.shared.mailbox.send(PollTrigger::Immediate);
            }
            ExternalEvent::FastOnlyToggled(enabled) => {
                self.shared.fast_only.store(enabled, Ordering::SeqCst);
                // The old key namespace must not serve data under the
                // new mode.
                self.cache.clear();
                self.shared.status.send_replace(StatusSnapshot::loading());
                self.shared.mailbox.send(PollTrigger::Immediate);
            }
        }
    }

    /// Latest published snapshot.
    pub fn status(&self) -> StatusSnapshot {
        self.shared.status.borrow().clone()
    }

    /// Subscribe to status updates.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.shared.status.subscribe()
    }

    /// Current fast-only mode.
    pub fn fast_only(&self) -> bool {
        self.shared.fast_only.load(Ordering::SeqCst)
    }
}

/// The polling loop and everything it owns.
pub struct Poller<S> {
    source: Arc<S>,
    routes: Vec<Route>,
    cache: Arc<RouteCache>,
    config: PollerConfig,
    shared: Arc<Shared>,
}

impl<S: TimetableSource> Poller<S> {
    pub fn new(
        source: Arc<S>,
        routes: Vec<Route>,
        cache: Arc<RouteCache>,
        config: PollerConfig,
    ) -> Self {
        let (status, _) = watch::channel(StatusSnapshot::loading());
        let shared = Arc::new(Shared {
            mailbox: Mailbox::new(),
            status,
            fast_only: AtomicBool::new(config.fast_only),
            rebuild_transports: AtomicBool::new(false),
        });
        Self {
            source,
            routes,
            cache,
            config,
            shared,
        }
    }

    /// Handle for event delivery and status reads.
    pub fn handle(&self) -> PollerHandle {
        PollerHandle {
            shared: Arc::clone(&self.shared),
            cache: Arc::clone(&self.cache),
        }
    }

    /// Run the polling loop until the owning task is cancelled.
    pub async fn run(self) {
        info!(routes = self.routes.len(), "poller started");

        let mut delay = Duration::ZERO;
        let mut trigger = PollTrigger::Immediate;

        loop {
            let previous_delay = delay;
            if trigger == PollTrigger::Immediate {
                delay = Duration::ZERO;
            }

            if self.shared.rebuild_transports.swap(false, Ordering::SeqCst) {
                if let Err(e) = self.source.invalidate().await {
                    warn!(error = %e, "transport rebuild failed");
                }
            }

            let failed = self.poll_cycle().await;

            delay = if failed {
                let base = match trigger {
                    PollTrigger::Immediate => Duration::ZERO,
                    PollTrigger::Scheduled => previous_delay,
                };
                let next = backoff(base, self.config.refresh, self.config.max_backoff);
                warn!(next_secs = next.as_secs(), "cycle failed, backing off");
                next
            } else {
                self.config.refresh
            };

            // One pending wait at a time: a trigger arriving during the
            // sleep supersedes it.
            trigger = tokio::select! {
                biased;
                t = self.shared.mailbox.recv() => t,
                _ = tokio::time::sleep(delay) => PollTrigger::Scheduled,
            };
        }
    }

    /// Fetch every route once and publish the combined status.
    ///
    /// Returns true when any route's search failed, which is what drives
    /// backoff. Empty results and missing credentials are data, not
    /// failures.
    async fn poll_cycle(&self) -> bool {
        let fast_only = self.shared.fast_only.load(Ordering::SeqCst);
        let options = FetchOptions {
            take: self.config.take,
            fast_only,
            credentials_present: self.config.credentials_present,
        };
        let now = Hhmm::from_time(chrono::Local::now().time());

        let mut states = Vec::with_capacity(self.routes.len());
        let mut failed = false;

        for route in &self.routes {
            let key = (route.id.clone(), fast_only);
            let state = match extract::fetch_route(self.source.as_ref(), route, now, &options).await
            {
                RouteFetch::Done(extraction) => {
                    debug!(route = %route.id, services = extraction.services.len(), "route fetched");
                    format::format_route(route, &extraction)
                }
                RouteFetch::Failed { error } => {
                    failed = true;
                    warn!(route = %route.id, error = %error, "route fetch failed");
                    self.fallback_state(&key, route, error)
                }
            };
            self.cache.update(key, state.clone());
            states.push(state);
        }

        let text = states
            .iter()
            .map(RouteState::to_text)
            .collect::<Vec<_>>()
            .join("\n\n");
        let kind = if failed {
            StatusKind::Error
        } else {
            StatusKind::Ok
        };
        self.shared.status.send_replace(StatusSnapshot { text, kind });

        failed
    }

    /// State shown for a route whose fetch failed: the previous good
    /// state with a stale marker when one exists, the error otherwise.
    fn fallback_state(
        &self,
        key: &crate::domain::CacheKey,
        route: &Route,
        error: String,
    ) -> RouteState {
        match self.cache.get(key) {
            Some(previous) if !previous.entries.is_empty() => previous.with_stale_marker(),
            _ => RouteState::message(route.title(), error),
        }
    }
}
