//! Realtime Trains JSON API client.
//!
//! Key characteristics of the API as this crate uses it:
//! - Search results carry departure details only; arrivals at the
//!   destination require a per-service detail request
//! - Times are bare `"HHMM"` digit strings in UK local time
//! - Fields are omitted rather than sent as null, so every DTO field
//!   is optional

use std::future::Future;

mod client;
mod dns;
mod error;
mod types;

pub use client::{RttClient, RttConfig};
pub use dns::DohResolver;
pub use error::RttError;
pub use types::{
    CallLocation, LocationDetail, LocationRef, SearchResponse, SearchService,
    ServiceDetailResponse,
};

use crate::domain::Crs;

/// The timetable operations the extractor and poller consume.
///
/// `RttClient` is the production implementation; tests substitute
/// scripted sources so extraction and polling run without a network.
pub trait TimetableSource: Send + Sync {
    /// Search upcoming services between two stations from "now" onward.
    fn search(
        &self,
        origin: &Crs,
        dest: &Crs,
    ) -> impl Future<Output = Result<SearchResponse, RttError>> + Send;

    /// Fetch the per-stop timetable for one service run.
    fn service_detail(
        &self,
        uid: &str,
        run_date: &str,
    ) -> impl Future<Output = Result<ServiceDetailResponse, RttError>> + Send;

    /// Rebuild the underlying transport after a connectivity transition.
    ///
    /// Defaults to a no-op for sources without pooled connections.
    fn invalidate(&self) -> impl Future<Output = Result<(), RttError>> + Send {
        async { Ok(()) }
    }
}

impl TimetableSource for RttClient {
    fn search(
        &self,
        origin: &Crs,
        dest: &Crs,
    ) -> impl Future<Output = Result<SearchResponse, RttError>> + Send {
        RttClient::search(self, origin, dest)
    }

    fn service_detail(
        &self,
        uid: &str,
        run_date: &str,
    ) -> impl Future<Output = Result<ServiceDetailResponse, RttError>> + Send {
        RttClient::service_detail(self, uid, run_date)
    }

    fn invalidate(&self) -> impl Future<Output = Result<(), RttError>> + Send {
        RttClient::invalidate(self)
    }
}
