//! JSON DTOs for the read surface.

use serde::Serialize;

use crate::domain::{RouteState, ServiceEntry};

/// One route's display state, tagged with its id.
#[derive(Debug, Clone, Serialize)]
pub struct RouteStateDto {
    pub id: String,
    pub title: String,
    pub entries: Vec<ServiceEntry>,
    pub empty_message: String,
}

impl RouteStateDto {
    pub fn new(id: &str, state: RouteState) -> Self {
        Self {
            id: id.to_string(),
            title: state.title,
            entries: state.entries,
            empty_message: state.empty_message,
        }
    }
}

/// Response to a fast-only toggle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FastOnlyDto {
    pub fast_only: bool,
}
