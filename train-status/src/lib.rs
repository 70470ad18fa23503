//! Train status poller.
//!
//! Polls the Realtime Trains API for a small fixed set of
//! origin→destination routes, derives a compact status per route, and
//! keeps the latest state available to display consumers with bounded
//! staleness.

pub mod cache;
pub mod config;
pub mod domain;
pub mod extract;
pub mod format;
pub mod poller;
pub mod rtt;
pub mod web;
