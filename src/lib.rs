//! FlowForge Console - operator console core for the FlowForge supervision daemon
//!
//! This library reconstructs a live, navigable incident timeline from the
//! daemon's HTTP/SSE API: it normalizes untrusted payloads into a typed domain
//! model, groups events into incident chains, reconciles polled snapshots with
//! the push stream, and keeps the selected incident consistent with a shareable
//! deep link.

pub mod cli;
pub mod client;
pub mod config;
pub mod exposition;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod selection;
pub mod session;
pub mod stats;
pub mod stream;
pub mod timeline;
pub mod trace;
