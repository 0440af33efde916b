//! HTTP front end for the bracket engine.
//!
//! Exposes tournament lifecycle, registration, bracket generation and score
//! reporting over a JSON API, backed by PostgreSQL or process-local storage.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
