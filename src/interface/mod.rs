//! Interface layer - External interfaces
//!
//! This layer handles:
//! - The operator dispatch form
//! - Call job intake over JSON
//! - Health and Prometheus endpoints

pub mod api;
