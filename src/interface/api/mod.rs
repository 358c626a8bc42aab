//! HTTP interface: dispatch form, job intake, health and metrics

pub mod dispatch_form;
pub mod dto;
pub mod health;
pub mod jobs_handler;
pub mod metrics_handler;
pub mod router;
pub mod state;

pub use metrics_handler::init_metrics;
pub use router::build_router;
pub use state::{AppState, FormDefaults};
