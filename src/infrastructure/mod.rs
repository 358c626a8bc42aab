//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - The LiveKit server API client (rooms, SIP, agent dispatch)
//! - The WebSocket bridge to the speech pipeline
//! - Dispatcher implementations (CLI, API)
//! - Metrics recording

pub mod call_metrics;
pub mod dispatch;
pub mod livekit;
pub mod session;
