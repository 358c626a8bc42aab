//! Outbound Caller - An AI voice agent that places follow-up calls
//!
//! Dials a patient over a SIP trunk, lets a conversational agent confirm
//! their appointment, and hands the call to a human when asked.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::error::Result;
