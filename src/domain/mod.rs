//! Domain layer - Call setup data, ports and fixed business answers
//!
//! This layer contains:
//! - Value objects: phone numbers, dial information
//! - Ports: call control (rooms, SIP), the agent session, dispatch
//! - Static answers: appointment availability and confirmation
//! - The scripted agent instructions

pub mod appointment;
pub mod call_control;
pub mod dial_info;
pub mod dispatch;
pub mod prompt;
pub mod session;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, PhoneNumber, Result};
