//! Shared kernel - Common types used across the call, dispatch and tool contexts

pub mod error;
pub mod phone_number;

pub use error::{DomainError, Result};
pub use phone_number::PhoneNumber;
