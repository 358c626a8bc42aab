//! Application layer - Use cases
//!
//! This layer runs one call job end to end:
//! - Starting the agent session and dialing the callee
//! - Serving the agent's tool calls
//! - Tearing the call down

pub mod entrypoint;
pub mod outbound_caller;
pub mod tools;
pub mod worker;
