//! Dispatcher implementations: the external CLI and the agent dispatch API

pub mod api;
pub mod cli;

pub use api::{new_room_name, ApiDispatcher};
pub use cli::CliDispatcher;
