//! Shared handler state

use crate::application::worker::JobRunner;
use crate::config::DispatchConfig;
use crate::domain::dispatch::Dispatcher;
use std::sync::Arc;

/// Values the dispatch form is prefilled with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDefaults {
    pub phone_number: String,
    pub transfer_to: String,
}

impl FormDefaults {
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            phone_number: config.default_phone_number.clone(),
            transfer_to: config.default_transfer_to.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<dyn Dispatcher>,
    pub jobs: Arc<dyn JobRunner>,
    pub form_defaults: FormDefaults,
}
