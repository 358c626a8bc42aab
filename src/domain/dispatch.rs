//! Call dispatch: asking the worker pool to run a new call job

use crate::domain::dial_info::DialInfo;
use crate::domain::shared::{DomainError, PhoneNumber, Result};
use async_trait::async_trait;
use thiserror::Error;

/// Shown when the operator submits the form without a number to call
pub const MISSING_PHONE_NUMBER: &str = "Please enter a phone number to call.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("dispatch command '{0}' not found")]
    NotFound(String),

    #[error("dispatch command exited with {status}")]
    CommandFailed {
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("dispatch I/O error: {0}")]
    Io(String),

    #[error("dispatch API error: {0}")]
    Api(String),
}

/// Validated dispatch request built from operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    dial_info: DialInfo,
}

impl DispatchRequest {
    /// Build from raw form fields. The phone number is required; an empty
    /// transfer number disables transfers for the call.
    pub fn from_form(phone_number: &str, transfer_to: &str) -> Result<Self> {
        if phone_number.trim().is_empty() {
            return Err(DomainError::ValidationError(
                MISSING_PHONE_NUMBER.to_string(),
            ));
        }

        let phone_number = PhoneNumber::parse(phone_number)?;
        let transfer_to = if transfer_to.trim().is_empty() {
            None
        } else {
            Some(PhoneNumber::parse(transfer_to)?)
        };

        Ok(Self {
            dial_info: DialInfo::new(phone_number, transfer_to),
        })
    }

    pub fn dial_info(&self) -> &DialInfo {
        &self.dial_info
    }

    pub fn phone_number(&self) -> &PhoneNumber {
        &self.dial_info.phone_number
    }

    pub fn metadata(&self) -> String {
        self.dial_info.to_metadata()
    }
}

/// Output of a successful dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub stdout: String,
    pub stderr: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: &DispatchRequest) -> std::result::Result<DispatchReceipt, DispatchError>;

    /// Human-readable name of the dispatch mechanism, used in operator messages
    fn program(&self) -> String;
}
