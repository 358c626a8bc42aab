//! Dial information carried in a call job's metadata
//!
//! The dispatcher serializes this record into the job metadata; the worker
//! reads it once at call setup and the tools reference it during the call.

use crate::domain::shared::{DomainError, PhoneNumber, Result};
use serde::{Deserialize, Serialize, Serializer};

/// Who to dial and where to transfer the caller when they ask for a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialInfo {
    pub phone_number: PhoneNumber,
    /// Written as `""` when absent
    #[serde(serialize_with = "empty_when_none")]
    pub transfer_to: Option<PhoneNumber>,
}

fn empty_when_none<S: Serializer>(
    number: &Option<PhoneNumber>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(number.as_ref().map(PhoneNumber::as_str).unwrap_or(""))
}

#[derive(Debug, Deserialize)]
struct RawDialInfo {
    phone_number: Option<String>,
    #[serde(default)]
    transfer_to: Option<String>,
}

impl DialInfo {
    pub fn new(phone_number: PhoneNumber, transfer_to: Option<PhoneNumber>) -> Self {
        Self {
            phone_number,
            transfer_to,
        }
    }

    /// Parse `{"phone_number": "...", "transfer_to": "..."}`.
    ///
    /// An empty `transfer_to` means the call cannot be transferred.
    pub fn from_metadata(metadata: &str) -> Result<Self> {
        let raw: RawDialInfo = serde_json::from_str(metadata).map_err(|e| {
            DomainError::ValidationError(format!("invalid job metadata: {}", e))
        })?;

        let phone_number = raw
            .phone_number
            .as_deref()
            .map(PhoneNumber::parse)
            .transpose()?
            .ok_or_else(|| {
                DomainError::ValidationError("job metadata is missing phone_number".to_string())
            })?;

        let transfer_to = match raw.transfer_to.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(number) => Some(PhoneNumber::parse(number)?),
        };

        Ok(Self {
            phone_number,
            transfer_to,
        })
    }

    /// Job metadata form of this record. Only string fields, so serialization cannot fail.
    pub fn to_metadata(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// The callee joins the room under its own phone number.
    pub fn participant_identity(&self) -> &str {
        self.phone_number.as_str()
    }
}
