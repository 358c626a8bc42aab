//! Agent session over the speech pipeline bridge

pub mod bridge;
pub mod protocol;

pub use bridge::BridgeSession;

use crate::domain::session::{AgentSession, SessionConnector, SessionError};
use async_trait::async_trait;
use std::sync::Arc;

/// Opens a fresh bridge connection for every call
#[derive(Debug, Clone)]
pub struct BridgeConnector {
    url: String,
}

impl BridgeConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl SessionConnector for BridgeConnector {
    async fn connect(&self) -> Result<Arc<dyn AgentSession>, SessionError> {
        let session = BridgeSession::connect(&self.url).await?;
        Ok(Arc::new(session))
    }
}
