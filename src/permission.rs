use anyhow::Result;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Microphone permission source
///
/// Queried once per recording attempt. Implementations must not cache a
/// denial: a later attempt prompts again.
#[async_trait::async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn request_microphone(&self) -> Result<PermissionStatus>;
}

/// Answers every request the same way, from configuration
pub struct StaticPermission {
    granted: bool,
}

impl StaticPermission {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

#[async_trait::async_trait]
impl PermissionProvider for StaticPermission {
    async fn request_microphone(&self) -> Result<PermissionStatus> {
        let status = if self.granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        info!("Microphone permission: {:?}", status);
        Ok(status)
    }
}
