use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Identifies the surface a download was requested from. Engines scope
/// transfer discovery by this id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginId(Arc<str>);

impl OriginId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Events delivered back to the requesting surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OriginEvent {
    DownloadStarted { url: Url },
}

pub trait OriginContext: Send + Sync {
    fn id(&self) -> OriginId;

    fn notify(&self, event: OriginEvent);
}

/// Origin that reports its events through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingOrigin {
    id: OriginId,
}

impl LoggingOrigin {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            id: OriginId::new(id),
        }
    }
}

impl OriginContext for LoggingOrigin {
    fn id(&self) -> OriginId {
        self.id.clone()
    }

    fn notify(&self, event: OriginEvent) {
        match event {
            OriginEvent::DownloadStarted { url } => {
                tracing::info!(origin = %self.id, url = %url, "Download started");
            }
        }
    }
}
