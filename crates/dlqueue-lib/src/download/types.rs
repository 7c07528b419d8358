use super::error::DownloadError;
use crate::engine::{OriginContext, SaveDialogOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadOptions {
    /// Target directory, must be absolute. Falls back to the platform default.
    pub directory: Option<PathBuf>,
    /// Overrides the engine-supplied filename.
    pub filename: Option<String>,
    pub overwrite: bool,
    /// Present the resolved path as the default of a save-as dialog instead of
    /// applying it directly.
    pub save_as: bool,
    pub dialog_options: Option<SaveDialogOptions>,
}

impl DownloadOptions {
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_save_as(mut self, dialog_options: Option<SaveDialogOptions>) -> Self {
        self.save_as = true;
        self.dialog_options = dialog_options;
        self
    }

    pub fn validate(&self) -> Result<(), DownloadError> {
        match &self.directory {
            Some(directory) if !directory.is_absolute() => Err(DownloadError::Configuration {
                directory: directory.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// A single queued download. Immutable once enqueued.
#[derive(Clone)]
pub struct DownloadRequest {
    pub origin: Arc<dyn OriginContext>,
    pub url: Url,
    pub options: DownloadOptions,
}

impl DownloadRequest {
    pub fn new(origin: Arc<dyn OriginContext>, url: Url, options: DownloadOptions) -> Self {
        Self {
            origin,
            url,
            options,
        }
    }
}

impl fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("origin", &self.origin.id())
            .field("url", &self.url.as_str())
            .field("options", &self.options)
            .finish()
    }
}

/// How a download settled when it didn't fail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Completed { save_path: Option<PathBuf> },
    Cancelled,
}
