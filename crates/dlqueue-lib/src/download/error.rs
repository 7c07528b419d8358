use crate::engine::TransferState;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single queued download failed. Reported only through that
/// download's handle; the queue itself keeps running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    #[error("The `directory` option must be an absolute path, got {}", .directory.display())]
    Configuration { directory: PathBuf },

    #[error("The download of {filename} was interrupted")]
    Interrupted { filename: String },

    #[error("Default download directory is unavailable: {reason}")]
    DefaultDirectory { reason: String },

    #[error("Download engine dropped the transfer of {url} before it finished")]
    EngineDisconnected { url: String },

    #[error("Download of {filename} ended in non-terminal state {state}")]
    UnexpectedTerminalState {
        filename: String,
        state: TransferState,
    },

    #[error("Download of {url} was removed from the queue before it started")]
    Dequeued { url: String },

    #[error("Download of {url} was abandoned by the queue")]
    Abandoned { url: String },
}
