//! Download admission, sequencing and per-transfer lifecycle tracking.

mod error;
mod queue;
mod session;
mod types;

pub use error::DownloadError;
pub use queue::{DownloadHandle, DownloadQueue};
pub use session::{SessionResult, SessionState, TransferSession};
pub use types::{DownloadOptions, DownloadOutcome, DownloadRequest};
