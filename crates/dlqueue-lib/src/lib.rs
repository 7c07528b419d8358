pub mod cli;
pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod http;
pub mod path;
pub mod queue;

pub use config::Config;
pub use download::{
    DownloadError, DownloadHandle, DownloadOptions, DownloadOutcome, DownloadQueue,
    DownloadRequest,
};
pub use error::DlQueueError;
