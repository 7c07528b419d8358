use thiserror::Error;

#[derive(Error, Debug)]
pub enum DlQueueError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid command-line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{failed} of {total} downloads failed")]
    DownloadsFailed { failed: usize, total: usize },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_downloads_summary_message() {
        let err = DlQueueError::DownloadsFailed {
            failed: 1,
            total: 3,
        };
        assert_eq!(err.to_string(), "1 of 3 downloads failed");
    }
}
