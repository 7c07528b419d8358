use crate::download::DownloadOptions;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone)]
pub struct FetchParams {
    pub urls: Vec<Url>,
    /// Applied to every queued URL.
    pub options: DownloadOptions,
    /// Fallback for requests without a directory; `None` uses the user's
    /// Downloads folder.
    pub default_directory: Option<PathBuf>,
    pub user_agent: Option<String>,
}
