use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub downloads: DownloadsConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadsConfig {
    /// Default target directory. Must be absolute.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub user_agent: Option<String>,
}
