mod loader;
mod model;

pub use loader::{ENV_PREFIX, load_config};
pub use model::{Config, DownloadsConfig};
