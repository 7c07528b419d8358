use super::Config;
use crate::error::DlQueueError;
use config::Config as ConfigBuilder;

pub const ENV_PREFIX: &str = "DLQUEUE";

/// Loads the optional config file and layers `DLQUEUE_*` environment
/// variables on top, e.g. `DLQUEUE_DOWNLOADS__DIRECTORY`.
pub fn load_config(config_path: Option<&str>) -> Result<Config, DlQueueError> {
    let mut builder = ConfigBuilder::builder();
    if let Some(config_path) = config_path {
        builder = builder.add_source(config::File::with_name(config_path));
    }

    let config_builder = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}
