//! Configuration loading.
//!
//! Sources, lowest precedence first: built-in defaults, `config/default.*`
//! (or the file passed explicitly), then `BRIDGE__*` environment variables.

mod settings;

use config::{Config, Environment, File};

use crate::config::settings::PartialSettings;
use crate::utils::error::Result;

pub use settings::{LogSettings, MqttSettings, ServerSettings, Settings};

const ENV_PREFIX: &str = "BRIDGE";
const DEFAULT_FILE: &str = "config/default";

/// Loads the configuration from `path` (or `config/default` when `None`) and the environment,
/// merged over `Settings::default()`.
///
/// An explicitly given file must exist. The default file is optional.
pub fn load_config(path: Option<&str>) -> Result<Settings> {
    let file = match path {
        Some(path) => File::with_name(path).required(true),
        None => File::with_name(DEFAULT_FILE).required(false),
    };

    let environment = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("mqtt.topics")
        .try_parsing(true);

    let config = Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()?;

    let partial: PartialSettings = config.try_deserialize()?;
    Ok(partial.merge_over(Settings::default()))
}
