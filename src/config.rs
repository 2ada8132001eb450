use std::path::{PathBuf};
use std::net::{SocketAddr};

use serde::Deserialize;
use config::{Config, ConfigError, File, Environment};

const APP_NAME: &'static str = "chef";

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub listen: SocketAddr,
    /// Answer 409 to a POST whose body matches a stored entity field by field.
    #[serde(default)]
    pub reject_duplicates: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub recipes_file: PathBuf,
    pub ingredients_file: PathBuf,
    /// Start from an empty collection when a data file is missing.
    #[serde(default)]
    pub create_missing: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: Api,
    pub storage: Storage,
}


impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        config.merge(File::with_name("config/default").required(true))?;
        config.merge(Environment::with_prefix(APP_NAME).separator("__"))?;
        config.try_into()
    }
}
