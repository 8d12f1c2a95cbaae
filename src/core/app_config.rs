use crate::model::config::{Config, ConfigTable};
use crate::model::error::Error;
use crate::model::error::system::SystemError;
use std::fs;
use std::ops::Deref;
use std::path::Path;

const CONFIG_FILE_PATH: &str = "./config.toml";

pub struct AppConfig {
    config: Config,
}

impl AppConfig {
    pub fn new() -> Result<Self, Error> {
        Self::from_file(Path::new(CONFIG_FILE_PATH))
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let toml_string = fs::read_to_string(path).map_err(SystemError::ConfigNotFound)?;
        let config = toml::from_str::<ConfigTable>(&toml_string)
            .map_err(SystemError::InvalidConfig)?
            .config;
        Ok(Self { config })
    }
}

impl Deref for AppConfig {
    type Target = Config;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}
