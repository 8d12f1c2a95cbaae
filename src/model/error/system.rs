use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Config file not found")]
    ConfigNotFound(#[source] std::io::Error),

    #[error("Invalid config file")]
    InvalidConfig(#[source] toml::de::Error),
}
