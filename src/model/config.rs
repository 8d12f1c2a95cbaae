use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct ConfigTable {
    #[serde(rename = "Config")]
    pub config: Config,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Directory holding the schedule store, the instance lock and logs.
    pub data_directory: PathBuf,
    /// Connection string of the operational database to back up.
    pub database_url: String,
}
