use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Log directory is empty: {0}")]
    EmptyLogDir(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid report template: {0}")]
    Template(String),
}

pub type Result<T> = std::result::Result<T, Error>;
