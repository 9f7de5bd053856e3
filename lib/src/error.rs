//! Errors that stop a simulation before it starts
use thiserror::Error;

use crate::process::Pid;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid process descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Duplicate process id: {0}")]
    DuplicatePid(Pid),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in {path}: {message}")]
    YamlParse { path: String, message: String },

    #[error(transparent)]
    Serde(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
