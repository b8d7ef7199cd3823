//! Core error types

use std::path::PathBuf;
use thiserror::Error;

use crate::options::Provider;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{flag} is {} only flag", .provider.with_article())]
    FlagProviderMismatch { flag: String, provider: Provider },

    #[error("{0}")]
    OutputModeConflict(&'static str),

    #[error("--replicas cannot be negative (got {0})")]
    NegativeReplicas(i32),

    #[error("Unknown Argument(s): {}", .0.join(","))]
    UnknownArguments(Vec<String>),

    #[error("YAML and JSON format cannot be provided at the same time")]
    FormatConflict,

    #[error("Unknown Volume type: {given}, possible values are: {}", .valid.join(" "))]
    InvalidVolumeType { given: String, valid: Vec<String> },

    #[error(
        "only one kind of {} resource can be generated when --out or --stdout is specified",
        .provider.display_name()
    )]
    ControllerCardinality { provider: Provider },

    #[error("No 'docker-compose' file found (looked for {})", .searched.join(", "))]
    MissingDescriptorFile { searched: Vec<String> },

    #[error("Input file format '{0}' is not supported")]
    UnsupportedInputFormat(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown controller: {0}")]
    UnknownController(String),

    #[error("Failed to parse {}: {message}", .path.display())]
    ComposeParse { path: PathBuf, message: String },

    #[error("Invalid service '{service}': {message}")]
    InvalidService { service: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Broad error classes, used to pick process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Inconsistent or invalid options
    Validation,
    /// Descriptor missing, unreadable or malformed
    Input,
    /// Filesystem or stream failure while writing output
    Io,
    /// Serialization of generated objects failed
    Internal,
}

impl ConvertError {
    /// Classify this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::FlagProviderMismatch { .. }
            | Self::OutputModeConflict(_)
            | Self::NegativeReplicas(_)
            | Self::UnknownArguments(_)
            | Self::FormatConflict
            | Self::InvalidVolumeType { .. }
            | Self::ControllerCardinality { .. }
            | Self::UnknownProvider(_)
            | Self::UnknownController(_) => ErrorClass::Validation,
            Self::MissingDescriptorFile { .. }
            | Self::UnsupportedInputFormat(_)
            | Self::ComposeParse { .. }
            | Self::InvalidService { .. } => ErrorClass::Input,
            Self::Io(_) => ErrorClass::Io,
            Self::Yaml(_) | Self::Json(_) => ErrorClass::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
