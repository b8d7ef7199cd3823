//! CLI error types with exit code handling

use miette::Diagnostic;
use stevedore_core::{ConvertError, ErrorClass};
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Flags are inconsistent with each other or with the provider
    #[error("{message}")]
    #[diagnostic(code(stevedore::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Compose input missing or malformed
    #[error("{message}")]
    #[diagnostic(code(stevedore::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (permissions, missing output directory, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(stevedore::cli::io))]
    Io { message: String },

    /// Internal error (serialization, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(stevedore::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Input { .. } => exit_codes::INPUT_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

fn help_for(err: &ConvertError) -> Option<String> {
    match err {
        ConvertError::FlagProviderMismatch { provider, .. } => Some(format!(
            "Drop the flag or pass --provider={}",
            provider.as_str()
        )),
        ConvertError::ControllerCardinality { .. } => Some(
            "Request a single controller kind, or omit --out/--stdout to write one file per object"
                .to_string(),
        ),
        ConvertError::MissingDescriptorFile { .. } => {
            Some("Pass the compose file explicitly with --file".to_string())
        }
        ConvertError::UnknownArguments(_) => {
            Some("Compose files are given with --file, not as positional arguments".to_string())
        }
        _ => None,
    }
}

impl From<ConvertError> for CliError {
    fn from(err: ConvertError) -> Self {
        let help = help_for(&err);
        let message = err.to_string();
        match err.class() {
            ErrorClass::Validation => CliError::Validation { message, help },
            ErrorClass::Input => CliError::Input { message, help },
            ErrorClass::Io => CliError::Io {
                message: match err {
                    ConvertError::Io(io) => io.to_string(),
                    other => other.to_string(),
                },
            },
            ErrorClass::Internal => CliError::Internal { message },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
