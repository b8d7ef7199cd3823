//! Descriptor loaders

pub mod compose;

use std::path::PathBuf;
use stevedore_core::{ComposeObject, ConvertError, Result};

pub use compose::ComposeLoader;

/// Turns descriptor files into the compose object model
pub trait Loader {
    /// Load and merge `files`, later files overriding earlier ones
    fn load_file(&self, files: &[PathBuf]) -> Result<ComposeObject>;
}

/// Get the loader for an input format
pub fn get_loader(format: &str) -> Result<Box<dyn Loader>> {
    match format {
        "compose" => Ok(Box::new(ComposeLoader::new())),
        other => Err(ConvertError::UnsupportedInputFormat(other.to_string())),
    }
}
