//! Descriptor file discovery

use std::fs;
use std::path::{Path, PathBuf};
use stevedore_core::{ConvertError, ConvertOptions, Result};
use tracing::debug;

/// Files looked for, in order, when no input file is given
pub const DEFAULT_COMPOSE_FILES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "container-compose.yml",
    "container-compose.yaml",
];

/// Fill `input_files` from the working directory if none were given
pub fn resolve_input_files(opt: &mut ConvertOptions) -> Result<()> {
    resolve(None, opt)
}

/// Fill `input_files` from `dir` if none were given
pub fn resolve_input_files_in(dir: &Path, opt: &mut ConvertOptions) -> Result<()> {
    resolve(Some(dir), opt)
}

fn resolve(dir: Option<&Path>, opt: &mut ConvertOptions) -> Result<()> {
    if !opt.input_files.is_empty() {
        return Ok(());
    }

    for name in DEFAULT_COMPOSE_FILES {
        let candidate = match dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        match fs::metadata(&candidate) {
            Ok(_) => {
                debug!("Using default compose file '{}'", candidate.display());
                opt.input_files = vec![candidate];
                return Ok(());
            }
            Err(e) => debug!("'{}' not found: {}", candidate.display(), e),
        }
    }

    Err(ConvertError::MissingDescriptorFile {
        searched: DEFAULT_COMPOSE_FILES.iter().map(|s| s.to_string()).collect(),
    })
}
