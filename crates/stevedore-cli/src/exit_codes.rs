//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - conversion completed without errors
pub const SUCCESS: u8 = 0;

/// General error - unspecified failure
pub const ERROR: u8 = 1;

/// Validation error - inconsistent or invalid flags
pub const VALIDATION_ERROR: u8 = 2;

/// Input error - compose file missing, unreadable or malformed
pub const INPUT_ERROR: u8 = 4;

/// IO error - writing the generated manifests failed
pub const IO_ERROR: u8 = 5;

/// Usage error - arguments clap could not parse (following sysexits.h convention)
pub const USAGE_ERROR: u8 = 64;
