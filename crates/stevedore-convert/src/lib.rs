//! Stevedore Convert - compose to Kubernetes and OpenShift conversion
//!
//! The pipeline has five stages, each in its own module:
//!
//! | Stage | Module | Entry point |
//! |-------|--------|-------------|
//! | Flag validation | [`validate`] | [`validate_flags`] |
//! | Input discovery | [`input`] | [`resolve_input_files`] |
//! | Controller selection | [`controllers`] | [`select_controllers`] |
//! | Load + transform | [`loader`], [`transformer`] | [`convert_objects`] |
//! | Output | [`printer`] | [`print_list`] |
//!
//! [`convert`] runs the last three stages; the CLI runs the first two
//! before calling it.
//!
//! # Example
//!
//! ```no_run
//! use stevedore_convert::{convert, resolve_input_files, validate_flags};
//! use stevedore_core::{ConvertOptions, FlagState};
//!
//! let flags = FlagState::default();
//! let mut opt = ConvertOptions::from_flags(&flags);
//! opt.to_stdout = true;
//!
//! validate_flags(&[], &flags, &mut opt).unwrap();
//! resolve_input_files(&mut opt).unwrap();
//! convert(&mut opt).unwrap();
//! ```

pub mod app;
pub mod controllers;
pub mod input;
pub mod loader;
pub mod printer;
pub mod transformer;
pub mod validate;

// Re-exports
pub use app::{convert, convert_objects};
pub use controllers::select_controllers;
pub use input::{DEFAULT_COMPOSE_FILES, resolve_input_files, resolve_input_files_in};
pub use loader::{ComposeLoader, Loader, get_loader};
pub use printer::print_list;
pub use transformer::{
    Kubernetes, OpenShift, ResourceObject, Transformer, VALID_VOLUME_TYPES, get_transformer,
};
pub use validate::validate_flags;
