//! Stevedore Core - Core types for the compose to Kubernetes converter
//!
//! This crate provides the foundational types used throughout stevedore:
//! - `ConvertOptions`: The resolved conversion configuration
//! - `FlagState`: Which provider-specific flags were set on the command line
//! - `ComposeObject`: The in-memory model of a compose project
//! - `ConvertError`: Errors shared by every pipeline stage

pub mod compose;
pub mod error;
pub mod options;

pub use compose::{BuildContext, ComposeObject, PortMapping, Protocol, ServiceConfig, VolumeMount};
pub use error::{ConvertError, ErrorClass, Result};
pub use options::{
    ControllerKind, ConvertOptions, DEFAULT_INPUT_FORMAT, DEFAULT_REPLICAS, DEFAULT_VOLUME_TYPE,
    Flag, FlagState, OutputFormat, Provider, STDOUT_SENTINEL,
};
