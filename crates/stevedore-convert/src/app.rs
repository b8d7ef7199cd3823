//! Conversion pipeline: controllers, load, transform, print

use stevedore_core::{ConvertOptions, Result};
use tracing::debug;

use crate::controllers::select_controllers;
use crate::loader::get_loader;
use crate::printer::print_list;
use crate::transformer::{ResourceObject, get_transformer};

/// Load, transform and return the generated objects without writing them
///
/// Applies the controller defaults to `opt` first; any failure aborts the
/// pipeline.
pub fn convert_objects(opt: &mut ConvertOptions) -> Result<Vec<ResourceObject>> {
    select_controllers(opt)?;

    let loader = get_loader(&opt.input_format)?;
    let object = loader.load_file(&opt.input_files)?;

    debug!("Transforming for provider {}", opt.provider);
    let transformer = get_transformer(opt);
    transformer.transform(&object, opt)
}

/// Convert the configured compose files and write the result
pub fn convert(opt: &mut ConvertOptions) -> Result<()> {
    let objects = convert_objects(opt)?;
    print_list(&objects, opt)
}
