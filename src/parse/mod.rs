mod module_parser;

use crate::types::{ExportDescriptor, ImportDescriptor};
use alloc::vec::Vec;

pub(crate) use module_parser::ModuleParser;

/// The import and export descriptors of one module, in declared order.
#[derive(Debug, Default)]
pub(crate) struct ParsedDescriptors {
    pub imports: Vec<ImportDescriptor>,
    pub exports: Vec<ExportDescriptor>,
}
