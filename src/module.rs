use crate::engine::Engine;
use crate::handle::{Handle, HandleKind};
use crate::host::Host;
use crate::instance::Instance;
use crate::parse::ModuleParser;
use crate::store::Store;
use crate::types::{ExportDescriptor, ExternKind, ImportDescriptor};
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

/// A compiled WebAssembly module together with its import and export
/// descriptors.
///
/// Cloning a module shares the compiled code. Releasing one clone does not
/// affect other clones or instances created from it.
pub struct Module {
    meta: Arc<ModuleMeta>,
    inner: Handle<wasmi::Module>,
}

struct ModuleMeta {
    name: String,
    imports: Imports,
    exports: Exports,
}

impl Clone for Module {
    fn clone(&self) -> Self {
        Self {
            meta: Arc::clone(&self.meta),
            inner: self.inner.share(),
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.meta.name)
            .field("imports", &self.meta.imports)
            .field("exports", &self.meta.exports)
            .field("inner", &self.inner)
            .finish()
    }
}

impl Module {
    /// Compiles a module from its binary encoding.
    ///
    /// `name` identifies the module in diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine has been released, if the engine
    /// rejects the binary, or if an import or export uses a construct that
    /// cannot cross the host boundary.
    pub fn new(engine: &Engine, name: &str, bytes: &[u8]) -> crate::Result<Self> {
        tracing::trace!(name, len = bytes.len(), "compiling module");

        let compiled =
            wasmi::Module::new(engine.wasmi()?, bytes).map_err(|err| crate::Error::InvalidModule {
                name: name.to_string(),
                message: err.to_string(),
            })?;
        let parsed = ModuleParser::default().parse(bytes)?;

        Ok(Self {
            meta: Arc::new(ModuleMeta {
                name: name.to_string(),
                imports: Imports(parsed.imports),
                exports: Exports(parsed.exports),
            }),
            inner: Handle::new(HandleKind::Module, compiled),
        })
    }

    /// Compiles a module from the WebAssembly text format.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not well-formed or for any reason listed
    /// on [`Module::new`].
    pub fn from_wat(engine: &Engine, name: &str, text: &str) -> crate::Result<Self> {
        let bytes = wat::parse_str(text).map_err(|err| crate::Error::InvalidModule {
            name: name.to_string(),
            message: err.to_string(),
        })?;
        Self::new(engine, name, &bytes)
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn imports(&self) -> &Imports {
        &self.meta.imports
    }

    pub fn exports(&self) -> &Exports {
        &self.meta.exports
    }

    /// Binds the host owned by `store` to this module's imports and
    /// instantiates it. See [`Instance::new`].
    ///
    /// # Errors
    ///
    /// See [`Instance::new`].
    pub fn instantiate<H: Host>(&self, store: &mut Store<H>) -> crate::Result<Instance> {
        Instance::new(store, self)
    }

    pub fn release(&mut self) {
        self.inner.release();
    }

    pub fn is_released(&self) -> bool {
        !self.inner.is_valid()
    }

    pub(crate) fn wasmi(&self) -> crate::Result<&wasmi::Module> {
        self.inner.get()
    }
}

/// The imports of a module in declared order.
#[derive(Debug, Clone, Default)]
pub struct Imports(Vec<ImportDescriptor>);

impl Imports {
    pub fn all(&self) -> &[ImportDescriptor] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, ImportDescriptor> {
        self.0.iter()
    }

    pub fn functions(&self) -> impl Iterator<Item = &ImportDescriptor> + '_ {
        self.of_kind(ExternKind::Function)
    }

    pub fn globals(&self) -> impl Iterator<Item = &ImportDescriptor> + '_ {
        self.of_kind(ExternKind::Global)
    }

    pub fn memories(&self) -> impl Iterator<Item = &ImportDescriptor> + '_ {
        self.of_kind(ExternKind::Memory)
    }

    pub fn tables(&self) -> impl Iterator<Item = &ImportDescriptor> + '_ {
        self.of_kind(ExternKind::Table)
    }

    fn of_kind(&self, kind: ExternKind) -> impl Iterator<Item = &ImportDescriptor> + '_ {
        self.0.iter().filter(move |import| import.kind() == kind)
    }
}

impl<'a> IntoIterator for &'a Imports {
    type Item = &'a ImportDescriptor;
    type IntoIter = core::slice::Iter<'a, ImportDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The exports of a module in declared order.
#[derive(Debug, Clone, Default)]
pub struct Exports(Vec<ExportDescriptor>);

impl Exports {
    pub fn all(&self) -> &[ExportDescriptor] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, ExportDescriptor> {
        self.0.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ExportDescriptor> {
        self.0.iter().find(|export| export.name() == name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &ExportDescriptor> + '_ {
        self.of_kind(ExternKind::Function)
    }

    pub fn globals(&self) -> impl Iterator<Item = &ExportDescriptor> + '_ {
        self.of_kind(ExternKind::Global)
    }

    pub fn memories(&self) -> impl Iterator<Item = &ExportDescriptor> + '_ {
        self.of_kind(ExternKind::Memory)
    }

    pub fn tables(&self) -> impl Iterator<Item = &ExportDescriptor> + '_ {
        self.of_kind(ExternKind::Table)
    }

    fn of_kind(&self, kind: ExternKind) -> impl Iterator<Item = &ExportDescriptor> + '_ {
        self.0.iter().filter(move |export| export.kind() == kind)
    }
}

impl<'a> IntoIterator for &'a Exports {
    type Item = &'a ExportDescriptor;
    type IntoIter = core::slice::Iter<'a, ExportDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
