use crate::bindings::Binding;
use crate::func::{ExternFunction, ReturnValue};
use crate::global::ExternGlobal;
use crate::handle::{Handle, HandleKind};
use crate::host::{Host, HostBindings};
use crate::linker;
use crate::memory::ExternMemory;
use crate::module::Module;
use crate::store::{Store, StoreId};
use crate::types::ExternType;
use crate::values::{Val, WasmResults};
use crate::wasm_unsupported;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;

/// An export of an instance.
#[derive(Debug)]
pub enum Extern {
    Func(ExternFunction),
    Global(ExternGlobal),
    Memory(ExternMemory),
}

impl Extern {
    pub fn name(&self) -> &str {
        match self {
            Extern::Func(func) => func.name(),
            Extern::Global(global) => global.name(),
            Extern::Memory(memory) => memory.name(),
        }
    }

    pub fn as_func(&self) -> Option<&ExternFunction> {
        match self {
            Extern::Func(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_global(&self) -> Option<&ExternGlobal> {
        match self {
            Extern::Global(global) => Some(global),
            _ => None,
        }
    }

    pub fn as_memory(&self) -> Option<&ExternMemory> {
        match self {
            Extern::Memory(memory) => Some(memory),
            _ => None,
        }
    }

    fn release(&mut self) {
        match self {
            Extern::Func(func) => func.release(),
            Extern::Global(global) => global.release(),
            Extern::Memory(memory) => memory.release(),
        }
    }
}

/// One linkage of a module's imports to the members of a host.
pub struct Instance {
    module: Module,
    store: StoreId,
    /// Exports in declared order.
    externs: Vec<Extern>,
    /// Export name to index into `externs`.
    names: HashMap<String, usize>,
    trampolines: Vec<Handle<wasmi::Func>>,
    inner: Handle<wasmi::Instance>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("module", &self.module.name())
            .field("store", &self.store)
            .field("externs", &self.externs)
            .field("names", &self.names)
            .field("trampolines", &self.trampolines.len())
            .field("inner", &self.inner)
            .finish()
    }
}

impl Instance {
    /// Binds the host owned by `store` to the imports of `module` and
    /// instantiates it.
    ///
    /// Every import is resolved and validated before any engine object is
    /// created, so a missing or incompatible member leaves no trace. Imports
    /// are bound in declared order. Once instantiation succeeded, the host's
    /// global and memory wrappers forward to the engine objects created for
    /// them.
    ///
    /// # Errors
    ///
    /// - [`MissingImport`](crate::Error::MissingImport),
    ///   [`AmbiguousImport`](crate::Error::AmbiguousImport) or
    ///   [`Binding`](crate::Error::Binding) if the host cannot satisfy an import.
    /// - [`Unsupported`](crate::Error::Unsupported) for table imports or exports.
    /// - [`Instantiation`](crate::Error::Instantiation) if the engine refuses
    ///   to link or instantiate the module.
    /// - [`InstantiationTrap`](crate::Error::InstantiationTrap) if the start
    ///   function traps.
    /// - [`InvalidOperation`](crate::Error::InvalidOperation) if the store or
    ///   module has been released, or a wrapper of the host is already bound.
    pub fn new<H: Host>(store: &mut Store<H>, module: &Module) -> crate::Result<Self> {
        tracing::debug!(module = module.name(), "instantiating module");

        let compiled = module.wasmi()?.clone();
        if !wasmi::Engine::same(compiled.engine(), store.wasmi()?.engine()) {
            return Err(crate::Error::invalid_operation(alloc::format!(
                "module '{}' was compiled by a different engine than the store's",
                module.name()
            )));
        }

        if let Some(table) = module.exports().tables().next() {
            return Err(wasm_unsupported!("table export '{table}'"));
        }

        let mut bindings = collect_bindings(store, module)?;

        let store_id = store.id();
        let catch_panics = store.config().catches_host_panics();
        let ctx = store.wasmi_mut()?;
        let mut externs = Vec::with_capacity(bindings.len());
        for binding in &mut bindings {
            externs.push(binding.bind(ctx, store_id, catch_panics)?);
        }

        let linker = linker::link::<H>(
            ctx.engine(),
            module,
            bindings.iter().map(Binding::import).zip(externs),
        )?;

        let pre = linker
            .instantiate(&mut *ctx, &compiled)
            .map_err(|err| crate::Error::Instantiation {
                module: module.name().to_string(),
                message: err.to_string(),
            })?;
        let instance = pre
            .start(&mut *ctx)
            .map_err(|err| crate::Error::InstantiationTrap {
                module: module.name().to_string(),
                message: err.to_string(),
            })?;

        // ownership of the bound objects moves to the instance and the host
        let mut trampolines = Vec::new();
        for binding in &mut bindings {
            if let Some(trampoline) = binding.commit()? {
                trampolines.push(trampoline);
            }
        }
        drop(bindings);

        let (externs, names) = collect_exports(store, module, instance)?;

        tracing::debug!(
            module = module.name(),
            exports = externs.len(),
            trampolines = trampolines.len(),
            "instantiated module"
        );

        Ok(Self {
            module: module.clone(),
            store: store_id,
            externs,
            names,
            trampolines,
            inner: Handle::new(HandleKind::Instance, instance),
        })
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The exports, 1:1 with the module's export descriptors and in the same
    /// order.
    pub fn exports(&self) -> &[Extern] {
        &self.externs
    }

    pub fn get_export(&self, name: &str) -> Option<&Extern> {
        self.names.get(name).map(|idx| &self.externs[*idx])
    }

    /// Looks up a function export by name. A missing export is not an
    /// error here.
    pub fn get_func(&self, name: &str) -> Option<&ExternFunction> {
        self.get_export(name).and_then(Extern::as_func)
    }

    pub fn get_global(&self, name: &str) -> Option<&ExternGlobal> {
        self.get_export(name).and_then(Extern::as_global)
    }

    pub fn get_memory(&self, name: &str) -> Option<&ExternMemory> {
        self.get_export(name).and_then(Extern::as_memory)
    }

    /// Calls the function export `name` with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportNotFound`](crate::Error::ExportNotFound) if there is no
    /// function export of that name, and otherwise fails like
    /// [`ExternFunction::call`].
    pub fn call<H>(&self, store: &mut Store<H>, name: &str, args: &[Val]) -> crate::Result<ReturnValue> {
        self.func(name)?.call(store, args)
    }

    /// Calls the function export `name` and decodes its results into `R`.
    ///
    /// # Errors
    ///
    /// See [`Instance::call`] and [`ExternFunction::call_typed`].
    pub fn call_typed<H, R: WasmResults>(
        &self,
        store: &mut Store<H>,
        name: &str,
        args: &[Val],
    ) -> crate::Result<R> {
        self.func(name)?.call_typed(store, args)
    }

    /// Releases the exports, then the trampolines, then the instance itself.
    /// Releasing twice is a no-op.
    pub fn release(&mut self) {
        for ext in &mut self.externs {
            ext.release();
        }
        for trampoline in &mut self.trampolines {
            trampoline.release();
        }
        self.inner.release();
    }

    pub fn is_released(&self) -> bool {
        !self.inner.is_valid()
    }

    fn func(&self, name: &str) -> crate::Result<&ExternFunction> {
        self.get_func(name).ok_or_else(|| crate::Error::ExportNotFound {
            name: name.to_string(),
        })
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.release();
    }
}

/// Resolves and validates a binding for every import of `module`.
fn collect_bindings<H: Host>(store: &Store<H>, module: &Module) -> crate::Result<Vec<Binding<H>>> {
    let host_bindings = HostBindings::<H>::collect();
    let resolved = linker::resolve(&host_bindings, module)?;
    let host = store.host()?;

    let mut bindings: Vec<Binding<H>> = Vec::with_capacity(resolved.len());
    for resolution in resolved {
        let binding = Binding::new(
            host_bindings.host_type(),
            resolution.import,
            resolution.member,
            host,
        )?;
        if let Some(other) = bindings.iter().find(|other| other.shares_wrapper(&binding)) {
            return Err(crate::Error::invalid_operation(alloc::format!(
                "'{}' cannot be bound to both '{}' and '{}'",
                binding.member(),
                other.import(),
                binding.import()
            )));
        }
        bindings.push(binding);
    }

    Ok(bindings)
}

fn collect_exports<H>(
    store: &Store<H>,
    module: &Module,
    instance: wasmi::Instance,
) -> crate::Result<(Vec<Extern>, HashMap<String, usize>)> {
    let ctx = store.wasmi()?;
    let missing = |name: &str| crate::Error::Instantiation {
        module: module.name().to_string(),
        message: alloc::format!("export '{name}' is missing from the instance"),
    };

    let mut externs = Vec::with_capacity(module.exports().len());
    let mut names = HashMap::with_capacity(module.exports().len());
    for export in module.exports() {
        let name = export.name().to_string();
        let ext = match export.ty() {
            ExternType::Func(ty) => {
                let func = instance.get_func(ctx, &name).ok_or_else(|| missing(&name))?;
                Extern::Func(ExternFunction::new(name.clone(), ty.clone(), store.id(), func))
            }
            ExternType::Global(ty) => {
                let global = instance.get_global(ctx, &name).ok_or_else(|| missing(&name))?;
                Extern::Global(ExternGlobal::new(name.clone(), *ty, store.id(), global))
            }
            ExternType::Memory(ty) => {
                let memory = instance.get_memory(ctx, &name).ok_or_else(|| missing(&name))?;
                Extern::Memory(ExternMemory::new(name.clone(), *ty, store.id(), memory))
            }
            ExternType::Table(_) => return Err(wasm_unsupported!("table export '{name}'")),
        };
        names.insert(name, externs.len());
        externs.push(ext);
    }

    Ok((externs, names))
}
