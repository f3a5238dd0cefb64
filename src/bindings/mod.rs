//! Per-import bindings: a validated pairing of one import with one host
//! member, and the engine object created for it.
//!
//! A binding goes through three steps. [`Binding::new`] validates the host
//! member against the import without touching the engine. [`Binding::bind`]
//! creates the engine object, which the binding owns until
//! [`Binding::commit`] hands it over once instantiation succeeded. Dropping
//! an uncommitted binding releases whatever it created.

mod func;
mod global;
mod memory;

use crate::handle::{Handle, HandleKind};
use crate::host::{HostFunc, HostMember, HostTarget};
use crate::store::StoreId;
use crate::trampoline::new_trampoline;
use crate::types::{ExternType, FuncType, ImportDescriptor};
use crate::wasm_unsupported;
use alloc::string::{String, ToString};
use core::fmt;
use global::GlobalBinding;
use memory::MemoryBinding;

pub(crate) struct Binding<H> {
    import: ImportDescriptor,
    /// `HostType.member`
    member: String,
    kind: BindingKind<H>,
}

enum BindingKind<H> {
    Function(FunctionBinding<H>),
    Global(GlobalBinding),
    Memory(MemoryBinding),
}

struct FunctionBinding<H> {
    ty: FuncType,
    func: HostFunc<H>,
    handle: Option<Handle<wasmi::Func>>,
}

impl<H> fmt::Debug for Binding<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            BindingKind::Function(_) => "function",
            BindingKind::Global(_) => "global",
            BindingKind::Memory(_) => "memory",
        };
        f.debug_struct("Binding")
            .field("import", &self.import)
            .field("member", &self.member)
            .field("kind", &kind)
            .finish()
    }
}

impl<H: 'static> Binding<H> {
    /// Validates `member` against `import`.
    ///
    /// # Errors
    ///
    /// Returns a [`Binding`](crate::Error::Binding) error naming the violated
    /// rule, or an invalid operation error if a wrapper field is already
    /// bound.
    pub fn new(
        host_type: &str,
        import: &ImportDescriptor,
        member: &HostMember<H>,
        host: &H,
    ) -> crate::Result<Self> {
        let label = alloc::format!("{host_type}.{}", member.member);
        let fail = |reason: String| crate::Error::Binding {
            member: label.clone(),
            import: import.to_string(),
            reason,
        };

        let kind = match (import.ty(), &member.target) {
            (ExternType::Func(ty), HostTarget::Func(func)) => {
                func::validate(func, ty).map_err(fail)?;
                BindingKind::Function(FunctionBinding {
                    ty: ty.clone(),
                    func: func.clone(),
                    handle: None,
                })
            }
            (ExternType::Global(ty), HostTarget::Global(accessor)) => {
                let field = accessor(host);
                global::validate(&field, ty)?.map_err(fail)?;
                BindingKind::Global(GlobalBinding::new(field))
            }
            (ExternType::Memory(ty), HostTarget::Memory(accessor)) => {
                let field = accessor(host);
                memory::validate(&field, ty)?.map_err(fail)?;
                BindingKind::Memory(MemoryBinding::new(field))
            }
            (ExternType::Table(_), _) => {
                return Err(wasm_unsupported!("table import '{import}'"));
            }
            (ty, _) => {
                return Err(fail(alloc::format!(
                    "member is expected to be a {}",
                    ty.kind()
                )));
            }
        };

        tracing::trace!(import = %import, member = %label, "validated binding");
        Ok(Self {
            import: import.clone(),
            member: label,
            kind,
        })
    }

    pub fn import(&self) -> &ImportDescriptor {
        &self.import
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    /// Whether `self` and `other` would bind the same host wrapper.
    pub fn shares_wrapper(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (BindingKind::Global(a), BindingKind::Global(b)) => a.same_slot(b),
            (BindingKind::Memory(a), BindingKind::Memory(b)) => a.same_slot(b),
            _ => false,
        }
    }

    /// Creates the engine object for this binding.
    ///
    /// # Errors
    ///
    /// Returns an invalid operation error if the binding is already bound.
    pub fn bind(
        &mut self,
        ctx: &mut wasmi::Store<H>,
        store: StoreId,
        catch_panics: bool,
    ) -> crate::Result<wasmi::Extern> {
        tracing::trace!(import = %self.import, member = %self.member, "binding import");
        match &mut self.kind {
            BindingKind::Function(binding) => {
                if binding.handle.is_some() {
                    return Err(crate::Error::invalid_operation("cannot bind more than once"));
                }
                let func = new_trampoline(
                    ctx,
                    self.import.to_string(),
                    &binding.ty,
                    binding.func.clone(),
                    catch_panics,
                );
                binding.handle = Some(Handle::new(HandleKind::Trampoline, func));
                Ok(func.into())
            }
            BindingKind::Global(binding) => binding.bind(ctx, store),
            BindingKind::Memory(binding) => binding.bind(ctx, store),
        }
    }

    /// Transfers the bound engine object to its new owner.
    ///
    /// Global and memory wrappers of the host start forwarding to their
    /// engine objects. For functions the trampoline handle is returned so the
    /// instance can keep it alive.
    pub fn commit(&mut self) -> crate::Result<Option<Handle<wasmi::Func>>> {
        match &mut self.kind {
            BindingKind::Function(binding) => binding.handle.take().map(Some).ok_or_else(|| {
                crate::Error::invalid_operation("the function binding was never bound")
            }),
            BindingKind::Global(binding) => binding.commit().map(|()| None),
            BindingKind::Memory(binding) => binding.commit().map(|()| None),
        }
    }
}
