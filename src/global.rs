use crate::handle::{Handle, HandleKind};
use crate::store::{Store, StoreId};
use crate::types::{GlobalType, Mutability};
use crate::values::{Val, ValueKind, WasmTy};
use crate::wasm_unsupported;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;
use std::sync::OnceLock;

/// The engine global a [`Global`] wrapper forwards to once bound.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoundGlobal {
    pub store: StoreId,
    pub global: wasmi::Global,
}

pub(crate) type GlobalSlot = Arc<OnceLock<BoundGlobal>>;

/// Everything the binder needs to know about a [`Global`] field of a host.
#[derive(Debug, Clone)]
pub(crate) struct GlobalField {
    pub ty: GlobalType,
    pub initial: Val,
    pub slot: GlobalSlot,
}

/// A host-side global that can satisfy a global import.
///
/// Before instantiation the wrapper only holds an initial value. Binding
/// creates an engine global from that value, after which [`Global::get`] and
/// [`Global::set`] read and write the engine global, so writes from either
/// side are visible to the other.
///
/// Clones share the binding: a clone taken out of the host before
/// instantiation observes the bound global afterwards.
pub struct Global<T> {
    initial: T,
    mutability: Mutability,
    slot: GlobalSlot,
}

impl<T: Clone> Clone for Global<T> {
    fn clone(&self) -> Self {
        Self {
            initial: self.initial.clone(),
            mutability: self.mutability,
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Global<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Global")
            .field("initial", &self.initial)
            .field("mutability", &self.mutability)
            .field("slot", &self.slot.get())
            .finish()
    }
}

impl<T: WasmTy> Global<T> {
    /// An immutable global.
    pub fn new(initial: T) -> Self {
        Self::with_mutability(initial, Mutability::Const)
    }

    pub fn new_mutable(initial: T) -> Self {
        Self::with_mutability(initial, Mutability::Var)
    }

    pub fn with_mutability(initial: T, mutability: Mutability) -> Self {
        Self {
            initial,
            mutability,
            slot: Arc::new(OnceLock::new()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        T::KIND
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn ty(&self) -> GlobalType {
        GlobalType {
            kind: T::KIND,
            mutability: self.mutability,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Reads the current value of the bound engine global.
    ///
    /// # Errors
    ///
    /// Returns an error if the wrapper has not been bound yet or was bound
    /// through a different store.
    pub fn get<H>(&self, store: &Store<H>) -> crate::Result<T> {
        let bound = self.bound(store)?;
        let raw = bound.global.get(store.wasmi()?);
        let val = Val::from_wasmi(&raw)?;
        T::from_val(val).ok_or_else(|| wasm_unsupported!("global of type {}", val.kind()))
    }

    /// Writes `value` to the bound engine global.
    ///
    /// # Errors
    ///
    /// Returns an error if the wrapper is immutable, has not been bound yet
    /// or was bound through a different store.
    pub fn set<H>(&self, store: &mut Store<H>, value: T) -> crate::Result<()> {
        let bound = *self.bound(store)?;
        if !self.mutability.is_mutable() {
            return Err(crate::Error::invalid_operation(
                "the value of the global cannot be modified",
            ));
        }
        let raw = value.into_val().to_wasmi(T::KIND)?;
        bound
            .global
            .set(store.wasmi_mut()?, raw)
            .map_err(|err| crate::Error::InvalidOperation(err.to_string()))
    }

    pub(crate) fn field(&self) -> GlobalField {
        GlobalField {
            ty: self.ty(),
            initial: self.initial.into_val(),
            slot: Arc::clone(&self.slot),
        }
    }

    fn bound<H>(&self, store: &Store<H>) -> crate::Result<&BoundGlobal> {
        let bound = self.slot.get().ok_or_else(|| {
            crate::Error::invalid_operation("the global cannot be used before it is instantiated")
        })?;
        store.ensure_same(bound.store, "global")?;
        Ok(bound)
    }
}

/// A global exported by an instance.
pub struct ExternGlobal {
    name: String,
    ty: GlobalType,
    store: StoreId,
    handle: Handle<wasmi::Global>,
}

impl fmt::Debug for ExternGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternGlobal")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("store", &self.store)
            .field("handle", &self.handle)
            .finish()
    }
}

impl ExternGlobal {
    pub(crate) fn new(name: String, ty: GlobalType, store: StoreId, global: wasmi::Global) -> Self {
        Self {
            name,
            ty,
            store,
            handle: Handle::new(HandleKind::Global, global),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &GlobalType {
        &self.ty
    }

    pub fn kind(&self) -> ValueKind {
        self.ty.kind
    }

    pub fn mutability(&self) -> Mutability {
        self.ty.mutability
    }

    /// # Errors
    ///
    /// Returns an error if the global has been released or `store` is not
    /// the store its instance lives in.
    pub fn get<H>(&self, store: &Store<H>) -> crate::Result<Val> {
        store.ensure_same(self.store, "global")?;
        let raw = self.handle.get()?.get(store.wasmi()?);
        Val::from_wasmi(&raw)
    }

    /// # Errors
    ///
    /// Returns an error if the global is immutable, `value` is not of the
    /// global's kind, the global has been released or `store` is not the
    /// store its instance lives in.
    pub fn set<H>(&self, store: &mut Store<H>, value: Val) -> crate::Result<()> {
        store.ensure_same(self.store, "global")?;
        if !self.ty.mutability.is_mutable() {
            return Err(crate::Error::invalid_operation(alloc::format!(
                "global export '{}' is immutable and cannot be modified",
                self.name
            )));
        }
        if value.kind() != self.ty.kind {
            return Err(crate::Error::invalid_operation(alloc::format!(
                "global export '{}' is of type '{}' but a value of type '{}' was given",
                self.name,
                self.ty.kind,
                value.kind()
            )));
        }
        let global = *self.handle.get()?;
        global
            .set(store.wasmi_mut()?, value.to_wasmi(self.ty.kind)?)
            .map_err(|err| crate::Error::InvalidOperation(err.to_string()))
    }

    pub(crate) fn release(&mut self) {
        self.handle.release();
    }
}
