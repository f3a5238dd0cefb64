use crate::handle::{Handle, HandleKind};
use crate::store::{Store, StoreId};
use crate::types::FuncType;
use crate::values::{Val, WasmResults};
use alloc::string::{String, ToString};
use core::fmt;
use smallvec::SmallVec;

/// The results of a call to an exported function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnValue {
    /// The function has no results.
    Unit,
    Single(Val),
    /// The function has two or more results, in declared order.
    Tuple(SmallVec<[Val; 4]>),
}

impl ReturnValue {
    pub(crate) fn from_values(values: SmallVec<[Val; 4]>) -> Self {
        match values.as_slice() {
            [] => Self::Unit,
            [single] => Self::Single(*single),
            _ => Self::Tuple(values),
        }
    }

    /// All result values, in declared order.
    pub fn values(&self) -> &[Val] {
        match self {
            ReturnValue::Unit => &[],
            ReturnValue::Single(val) => core::slice::from_ref(val),
            ReturnValue::Tuple(values) => values,
        }
    }

    /// Decodes the results into a host type, flattening nested tuples left
    /// to right. Returns `None` if the number or kinds of values differ.
    pub fn typed<R: WasmResults>(&self) -> Option<R> {
        R::load(self.values())
    }
}

/// A function exported by an instance.
pub struct ExternFunction {
    name: String,
    ty: FuncType,
    store: StoreId,
    handle: Handle<wasmi::Func>,
}

impl fmt::Debug for ExternFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternFunction")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("store", &self.store)
            .field("handle", &self.handle)
            .finish()
    }
}

impl ExternFunction {
    pub(crate) fn new(name: String, ty: FuncType, store: StoreId, func: wasmi::Func) -> Self {
        Self {
            name,
            ty,
            store,
            handle: Handle::new(HandleKind::Function, func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FuncType {
        &self.ty
    }

    /// Calls the function with `args` and collects its results.
    ///
    /// Every argument has to carry exactly the kind of the corresponding
    /// parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument count or kinds don't match the
    /// function's parameters, if `store` is not the instance's store, if the
    /// function has been released, or a [`Trap`](crate::Error::Trap) if
    /// execution traps.
    pub fn call<H>(&self, store: &mut Store<H>, args: &[Val]) -> crate::Result<ReturnValue> {
        let mut results: SmallVec<[Val; 4]> =
            self.ty.results().iter().map(|kind| Val::zero(*kind)).collect();
        self.call_into(store, args, &mut results)?;
        Ok(ReturnValue::from_values(results))
    }

    /// Calls the function and decodes its results into `R`.
    ///
    /// # Errors
    ///
    /// Fails for any reason [`ExternFunction::call`] does, or with
    /// [`ResultType`](crate::Error::ResultType) if the results don't decode
    /// into `R`.
    pub fn call_typed<H, R: WasmResults>(&self, store: &mut Store<H>, args: &[Val]) -> crate::Result<R> {
        self.call(store, args)?
            .typed()
            .ok_or_else(|| crate::Error::ResultType {
                function: self.name.clone(),
                requested: core::any::type_name::<R>(),
            })
    }

    /// Calls the function, writing its results into `results`, which has to
    /// hold exactly one slot per result.
    ///
    /// # Errors
    ///
    /// See [`ExternFunction::call`].
    pub fn call_into<H>(&self, store: &mut Store<H>, args: &[Val], results: &mut [Val]) -> crate::Result<()> {
        store.ensure_same(self.store, "function")?;
        let func = *self.handle.get()?;

        let params = self.ty.params();
        if args.len() != params.len() {
            return Err(crate::Error::ArgumentCount {
                function: self.name.clone(),
                expected: params.len(),
                actual: args.len(),
            });
        }
        let inputs = args
            .iter()
            .zip(params)
            .enumerate()
            .map(|(index, (arg, kind))| {
                if arg.kind() == *kind {
                    arg.to_wasmi(*kind)
                } else {
                    Err(crate::Error::ArgumentType {
                        function: self.name.clone(),
                        index,
                        expected: *kind,
                        actual: arg.kind(),
                    })
                }
            })
            .collect::<crate::Result<SmallVec<[wasmi::Val; 8]>>>()?;

        let kinds = self.ty.results();
        if results.len() != kinds.len() {
            return Err(crate::Error::invalid_operation(alloc::format!(
                "function '{}' has {} result(s) but {} slot(s) were provided",
                self.name,
                kinds.len(),
                results.len()
            )));
        }
        let mut outputs = kinds
            .iter()
            .map(|kind| Val::zero(*kind).to_wasmi(*kind))
            .collect::<crate::Result<SmallVec<[wasmi::Val; 4]>>>()?;

        tracing::debug!(function = %self.name, args = args.len(), "calling export");
        func.call(store.wasmi_mut()?, &inputs, &mut outputs)
            .map_err(|err| crate::Error::Trap {
                message: err.to_string(),
            })?;

        for (slot, raw) in results.iter_mut().zip(&outputs) {
            *slot = Val::from_wasmi(raw)?;
        }
        Ok(())
    }

    pub(crate) fn release(&mut self) {
        self.handle.release();
    }
}
