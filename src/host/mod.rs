//! Declaring which members of a host type satisfy which module imports.
//!
//! A host type implements [`Host`] and fills a [`HostBindings`] table with
//! one entry per import it can satisfy. The [`host_imports!`](crate::host_imports)
//! macro writes that implementation from a compact declaration:
//!
//! ```ignore
//! host_imports! {
//!     Counter {
//!         func "env" "tick" => tick,
//!         func "log" => log,
//!         global "env" "total" => total,
//!         memory "env" "memory" => memory,
//!     }
//! }
//! ```
//!
//! An entry with a single string binds an import whose module name is empty.

mod func;

pub use func::{HostFunc, HostReturn, IntoHostFunc};

use crate::global::{Global, GlobalField};
use crate::memory::{Memory, MemoryField};
use crate::utils::short_type_name;
use crate::values::WasmTy;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// A type whose members can be bound to module imports.
///
/// The default implementation declares no imports, which is enough to
/// instantiate modules that import nothing.
pub trait Host: Sized + 'static {
    /// Registers the members of `Self` that satisfy module imports.
    fn define(bindings: &mut HostBindings<Self>) {
        let _ = bindings;
    }
}

impl Host for () {}

/// The registration table of one host type: `(module, name)` to host member.
pub struct HostBindings<H> {
    host_type: &'static str,
    string2idx: HashMap<Arc<str>, usize>,
    strings: Vec<Arc<str>>,
    map: HashMap<ImportKey, SmallVec<[usize; 1]>>,
    members: Vec<HostMember<H>>,
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
struct ImportKey {
    module: usize,
    name: usize,
}

/// One registered member of a host type.
pub(crate) struct HostMember<H> {
    pub member: &'static str,
    pub target: HostTarget<H>,
}

pub(crate) enum HostTarget<H> {
    Func(HostFunc<H>),
    Global(Box<dyn Fn(&H) -> GlobalField + Send + Sync>),
    Memory(Box<dyn Fn(&H) -> MemoryField + Send + Sync>),
}

impl<H> HostTarget<H> {
    pub fn describe(&self) -> &'static str {
        match self {
            HostTarget::Func(_) => "function",
            HostTarget::Global(_) => "global",
            HostTarget::Memory(_) => "memory",
        }
    }

    /// Fields and methods never compete for the same import.
    pub fn is_field(&self) -> bool {
        !matches!(self, HostTarget::Func(_))
    }
}

impl<H> fmt::Debug for HostBindings<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries = f.debug_map();
        for (key, indices) in &self.map {
            for idx in indices {
                let member = &self.members[*idx];
                entries.entry(
                    &(&*self.strings[key.module], &*self.strings[key.name]),
                    &(member.member, member.target.describe()),
                );
            }
        }
        entries.finish()
    }
}

impl<H: Host> HostBindings<H> {
    /// Builds the table by running [`Host::define`].
    pub(crate) fn collect() -> Self {
        let mut bindings = Self {
            host_type: short_type_name::<H>(),
            string2idx: HashMap::new(),
            strings: Vec::new(),
            map: HashMap::new(),
            members: Vec::new(),
        };
        H::define(&mut bindings);
        tracing::trace!(host = bindings.host_type, members = bindings.members.len(), "collected host bindings");
        bindings
    }
}

impl<H: 'static> HostBindings<H> {
    /// Binds the function import `module.name` to `func`.
    ///
    /// `member` names the bound member in diagnostics.
    pub fn func<Params, Results>(
        &mut self,
        module: &str,
        name: &str,
        member: &'static str,
        func: impl IntoHostFunc<H, Params, Results>,
    ) -> &mut Self {
        self.host_func(module, name, member, func.into_host_func())
    }

    /// Binds the function import `module.name` to an already type-erased
    /// host function.
    pub fn host_func(
        &mut self,
        module: &str,
        name: &str,
        member: &'static str,
        func: HostFunc<H>,
    ) -> &mut Self {
        self.insert(module, name, member, HostTarget::Func(func))
    }

    /// Binds the global import `module.name` to the [`Global`] field
    /// returned by `field`.
    pub fn global<T: WasmTy>(
        &mut self,
        module: &str,
        name: &str,
        member: &'static str,
        field: fn(&H) -> &Global<T>,
    ) -> &mut Self {
        let target = HostTarget::Global(Box::new(move |host: &H| field(host).field()));
        self.insert(module, name, member, target)
    }

    /// Binds the memory import `module.name` to the [`Memory`] field
    /// returned by `field`.
    pub fn memory(
        &mut self,
        module: &str,
        name: &str,
        member: &'static str,
        field: fn(&H) -> &Memory,
    ) -> &mut Self {
        let target = HostTarget::Memory(Box::new(move |host: &H| field(host).field()));
        self.insert(module, name, member, target)
    }

    pub fn host_type(&self) -> &'static str {
        self.host_type
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Every member registered for exactly `module.name`, in registration
    /// order.
    pub(crate) fn candidates<'a>(
        &'a self,
        module: &str,
        name: &str,
    ) -> impl Iterator<Item = &'a HostMember<H>> + 'a {
        let indices = self
            .lookup_key(module, name)
            .and_then(|key| self.map.get(&key))
            .map_or(&[][..], |indices| indices.as_slice());
        indices.iter().map(|idx| &self.members[*idx])
    }

    fn insert(
        &mut self,
        module: &str,
        name: &str,
        member: &'static str,
        target: HostTarget<H>,
    ) -> &mut Self {
        let key = ImportKey {
            module: self.intern_str(module),
            name: self.intern_str(name),
        };
        let idx = self.members.len();
        self.members.push(HostMember { member, target });
        self.map.entry(key).or_default().push(idx);
        self
    }

    fn lookup_key(&self, module: &str, name: &str) -> Option<ImportKey> {
        Some(ImportKey {
            module: *self.string2idx.get(module)?,
            name: *self.string2idx.get(name)?,
        })
    }

    fn intern_str(&mut self, string: &str) -> usize {
        if let Some(idx) = self.string2idx.get(string) {
            return *idx;
        }
        let string: Arc<str> = string.into();
        let idx = self.strings.len();
        self.strings.push(Arc::clone(&string));
        self.string2idx.insert(string, idx);
        idx
    }
}

/// Implements [`Host`] for a type from a list of import declarations.
///
/// Each entry is `func`, `global` or `memory`, followed by the import's
/// module name and name (or just the name for an empty module name) and the
/// member that satisfies it. `func` members are methods taking `&mut self`,
/// `global` members are [`Global`] fields and `memory` members are
/// [`Memory`] fields.
#[macro_export]
macro_rules! host_imports {
    ($host:ident { $($entries:tt)* }) => {
        impl $crate::Host for $host {
            fn define(bindings: &mut $crate::HostBindings<Self>) {
                $crate::host_imports!(@entries $host bindings $($entries)*);
            }
        }
    };

    (@entries $host:ident $b:ident) => {};
    (@entries $host:ident $b:ident func $module:literal $name:literal => $member:ident $(, $($rest:tt)*)?) => {
        $b.func($module, $name, stringify!($member), <$host>::$member);
        $crate::host_imports!(@entries $host $b $($($rest)*)?);
    };
    (@entries $host:ident $b:ident func $name:literal => $member:ident $(, $($rest:tt)*)?) => {
        $b.func("", $name, stringify!($member), <$host>::$member);
        $crate::host_imports!(@entries $host $b $($($rest)*)?);
    };
    (@entries $host:ident $b:ident global $module:literal $name:literal => $field:ident $(, $($rest:tt)*)?) => {
        $b.global($module, $name, stringify!($field), |host: &$host| &host.$field);
        $crate::host_imports!(@entries $host $b $($($rest)*)?);
    };
    (@entries $host:ident $b:ident global $name:literal => $field:ident $(, $($rest:tt)*)?) => {
        $b.global("", $name, stringify!($field), |host: &$host| &host.$field);
        $crate::host_imports!(@entries $host $b $($($rest)*)?);
    };
    (@entries $host:ident $b:ident memory $module:literal $name:literal => $field:ident $(, $($rest:tt)*)?) => {
        $b.memory($module, $name, stringify!($field), |host: &$host| &host.$field);
        $crate::host_imports!(@entries $host $b $($($rest)*)?);
    };
    (@entries $host:ident $b:ident memory $name:literal => $field:ident $(, $($rest:tt)*)?) => {
        $b.memory("", $name, stringify!($field), |host: &$host| &host.$field);
        $crate::host_imports!(@entries $host $b $($($rest)*)?);
    };
}
