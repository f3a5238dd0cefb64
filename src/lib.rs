//! Binds host-declared functions, globals and linear memories to the imports of a
//! WebAssembly module and dispatches calls into the module's exports.
//!
//! A host type declares which of its members satisfy which `(module, name)`
//! import through the [`Host`] trait, usually via the [`host_imports!`] macro.
//! [`Module::instantiate`] resolves every import of the module against that
//! table, validates the shapes at bind time and links the resulting externs.
//!
//! ```ignore
//! use wasm_host::{host_imports, Engine, Global, Module, Store};
//!
//! struct Counter {
//!     calls: u32,
//!     total: Global<i64>,
//! }
//!
//! impl Counter {
//!     fn tick(&mut self, n: i32) -> i32 {
//!         self.calls += 1;
//!         n + 1
//!     }
//! }
//!
//! host_imports! {
//!     Counter {
//!         func "env" "tick" => tick,
//!         global "env" "total" => total,
//!     }
//! }
//!
//! let engine = Engine::default();
//! let module = Module::from_wat(&engine, "counter", WAT)?;
//! let mut store = Store::new(&engine, Counter { calls: 0, total: Global::new_mutable(0) })?;
//! let instance = module.instantiate(&mut store)?;
//! let ret = instance.call(&mut store, "run", &[41_i32.into()])?;
//! ```

extern crate alloc;
extern crate core;

mod bindings;
mod config;
mod engine;
mod errors;
mod func;
mod global;
mod handle;
mod host;
mod instance;
mod linker;
mod memory;
mod module;
mod parse;
mod store;
mod trampoline;
mod trap;
mod types;
mod utils;
mod values;

pub use config::Config;
pub use engine::Engine;
pub use errors::Error;
pub use func::{ExternFunction, ReturnValue};
pub use global::{ExternGlobal, Global};
pub use host::{Host, HostBindings, HostFunc, HostReturn, IntoHostFunc};
pub use instance::{Extern, Instance};
pub use memory::{ExternMemory, Memory};
pub use module::{Exports, Imports, Module};
pub use store::{Store, StoreId};
pub use trap::HostFault;
pub use types::{
    ExportDescriptor, ExternKind, ExternType, FuncType, GlobalType, ImportDescriptor,
    MemoryType, Mutability, ResultShape, TableType,
};
pub use values::{Val, ValueKind, WasmResults, WasmTy};

pub type Result<T> = core::result::Result<T, Error>;

/// WebAssembly page sizes are defined to be 64KiB.
pub const WASM_PAGE_SIZE: u32 = 0x10000;

/// The number of pages (for 32-bit memories) we can have before we run out of
/// byte index space.
pub const WASM32_MAX_PAGES: u32 = 1 << 16;
