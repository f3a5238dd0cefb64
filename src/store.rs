use crate::config::Config;
use crate::engine::Engine;
use crate::handle::{Handle, HandleKind};
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Uniquely identifies a [`Store`] for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    fn allocate() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

/// Owns the engine store together with the host value `H` whose members
/// satisfy module imports.
///
/// Every global, memory, function and instance created through a store
/// remembers its [`StoreId`] and refuses to be used with any other store.
pub struct Store<H> {
    id: StoreId,
    config: Config,
    inner: Handle<wasmi::Store<H>>,
}

impl<H> fmt::Debug for Store<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("inner", &self.inner)
            .finish()
    }
}

impl<H> Store<H> {
    /// Creates a new store that owns `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if `engine` has been released.
    pub fn new(engine: &Engine, host: H) -> crate::Result<Self> {
        let id = StoreId::allocate();
        tracing::trace!(%id, "creating store");
        Ok(Self {
            id,
            config: *engine.config(),
            inner: Handle::new(HandleKind::Store, wasmi::Store::new(engine.wasmi()?, host)),
        })
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// # Errors
    ///
    /// Returns an error if the store has been released.
    pub fn host(&self) -> crate::Result<&H> {
        Ok(self.inner.get()?.data())
    }

    /// # Errors
    ///
    /// Returns an error if the store has been released.
    pub fn host_mut(&mut self) -> crate::Result<&mut H> {
        Ok(self.inner.get_mut()?.data_mut())
    }

    /// Releases the engine store and the host value it owns.
    ///
    /// Everything created through this store becomes unusable.
    pub fn release(&mut self) {
        self.inner.release();
    }

    pub fn is_released(&self) -> bool {
        !self.inner.is_valid()
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn wasmi(&self) -> crate::Result<&wasmi::Store<H>> {
        self.inner.get()
    }

    pub(crate) fn wasmi_mut(&mut self) -> crate::Result<&mut wasmi::Store<H>> {
        self.inner.get_mut()
    }

    pub(crate) fn ensure_same(&self, owner: StoreId, what: &str) -> crate::Result<()> {
        if owner == self.id {
            Ok(())
        } else {
            Err(crate::Error::invalid_operation(alloc::format!(
                "the {what} belongs to {owner} and cannot be used with {}",
                self.id
            )))
        }
    }
}
