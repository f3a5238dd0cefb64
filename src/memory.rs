use crate::handle::{Handle, HandleKind};
use crate::store::{Store, StoreId};
use crate::types::MemoryType;
use crate::{WASM32_MAX_PAGES, WASM_PAGE_SIZE};
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use core::ops::Range;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy)]
pub(crate) struct BoundMemory {
    pub store: StoreId,
    pub memory: wasmi::Memory,
}

pub(crate) type MemorySlot = Arc<OnceLock<BoundMemory>>;

/// Everything the binder needs to know about a [`Memory`] field of a host.
#[derive(Debug, Clone)]
pub(crate) struct MemoryField {
    pub ty: MemoryType,
    pub slot: MemorySlot,
}

/// A host-side linear memory that can satisfy a memory import.
///
/// The declared limits have to equal the import's limits exactly. Once
/// bound, the wrapper gives access to the memory's bytes.
pub struct Memory {
    ty: MemoryType,
    slot: MemorySlot,
}

impl Clone for Memory {
    fn clone(&self) -> Self {
        Self {
            ty: self.ty,
            slot: Arc::clone(&self.slot),
        }
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("ty", &self.ty)
            .field("slot", &self.slot.get())
            .finish()
    }
}

impl Memory {
    /// Declares a memory of `minimum` pages that may grow up to `maximum`
    /// pages.
    ///
    /// # Errors
    ///
    /// Returns an error if either limit exceeds [`WASM32_MAX_PAGES`] or
    /// `minimum` exceeds `maximum`.
    pub fn new(minimum: u32, maximum: Option<u32>) -> crate::Result<Self> {
        let limit = maximum.unwrap_or(minimum);
        if minimum > WASM32_MAX_PAGES || limit > WASM32_MAX_PAGES {
            return Err(crate::Error::invalid_operation(alloc::format!(
                "memory limits may not exceed {WASM32_MAX_PAGES} pages"
            )));
        }
        if minimum > limit {
            return Err(crate::Error::invalid_operation(alloc::format!(
                "memory minimum of {minimum} page(s) exceeds its maximum of {limit} page(s)"
            )));
        }

        Ok(Self {
            ty: MemoryType { minimum, maximum },
            slot: Arc::new(OnceLock::new()),
        })
    }

    pub fn minimum(&self) -> u32 {
        self.ty.minimum
    }

    pub fn maximum(&self) -> Option<u32> {
        self.ty.maximum
    }

    pub fn ty(&self) -> &MemoryType {
        &self.ty
    }

    pub fn is_bound(&self) -> bool {
        self.slot.get().is_some()
    }

    /// The current size in pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory is not bound through `store`.
    pub fn size<H>(&self, store: &Store<H>) -> crate::Result<u32> {
        Ok(pages(self.data(store)?.len()))
    }

    /// # Errors
    ///
    /// Returns an error if the memory is not bound through `store`.
    pub fn data<'a, H>(&self, store: &'a Store<H>) -> crate::Result<&'a [u8]> {
        let bound = self.bound(store)?;
        Ok(bound.memory.data(store.wasmi()?))
    }

    /// # Errors
    ///
    /// Returns an error if the memory is not bound through `store`.
    pub fn data_mut<'a, H>(&self, store: &'a mut Store<H>) -> crate::Result<&'a mut [u8]> {
        let bound = *self.bound(store)?;
        Ok(bound.memory.data_mut(store.wasmi_mut()?))
    }

    /// Copies `buf.len()` bytes starting at `offset` into `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory is not bound through `store` or the
    /// range is out of bounds.
    pub fn read<H>(&self, store: &Store<H>, offset: usize, buf: &mut [u8]) -> crate::Result<()> {
        read(self.data(store)?, offset, buf)
    }

    /// Copies `bytes` into the memory starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory is not bound through `store` or the
    /// range is out of bounds.
    pub fn write<H>(&self, store: &mut Store<H>, offset: usize, bytes: &[u8]) -> crate::Result<()> {
        write(self.data_mut(store)?, offset, bytes)
    }

    pub(crate) fn field(&self) -> MemoryField {
        MemoryField {
            ty: self.ty,
            slot: Arc::clone(&self.slot),
        }
    }

    fn bound<H>(&self, store: &Store<H>) -> crate::Result<&BoundMemory> {
        let bound = self.slot.get().ok_or_else(|| {
            crate::Error::invalid_operation("the memory cannot be used before it is instantiated")
        })?;
        store.ensure_same(bound.store, "memory")?;
        Ok(bound)
    }
}

/// A linear memory exported by an instance.
pub struct ExternMemory {
    name: String,
    ty: MemoryType,
    store: StoreId,
    handle: Handle<wasmi::Memory>,
}

impl fmt::Debug for ExternMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternMemory")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("store", &self.store)
            .field("handle", &self.handle)
            .finish()
    }
}

impl ExternMemory {
    pub(crate) fn new(name: String, ty: MemoryType, store: StoreId, memory: wasmi::Memory) -> Self {
        Self {
            name,
            ty,
            store,
            handle: Handle::new(HandleKind::Memory, memory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The limits the module declares for this memory.
    pub fn ty(&self) -> &MemoryType {
        &self.ty
    }

    /// # Errors
    ///
    /// Returns an error if the memory has been released or `store` is not
    /// the store its instance lives in.
    pub fn size<H>(&self, store: &Store<H>) -> crate::Result<u32> {
        Ok(pages(self.data(store)?.len()))
    }

    /// # Errors
    ///
    /// Returns an error if the memory has been released or `store` is not
    /// the store its instance lives in.
    pub fn data<'a, H>(&self, store: &'a Store<H>) -> crate::Result<&'a [u8]> {
        store.ensure_same(self.store, "memory")?;
        Ok(self.handle.get()?.data(store.wasmi()?))
    }

    /// # Errors
    ///
    /// Returns an error if the memory has been released or `store` is not
    /// the store its instance lives in.
    pub fn data_mut<'a, H>(&self, store: &'a mut Store<H>) -> crate::Result<&'a mut [u8]> {
        store.ensure_same(self.store, "memory")?;
        let memory = *self.handle.get()?;
        Ok(memory.data_mut(store.wasmi_mut()?))
    }

    /// # Errors
    ///
    /// See [`Memory::read`].
    pub fn read<H>(&self, store: &Store<H>, offset: usize, buf: &mut [u8]) -> crate::Result<()> {
        read(self.data(store)?, offset, buf)
    }

    /// # Errors
    ///
    /// See [`Memory::write`].
    pub fn write<H>(&self, store: &mut Store<H>, offset: usize, bytes: &[u8]) -> crate::Result<()> {
        write(self.data_mut(store)?, offset, bytes)
    }

    pub(crate) fn release(&mut self) {
        self.handle.release();
    }
}

fn pages(len: usize) -> u32 {
    let pages = len / WASM_PAGE_SIZE as usize;
    u32::try_from(pages).unwrap_or(u32::MAX)
}

fn range(data: &[u8], offset: usize, len: usize) -> crate::Result<Range<usize>> {
    offset
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .map(|end| offset..end)
        .ok_or(crate::Error::MemoryAccess { offset, len })
}

fn read(data: &[u8], offset: usize, buf: &mut [u8]) -> crate::Result<()> {
    let range = range(data, offset, buf.len())?;
    buf.copy_from_slice(&data[range]);
    Ok(())
}

fn write(data: &mut [u8], offset: usize, bytes: &[u8]) -> crate::Result<()> {
    let range = range(data, offset, bytes.len())?;
    data[range].copy_from_slice(bytes);
    Ok(())
}
