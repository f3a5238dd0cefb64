use crate::handle::{Handle, HandleKind};
use crate::memory::{BoundMemory, MemoryField};
use crate::store::StoreId;
use crate::types::MemoryType;
use alloc::string::{String, ToString};
use alloc::sync::Arc;

/// Checks a host [`Memory`](crate::Memory) field against a memory import.
///
/// Both limits have to be equal, there is no negotiation.
pub(super) fn validate(field: &MemoryField, ty: &MemoryType) -> crate::Result<Result<(), String>> {
    if field.slot.get().is_some() {
        return Err(crate::Error::invalid_operation(
            "the memory has already been bound to an instance",
        ));
    }
    if field.ty.minimum != ty.minimum {
        return Ok(Err(alloc::format!(
            "memory does not have the expected minimum of {} page(s)",
            ty.minimum
        )));
    }
    if field.ty.maximum != ty.maximum {
        return Ok(Err(match ty.maximum {
            Some(maximum) => {
                alloc::format!("memory does not have the expected maximum of {maximum} page(s)")
            }
            None => "memory is expected to have no maximum".into(),
        }));
    }
    Ok(Ok(()))
}

#[derive(Debug)]
pub(crate) struct MemoryBinding {
    field: MemoryField,
    handle: Option<(StoreId, Handle<wasmi::Memory>)>,
}

impl MemoryBinding {
    pub fn new(field: MemoryField) -> Self {
        Self {
            field,
            handle: None,
        }
    }

    pub fn bind<H>(&mut self, ctx: &mut wasmi::Store<H>, store: StoreId) -> crate::Result<wasmi::Extern> {
        if self.handle.is_some() {
            return Err(crate::Error::invalid_operation("cannot bind more than once"));
        }
        let ty = wasmi::MemoryType::new(self.field.ty.minimum, self.field.ty.maximum)
            .map_err(|err| crate::Error::invalid_operation(err.to_string()))?;
        let memory = wasmi::Memory::new(ctx, ty)
            .map_err(|err| crate::Error::invalid_operation(err.to_string()))?;
        self.handle = Some((store, Handle::new(HandleKind::Memory, memory)));
        Ok(memory.into())
    }

    /// Hands the bound engine memory to the host wrapper.
    pub fn commit(&mut self) -> crate::Result<()> {
        let (store, mut handle) = self
            .handle
            .take()
            .ok_or_else(|| crate::Error::invalid_operation("the memory binding was never bound"))?;
        let memory = handle.take()?;
        self.field
            .slot
            .set(BoundMemory { store, memory })
            .map_err(|_| crate::Error::invalid_operation("the memory has already been bound to an instance"))
    }

    pub fn same_slot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.field.slot, &other.field.slot)
    }
}
