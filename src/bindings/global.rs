use crate::global::{BoundGlobal, GlobalField};
use crate::handle::{Handle, HandleKind};
use crate::store::StoreId;
use crate::types::GlobalType;
use alloc::string::String;
use alloc::sync::Arc;

/// Checks a host [`Global`](crate::Global) field against a global import.
pub(super) fn validate(field: &GlobalField, ty: &GlobalType) -> crate::Result<Result<(), String>> {
    if field.slot.get().is_some() {
        return Err(crate::Error::invalid_operation(
            "the global has already been bound to an instance",
        ));
    }
    if field.ty.kind != ty.kind {
        return Ok(Err(alloc::format!(
            "global type argument is expected to be of type '{}'",
            ty.kind
        )));
    }
    if field.ty.mutability != ty.mutability {
        return Ok(Err(alloc::format!(
            "global is expected to be {}",
            ty.mutability
        )));
    }
    Ok(Ok(()))
}

#[derive(Debug)]
pub(crate) struct GlobalBinding {
    field: GlobalField,
    handle: Option<(StoreId, Handle<wasmi::Global>)>,
}

impl GlobalBinding {
    pub fn new(field: GlobalField) -> Self {
        Self {
            field,
            handle: None,
        }
    }

    pub fn bind<H>(&mut self, ctx: &mut wasmi::Store<H>, store: StoreId) -> crate::Result<wasmi::Extern> {
        if self.handle.is_some() {
            return Err(crate::Error::invalid_operation("cannot bind more than once"));
        }
        let initial = self.field.initial.to_wasmi(self.field.ty.kind)?;
        let global = wasmi::Global::new(ctx, initial, self.field.ty.mutability.to_wasmi());
        self.handle = Some((store, Handle::new(HandleKind::Global, global)));
        Ok(global.into())
    }

    /// Hands the bound engine global to the host wrapper.
    pub fn commit(&mut self) -> crate::Result<()> {
        let (store, mut handle) = self
            .handle
            .take()
            .ok_or_else(|| crate::Error::invalid_operation("the global binding was never bound"))?;
        let global = handle.take()?;
        self.field
            .slot
            .set(BoundGlobal { store, global })
            .map_err(|_| crate::Error::invalid_operation("the global has already been bound to an instance"))
    }

    pub fn same_slot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.field.slot, &other.field.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mutability;
    use crate::values::ValueKind;
    use crate::Global;

    fn ty(kind: ValueKind, mutability: Mutability) -> GlobalType {
        GlobalType { kind, mutability }
    }

    #[test_log::test]
    fn kind_and_mutability_must_match() {
        let field = Global::new_mutable(0_i32).field();
        assert_eq!(
            validate(&field, &ty(ValueKind::Int32, Mutability::Var)).unwrap(),
            Ok(())
        );
        assert_eq!(
            validate(&field, &ty(ValueKind::Int32, Mutability::Const)).unwrap(),
            Err("global is expected to be immutable".into())
        );
        assert_eq!(
            validate(&field, &ty(ValueKind::Int64, Mutability::Var)).unwrap(),
            Err("global type argument is expected to be of type 'i64'".into())
        );

        let field = Global::new(0_i32).field();
        assert_eq!(
            validate(&field, &ty(ValueKind::Int32, Mutability::Var)).unwrap(),
            Err("global is expected to be mutable".into())
        );
    }
}
