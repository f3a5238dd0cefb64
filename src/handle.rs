use core::fmt;

/// What kind of engine object a [`Handle`] owns, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandleKind {
    Engine,
    Store,
    Module,
    Instance,
    Function,
    Global,
    Memory,
    Trampoline,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandleKind::Engine => "engine",
            HandleKind::Store => "store",
            HandleKind::Module => "module",
            HandleKind::Instance => "instance",
            HandleKind::Function => "function",
            HandleKind::Global => "global",
            HandleKind::Memory => "memory",
            HandleKind::Trampoline => "trampoline",
        };
        f.write_str(name)
    }
}

/// The single owner of one engine object.
///
/// A handle is either valid and owns its object, or invalid. It becomes
/// invalid through [`Handle::release`] or [`Handle::take`] and never becomes
/// valid again. Releasing an invalid handle is a no-op, and dropping a valid
/// handle releases it.
pub(crate) struct Handle<T> {
    kind: HandleKind,
    inner: Option<T>,
}

impl<T> Handle<T> {
    pub fn new(kind: HandleKind, inner: T) -> Self {
        Self {
            kind,
            inner: Some(inner),
        }
    }

    /// A second handle to the same shared object, or an invalid handle if
    /// this one has been released.
    pub fn share(&self) -> Self
    where
        T: Clone,
    {
        Self {
            kind: self.kind,
            inner: self.inner.clone(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    pub fn get(&self) -> crate::Result<&T> {
        self.inner.as_ref().ok_or_else(|| self.released_error())
    }

    pub fn get_mut(&mut self) -> crate::Result<&mut T> {
        let kind = self.kind;
        self.inner.as_mut().ok_or_else(|| released_error(kind))
    }

    /// Moves the object out, transferring ownership to the caller.
    pub fn take(&mut self) -> crate::Result<T> {
        let kind = self.kind;
        self.inner.take().ok_or_else(|| released_error(kind))
    }

    pub fn release(&mut self) {
        if let Some(inner) = self.inner.take() {
            tracing::trace!(kind = %self.kind, "releasing handle");
            drop(inner);
        }
    }

    fn released_error(&self) -> crate::Error {
        released_error(self.kind)
    }
}

fn released_error(kind: HandleKind) -> crate::Error {
    crate::Error::invalid_operation(alloc::format!("the {kind} handle has already been released"))
}

impl<T> Drop for Handle<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.kind)
            .field("valid", &self.inner.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;

    #[test_log::test]
    fn release_is_idempotent() {
        let object = Arc::new(());
        let mut handle = Handle::new(HandleKind::Global, Arc::clone(&object));
        assert!(handle.is_valid());
        assert_eq!(Arc::strong_count(&object), 2);

        handle.release();
        handle.release();
        assert!(!handle.is_valid());
        assert_eq!(Arc::strong_count(&object), 1);
        assert!(matches!(
            handle.get(),
            Err(crate::Error::InvalidOperation(_))
        ));
    }

    #[test_log::test]
    fn take_transfers_ownership() {
        let mut handle = Handle::new(HandleKind::Memory, 7_u32);
        assert_eq!(handle.take().unwrap(), 7);
        assert!(!handle.is_valid());
        assert!(handle.take().is_err());
    }

    #[test_log::test]
    fn get_mut_fails_once_released() {
        let mut handle = Handle::new(HandleKind::Memory, 1_u32);
        *handle.get_mut().unwrap() += 1;
        assert_eq!(*handle.get().unwrap(), 2);

        handle.release();
        assert!(matches!(
            handle.get_mut(),
            Err(crate::Error::InvalidOperation(_))
        ));
    }

    #[test_log::test]
    fn drop_releases() {
        let object = Arc::new(());
        {
            let _handle = Handle::new(HandleKind::Function, Arc::clone(&object));
        }
        assert_eq!(Arc::strong_count(&object), 1);
    }
}
