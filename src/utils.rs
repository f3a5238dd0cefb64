#[macro_export]
macro_rules! enum_accessors {
    ($bind:ident $(($variant:ident($ty:ty) $get:ident $unwrap:ident $cvt:expr))*) => ($(
        /// Attempt to access the underlying value of this `Val`, returning
        /// `None` if it is not the correct type.
        #[inline]
        pub fn $get(&self) -> Option<$ty> {
            if let Self::$variant($bind) = self {
                Some($cvt)
            } else {
                None
            }
        }

        /// Returns the underlying value of this `Val`, panicking if it's the
        /// wrong type.
        ///
        /// # Panics
        ///
        /// Panics if `self` is not of the right type.
        #[inline]
        pub fn $unwrap(&self) -> $ty {
            self.$get().expect(concat!("expected ", stringify!($ty)))
        }
    )*)
}

/// The last path segment of `T`'s type name, with generic arguments kept.
///
/// `my_app::hosts::Counter` becomes `Counter`, `alloc::vec::Vec<u8>` becomes `Vec<u8>`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = core::any::type_name::<T>();
    let path_end = full.find('<').unwrap_or(full.len());
    match full[..path_end].rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::short_type_name;

    struct Counter;

    #[test_log::test]
    fn short_names() {
        assert_eq!(short_type_name::<Counter>(), "Counter");
        assert_eq!(short_type_name::<()>(), "()");
        assert_eq!(short_type_name::<alloc::vec::Vec<u8>>(), "Vec<u8>");
    }
}
