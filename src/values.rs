use crate::enum_accessors;
use crate::types::ResultShape;
use crate::wasm_unsupported;
use core::fmt;
use smallvec::SmallVec;
use wasmi::core::{ValType, F32, F64};

/// The closed set of scalar types that can cross the host/module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ValueKind {
    pub(crate) fn from_wasmparser(ty: wasmparser::ValType) -> crate::Result<Self> {
        match ty {
            wasmparser::ValType::I32 => Ok(Self::Int32),
            wasmparser::ValType::I64 => Ok(Self::Int64),
            wasmparser::ValType::F32 => Ok(Self::Float32),
            wasmparser::ValType::F64 => Ok(Self::Float64),
            ty => Err(wasm_unsupported!("value type {ty:?}")),
        }
    }

    pub(crate) fn to_wasmi(self) -> ValType {
        match self {
            Self::Int32 => ValType::I32,
            Self::Int64 => ValType::I64,
            Self::Float32 => ValType::F32,
            Self::Float64 => ValType::F64,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int32 => f.write_str("i32"),
            ValueKind::Int64 => f.write_str("i64"),
            ValueKind::Float32 => f.write_str("f32"),
            ValueKind::Float64 => f.write_str("f64"),
        }
    }
}

/// A scalar value that a WebAssembly module can consume or produce.
///
/// Floats are stored as their raw bits so NaN payloads and the sign of zero
/// survive every conversion unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Val {
    /// A 32-bit integer.
    I32(i32),
    /// A 64-bit integer.
    I64(i64),
    /// A 32-bit float.
    ///
    /// Note that the raw bits of the float are stored here, and you can use
    /// `f32::from_bits` to create an `f32` value.
    F32(u32),
    /// A 64-bit float.
    ///
    /// Note that the raw bits of the float are stored here, and you can use
    /// `f64::from_bits` to create an `f64` value.
    F64(u64),
}

impl Val {
    /// The zero value of the given kind.
    pub const fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int32 => Self::I32(0),
            ValueKind::Int64 => Self::I64(0),
            ValueKind::Float32 => Self::F32(0),
            ValueKind::Float64 => Self::F64(0),
        }
    }

    pub const fn kind(&self) -> ValueKind {
        match self {
            Val::I32(_) => ValueKind::Int32,
            Val::I64(_) => ValueKind::Int64,
            Val::F32(_) => ValueKind::Float32,
            Val::F64(_) => ValueKind::Float64,
        }
    }

    /// Converts this value into the engine representation of `kind`.
    ///
    /// The tag of `self` has to match `kind` exactly, no widening or narrowing
    /// takes place.
    pub(crate) fn to_wasmi(self, kind: ValueKind) -> crate::Result<wasmi::Val> {
        match (self, kind) {
            (Val::I32(v), ValueKind::Int32) => Ok(wasmi::Val::I32(v)),
            (Val::I64(v), ValueKind::Int64) => Ok(wasmi::Val::I64(v)),
            (Val::F32(bits), ValueKind::Float32) => Ok(wasmi::Val::F32(F32::from_bits(bits))),
            (Val::F64(bits), ValueKind::Float64) => Ok(wasmi::Val::F64(F64::from_bits(bits))),
            (val, kind) => Err(wasm_unsupported!(
                "value of type {} where {kind} was declared",
                val.kind()
            )),
        }
    }

    /// Converts an engine value back into its tagged host representation.
    pub(crate) fn from_wasmi(raw: &wasmi::Val) -> crate::Result<Self> {
        match raw {
            wasmi::Val::I32(v) => Ok(Val::I32(*v)),
            wasmi::Val::I64(v) => Ok(Val::I64(*v)),
            wasmi::Val::F32(v) => Ok(Val::F32(v.to_bits())),
            wasmi::Val::F64(v) => Ok(Val::F64(v.to_bits())),
            _ => Err(wasm_unsupported!("value kind {:?}", raw.ty())),
        }
    }

    enum_accessors! {
        e
        (I32(i32) i32 unwrap_i32 *e)
        (I64(i64) i64 unwrap_i64 *e)
        (F32(f32) f32 unwrap_f32 f32::from_bits(*e))
        (F64(f64) f64 unwrap_f64 f64::from_bits(*e))
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::I32(v) => write!(f, "{v}"),
            Val::I64(v) => write!(f, "{v}"),
            Val::F32(bits) => write!(f, "{}", f32::from_bits(*bits)),
            Val::F64(bits) => write!(f, "{}", f64::from_bits(*bits)),
        }
    }
}

impl From<i32> for Val {
    #[inline]
    fn from(val: i32) -> Val {
        Val::I32(val)
    }
}

impl From<i64> for Val {
    #[inline]
    fn from(val: i64) -> Val {
        Val::I64(val)
    }
}

impl From<f32> for Val {
    #[inline]
    fn from(val: f32) -> Val {
        Val::F32(val.to_bits())
    }
}

impl From<f64> for Val {
    #[inline]
    fn from(val: f64) -> Val {
        Val::F64(val.to_bits())
    }
}

/// A host scalar type with a fixed [`ValueKind`].
///
/// The mapping is `i32 ↔ Int32`, `i64 ↔ Int64`, `f32 ↔ Float32` and
/// `f64 ↔ Float64`; there are no other implementations.
pub trait WasmTy: Copy + Send + Sync + 'static {
    const KIND: ValueKind;

    fn into_val(self) -> Val;

    /// Returns `None` if `val` is not of kind [`Self::KIND`].
    fn from_val(val: Val) -> Option<Self>;
}

macro_rules! impl_wasm_ty {
    ($($ty:ty => $kind:ident $get:ident),*) => {$(
        impl WasmTy for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            #[inline]
            fn into_val(self) -> Val {
                Val::from(self)
            }

            #[inline]
            fn from_val(val: Val) -> Option<Self> {
                val.$get()
            }
        }
    )*};
}

impl_wasm_ty!(i32 => Int32 i32, i64 => Int64 i64, f32 => Float32 f32, f64 => Float64 f64);

/// An ordered, fixed-size list of results.
///
/// Implemented for `()`, for every [`WasmTy`] and for tuples of up to eight
/// elements whose elements are themselves `WasmResults`. Nested tuples are
/// flattened left to right, so `(i32, (i64, f32))` has the same slots as
/// `(i32, i64, f32)`.
pub trait WasmResults: Sized {
    /// The number of flattened result slots.
    const LEN: usize;

    /// The shape this type presents to the signature validator.
    fn shape() -> ResultShape;

    fn push_kinds(kinds: &mut SmallVec<[ValueKind; 4]>);

    /// Writes `self` into `slots`, which is exactly [`Self::LEN`] long.
    fn store(self, slots: &mut [Val]);

    /// Reads a value back from `slots`, which is exactly [`Self::LEN`] long.
    fn load(slots: &[Val]) -> Option<Self>;

    fn kinds() -> SmallVec<[ValueKind; 4]> {
        let mut kinds = SmallVec::new();
        Self::push_kinds(&mut kinds);
        kinds
    }
}

impl WasmResults for () {
    const LEN: usize = 0;

    fn shape() -> ResultShape {
        ResultShape::Unit
    }

    fn push_kinds(_kinds: &mut SmallVec<[ValueKind; 4]>) {}

    fn store(self, _slots: &mut [Val]) {}

    fn load(slots: &[Val]) -> Option<Self> {
        slots.is_empty().then_some(())
    }
}

impl<T: WasmTy> WasmResults for T {
    const LEN: usize = 1;

    fn shape() -> ResultShape {
        ResultShape::Scalar(T::KIND)
    }

    fn push_kinds(kinds: &mut SmallVec<[ValueKind; 4]>) {
        kinds.push(T::KIND);
    }

    fn store(self, slots: &mut [Val]) {
        slots[0] = self.into_val();
    }

    fn load(slots: &[Val]) -> Option<Self> {
        match slots {
            [val] => T::from_val(*val),
            _ => None,
        }
    }
}

macro_rules! impl_wasm_results_tuple {
    ($($t:ident)*) => {
        impl<$($t: WasmResults),*> WasmResults for ($($t,)*) {
            const LEN: usize = 0 $(+ $t::LEN)*;

            fn shape() -> ResultShape {
                ResultShape::Tuple(Self::kinds())
            }

            fn push_kinds(kinds: &mut SmallVec<[ValueKind; 4]>) {
                $($t::push_kinds(kinds);)*
            }

            #[allow(non_snake_case, reason = "tuple fields are bound to their type parameter names")]
            fn store(self, slots: &mut [Val]) {
                let ($($t,)*) = self;
                let mut offset = 0;
                $(
                    $t.store(&mut slots[offset..offset + <$t as WasmResults>::LEN]);
                    offset += <$t as WasmResults>::LEN;
                )*
                debug_assert_eq!(offset, slots.len());
            }

            fn load(slots: &[Val]) -> Option<Self> {
                if slots.len() != Self::LEN {
                    return None;
                }
                let mut offset = 0;
                Some(($({
                    let value = $t::load(&slots[offset..offset + <$t as WasmResults>::LEN])?;
                    offset += <$t as WasmResults>::LEN;
                    value
                },)*))
            }
        }
    };
}

impl_wasm_results_tuple!(A1);
impl_wasm_results_tuple!(A1 A2);
impl_wasm_results_tuple!(A1 A2 A3);
impl_wasm_results_tuple!(A1 A2 A3 A4);
impl_wasm_results_tuple!(A1 A2 A3 A4 A5);
impl_wasm_results_tuple!(A1 A2 A3 A4 A5 A6);
impl_wasm_results_tuple!(A1 A2 A3 A4 A5 A6 A7);
impl_wasm_results_tuple!(A1 A2 A3 A4 A5 A6 A7 A8);

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(val: Val) -> Val {
        let raw = val.to_wasmi(val.kind()).unwrap();
        Val::from_wasmi(&raw).unwrap()
    }

    #[test_log::test]
    fn marshaling_round_trips_every_kind() {
        for val in [
            Val::I32(i32::MIN),
            Val::I32(-1),
            Val::I64(i64::MAX),
            Val::F32(1.5_f32.to_bits()),
            Val::F64((-0.0_f64).to_bits()),
        ] {
            assert_eq!(round_trip(val), val);
        }
    }

    #[test_log::test]
    fn nan_payloads_are_preserved() {
        let quiet = Val::F32(0x7fc0_0001);
        let signalling = Val::F64(0x7ff0_0000_0000_0001);
        assert_eq!(round_trip(quiet), quiet);
        assert_eq!(round_trip(signalling), signalling);
    }

    #[test_log::test]
    fn no_implicit_widening() {
        let err = Val::I32(1).to_wasmi(ValueKind::Int64).unwrap_err();
        assert!(matches!(err, crate::Error::Unsupported(_)));
    }

    #[test_log::test]
    fn nested_tuples_flatten_left_to_right() {
        type Nested = (i32, (i64, f32), f64);
        assert_eq!(<Nested as WasmResults>::LEN, 4);
        assert_eq!(
            Nested::kinds().as_slice(),
            &[
                ValueKind::Int32,
                ValueKind::Int64,
                ValueKind::Float32,
                ValueKind::Float64
            ]
        );

        let mut slots = [Val::I32(0); 4];
        (1_i32, (2_i64, 3.0_f32), 4.0_f64).store(&mut slots);
        assert_eq!(
            slots,
            [Val::I32(1), Val::I64(2), Val::from(3.0_f32), Val::from(4.0_f64)]
        );
        assert_eq!(
            Nested::load(&slots),
            Some((1, (2, 3.0), 4.0))
        );
    }

    #[test_log::test]
    fn load_rejects_wrong_kinds() {
        assert_eq!(<(i32, i32)>::load(&[Val::I32(1), Val::I64(2)]), None);
        assert_eq!(<i64>::load(&[Val::I64(1), Val::I64(2)]), None);
        assert_eq!(<()>::load(&[]), Some(()));
    }

    #[test_log::test]
    fn shapes() {
        assert_eq!(<() as WasmResults>::shape(), ResultShape::Unit);
        assert_eq!(
            <f64 as WasmResults>::shape(),
            ResultShape::Scalar(ValueKind::Float64)
        );
        assert_eq!(
            <(i32,) as WasmResults>::shape(),
            ResultShape::Tuple(smallvec::smallvec![ValueKind::Int32])
        );
    }
}
