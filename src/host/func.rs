use crate::trap::HostFault;
use crate::types::ResultShape;
use crate::values::{Val, ValueKind, WasmResults, WasmTy};
use alloc::string::ToString;
use alloc::sync::Arc;
use core::fmt;
use smallvec::{smallvec, SmallVec};

type Callback<H> = dyn Fn(&mut H, &[Val], &mut [Val]) -> Result<(), HostFault> + Send + Sync;

/// A host function in its type-erased form, ready to be bound to a function
/// import.
///
/// Carries the parameter kinds and result shape that the signature
/// validator checks against the import.
pub struct HostFunc<H> {
    params: SmallVec<[ValueKind; 4]>,
    results: ResultShape,
    callback: Arc<Callback<H>>,
}

impl<H> Clone for HostFunc<H> {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            results: self.results.clone(),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<H> fmt::Debug for HostFunc<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunc")
            .field("params", &self.params)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

impl<H> HostFunc<H> {
    /// Creates a host function that works directly on value slices.
    ///
    /// `callback` receives exactly one argument per entry of `params`, each
    /// tagged with that kind, and one pre-zeroed result slot per kind of
    /// `results`.
    pub fn new(
        params: impl IntoIterator<Item = ValueKind>,
        results: ResultShape,
        callback: impl Fn(&mut H, &[Val], &mut [Val]) -> Result<(), HostFault> + Send + Sync + 'static,
    ) -> Self {
        Self {
            params: params.into_iter().collect(),
            results,
            callback: Arc::new(callback),
        }
    }

    pub fn params(&self) -> &[ValueKind] {
        &self.params
    }

    pub fn results(&self) -> &ResultShape {
        &self.results
    }

    pub(crate) fn invoke(&self, host: &mut H, args: &[Val], results: &mut [Val]) -> Result<(), HostFault> {
        (self.callback)(host, args, results)
    }
}

/// The return type of a host function.
///
/// Implemented for every [`WasmResults`] type and for `Result<R, E>` where
/// `R: WasmResults` and `E: Display`. An `Err` becomes a trap carrying the
/// error's message.
pub trait HostReturn {
    fn shape() -> ResultShape;

    /// Writes the returned values into `slots`.
    ///
    /// # Errors
    ///
    /// Returns the fault that should be raised as a trap instead.
    fn into_results(self, slots: &mut [Val]) -> Result<(), HostFault>;
}

impl<T: WasmResults> HostReturn for T {
    fn shape() -> ResultShape {
        T::shape()
    }

    fn into_results(self, slots: &mut [Val]) -> Result<(), HostFault> {
        if slots.len() != T::LEN {
            return Err(HostFault::Error(alloc::format!(
                "host function produced {} result(s) but {} were expected",
                T::LEN,
                slots.len()
            )));
        }
        self.store(slots);
        Ok(())
    }
}

impl<T: WasmResults, E: fmt::Display> HostReturn for Result<T, E> {
    fn shape() -> ResultShape {
        T::shape()
    }

    fn into_results(self, slots: &mut [Val]) -> Result<(), HostFault> {
        match self {
            Ok(values) => values.into_results(slots),
            Err(err) => Err(HostFault::Error(err.to_string())),
        }
    }
}

/// Rust closures and methods that can be turned into a [`HostFunc`].
///
/// Implemented for `Fn(&mut H, A1, .., An) -> R` with up to eight [`WasmTy`]
/// parameters and `R: HostReturn`. Methods taking `&mut self` qualify
/// directly, so `Counter::tick` can be registered as is.
pub trait IntoHostFunc<H, Params, Results>: Send + Sync + 'static {
    fn into_host_func(self) -> HostFunc<H>;
}

fn next_arg<A: WasmTy>(args: &mut core::slice::Iter<'_, Val>) -> Result<A, HostFault> {
    let val = args
        .next()
        .ok_or_else(|| HostFault::Error("missing argument".into()))?;
    A::from_val(*val).ok_or_else(|| {
        HostFault::Error(alloc::format!(
            "argument of type '{}' where '{}' was expected",
            val.kind(),
            A::KIND
        ))
    })
}

macro_rules! impl_into_host_func {
    ($($a:ident)*) => {
        impl<H, F, R, $($a,)*> IntoHostFunc<H, ($($a,)*), R> for F
        where
            H: 'static,
            F: Fn(&mut H, $($a),*) -> R + Send + Sync + 'static,
            R: HostReturn,
            $($a: WasmTy,)*
        {
            fn into_host_func(self) -> HostFunc<H> {
                HostFunc {
                    params: smallvec![$(<$a as WasmTy>::KIND),*],
                    results: R::shape(),
                    callback: Arc::new(move |host: &mut H, args: &[Val], results: &mut [Val]| {
                        #[allow(unused_mut, unused_variables, reason = "unused by the zero-argument expansion")]
                        let mut args = args.iter();
                        let ret = (self)(host, $(next_arg::<$a>(&mut args)?),*);
                        ret.into_results(results)
                    }),
                }
            }
        }
    };
}

impl_into_host_func!();
impl_into_host_func!(A1);
impl_into_host_func!(A1 A2);
impl_into_host_func!(A1 A2 A3);
impl_into_host_func!(A1 A2 A3 A4);
impl_into_host_func!(A1 A2 A3 A4 A5);
impl_into_host_func!(A1 A2 A3 A4 A5 A6);
impl_into_host_func!(A1 A2 A3 A4 A5 A6 A7);
impl_into_host_func!(A1 A2 A3 A4 A5 A6 A7 A8);
