use crate::host::HostFunc;
use crate::trap::HostFault;
use crate::types::FuncType;
use crate::values::{Val, ValueKind};
use alloc::string::{String, ToString};
use smallvec::SmallVec;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Wraps `func` in an engine function of type `ty` that module code can
/// call.
///
/// Arguments are converted by the declared parameter kinds, the host
/// function runs against the store's host value and its results are written
/// back slot by slot. Any [`HostFault`] becomes a trap carrying the fault's
/// message and never unwinds into the engine.
pub(crate) fn new_trampoline<H: 'static>(
    ctx: &mut wasmi::Store<H>,
    label: String,
    ty: &FuncType,
    func: HostFunc<H>,
    catch_panics: bool,
) -> wasmi::Func {
    let params: SmallVec<[ValueKind; 4]> = ty.params().into();
    let results: SmallVec<[ValueKind; 4]> = ty.results().into();

    wasmi::Func::new(
        ctx,
        ty.to_wasmi(),
        move |mut caller: wasmi::Caller<'_, H>, inputs: &[wasmi::Val], outputs: &mut [wasmi::Val]| {
            let trap = |fault: HostFault| {
                tracing::debug!(import = %label, %fault, "host function faulted");
                fault.into_trap()
            };

            let args = inputs
                .iter()
                .zip(&params)
                .map(|(raw, kind)| to_host(raw, *kind))
                .collect::<Result<SmallVec<[Val; 8]>, _>>()
                .map_err(trap)?;
            let mut values: SmallVec<[Val; 4]> = results.iter().map(|kind| Val::zero(*kind)).collect();

            let host = caller.data_mut();
            let outcome = if catch_panics {
                catch_unwind(AssertUnwindSafe(|| func.invoke(host, &args, &mut values)))
                    .unwrap_or_else(|payload| Err(HostFault::from_panic(&*payload)))
            } else {
                func.invoke(host, &args, &mut values)
            };
            outcome.map_err(trap)?;

            for ((slot, value), kind) in outputs.iter_mut().zip(values).zip(&results) {
                *slot = value
                    .to_wasmi(*kind)
                    .map_err(|err| trap(HostFault::Error(err.to_string())))?;
            }
            Ok(())
        },
    )
}

fn to_host(raw: &wasmi::Val, kind: ValueKind) -> Result<Val, HostFault> {
    let val = Val::from_wasmi(raw).map_err(|err| HostFault::Error(err.to_string()))?;
    if val.kind() == kind {
        Ok(val)
    } else {
        Err(HostFault::Error(alloc::format!(
            "argument of type '{}' where '{kind}' was declared",
            val.kind()
        )))
    }
}
