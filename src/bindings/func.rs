use crate::host::HostFunc;
use crate::types::{FuncType, ResultShape};
use alloc::string::String;

/// Checks `func` against the function import type `ty`.
///
/// Returns the reason of the first violated rule. Parameters are checked
/// before results, and results slot by slot, so the reason names the exact
/// offending position.
pub(super) fn validate<H>(func: &HostFunc<H>, ty: &FuncType) -> Result<(), String> {
    let expected = ty.params();
    let actual = func.params();
    if expected.len() != actual.len() {
        return Err(alloc::format!(
            "parameter mismatch: import requires {} but the function has {}",
            expected.len(),
            actual.len()
        ));
    }
    for (i, (expected, actual)) in expected.iter().zip(actual).enumerate() {
        if expected != actual {
            return Err(alloc::format!(
                "parameter #{i} is expected to be of type '{expected}'"
            ));
        }
    }

    match (ty.results(), func.results()) {
        ([], ResultShape::Unit) => Ok(()),
        ([], _) => Err("function must not return a value".into()),
        ([expected], ResultShape::Scalar(actual)) if expected == actual => Ok(()),
        ([expected], _) => Err(alloc::format!(
            "return type is expected to be '{expected}'"
        )),
        (expected, ResultShape::Tuple(actual)) if expected.len() == actual.len() => {
            for (i, (expected, actual)) in expected.iter().zip(actual).enumerate() {
                if expected != actual {
                    return Err(alloc::format!(
                        "return tuple item #{i} is expected to be of type '{expected}'"
                    ));
                }
            }
            Ok(())
        }
        (expected, _) => Err(alloc::format!(
            "return type is expected to be a tuple of size {}",
            expected.len()
        )),
    }
}
