use crate::host::{HostBindings, HostMember};
use crate::module::Module;
use crate::types::{ExternKind, ImportDescriptor};
use crate::wasm_unsupported;
use alloc::string::ToString;
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};

/// One import of a module paired with the host member that satisfies it.
pub(crate) struct Resolution<'a, H> {
    pub import: &'a ImportDescriptor,
    pub member: &'a HostMember<H>,
}

/// Matches every import of `module` to exactly one member of `bindings`.
///
/// Imports are visited in declared order. A member matches when its module
/// name and name both equal the import's; an empty module name only matches
/// an empty module name. Function imports only consider function members,
/// global and memory imports only consider field members. Repeated imports
/// of the same `(module, name)` with the same type resolve once; a repeat
/// with a different type resolves again so its binding is validated too.
///
/// Resolution is pure, no engine objects are created.
///
/// # Errors
///
/// Fails with [`MissingImport`](crate::Error::MissingImport) if no member
/// matches, with [`AmbiguousImport`](crate::Error::AmbiguousImport) if more
/// than one does, and with [`Unsupported`](crate::Error::Unsupported) for
/// table imports and for a `(module, name)` imported as more than one kind,
/// which cannot be linked by name.
pub(crate) fn resolve<'a, H: 'static>(
    bindings: &'a HostBindings<H>,
    module: &'a Module,
) -> crate::Result<Vec<Resolution<'a, H>>> {
    let mut seen = HashSet::new();
    let mut kinds: HashMap<(&str, &str), ExternKind> = HashMap::new();
    let mut resolved = Vec::with_capacity(module.imports().len());

    for import in module.imports() {
        if !seen.insert((import.module(), import.name(), import.ty())) {
            tracing::trace!(%import, "import already resolved");
            continue;
        }

        if import.kind() == ExternKind::Table {
            return Err(wasm_unsupported!("table import '{import}'"));
        }

        let first = *kinds
            .entry((import.module(), import.name()))
            .or_insert(import.kind());
        if first != import.kind() {
            return Err(wasm_unsupported!(
                "import '{import}' is declared both as a {first} and as a {}",
                import.kind()
            ));
        }

        let wants_field = import.kind() != ExternKind::Function;
        let mut candidates = bindings
            .candidates(import.module(), import.name())
            .filter(|member| member.target.is_field() == wants_field);

        let member = candidates
            .next()
            .ok_or_else(|| crate::Error::MissingImport {
                module: module.name().to_string(),
                kind: import.kind(),
                import: import.to_string(),
            })?;

        let extra = candidates.count();
        if extra > 0 {
            return Err(crate::Error::AmbiguousImport {
                module: module.name().to_string(),
                kind: import.kind(),
                import: import.to_string(),
                count: extra + 1,
            });
        }

        resolved.push(Resolution { import, member });
    }

    Ok(resolved)
}

/// Builds an engine linker that defines every bound extern under its
/// import's module name and name.
///
/// # Errors
///
/// Returns an [`Instantiation`](crate::Error::Instantiation) error if the
/// engine refuses a definition.
pub(crate) fn link<'a, H>(
    engine: &wasmi::Engine,
    module: &Module,
    externs: impl IntoIterator<Item = (&'a ImportDescriptor, wasmi::Extern)>,
) -> crate::Result<wasmi::Linker<H>> {
    let mut linker = wasmi::Linker::new(engine);
    for (import, item) in externs {
        linker
            .define(import.module(), import.name(), item)
            .map_err(|err| crate::Error::Instantiation {
                module: module.name().to_string(),
                message: err.to_string(),
            })?;
    }
    Ok(linker)
}
