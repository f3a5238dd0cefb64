use crate::values::ValueKind;
use alloc::string::String;
use core::fmt;
use smallvec::SmallVec;

/// The kind of an import or export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternKind {
    Function,
    Global,
    Memory,
    Table,
}

impl fmt::Display for ExternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternKind::Function => f.write_str("function"),
            ExternKind::Global => f.write_str("global"),
            ExternKind::Memory => f.write_str("memory"),
            ExternKind::Table => f.write_str("table"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Const,
    Var,
}

impl Mutability {
    pub fn is_mutable(self) -> bool {
        matches!(self, Self::Var)
    }

    pub(crate) fn to_wasmi(self) -> wasmi::Mutability {
        match self {
            Mutability::Const => wasmi::Mutability::Const,
            Mutability::Var => wasmi::Mutability::Var,
        }
    }
}

impl From<bool> for Mutability {
    fn from(mutable: bool) -> Self {
        if mutable {
            Self::Var
        } else {
            Self::Const
        }
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutability::Const => f.write_str("immutable"),
            Mutability::Var => f.write_str("mutable"),
        }
    }
}

/// The shape of a function's result list as seen by the signature validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResultShape {
    /// No results.
    Unit,
    /// Exactly one scalar.
    Scalar(ValueKind),
    /// An ordered, flattened aggregate.
    Tuple(SmallVec<[ValueKind; 4]>),
}

impl ResultShape {
    /// The flattened kinds, in slot order.
    pub fn kinds(&self) -> &[ValueKind] {
        match self {
            ResultShape::Unit => &[],
            ResultShape::Scalar(kind) => core::slice::from_ref(kind),
            ResultShape::Tuple(kinds) => kinds,
        }
    }
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultShape::Unit => f.write_str("()"),
            ResultShape::Scalar(kind) => write!(f, "{kind}"),
            ResultShape::Tuple(kinds) => {
                f.write_str("(")?;
                for (i, kind) in kinds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{kind}")?;
                }
                if kinds.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    params: SmallVec<[ValueKind; 4]>,
    results: SmallVec<[ValueKind; 4]>,
}

impl FuncType {
    pub fn new(
        params: impl IntoIterator<Item = ValueKind>,
        results: impl IntoIterator<Item = ValueKind>,
    ) -> Self {
        Self {
            params: params.into_iter().collect(),
            results: results.into_iter().collect(),
        }
    }

    pub fn params(&self) -> &[ValueKind] {
        &self.params
    }

    pub fn results(&self) -> &[ValueKind] {
        &self.results
    }

    pub(crate) fn to_wasmi(&self) -> wasmi::FuncType {
        wasmi::FuncType::new(
            self.params.iter().map(|kind| kind.to_wasmi()),
            self.results.iter().map(|kind| kind.to_wasmi()),
        )
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(func")?;
        for param in &self.params {
            write!(f, " (param {param})")?;
        }
        for result in &self.results {
            write!(f, " (result {result})")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalType {
    pub kind: ValueKind,
    pub mutability: Mutability,
}

/// Limits of a linear memory in units of [`WASM_PAGE_SIZE`](crate::WASM_PAGE_SIZE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryType {
    pub minimum: u32,
    pub maximum: Option<u32>,
}

/// Table limits are only described, tables themselves cannot be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableType {
    pub minimum: u64,
    pub maximum: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExternType {
    Func(FuncType),
    Global(GlobalType),
    Memory(MemoryType),
    Table(TableType),
}

impl ExternType {
    pub fn kind(&self) -> ExternKind {
        match self {
            ExternType::Func(_) => ExternKind::Function,
            ExternType::Global(_) => ExternKind::Global,
            ExternType::Memory(_) => ExternKind::Memory,
            ExternType::Table(_) => ExternKind::Table,
        }
    }

    pub fn as_func(&self) -> Option<&FuncType> {
        match self {
            ExternType::Func(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_global(&self) -> Option<&GlobalType> {
        match self {
            ExternType::Global(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_memory(&self) -> Option<&MemoryType> {
        match self {
            ExternType::Memory(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableType> {
        match self {
            ExternType::Table(ty) => Some(ty),
            _ => None,
        }
    }
}

/// One import of a module, in the order the module declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportDescriptor {
    pub(crate) module: String,
    pub(crate) name: String,
    pub(crate) ty: ExternType,
}

impl ImportDescriptor {
    /// The module name of the import, may be empty.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ExternType {
        &self.ty
    }

    pub fn kind(&self) -> ExternKind {
        self.ty.kind()
    }
}

impl fmt::Display for ImportDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.module, self.name)
        }
    }
}

/// One export of a module, in the order the module declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExportDescriptor {
    pub(crate) name: String,
    pub(crate) ty: ExternType,
}

impl ExportDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ExternType {
        &self.ty
    }

    pub fn kind(&self) -> ExternKind {
        self.ty.kind()
    }
}

impl fmt::Display for ExportDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test_log::test]
    fn import_display() {
        let ty = ExternType::Func(FuncType::default());
        let scoped = ImportDescriptor {
            module: "env".into(),
            name: "hello".into(),
            ty: ty.clone(),
        };
        let bare = ImportDescriptor {
            module: String::new(),
            name: "hello".into(),
            ty,
        };
        assert_eq!(alloc::format!("{scoped}"), "env.hello");
        assert_eq!(alloc::format!("{bare}"), "hello");
    }

    #[test_log::test]
    fn shape_display() {
        assert_eq!(alloc::format!("{}", ResultShape::Unit), "()");
        assert_eq!(
            alloc::format!("{}", ResultShape::Tuple(smallvec![ValueKind::Int32])),
            "(i32,)"
        );
        assert_eq!(
            alloc::format!(
                "{}",
                ResultShape::Tuple(smallvec![ValueKind::Int64, ValueKind::Float32])
            ),
            "(i64, f32)"
        );
    }

    #[test_log::test]
    fn func_type_display() {
        let ty = FuncType::new([ValueKind::Int32], [ValueKind::Float64]);
        assert_eq!(alloc::format!("{ty}"), "(func (param i32) (result f64))");
    }
}
