use crate::types::ExternKind;
use crate::values::ValueKind;
use alloc::string::String;

#[derive(onlyerror::Error, Debug)]
pub enum Error {
    /// The input WebAssembly code is invalid.
    ///
    /// Raised by the descriptor parser when it encounters a malformed binary.
    #[error("invalid WASM input at {offset}: {message}")]
    InvalidWebAssembly {
        /// A string describing the validation error.
        message: String,
        /// The bytecode offset where the error occurred.
        offset: usize,
    },
    /// The engine refused to compile the module.
    #[error("WebAssembly module '{name}' is not valid: {message}")]
    InvalidModule { name: String, message: String },
    /// The WebAssembly code used an unsupported feature.
    #[error("Feature used by the WebAssembly code is not supported: {0}")]
    Unsupported(String),
    /// No host member is declared for a required import.
    #[error("failed to instantiate module '{module}': missing {kind} import '{import}'")]
    MissingImport {
        module: String,
        kind: ExternKind,
        import: String,
    },
    /// More than one host member is declared for the same import.
    #[error("failed to instantiate module '{module}': {count} host members match {kind} import '{import}'")]
    AmbiguousImport {
        module: String,
        kind: ExternKind,
        import: String,
        count: usize,
    },
    /// A host member exists for an import but its shape is incompatible.
    #[error("unable to bind '{member}' to WebAssembly import '{import}': {reason}")]
    Binding {
        /// `HostType.member`
        member: String,
        import: String,
        reason: String,
    },
    /// The engine refused to link or instantiate the module.
    #[error("failed to instantiate module '{module}': {message}")]
    Instantiation { module: String, message: String },
    /// A trap was raised while the module was being instantiated.
    #[error("failed to instantiate module '{module}': {message}")]
    InstantiationTrap { module: String, message: String },
    /// A trap was raised while executing an exported function.
    #[error("wasm trap: {message}")]
    Trap { message: String },
    /// An object was used outside of its legal lifecycle.
    #[error("{0}")]
    InvalidOperation(String),
    /// The instance has no function export with this name.
    #[error("the instance has no function export named '{name}'")]
    ExportNotFound { name: String },
    #[error("function '{function}' expects {expected} argument(s) but {actual} were given")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },
    #[error("argument #{index} of function '{function}' is expected to be of type '{expected}' but is '{actual}'")]
    ArgumentType {
        function: String,
        index: usize,
        expected: ValueKind,
        actual: ValueKind,
    },
    /// The results of a call could not be decoded into the requested host type.
    #[error("results of function '{function}' cannot be read as {requested}")]
    ResultType {
        function: String,
        requested: &'static str,
    },
    #[error("memory access out of bounds: {len} byte(s) at offset {offset}")]
    MemoryAccess { offset: usize, len: usize },
}

impl Error {
    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}

impl From<wasmparser::BinaryReaderError> for Error {
    fn from(e: wasmparser::BinaryReaderError) -> Self {
        Self::InvalidWebAssembly {
            message: e.message().into(),
            offset: e.offset(),
        }
    }
}

#[macro_export]
macro_rules! wasm_unsupported {
    ($($arg:tt)*) => { $crate::Error::Unsupported(alloc::format!($($arg)*)) }
}
