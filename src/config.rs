use core::fmt;

/// Engine configuration.
///
/// Every feature defaults to enabled. A `Config` is copied into each
/// [`Engine`](crate::Engine) and from there into each [`Store`](crate::Store).
#[derive(Clone, Copy)]
#[allow(clippy::struct_excessive_bools, reason = "each flag toggles an independent feature")]
pub struct Config {
    multi_value: bool,
    mutable_global: bool,
    bulk_memory: bool,
    catch_host_panics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multi_value: true,
            mutable_global: true,
            bulk_memory: true,
            catch_host_panics: true,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("multi_value", &self.multi_value)
            .field("mutable_global", &self.mutable_global)
            .field("bulk_memory", &self.bulk_memory)
            .field("catch_host_panics", &self.catch_host_panics)
            .finish()
    }
}

impl Config {
    /// Allow functions and blocks to produce more than one result.
    ///
    /// Host functions returning tuples of two or more values need this.
    pub fn multi_value(&mut self, enable: bool) -> &mut Self {
        self.multi_value = enable;
        self
    }

    /// Allow mutable globals to be imported and exported.
    pub fn mutable_global(&mut self, enable: bool) -> &mut Self {
        self.mutable_global = enable;
        self
    }

    pub fn bulk_memory(&mut self, enable: bool) -> &mut Self {
        self.bulk_memory = enable;
        self
    }

    /// Whether a panic inside a host function is turned into a trap.
    ///
    /// When disabled the panic unwinds through the engine into the caller
    /// of the export.
    pub fn catch_host_panics(&mut self, enable: bool) -> &mut Self {
        self.catch_host_panics = enable;
        self
    }

    pub(crate) fn catches_host_panics(&self) -> bool {
        self.catch_host_panics
    }

    pub(crate) fn to_wasmi(self) -> wasmi::Config {
        let mut config = wasmi::Config::default();
        config
            .wasm_multi_value(self.multi_value)
            .wasm_mutable_global(self.mutable_global)
            .wasm_bulk_memory(self.bulk_memory);
        config
    }
}
