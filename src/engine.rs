use crate::config::Config;
use crate::handle::{Handle, HandleKind};

/// The root object: compiles modules and creates stores.
///
/// Modules and stores keep their own reference to the underlying engine, so
/// releasing an `Engine` does not invalidate anything created through it,
/// it only prevents creating more.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    inner: Handle<wasmi::Engine>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        tracing::trace!(?config, "creating engine");
        Self {
            config: *config,
            inner: Handle::new(HandleKind::Engine, wasmi::Engine::new(&config.to_wasmi())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn release(&mut self) {
        self.inner.release();
    }

    pub fn is_released(&self) -> bool {
        !self.inner.is_valid()
    }

    pub(crate) fn wasmi(&self) -> crate::Result<&wasmi::Engine> {
        self.inner.get()
    }
}
