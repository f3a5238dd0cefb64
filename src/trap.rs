use alloc::string::{String, ToString};
use core::any::Any;

/// A failure raised by a host function while module code was calling it.
///
/// The trampoline converts every fault into a trap carrying the fault's
/// message, so module code observes an ordinary trap.
#[derive(onlyerror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostFault {
    /// The host function returned an error.
    #[error("{0}")]
    Error(String),
    /// The host function panicked.
    #[error("host function panicked: {0}")]
    Panic(String),
}

impl HostFault {
    pub fn message(&self) -> &str {
        match self {
            HostFault::Error(msg) | HostFault::Panic(msg) => msg,
        }
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            String::from("Box<dyn Any>")
        };
        Self::Panic(message)
    }

    pub(crate) fn into_trap(self) -> wasmi::Error {
        wasmi::Error::new(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;

    #[test_log::test]
    fn panic_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(HostFault::from_panic(&*payload), HostFault::Panic("boom".into()));

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(HostFault::from_panic(&*payload).message(), "owned boom");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(HostFault::from_panic(&*payload).message(), "Box<dyn Any>");
    }

    #[test_log::test]
    fn display() {
        assert_eq!(HostFault::Error("nope".into()).to_string(), "nope");
        assert_eq!(
            HostFault::Panic("boom".into()).to_string(),
            "host function panicked: boom"
        );
    }
}
