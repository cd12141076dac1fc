pub mod bus;
pub mod error;
pub mod hook;

pub use bus::{Bus, HostBus, IoPorts, Memory};
pub use error::{ConfigError, ExecutionError};
pub use hook::{ExecHook, LogTracer, Tracer};
