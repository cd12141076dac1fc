use std::fmt;
use std::path::PathBuf;

use zeal_core::core::{ConfigError, ExecutionError};

#[derive(Debug)]
pub enum RunnerError {
    /// Reading an image or profile, or writing a state dump.
    Io { path: PathBuf, source: std::io::Error },
    Profile { path: PathBuf, source: toml::de::Error },
    DumpState(toml::ser::Error),
    InvalidLogLevel(String),
    /// The image does not fit between its load address and the top of memory.
    ImageTooLarge { len: usize, load_address: u16 },
    Config(ConfigError),
    Execution(ExecutionError),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Profile { path, source } => write!(f, "{}: {source}", path.display()),
            Self::DumpState(e) => write!(f, "cannot serialize CPU state: {e}"),
            Self::InvalidLogLevel(level) => write!(f, "unknown log level '{level}'"),
            Self::ImageTooLarge { len, load_address } => write!(
                f,
                "{len}-byte image does not fit at 0x{load_address:04X}"
            ),
            Self::Config(e) => write!(f, "{e}"),
            Self::Execution(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Profile { source, .. } => Some(source),
            Self::DumpState(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Execution(e) => Some(e),
            Self::InvalidLogLevel(_) | Self::ImageTooLarge { .. } => None,
        }
    }
}

impl From<ConfigError> for RunnerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ExecutionError> for RunnerError {
    fn from(e: ExecutionError) -> Self {
        Self::Execution(e)
    }
}
