//! Optional TOML machine profile. Command-line flags take precedence.
//!
//! ```toml
//! cpm = false
//! load_address = 0x8000
//! entry = 0x8000
//! stack = 0xF000
//! interrupt_mode = 1
//! max_cycles = 50_000_000
//! log_level = "debug"
//! trace = false
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::RunnerError;

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub cpm: bool,
    pub load_address: Option<u16>,
    pub entry: Option<u16>,
    pub stack: Option<u16>,
    pub interrupt_mode: Option<u8>,
    pub interrupts: Option<bool>,
    pub max_cycles: Option<u64>,
    pub log_level: Option<String>,
    pub trace: bool,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| RunnerError::Io { path: path.to_owned(), source })?;
        toml::from_str(&text).map_err(|source| RunnerError::Profile { path: path.to_owned(), source })
    }
}
