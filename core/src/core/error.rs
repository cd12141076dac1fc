use crate::cpu::z80::op::Prefix;

// ---------------------------------------------------------------------------
// Execution errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a single `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionError {
    /// The opcode table slot reached for this byte sequence is empty.
    /// No state was changed: PC still points at the first byte of the
    /// faulting instruction and the cycle counter did not move.
    UnsupportedOpcode {
        prefix: Prefix,
        opcode: u8,
        pc: u16,
    },
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedOpcode { prefix, opcode, pc } => write!(
                f,
                "unsupported opcode {}{opcode:02X} at 0x{pc:04X}",
                prefix.mnemonic_bytes()
            ),
        }
    }
}

impl std::error::Error for ExecutionError {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Rejected engine configuration. Raised only by `Engine::new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidConfiguration(String),
}

impl ConfigError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfiguration(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}
