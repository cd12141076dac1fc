use crate::core::{ConfigError, ExecHook, IoPorts, Tracer};
use crate::cpu::z80::{InterruptMode, OpcodeTables, STANDARD_TABLES, Z80};

/// Register values applied after every reset, on top of the power-on defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOverrides {
    pub af: Option<u16>,
    pub bc: Option<u16>,
    pub de: Option<u16>,
    pub hl: Option<u16>,
    pub ix: Option<u16>,
    pub iy: Option<u16>,
    pub sp: Option<u16>,
    pub pc: Option<u16>,
    pub i: Option<u8>,
    pub r: Option<u8>,
    /// Raw mode number, checked against 0..=2 when the engine is built.
    pub interrupt_mode: Option<u8>,
}

impl ResetOverrides {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match self.interrupt_mode {
            Some(mode) if InterruptMode::from_u8(mode).is_none() => {
                Err(ConfigError::invalid(format!("interrupt mode {mode} is not 0, 1 or 2")))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn apply(&self, cpu: &mut Z80) {
        let regs = &mut cpu.regs;
        if let Some(v) = self.af { regs.set_af(v); }
        if let Some(v) = self.bc { regs.set_bc(v); }
        if let Some(v) = self.de { regs.set_de(v); }
        if let Some(v) = self.hl { regs.set_hl(v); }
        if let Some(v) = self.ix { regs.ix = v; }
        if let Some(v) = self.iy { regs.iy = v; }
        if let Some(v) = self.sp { regs.sp = v; }
        if let Some(v) = self.pc { regs.pc = v; }
        if let Some(v) = self.i { regs.i = v; }
        if let Some(v) = self.r { regs.r = v; }
        if let Some(mode) = self.interrupt_mode.and_then(InterruptMode::from_u8) {
            cpu.im = mode;
        }
    }
}

/// Everything an [`Engine`](super::Engine) needs besides its memory.
pub struct EngineConfig {
    pub tracing_enabled: bool,
    pub tracer: Option<Box<dyn Tracer + Send>>,
    pub io_handler: Option<Box<dyn IoPorts + Send>>,
    /// When false, NMI and INT requests are dropped.
    pub interrupts_enabled: bool,
    pub pre_execution_hook: Option<Box<dyn ExecHook + Send>>,
    pub reset_overrides: ResetOverrides,
    /// Dispatch tables; a partial set makes the missing opcodes fail.
    pub tables: &'static OpcodeTables,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracing_enabled: false,
            tracer: None,
            io_handler: None,
            interrupts_enabled: true,
            pre_execution_hook: None,
            reset_overrides: ResetOverrides::default(),
            tables: &STANDARD_TABLES,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `tracer` and turn tracing on.
    pub fn with_tracer(mut self, tracer: impl Tracer + Send + 'static) -> Self {
        self.tracer = Some(Box::new(tracer));
        self.tracing_enabled = true;
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing_enabled = enabled;
        self
    }

    pub fn with_io(mut self, io: impl IoPorts + Send + 'static) -> Self {
        self.io_handler = Some(Box::new(io));
        self
    }

    pub fn with_interrupts(mut self, enabled: bool) -> Self {
        self.interrupts_enabled = enabled;
        self
    }

    pub fn with_hook(mut self, hook: impl ExecHook + Send + 'static) -> Self {
        self.pre_execution_hook = Some(Box::new(hook));
        self
    }

    pub fn with_reset_overrides(mut self, overrides: ResetOverrides) -> Self {
        self.reset_overrides = overrides;
        self
    }

    pub fn with_tables(mut self, tables: &'static OpcodeTables) -> Self {
        self.tables = tables;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.tracing_enabled && self.tracer.is_none() {
            return Err(ConfigError::invalid("tracing enabled without a tracer"));
        }
        self.reset_overrides.validate()
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("tracing_enabled", &self.tracing_enabled)
            .field("tracer", &self.tracer.is_some())
            .field("io_handler", &self.io_handler.is_some())
            .field("interrupts_enabled", &self.interrupts_enabled)
            .field("pre_execution_hook", &self.pre_execution_hook.is_some())
            .field("reset_overrides", &self.reset_overrides)
            .field("tables", &self.tables)
            .finish()
    }
}
