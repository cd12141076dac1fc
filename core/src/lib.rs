pub mod core;
pub mod cpu;
pub mod engine;

pub mod prelude {
    pub use crate::core::{Bus, ConfigError, ExecHook, ExecutionError, IoPorts, LogTracer, Memory, Tracer};
    pub use crate::cpu::z80::{Instruction, InterruptMode, Step, Z80};
    pub use crate::cpu::{Cpu, CpuStateTrait, Z80State};
    pub use crate::engine::{Engine, EngineConfig, ResetOverrides};
}
