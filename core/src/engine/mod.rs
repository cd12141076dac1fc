//! Thread-safe execution facade.
//!
//! The engine owns the CPU, the host memory and the configured collaborators
//! behind one lock. Each public call holds the lock for its whole duration,
//! so other threads only ever observe the machine between instructions.

mod config;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use config::{EngineConfig, ResetOverrides};

use crate::core::{ConfigError, ExecHook, ExecutionError, HostBus, IoPorts, Memory, Tracer};
use crate::cpu::z80::{Step, Z80};
use crate::cpu::{Cpu, CpuStateTrait, Z80State};

struct Inner<M> {
    cpu: Z80,
    memory: M,
    io: Option<Box<dyn IoPorts + Send>>,
    hook: Option<Box<dyn ExecHook + Send>>,
    tracer: Option<Box<dyn Tracer + Send>>,
    tracing_enabled: bool,
    interrupts_enabled: bool,
    reset_overrides: ResetOverrides,
}

impl<M: Memory> Inner<M> {
    fn step(&mut self) -> Result<Step, ExecutionError> {
        let Inner { cpu, memory, io, hook, tracer, tracing_enabled, .. } = self;

        let io: Option<&mut (dyn IoPorts + Send)> = match io {
            Some(io) => Some(&mut **io),
            None => None,
        };
        let mut bus = HostBus::new(memory, io);
        let result = match hook.as_deref_mut() {
            Some(hook) => cpu.step_with_hook(&mut bus, hook),
            None => cpu.step(&mut bus),
        };
        let step = result.inspect_err(|e| log::warn!("execution stopped: {e}"))?;

        if *tracing_enabled {
            if let Some(tracer) = tracer.as_deref_mut() {
                tracer.trace(&step, cpu);
            }
        }
        Ok(step)
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.reset_overrides.apply(&mut self.cpu);
    }
}

/// A Z80 bound to its memory, safe to share between threads.
pub struct Engine<M: Memory + Send> {
    inner: Mutex<Inner<M>>,
}

impl<M: Memory + Send> Engine<M> {
    /// Validate `config` and build an engine in the reset state.
    pub fn new(memory: M, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut inner = Inner {
            cpu: Z80::with_tables(config.tables),
            memory,
            io: config.io_handler,
            hook: config.pre_execution_hook,
            tracer: config.tracer,
            tracing_enabled: config.tracing_enabled,
            interrupts_enabled: config.interrupts_enabled,
            reset_overrides: config.reset_overrides,
        };
        inner.reset();
        Ok(Self { inner: Mutex::new(inner) })
    }

    /// A panic in a hook or tracer poisons the lock. Hooks run before the CPU
    /// is touched and tracers after the step completes, so the state it
    /// guards is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner<M>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute one instruction, interrupt response or halted idle cycle.
    pub fn step(&self) -> Result<(), ExecutionError> {
        self.lock().step().map(|_| ())
    }

    /// Step until at least `budget` T-states have elapsed or the CPU halts.
    /// Returns the T-states actually consumed.
    pub fn run(&self, budget: u64) -> Result<u64, ExecutionError> {
        let mut inner = self.lock();
        let mut consumed = 0u64;
        while consumed < budget {
            consumed += inner.step()?.cycles() as u64;
            if inner.cpu.halted {
                break;
            }
        }
        Ok(consumed)
    }

    pub fn halted(&self) -> bool {
        self.lock().cpu.is_sleeping()
    }

    pub fn cycles(&self) -> u64 {
        self.lock().cpu.cycles
    }

    pub fn state(&self) -> Z80State {
        self.lock().cpu.snapshot()
    }

    pub fn load_snapshot(&self, state: Z80State) {
        let mut inner = self.lock();
        inner.cpu.restore(&state);
        log::debug!("restored snapshot at PC={:04X}", state.regs.pc);
    }

    pub fn signal_nmi(&self) {
        let mut inner = self.lock();
        if inner.interrupts_enabled {
            inner.cpu.signal_nmi();
        } else {
            log::debug!("NMI ignored, interrupts disabled");
        }
    }

    /// Drive the INT line. It stays asserted until the CPU accepts it or
    /// the caller releases it.
    pub fn signal_int(&self, active: bool) {
        let mut inner = self.lock();
        if inner.interrupts_enabled {
            inner.cpu.set_int_line(active);
        } else if active {
            log::debug!("INT ignored, interrupts disabled");
        }
    }

    /// Power-on reset followed by the configured register overrides.
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Run `f` with exclusive access to the memory between instructions.
    pub fn with_memory<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.lock().memory)
    }

    pub fn into_memory(self) -> M {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner).memory
    }
}
