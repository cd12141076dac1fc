//! Observers the engine calls around each step.

use crate::cpu::z80::{Instruction, Step, Z80};

/// Sees each decoded instruction before it executes. The CPU is exactly as
/// it was before the step: PC still equals `instr.pc` and R is not bumped.
pub trait ExecHook {
    fn before_execute(&mut self, cpu: &Z80, instr: &Instruction);
}

impl<F: FnMut(&Z80, &Instruction)> ExecHook for F {
    fn before_execute(&mut self, cpu: &Z80, instr: &Instruction) {
        self(cpu, instr)
    }
}

/// Receives every completed step while tracing is enabled.
pub trait Tracer {
    fn trace(&mut self, step: &Step, cpu: &Z80);
}

/// Writes one `trace`-level record per step to the `zeal::trace` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn trace(&mut self, step: &Step, cpu: &Z80) {
        let r = &cpu.regs;
        match step {
            Step::Executed { instr, cycles } => log::trace!(
                target: "zeal::trace",
                "{instr} [{cycles}T] AF={:04X} BC={:04X} DE={:04X} HL={:04X} IX={:04X} IY={:04X} SP={:04X}",
                r.af(), r.bc(), r.de(), r.hl(), r.ix, r.iy, r.sp
            ),
            Step::Interrupt { kind, cycles } => log::trace!(
                target: "zeal::trace",
                "{kind:?} [{cycles}T] -> PC={:04X} SP={:04X}",
                r.pc, r.sp
            ),
            Step::HaltIdle { .. } => log::trace!(target: "zeal::trace", "halted at {:04X}", r.pc),
        }
    }
}
