//! CPU state snapshot types and traits

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cpu::z80::{InterruptMode, Registers};

/// Trait for CPU types that can capture and reinstate their state
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: &Self::Snapshot);
}

/// Z80 CPU state snapshot
///
/// Everything that influences future execution, hidden registers included,
/// so restoring a snapshot into a fresh CPU resumes bit-exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Z80State {
    pub regs: Registers,
    pub iff1: bool,             // Interrupt flip-flop 1
    pub iff2: bool,             // Interrupt flip-flop 2
    pub im: InterruptMode,
    pub nmi_pending: bool,
    pub int_line: bool,
    pub halted: bool,
    pub ei_delay: bool,         // EI executed, INT held off one instruction
    pub prefix_pending: bool,   // Mid prefix chain
    pub memptr: u16,            // Hidden WZ register
    pub p: bool,                // LD A,I/R tracker
    pub q: u8,                  // Copy of F when flags modified, 0 otherwise
    pub cycles: u64,
}
