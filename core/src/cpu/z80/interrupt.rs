//! NMI and maskable interrupt acceptance.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::core::Bus;
use crate::cpu::z80::{Flag, Step, Z80};

pub const NMI_VECTOR: u16 = 0x0066;
/// Restart address for IM 0 (treated as RST 38H) and IM 1.
pub const IM1_VECTOR: u16 = 0x0038;
/// Where the low byte of the IM 2 vector is read from. Real hardware takes
/// it from the data bus; an idle bus reads 0xFF.
pub const IM2_VECTOR_SOURCE: u16 = 0xFFFF;

pub const NMI_CYCLES: u32 = 11;
pub const IM1_CYCLES: u32 = 13;
pub const IM2_CYCLES: u32 = 19;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InterruptMode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
}

impl InterruptMode {
    pub const fn from_u8(mode: u8) -> Option<Self> {
        match mode {
            0 => Some(InterruptMode::Mode0),
            1 => Some(InterruptMode::Mode1),
            2 => Some(InterruptMode::Mode2),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            InterruptMode::Mode0 => 0,
            InterruptMode::Mode1 => 1,
            InterruptMode::Mode2 => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptKind {
    Nmi,
    Int(InterruptMode),
}

impl Z80 {
    /// Accept a pending interrupt at an instruction boundary.
    ///
    /// NMI wins over INT. INT needs IFF1 and is held off for one instruction
    /// after EI. Neither is taken between a prefix and its opcode.
    pub(crate) fn service_interrupt<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Option<Step> {
        if self.prefix_pending {
            return None;
        }
        let kind = if self.nmi_pending {
            InterruptKind::Nmi
        } else if self.int_line && self.iff1 && !self.ei_delay {
            InterruptKind::Int(self.im)
        } else {
            return None;
        };

        if self.halted {
            self.halted = false;
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
        self.regs.bump_r(1);
        self.ei_delay = false;

        let return_pc = self.regs.pc;
        let (target, cycles) = match kind {
            InterruptKind::Nmi => {
                self.nmi_pending = false;
                self.iff1 = false;
                self.push_word(bus, return_pc);
                (NMI_VECTOR, NMI_CYCLES)
            }
            InterruptKind::Int(mode) => {
                self.int_line = false;
                self.iff1 = false;
                self.iff2 = false;
                // NMOS quirk: INT accepted right after LD A,I/R clears P/V.
                if self.p {
                    self.regs.f &= !(Flag::PV as u8);
                }
                match mode {
                    InterruptMode::Mode0 | InterruptMode::Mode1 => {
                        self.push_word(bus, return_pc);
                        (IM1_VECTOR, IM1_CYCLES)
                    }
                    InterruptMode::Mode2 => {
                        // The vector source is sampled before the push can overwrite it.
                        let low = bus.read_byte(IM2_VECTOR_SOURCE);
                        let vector = ((self.regs.i as u16) << 8) | low as u16;
                        self.push_word(bus, return_pc);
                        (bus.read_word(vector), IM2_CYCLES)
                    }
                }
            }
        };

        self.regs.pc = target;
        self.memptr = target;
        self.p = false;
        self.q = 0;
        self.cycles += cycles as u64;
        log::debug!("{kind:?} accepted at {return_pc:04X}, vector {target:04X}");

        Some(Step::Interrupt { kind, cycles })
    }
}
