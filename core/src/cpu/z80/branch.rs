use crate::core::Bus;
use crate::cpu::z80::interrupt::InterruptMode;
use crate::cpu::z80::op::Cond;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// `None` is the unconditional form.
    pub(crate) fn eval_condition(&self, cond: Option<Cond>) -> bool {
        let Some(cond) = cond else { return true };
        match cond {
            Cond::NZ => !self.regs.flag(Flag::Z),
            Cond::Z => self.regs.flag(Flag::Z),
            Cond::NC => !self.regs.flag(Flag::C),
            Cond::C => self.regs.flag(Flag::C),
            Cond::PO => !self.regs.flag(Flag::PV),
            Cond::PE => self.regs.flag(Flag::PV),
            Cond::P => !self.regs.flag(Flag::S),
            Cond::M => self.regs.flag(Flag::S),
        }
    }

    /// JP [cc,]nn. WZ takes the target even when the jump is not taken.
    pub(crate) fn op_jp(&mut self, cond: Option<Cond>, target: u16) -> bool {
        self.memptr = target;
        let taken = self.eval_condition(cond);
        if taken {
            self.regs.pc = target;
        }
        taken
    }

    /// JR [cc,]e. The offset is relative to the following instruction.
    pub(crate) fn op_jr(&mut self, cond: Option<Cond>, offset: i8) -> bool {
        let taken = self.eval_condition(cond);
        if taken {
            self.relative_jump(offset);
        }
        taken
    }

    pub(crate) fn op_djnz(&mut self, offset: i8) -> bool {
        self.regs.b = self.regs.b.wrapping_sub(1);
        let taken = self.regs.b != 0;
        if taken {
            self.relative_jump(offset);
        }
        taken
    }

    fn relative_jump(&mut self, offset: i8) {
        self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
        self.memptr = self.regs.pc;
    }

    pub(crate) fn op_call<B: Bus + ?Sized>(&mut self, cond: Option<Cond>, target: u16, bus: &mut B) -> bool {
        self.memptr = target;
        let taken = self.eval_condition(cond);
        if taken {
            self.push_word(bus, self.regs.pc);
            self.regs.pc = target;
        }
        taken
    }

    pub(crate) fn op_ret<B: Bus + ?Sized>(&mut self, cond: Option<Cond>, bus: &mut B) -> bool {
        let taken = self.eval_condition(cond);
        if taken {
            self.regs.pc = self.pop_word(bus);
            self.memptr = self.regs.pc;
        }
        taken
    }

    /// RETN/RETI: pop PC, copy IFF2 into IFF1.
    pub(crate) fn op_retn<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.iff1 = self.iff2;
        self.regs.pc = self.pop_word(bus);
        self.memptr = self.regs.pc;
    }

    pub(crate) fn op_rst<B: Bus + ?Sized>(&mut self, vector: u8, bus: &mut B) {
        self.push_word(bus, self.regs.pc);
        self.regs.pc = vector as u16;
        self.memptr = self.regs.pc;
    }

    /// HALT parks PC on the HALT opcode; idle steps follow until an interrupt.
    pub(crate) fn op_halt(&mut self) {
        self.regs.pc = self.regs.pc.wrapping_sub(1);
        self.halted = true;
    }

    pub(crate) fn op_di(&mut self) {
        self.iff1 = false;
        self.iff2 = false;
    }

    /// EI: interrupts are enabled, but INT stays blocked for one more instruction.
    pub(crate) fn op_ei(&mut self) {
        self.iff1 = true;
        self.iff2 = true;
        self.ei_delay = true;
    }

    pub(crate) fn op_im(&mut self, mode: u8) {
        if let Some(mode) = InterruptMode::from_u8(mode) {
            self.im = mode;
        }
    }
}
