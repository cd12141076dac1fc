use crate::core::Bus;
use crate::cpu::z80::decode::Operands;
use crate::cpu::z80::flags::{self, XY};
use crate::cpu::z80::op::{AluOp, Loc8, Reg16};
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    pub(crate) fn perform_alu_op(&mut self, op: AluOp, val: u8) {
        let a = self.regs.a;
        let carry = self.regs.flag(Flag::C);
        let (result, f) = match op {
            AluOp::Add => flags::add8(a, val, false),
            AluOp::Adc => flags::add8(a, val, carry),
            AluOp::Sub => flags::sub8(a, val, false),
            AluOp::Sbc => flags::sub8(a, val, carry),
            AluOp::And => flags::and8(a, val),
            AluOp::Xor => flags::xor8(a, val),
            AluOp::Or => flags::or8(a, val),
            AluOp::Cp => (a, flags::cp8(a, val)),
        };
        self.regs.a = result;
        self.put_flags(f);
    }

    /// INC/DEC on a register, (HL) or (IX+d).
    pub(crate) fn op_inc_dec8<B: Bus + ?Sized>(
        &mut self,
        loc: Loc8,
        decrement: bool,
        ops: &Operands,
        bus: &mut B,
    ) {
        let val = self.read_loc(loc, ops, bus);
        let (result, f) = if decrement {
            flags::dec8(val, self.regs.f)
        } else {
            flags::inc8(val, self.regs.f)
        };
        self.write_loc(loc, result, ops, bus);
        self.put_flags(f);
    }

    pub(crate) fn op_add16(&mut self, dst: Reg16, src: Reg16) {
        let a = self.regs.get16(dst);
        let (result, f) = flags::add16(a, self.regs.get16(src), self.regs.f);
        self.memptr = a.wrapping_add(1);
        self.regs.set16(dst, result);
        self.put_flags(f);
    }

    pub(crate) fn op_adc16(&mut self, src: Reg16) {
        let hl = self.regs.hl();
        let (result, f) = flags::adc16(hl, self.regs.get16(src), self.regs.flag(Flag::C));
        self.memptr = hl.wrapping_add(1);
        self.regs.set_hl(result);
        self.put_flags(f);
    }

    pub(crate) fn op_sbc16(&mut self, src: Reg16) {
        let hl = self.regs.hl();
        let (result, f) = flags::sbc16(hl, self.regs.get16(src), self.regs.flag(Flag::C));
        self.memptr = hl.wrapping_add(1);
        self.regs.set_hl(result);
        self.put_flags(f);
    }

    pub(crate) fn op_daa(&mut self) {
        let (result, f) = flags::daa(self.regs.a, self.regs.f);
        self.regs.a = result;
        self.put_flags(f);
    }

    pub(crate) fn op_cpl(&mut self) {
        self.regs.a = !self.regs.a;
        let keep = self.regs.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8 | Flag::C as u8);
        self.put_flags(keep | Flag::H as u8 | Flag::N as u8 | (self.regs.a & XY));
    }

    pub(crate) fn op_neg(&mut self) {
        let (result, f) = flags::sub8(0, self.regs.a, false);
        self.regs.a = result;
        self.put_flags(f);
    }

    /// X/Y for SCF/CCF: F is OR-ed in only when the previous instruction
    /// did not itself write the flags.
    fn scf_ccf_xy(&self) -> u8 {
        ((self.prev_q ^ self.regs.f) | self.regs.a) & XY
    }

    pub(crate) fn op_scf(&mut self) {
        let keep = self.regs.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        self.put_flags(keep | self.scf_ccf_xy() | Flag::C as u8);
    }

    pub(crate) fn op_ccf(&mut self) {
        let carry = self.regs.flag(Flag::C);
        let mut f = self.regs.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        f |= self.scf_ccf_xy();
        if carry {
            f |= Flag::H as u8;
        } else {
            f |= Flag::C as u8;
        }
        self.put_flags(f);
    }
}
