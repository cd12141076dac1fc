use crate::core::Bus;
use crate::cpu::z80::decode::Operands;
use crate::cpu::z80::flags::{self, XY};
use crate::cpu::z80::op::{Loc8, Reg8, RotOp};
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// RLCA, RRCA, RLA, RRA
    pub(crate) fn op_rot_a(&mut self, op: RotOp) {
        let (result, f) = flags::rot_a(op, self.regs.a, self.regs.f);
        self.regs.a = result;
        self.put_flags(f);
    }

    /// CB rotate/shift. Indexed forms may also copy the result to a register.
    pub(crate) fn op_rot<B: Bus + ?Sized>(
        &mut self,
        op: RotOp,
        loc: Loc8,
        copy: Option<Reg8>,
        ops: &Operands,
        bus: &mut B,
    ) {
        let val = self.read_loc(loc, ops, bus);
        let (result, f) = flags::rot(op, val, self.regs.f);
        self.write_loc(loc, result, ops, bus);
        if let Some(reg) = copy {
            self.regs.set8(reg, result);
        }
        self.put_flags(f);
    }

    /// BIT b,loc. X/Y leak from the operand for registers and from the
    /// high byte of WZ for memory forms.
    pub(crate) fn op_bit<B: Bus + ?Sized>(&mut self, bit: u8, loc: Loc8, ops: &Operands, bus: &mut B) {
        let val = self.read_loc(loc, ops, bus);
        let set = val & (1 << bit);

        let mut f = (self.regs.f & Flag::C as u8) | Flag::H as u8;
        if set == 0 {
            f |= Flag::Z as u8 | Flag::PV as u8;
        }
        if bit == 7 && set != 0 {
            f |= Flag::S as u8;
        }
        f |= match loc {
            Loc8::Reg(_) => val & XY,
            _ => (self.memptr >> 8) as u8 & XY,
        };
        self.put_flags(f);
    }

    pub(crate) fn op_res_set<B: Bus + ?Sized>(
        &mut self,
        bit: u8,
        set: bool,
        loc: Loc8,
        copy: Option<Reg8>,
        ops: &Operands,
        bus: &mut B,
    ) {
        let val = self.read_loc(loc, ops, bus);
        let result = if set { val | (1 << bit) } else { val & !(1 << bit) };
        self.write_loc(loc, result, ops, bus);
        if let Some(reg) = copy {
            self.regs.set8(reg, result);
        }
    }

    /// RLD: rotate the low nibble of A and the byte at (HL) left by one nibble.
    pub(crate) fn op_rld<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.regs.hl();
        let val = bus.read_byte(addr);
        let a = self.regs.a;
        bus.write_byte(addr, (val << 4) | (a & 0x0F));
        self.regs.a = (a & 0xF0) | (val >> 4);
        self.finish_nibble_rotate(addr);
    }

    pub(crate) fn op_rrd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.regs.hl();
        let val = bus.read_byte(addr);
        let a = self.regs.a;
        bus.write_byte(addr, (a << 4) | (val >> 4));
        self.regs.a = (a & 0xF0) | (val & 0x0F);
        self.finish_nibble_rotate(addr);
    }

    fn finish_nibble_rotate(&mut self, addr: u16) {
        self.memptr = addr.wrapping_add(1);
        let f = (self.regs.f & Flag::C as u8) | flags::szxyp(self.regs.a);
        self.put_flags(f);
    }
}
