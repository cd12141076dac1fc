use crate::core::Bus;
use crate::cpu::z80::decode::Operands;
use crate::cpu::z80::flags;
use crate::cpu::z80::op::{Loc8, Reg16, Reg8, SpecialReg};
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    // --- Operand access ---

    /// Effective address of a memory operand. Indexed forms latch it into WZ.
    fn loc_addr(&mut self, loc: Loc8, ops: &Operands) -> u16 {
        match loc {
            Loc8::Ind(rr) => self.regs.get16(rr),
            Loc8::Indexed(index) => {
                let addr = self.regs.get16(index.reg16()).wrapping_add(ops.displacement() as u16);
                self.memptr = addr;
                addr
            }
            Loc8::Abs => ops.word(),
            Loc8::Reg(_) | Loc8::Imm => 0,
        }
    }

    pub(crate) fn read_loc<B: Bus + ?Sized>(&mut self, loc: Loc8, ops: &Operands, bus: &mut B) -> u8 {
        match loc {
            Loc8::Reg(reg) => self.regs.get8(reg),
            Loc8::Imm => ops.byte(),
            _ => {
                let addr = self.loc_addr(loc, ops);
                bus.read_byte(addr)
            }
        }
    }

    /// Writes to `Loc8::Imm` are dropped; no opcode encodes one.
    pub(crate) fn write_loc<B: Bus + ?Sized>(&mut self, loc: Loc8, val: u8, ops: &Operands, bus: &mut B) {
        match loc {
            Loc8::Reg(reg) => self.regs.set8(reg, val),
            Loc8::Imm => {}
            _ => {
                let addr = self.loc_addr(loc, ops);
                bus.write_byte(addr, val);
            }
        }
    }

    // --- Loads ---

    /// LD dst,src for every 8-bit form, including the A <-> (BC)/(DE)/(nn)
    /// transfers that leave a trace in WZ.
    pub(crate) fn op_ld8<B: Bus + ?Sized>(&mut self, dst: Loc8, src: Loc8, ops: &Operands, bus: &mut B) {
        let val = self.read_loc(src, ops, bus);
        self.write_loc(dst, val, ops, bus);

        let a_high = (self.regs.a as u16) << 8;
        match (dst, src) {
            (Loc8::Reg(Reg8::A), Loc8::Ind(rr @ (Reg16::BC | Reg16::DE))) => {
                self.memptr = self.regs.get16(rr).wrapping_add(1);
            }
            (Loc8::Ind(rr @ (Reg16::BC | Reg16::DE)), Loc8::Reg(Reg8::A)) => {
                self.memptr = a_high | (self.regs.get16(rr).wrapping_add(1) & 0x00FF);
            }
            (Loc8::Reg(Reg8::A), Loc8::Abs) => {
                self.memptr = ops.word().wrapping_add(1);
            }
            (Loc8::Abs, Loc8::Reg(Reg8::A)) => {
                self.memptr = a_high | (ops.word().wrapping_add(1) & 0x00FF);
            }
            _ => {}
        }
    }

    /// LD (nn),rr
    pub(crate) fn op_ld16_store<B: Bus + ?Sized>(&mut self, rr: Reg16, addr: u16, bus: &mut B) {
        bus.write_word(addr, self.regs.get16(rr));
        self.memptr = addr.wrapping_add(1);
    }

    /// LD rr,(nn)
    pub(crate) fn op_ld16_load<B: Bus + ?Sized>(&mut self, rr: Reg16, addr: u16, bus: &mut B) {
        let val = bus.read_word(addr);
        self.regs.set16(rr, val);
        self.memptr = addr.wrapping_add(1);
    }

    /// LD A,I / LD A,R: P/V reports IFF2.
    pub(crate) fn op_ld_a_special(&mut self, reg: SpecialReg) {
        self.regs.a = match reg {
            SpecialReg::I => self.regs.i,
            SpecialReg::R => self.regs.r,
        };
        let mut f = (self.regs.f & Flag::C as u8) | flags::szxy(self.regs.a);
        if self.iff2 {
            f |= Flag::PV as u8;
        }
        self.put_flags(f);
        self.p = true;
    }

    /// LD I,A / LD R,A
    pub(crate) fn op_ld_special_a(&mut self, reg: SpecialReg) {
        match reg {
            SpecialReg::I => self.regs.i = self.regs.a,
            SpecialReg::R => self.regs.r = self.regs.a,
        }
    }

    pub(crate) fn op_ex_de_hl(&mut self) {
        let de = self.regs.de();
        self.regs.set_de(self.regs.hl());
        self.regs.set_hl(de);
    }

    // --- Port I/O ---

    /// IN A,(n): A supplies the high byte of the port address.
    pub(crate) fn op_in_a_n<B: Bus + ?Sized>(&mut self, n: u8, bus: &mut B) {
        let port = ((self.regs.a as u16) << 8) | n as u16;
        self.regs.a = bus.io_read(port);
        self.memptr = port.wrapping_add(1);
    }

    /// OUT (n),A
    pub(crate) fn op_out_n_a<B: Bus + ?Sized>(&mut self, n: u8, bus: &mut B) {
        let a = self.regs.a;
        let port = ((a as u16) << 8) | n as u16;
        bus.io_write(port, a);
        self.memptr = ((a as u16) << 8) | (n.wrapping_add(1) as u16);
    }

    /// IN r,(C). With no target register only the flags change.
    pub(crate) fn op_in_r_c<B: Bus + ?Sized>(&mut self, reg: Option<Reg8>, bus: &mut B) {
        let port = self.regs.bc();
        let val = bus.io_read(port);
        if let Some(reg) = reg {
            self.regs.set8(reg, val);
        }
        let f = (self.regs.f & Flag::C as u8) | flags::szxyp(val);
        self.put_flags(f);
        self.memptr = port.wrapping_add(1);
    }

    /// OUT (C),r. With no source register a zero is written.
    pub(crate) fn op_out_c_r<B: Bus + ?Sized>(&mut self, reg: Option<Reg8>, bus: &mut B) {
        let port = self.regs.bc();
        let val = reg.map_or(0, |reg| self.regs.get8(reg));
        bus.io_write(port, val);
        self.memptr = port.wrapping_add(1);
    }
}
