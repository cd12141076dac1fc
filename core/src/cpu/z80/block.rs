//! LDI/CPI/INI/OUTI and their decrementing and repeating forms.
//!
//! A repeating instruction that has more work to do rewinds PC onto itself,
//! so each iteration is a separate `step` and interrupts can land between
//! iterations.

use crate::core::Bus;
use crate::cpu::z80::flags::{self, XY};
use crate::cpu::z80::op::BlockOp;
use crate::cpu::z80::{Flag, Z80};

const C: u8 = Flag::C as u8;
const N: u8 = Flag::N as u8;
const PV: u8 = Flag::PV as u8;
const X: u8 = Flag::X as u8;
const H: u8 = Flag::H as u8;
const Y: u8 = Flag::Y as u8;
const Z: u8 = Flag::Z as u8;
const S: u8 = Flag::S as u8;

impl Z80 {
    /// Returns true when a repeating form goes round again.
    pub(crate) fn op_block<B: Bus + ?Sized>(
        &mut self,
        op: BlockOp,
        decrement: bool,
        repeat: bool,
        bus: &mut B,
    ) -> bool {
        let step: u16 = if decrement { 0xFFFF } else { 0x0001 };
        match op {
            BlockOp::Ld => self.block_ld(step, repeat, bus),
            BlockOp::Cp => self.block_cp(step, repeat, bus),
            BlockOp::In => self.block_in(step, repeat, bus),
            BlockOp::Out => self.block_out(step, repeat, bus),
        }
    }

    /// Point PC back at the instruction. X/Y then come from PC's high byte.
    fn rewind_block(&mut self, f: u8) -> u8 {
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.memptr = self.regs.pc.wrapping_add(1);
        (f & !XY) | ((self.regs.pc >> 8) as u8 & XY)
    }

    fn block_ld<B: Bus + ?Sized>(&mut self, step: u16, repeat: bool, bus: &mut B) -> bool {
        let val = bus.read_byte(self.regs.hl());
        bus.write_byte(self.regs.de(), val);
        self.regs.set_hl(self.regs.hl().wrapping_add(step));
        self.regs.set_de(self.regs.de().wrapping_add(step));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let n = val.wrapping_add(self.regs.a);
        let mut f = self.regs.f & (S | Z | C);
        if bc != 0 { f |= PV; }
        if n & 0x08 != 0 { f |= X; }
        if n & 0x02 != 0 { f |= Y; }

        let again = repeat && bc != 0;
        if again {
            f = self.rewind_block(f);
        }
        self.put_flags(f);
        again
    }

    fn block_cp<B: Bus + ?Sized>(&mut self, step: u16, repeat: bool, bus: &mut B) -> bool {
        let a = self.regs.a;
        let val = bus.read_byte(self.regs.hl());
        let result = a.wrapping_sub(val);
        self.regs.set_hl(self.regs.hl().wrapping_add(step));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);
        self.memptr = self.memptr.wrapping_add(step);

        let half = (a & 0x0F) < (val & 0x0F);
        let n = result.wrapping_sub(half as u8);
        let mut f = (self.regs.f & C) | N | (result & S);
        if result == 0 { f |= Z; }
        if half { f |= H; }
        if bc != 0 { f |= PV; }
        if n & 0x08 != 0 { f |= X; }
        if n & 0x02 != 0 { f |= Y; }

        let again = repeat && bc != 0 && result != 0;
        if again {
            f = self.rewind_block(f);
        }
        self.put_flags(f);
        again
    }

    fn block_in<B: Bus + ?Sized>(&mut self, step: u16, repeat: bool, bus: &mut B) -> bool {
        let port = self.regs.bc();
        let val = bus.io_read(port);
        bus.write_byte(self.regs.hl(), val);
        self.memptr = port.wrapping_add(step);
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.regs.set_hl(self.regs.hl().wrapping_add(step));

        let k = val as u16 + self.regs.c.wrapping_add(step as u8) as u16;
        self.finish_block_io(val, k, repeat)
    }

    fn block_out<B: Bus + ?Sized>(&mut self, step: u16, repeat: bool, bus: &mut B) -> bool {
        let val = bus.read_byte(self.regs.hl());
        self.regs.b = self.regs.b.wrapping_sub(1);
        let port = self.regs.bc();
        bus.io_write(port, val);
        self.memptr = port.wrapping_add(step);
        self.regs.set_hl(self.regs.hl().wrapping_add(step));

        let k = val as u16 + self.regs.l as u16;
        self.finish_block_io(val, k, repeat)
    }

    /// Shared INI/OUTI flag rules. `k` is the byte moved plus the adjusted
    /// C (input) or new L (output).
    fn finish_block_io(&mut self, val: u8, k: u16, repeat: bool) -> bool {
        let b = self.regs.b;
        let mut f = flags::szxy(b);
        if val & 0x80 != 0 { f |= N; }
        if k > 0xFF { f |= H | C; }
        if flags::parity((k as u8 & 0x07) ^ b) { f |= PV; }

        let again = repeat && b != 0;
        if again {
            f = self.rewind_block(f);
            // The repeat cycles run B through the ALU once more, which
            // disturbs H and P/V.
            let pv_adjust = if f & C != 0 {
                if val & 0x80 != 0 {
                    f = (f & !H) | if b & 0x0F == 0x00 { H } else { 0 };
                    b.wrapping_sub(1)
                } else {
                    f = (f & !H) | if b & 0x0F == 0x0F { H } else { 0 };
                    b.wrapping_add(1)
                }
            } else {
                b
            };
            if !flags::parity(pv_adjust & 0x07) {
                f ^= PV;
            }
        }
        self.put_flags(f);
        again
    }
}
