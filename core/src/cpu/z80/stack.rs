use crate::core::Bus;
use crate::cpu::z80::Z80;
use crate::cpu::z80::op::Reg16;

impl Z80 {
    /// High byte goes to SP-1, low byte to SP-2.
    pub(crate) fn push_word<B: Bus + ?Sized>(&mut self, bus: &mut B, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_byte(self.regs.sp, (val >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_byte(self.regs.sp, val as u8);
    }

    pub(crate) fn pop_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let low = bus.read_byte(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let high = bus.read_byte(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        ((high as u16) << 8) | low as u16
    }

    /// PUSH BC/DE/HL/AF/IX/IY
    pub(crate) fn op_push<B: Bus + ?Sized>(&mut self, rr: Reg16, bus: &mut B) {
        let val = self.regs.get16(rr);
        self.push_word(bus, val);
    }

    /// POP BC/DE/HL/AF/IX/IY. POP AF loads F directly, so Q is not latched.
    pub(crate) fn op_pop<B: Bus + ?Sized>(&mut self, rr: Reg16, bus: &mut B) {
        let val = self.pop_word(bus);
        self.regs.set16(rr, val);
    }

    /// EX (SP),HL / IX / IY
    pub(crate) fn op_ex_sp<B: Bus + ?Sized>(&mut self, rr: Reg16, bus: &mut B) {
        let sp = self.regs.sp;
        let from_stack = bus.read_word(sp);
        bus.write_word(sp, self.regs.get16(rr));
        self.regs.set16(rr, from_stack);
        self.memptr = from_stack;
    }
}
