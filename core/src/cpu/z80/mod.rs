mod alu;
mod bit;
mod block;
mod branch;
pub mod decode;
pub mod flags;
pub mod interrupt;
mod load_store;
pub mod op;
pub mod registers;
mod stack;
pub mod table;

use crate::core::{Bus, ExecutionError, hook::ExecHook};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, Z80State},
};

pub use decode::{Instruction, Operands};
pub use interrupt::{InterruptKind, InterruptMode};
pub use op::{Op, Prefix};
pub use registers::{Flag, Registers};
pub use table::{OpEntry, OpcodeTables, STANDARD_TABLES};

/// T-states burned per `step` while halted (an internal NOP).
pub const HALT_IDLE_CYCLES: u32 = 4;

/// What a single `step` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Executed { instr: Instruction, cycles: u32 },
    Interrupt { kind: InterruptKind, cycles: u32 },
    HaltIdle { cycles: u32 },
}

impl Step {
    pub fn cycles(&self) -> u32 {
        match *self {
            Step::Executed { cycles, .. }
            | Step::Interrupt { cycles, .. }
            | Step::HaltIdle { cycles } => cycles,
        }
    }
}

/// Instruction-stepped Z80 interpreter.
pub struct Z80 {
    pub regs: Registers,

    // Interrupt state
    pub iff1: bool,
    pub iff2: bool,
    pub im: InterruptMode,
    pub halted: bool,
    pub(crate) nmi_pending: bool,
    pub(crate) int_line: bool,

    // Hidden state
    pub memptr: u16,  // WZ
    pub ei_delay: bool,
    pub p: bool,      // Set by LD A,I / LD A,R for the interrupt P/V quirk
    pub q: u8,        // F if the last instruction wrote flags, 0 otherwise
    pub(crate) prev_q: u8,
    pub(crate) prefix_pending: bool,

    /// T-states consumed since construction or the last reset.
    pub cycles: u64,

    tables: &'static OpcodeTables,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    pub fn new() -> Self {
        Self::with_tables(&STANDARD_TABLES)
    }

    /// Interpreter dispatching through custom (possibly partial) tables.
    pub fn with_tables(tables: &'static OpcodeTables) -> Self {
        Self {
            regs: Registers::new(),
            iff1: false,
            iff2: false,
            im: InterruptMode::Mode0,
            halted: false,
            nmi_pending: false,
            int_line: false,
            memptr: 0,
            ei_delay: false,
            p: false,
            q: 0,
            prev_q: 0,
            prefix_pending: false,
            cycles: 0,
            tables,
        }
    }

    pub fn tables(&self) -> &'static OpcodeTables {
        self.tables
    }

    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    pub fn int_line(&self) -> bool {
        self.int_line
    }

    /// Write F and latch it into Q.
    pub(crate) fn put_flags(&mut self, f: u8) {
        self.regs.f = f;
        self.q = f;
    }

    /// Run one instruction, interrupt response, or halted idle cycle.
    pub fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<Step, ExecutionError> {
        self.run_step(bus, None)
    }

    /// As `step`, with `hook` observing the decoded instruction before it runs.
    pub fn step_with_hook<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        hook: &mut dyn ExecHook,
    ) -> Result<Step, ExecutionError> {
        self.run_step(bus, Some(hook))
    }

    fn run_step<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        hook: Option<&mut dyn ExecHook>,
    ) -> Result<Step, ExecutionError> {
        if let Some(step) = self.service_interrupt(bus) {
            return Ok(step);
        }

        if self.halted {
            self.regs.bump_r(1);
            self.cycles += HALT_IDLE_CYCLES as u64;
            return Ok(Step::HaltIdle { cycles: HALT_IDLE_CYCLES });
        }

        // Nothing below the decode may fail, so a decode error leaves the CPU as it was.
        let instr = self.decode(bus)?;

        // Still untouched here: a hook that panics leaves the instruction to run again.
        if let Some(hook) = hook {
            hook.before_execute(self, &instr);
        }

        let chained = instr.op() == Op::IgnoredPrefix;
        self.regs.bump_r(if chained { 1 } else { instr.prefix.m1_fetches() });
        self.regs.pc = instr.next_pc();
        if !chained {
            self.ei_delay = false;
            self.p = false;
            self.prev_q = self.q;
            self.q = 0;
        }
        self.prefix_pending = chained;

        let taken = self.execute(&instr, bus);
        let cycles = instr.entry.cycles_for(taken) as u32;
        self.cycles += cycles as u64;
        Ok(Step::Executed { instr, cycles })
    }

    /// Apply a decoded instruction. Returns whether a conditional branch was
    /// taken (or a block instruction repeats), which selects the cycle cost.
    fn execute<B: Bus + ?Sized>(&mut self, instr: &Instruction, bus: &mut B) -> bool {
        let ops = &instr.operands;
        match instr.entry.op {
            Op::Prefix(_) | Op::IndexedCb(_) => {
                unreachable!("prefix marker {:?} survived decode", instr.entry.op)
            }
            Op::Nop | Op::EdNop | Op::IgnoredPrefix => {}
            Op::Halt => self.op_halt(),
            Op::Di => self.op_di(),
            Op::Ei => self.op_ei(),
            Op::Im(mode) => self.op_im(mode),
            Op::Daa => self.op_daa(),
            Op::Cpl => self.op_cpl(),
            Op::Neg => self.op_neg(),
            Op::Scf => self.op_scf(),
            Op::Ccf => self.op_ccf(),

            Op::Ld8 { dst, src } => self.op_ld8(dst, src, ops, bus),
            Op::Ld16Imm(rr) => self.regs.set16(rr, ops.word()),
            Op::Ld16Store(rr) => self.op_ld16_store(rr, ops.word(), bus),
            Op::Ld16Load(rr) => self.op_ld16_load(rr, ops.word(), bus),
            Op::LdSp(rr) => self.regs.sp = self.regs.get16(rr),
            Op::LdASpecial(reg) => self.op_ld_a_special(reg),
            Op::LdSpecialA(reg) => self.op_ld_special_a(reg),
            Op::ExAf => self.regs.exchange_af(),
            Op::Exx => self.regs.exx(),
            Op::ExDeHl => self.op_ex_de_hl(),
            Op::ExSp(rr) => self.op_ex_sp(rr, bus),
            Op::Push(rr) => self.op_push(rr, bus),
            Op::Pop(rr) => self.op_pop(rr, bus),

            Op::Alu { op, src } => {
                let val = self.read_loc(src, ops, bus);
                self.perform_alu_op(op, val);
            }
            Op::Inc8(loc) => self.op_inc_dec8(loc, false, ops, bus),
            Op::Dec8(loc) => self.op_inc_dec8(loc, true, ops, bus),
            Op::Inc16(rr) => self.regs.set16(rr, self.regs.get16(rr).wrapping_add(1)),
            Op::Dec16(rr) => self.regs.set16(rr, self.regs.get16(rr).wrapping_sub(1)),
            Op::Add16 { dst, src } => self.op_add16(dst, src),
            Op::Adc16(rr) => self.op_adc16(rr),
            Op::Sbc16(rr) => self.op_sbc16(rr),

            Op::RotA(op) => self.op_rot_a(op),
            Op::Rot { op, loc, copy } => self.op_rot(op, loc, copy, ops, bus),
            Op::Bit { bit, loc } => self.op_bit(bit, loc, ops, bus),
            Op::Res { bit, loc, copy } => self.op_res_set(bit, false, loc, copy, ops, bus),
            Op::Set { bit, loc, copy } => self.op_res_set(bit, true, loc, copy, ops, bus),
            Op::Rld => self.op_rld(bus),
            Op::Rrd => self.op_rrd(bus),

            Op::Block { op, decrement, repeat } => return self.op_block(op, decrement, repeat, bus),

            Op::InImm => self.op_in_a_n(ops.byte(), bus),
            Op::OutImm => self.op_out_n_a(ops.byte(), bus),
            Op::InC(reg) => self.op_in_r_c(reg, bus),
            Op::OutC(reg) => self.op_out_c_r(reg, bus),

            Op::Jp(cond) => return self.op_jp(cond, ops.word()),
            Op::JpInd(rr) => self.regs.pc = self.regs.get16(rr),
            Op::Jr(cond) => return self.op_jr(cond, ops.byte() as i8),
            Op::Djnz => return self.op_djnz(ops.byte() as i8),
            Op::Call(cond) => return self.op_call(cond, ops.word(), bus),
            Op::Ret(cond) => return self.op_ret(cond, bus),
            Op::Retn | Op::Reti => self.op_retn(bus),
            Op::Rst(vector) => self.op_rst(vector, bus),
        }
        true
    }
}

impl Cpu for Z80 {
    /// Power-on state: registers back to defaults, interrupts off, IM 0,
    /// pending requests dropped, cycle counter cleared.
    fn reset(&mut self) {
        *self = Self::with_tables(self.tables);
        log::debug!("z80 reset");
    }

    fn signal_nmi(&mut self) {
        self.nmi_pending = true;
    }

    fn set_int_line(&mut self, active: bool) {
        self.int_line = active;
    }

    fn is_sleeping(&self) -> bool {
        self.halted
    }
}

impl CpuStateTrait for Z80 {
    type Snapshot = Z80State;

    fn snapshot(&self) -> Z80State {
        Z80State {
            regs: self.regs,
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            nmi_pending: self.nmi_pending,
            int_line: self.int_line,
            halted: self.halted,
            ei_delay: self.ei_delay,
            prefix_pending: self.prefix_pending,
            memptr: self.memptr,
            p: self.p,
            q: self.q,
            cycles: self.cycles,
        }
    }

    fn restore(&mut self, state: &Z80State) {
        self.regs = state.regs;
        self.iff1 = state.iff1;
        self.iff2 = state.iff2;
        self.im = state.im;
        self.nmi_pending = state.nmi_pending;
        self.int_line = state.int_line;
        self.halted = state.halted;
        self.ei_delay = state.ei_delay;
        self.prefix_pending = state.prefix_pending;
        self.memptr = state.memptr;
        self.p = state.p;
        self.q = state.q;
        self.prev_q = state.q;
        self.cycles = state.cycles;
    }
}
