//! Opcode dispatch tables.
//!
//! Five physical 256-entry tables (unprefixed, CB, ED, DD, FD) are built at
//! compile time. DDCB/FDCB entries are derived from the CB table on demand by
//! swapping the register operand for `(IX+d)` / `(IY+d)`.

use super::op::{
    AluOp, BlockOp, Cond, Index, Loc8, Op, OperandShape, Prefix, Reg16, Reg8, RotOp, SpecialReg,
};

/// One table slot: what to run, how long it is, and what it costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpEntry {
    pub op: Op,
    pub operands: OperandShape,
    /// Total instruction length in bytes, prefixes included.
    pub len: u8,
    /// T-states when the condition holds (or for unconditional ops).
    pub cycles: u8,
    /// T-states when a conditional branch/call/return or block repeat falls through.
    pub cycles_not_taken: u8,
}

impl OpEntry {
    const fn new(op: Op, operands: OperandShape, prefix_len: u8, cycles: u8) -> Self {
        Self::cond(op, operands, prefix_len, cycles, cycles)
    }

    const fn cond(op: Op, operands: OperandShape, prefix_len: u8, taken: u8, not_taken: u8) -> Self {
        Self {
            op,
            operands,
            len: prefix_len + 1 + operands.len(),
            cycles: taken,
            cycles_not_taken: not_taken,
        }
    }

    /// Prefix bytes are charged through the entries of the table they select.
    const fn marker(op: Op, prefix_len: u8) -> Self {
        Self::new(op, OperandShape::None, prefix_len, 0)
    }

    pub const fn cycles_for(&self, taken: bool) -> u8 {
        if taken { self.cycles } else { self.cycles_not_taken }
    }
}

type Table = [Option<OpEntry>; 256];

#[derive(Clone)]
pub struct OpcodeTables {
    pub unprefixed: Table,
    pub cb: Table,
    pub ed: Table,
    pub dd: Table,
    pub fd: Table,
}

/// The complete documented + undocumented instruction set.
pub static STANDARD_TABLES: OpcodeTables = OpcodeTables::standard();

impl OpcodeTables {
    pub const fn standard() -> Self {
        let mut unprefixed = [None; 256];
        let mut cb = [None; 256];
        let mut ed = [None; 256];
        let mut dd = [None; 256];
        let mut fd = [None; 256];

        let mut i = 0;
        while i < 256 {
            let op = i as u8;
            unprefixed[i] = Some(unprefixed_entry(op));
            cb[i] = Some(cb_entry(op));
            ed[i] = Some(ed_entry(op));
            dd[i] = Some(indexed_entry(op, Index::IX));
            fd[i] = Some(indexed_entry(op, Index::IY));
            i += 1;
        }

        Self { unprefixed, cb, ed, dd, fd }
    }

    /// The physical table a prefix resolves through. DDCB/FDCB share the CB table.
    pub fn table(&self, prefix: Prefix) -> &Table {
        match prefix {
            Prefix::None => &self.unprefixed,
            Prefix::CB | Prefix::DDCB | Prefix::FDCB => &self.cb,
            Prefix::ED => &self.ed,
            Prefix::DD => &self.dd,
            Prefix::FD => &self.fd,
        }
    }

    fn table_mut(&mut self, prefix: Prefix) -> &mut Table {
        match prefix {
            Prefix::None => &mut self.unprefixed,
            Prefix::CB | Prefix::DDCB | Prefix::FDCB => &mut self.cb,
            Prefix::ED => &mut self.ed,
            Prefix::DD => &mut self.dd,
            Prefix::FD => &mut self.fd,
        }
    }

    /// Resolve a slot. For DDCB/FDCB the CB entry is rewritten to its
    /// indexed form.
    pub fn lookup(&self, prefix: Prefix, opcode: u8) -> Option<OpEntry> {
        let entry = self.table(prefix)[opcode as usize]?;
        match prefix {
            Prefix::DDCB => indexed_cb_entry(entry, Index::IX),
            Prefix::FDCB => indexed_cb_entry(entry, Index::IY),
            _ => Some(entry),
        }
    }

    /// A copy of these tables with one slot emptied. Emptying a DDCB/FDCB
    /// slot empties the shared CB slot.
    pub fn without(&self, prefix: Prefix, opcode: u8) -> Self {
        let mut tables = self.clone();
        tables.table_mut(prefix)[opcode as usize] = None;
        tables
    }
}

impl std::fmt::Debug for OpcodeTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filled = |t: &Table| t.iter().filter(|e| e.is_some()).count();
        f.debug_struct("OpcodeTables")
            .field("unprefixed", &filled(&self.unprefixed))
            .field("cb", &filled(&self.cb))
            .field("ed", &filled(&self.ed))
            .field("dd", &filled(&self.dd))
            .field("fd", &filled(&self.fd))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Operand decoding tables (x/y/z/p/q opcode fields)
// ---------------------------------------------------------------------------

const R: [Loc8; 8] = [
    Loc8::Reg(Reg8::B),
    Loc8::Reg(Reg8::C),
    Loc8::Reg(Reg8::D),
    Loc8::Reg(Reg8::E),
    Loc8::Reg(Reg8::H),
    Loc8::Reg(Reg8::L),
    Loc8::Ind(Reg16::HL),
    Loc8::Reg(Reg8::A),
];

/// Register operands of IN r,(C) / OUT (C),r; slot 6 is the flags-only form.
const IO_R: [Option<Reg8>; 8] = [
    Some(Reg8::B),
    Some(Reg8::C),
    Some(Reg8::D),
    Some(Reg8::E),
    Some(Reg8::H),
    Some(Reg8::L),
    None,
    Some(Reg8::A),
];

const RP: [Reg16; 4] = [Reg16::BC, Reg16::DE, Reg16::HL, Reg16::SP];
const RP2: [Reg16; 4] = [Reg16::BC, Reg16::DE, Reg16::HL, Reg16::AF];

const CC: [Cond; 8] = [
    Cond::NZ,
    Cond::Z,
    Cond::NC,
    Cond::C,
    Cond::PO,
    Cond::PE,
    Cond::P,
    Cond::M,
];

const ALU: [AluOp; 8] = [
    AluOp::Add,
    AluOp::Adc,
    AluOp::Sub,
    AluOp::Sbc,
    AluOp::And,
    AluOp::Xor,
    AluOp::Or,
    AluOp::Cp,
];

const ROT: [RotOp; 8] = [
    RotOp::Rlc,
    RotOp::Rrc,
    RotOp::Rl,
    RotOp::Rr,
    RotOp::Sla,
    RotOp::Sra,
    RotOp::Sll,
    RotOp::Srl,
];

const BLOCK: [BlockOp; 4] = [BlockOp::Ld, BlockOp::Cp, BlockOp::In, BlockOp::Out];

/// IM operand by ED opcode y field; the undocumented mirrors select IM 0.
const IM: [u8; 8] = [0, 0, 1, 2, 0, 0, 1, 2];

// ---------------------------------------------------------------------------
// Table builders
// ---------------------------------------------------------------------------

const fn e0(op: Op, shape: OperandShape, cycles: u8) -> OpEntry {
    OpEntry::new(op, shape, 0, cycles)
}

const fn e1(op: Op, shape: OperandShape, cycles: u8) -> OpEntry {
    OpEntry::new(op, shape, 1, cycles)
}

const fn unprefixed_entry(opcode: u8) -> OpEntry {
    use OperandShape::{Imm16, Imm8, None as NoOps};

    let x = opcode >> 6;
    let y = ((opcode >> 3) & 7) as usize;
    let z = (opcode & 7) as usize;
    let p = y >> 1;
    let q = y & 1;

    match x {
        0 => match z {
            0 => match y {
                0 => e0(Op::Nop, NoOps, 4),
                1 => e0(Op::ExAf, NoOps, 4),
                2 => OpEntry::cond(Op::Djnz, Imm8, 0, 13, 8),
                3 => e0(Op::Jr(None), Imm8, 12),
                _ => OpEntry::cond(Op::Jr(Some(CC[y - 4])), Imm8, 0, 12, 7),
            },
            1 => {
                if q == 0 {
                    e0(Op::Ld16Imm(RP[p]), Imm16, 10)
                } else {
                    e0(Op::Add16 { dst: Reg16::HL, src: RP[p] }, NoOps, 11)
                }
            }
            2 => {
                let a = Loc8::Reg(Reg8::A);
                match y {
                    0 => e0(Op::Ld8 { dst: Loc8::Ind(Reg16::BC), src: a }, NoOps, 7),
                    1 => e0(Op::Ld8 { dst: a, src: Loc8::Ind(Reg16::BC) }, NoOps, 7),
                    2 => e0(Op::Ld8 { dst: Loc8::Ind(Reg16::DE), src: a }, NoOps, 7),
                    3 => e0(Op::Ld8 { dst: a, src: Loc8::Ind(Reg16::DE) }, NoOps, 7),
                    4 => e0(Op::Ld16Store(Reg16::HL), Imm16, 16),
                    5 => e0(Op::Ld16Load(Reg16::HL), Imm16, 16),
                    6 => e0(Op::Ld8 { dst: Loc8::Abs, src: a }, Imm16, 13),
                    _ => e0(Op::Ld8 { dst: a, src: Loc8::Abs }, Imm16, 13),
                }
            }
            3 => {
                if q == 0 {
                    e0(Op::Inc16(RP[p]), NoOps, 6)
                } else {
                    e0(Op::Dec16(RP[p]), NoOps, 6)
                }
            }
            4 => e0(Op::Inc8(R[y]), NoOps, if y == 6 { 11 } else { 4 }),
            5 => e0(Op::Dec8(R[y]), NoOps, if y == 6 { 11 } else { 4 }),
            6 => e0(Op::Ld8 { dst: R[y], src: Loc8::Imm }, Imm8, if y == 6 { 10 } else { 7 }),
            _ => {
                let op = match y {
                    0 => Op::RotA(RotOp::Rlc),
                    1 => Op::RotA(RotOp::Rrc),
                    2 => Op::RotA(RotOp::Rl),
                    3 => Op::RotA(RotOp::Rr),
                    4 => Op::Daa,
                    5 => Op::Cpl,
                    6 => Op::Scf,
                    _ => Op::Ccf,
                };
                e0(op, NoOps, 4)
            }
        },
        1 => {
            if opcode == 0x76 {
                e0(Op::Halt, NoOps, 4)
            } else {
                let cycles = if y == 6 || z == 6 { 7 } else { 4 };
                e0(Op::Ld8 { dst: R[y], src: R[z] }, NoOps, cycles)
            }
        }
        2 => e0(Op::Alu { op: ALU[y], src: R[z] }, NoOps, if z == 6 { 7 } else { 4 }),
        _ => match z {
            0 => OpEntry::cond(Op::Ret(Some(CC[y])), NoOps, 0, 11, 5),
            1 => {
                if q == 0 {
                    e0(Op::Pop(RP2[p]), NoOps, 10)
                } else {
                    match p {
                        0 => e0(Op::Ret(None), NoOps, 10),
                        1 => e0(Op::Exx, NoOps, 4),
                        2 => e0(Op::JpInd(Reg16::HL), NoOps, 4),
                        _ => e0(Op::LdSp(Reg16::HL), NoOps, 6),
                    }
                }
            }
            2 => e0(Op::Jp(Some(CC[y])), Imm16, 10),
            3 => match y {
                0 => e0(Op::Jp(None), Imm16, 10),
                1 => OpEntry::marker(Op::Prefix(Prefix::CB), 0),
                2 => e0(Op::OutImm, Imm8, 11),
                3 => e0(Op::InImm, Imm8, 11),
                4 => e0(Op::ExSp(Reg16::HL), NoOps, 19),
                5 => e0(Op::ExDeHl, NoOps, 4),
                6 => e0(Op::Di, NoOps, 4),
                _ => e0(Op::Ei, NoOps, 4),
            },
            4 => OpEntry::cond(Op::Call(Some(CC[y])), Imm16, 0, 17, 10),
            5 => {
                if q == 0 {
                    e0(Op::Push(RP2[p]), NoOps, 11)
                } else {
                    match p {
                        0 => e0(Op::Call(None), Imm16, 17),
                        1 => OpEntry::marker(Op::Prefix(Prefix::DD), 0),
                        2 => OpEntry::marker(Op::Prefix(Prefix::ED), 0),
                        _ => OpEntry::marker(Op::Prefix(Prefix::FD), 0),
                    }
                }
            }
            6 => e0(Op::Alu { op: ALU[y], src: Loc8::Imm }, Imm8, 7),
            _ => e0(Op::Rst((y as u8) * 8), NoOps, 11),
        },
    }
}

const fn cb_entry(opcode: u8) -> OpEntry {
    let y = (opcode >> 3) & 7;
    let z = (opcode & 7) as usize;
    let loc = R[z];
    let mem = z == 6;
    let rw_cycles = if mem { 15 } else { 8 };

    let (op, cycles) = match opcode >> 6 {
        0 => (Op::Rot { op: ROT[y as usize], loc, copy: None }, rw_cycles),
        1 => (Op::Bit { bit: y, loc }, if mem { 12 } else { 8 }),
        2 => (Op::Res { bit: y, loc, copy: None }, rw_cycles),
        _ => (Op::Set { bit: y, loc, copy: None }, rw_cycles),
    };
    OpEntry::new(op, OperandShape::None, 1, cycles)
}

const fn ed_entry(opcode: u8) -> OpEntry {
    use OperandShape::{Imm16, None as NoOps};

    let x = opcode >> 6;
    let y = ((opcode >> 3) & 7) as usize;
    let z = (opcode & 7) as usize;
    let p = y >> 1;
    let q = y & 1;

    match x {
        1 => match z {
            0 => e1(Op::InC(IO_R[y]), NoOps, 12),
            1 => e1(Op::OutC(IO_R[y]), NoOps, 12),
            2 => {
                if q == 0 {
                    e1(Op::Sbc16(RP[p]), NoOps, 15)
                } else {
                    e1(Op::Adc16(RP[p]), NoOps, 15)
                }
            }
            3 => {
                if q == 0 {
                    e1(Op::Ld16Store(RP[p]), Imm16, 20)
                } else {
                    e1(Op::Ld16Load(RP[p]), Imm16, 20)
                }
            }
            4 => e1(Op::Neg, NoOps, 8),
            5 => e1(if y == 1 { Op::Reti } else { Op::Retn }, NoOps, 14),
            6 => e1(Op::Im(IM[y]), NoOps, 8),
            _ => match y {
                0 => e1(Op::LdSpecialA(SpecialReg::I), NoOps, 9),
                1 => e1(Op::LdSpecialA(SpecialReg::R), NoOps, 9),
                2 => e1(Op::LdASpecial(SpecialReg::I), NoOps, 9),
                3 => e1(Op::LdASpecial(SpecialReg::R), NoOps, 9),
                4 => e1(Op::Rrd, NoOps, 18),
                5 => e1(Op::Rld, NoOps, 18),
                _ => e1(Op::EdNop, NoOps, 8),
            },
        },
        2 if z <= 3 && y >= 4 => {
            let op = Op::Block { op: BLOCK[z], decrement: y & 1 == 1, repeat: y >= 6 };
            if y >= 6 {
                OpEntry::cond(op, NoOps, 1, 21, 16)
            } else {
                e1(op, NoOps, 16)
            }
        }
        _ => e1(Op::EdNop, NoOps, 8),
    }
}

/// H/L operands become the index register halves; everything else is untouched.
const fn index_half(loc: Loc8, idx: Index) -> Loc8 {
    match loc {
        Loc8::Reg(Reg8::H) => Loc8::Reg(idx.high()),
        Loc8::Reg(Reg8::L) => Loc8::Reg(idx.low()),
        other => other,
    }
}

const fn indexed_entry(opcode: u8, idx: Index) -> OpEntry {
    use OperandShape::{Disp, DispImm8, Imm16, Imm8, None as NoOps};

    let ir = idx.reg16();
    let mem = Loc8::Indexed(idx);
    let y = ((opcode >> 3) & 7) as usize;
    let z = (opcode & 7) as usize;

    match opcode {
        0x09 | 0x19 | 0x29 | 0x39 => {
            let src = if y >> 1 == 2 { ir } else { RP[y >> 1] };
            e1(Op::Add16 { dst: ir, src }, NoOps, 15)
        }
        0x21 => e1(Op::Ld16Imm(ir), Imm16, 14),
        0x22 => e1(Op::Ld16Store(ir), Imm16, 20),
        0x2A => e1(Op::Ld16Load(ir), Imm16, 20),
        0x23 => e1(Op::Inc16(ir), NoOps, 10),
        0x2B => e1(Op::Dec16(ir), NoOps, 10),
        0x24 => e1(Op::Inc8(Loc8::Reg(idx.high())), NoOps, 8),
        0x25 => e1(Op::Dec8(Loc8::Reg(idx.high())), NoOps, 8),
        0x26 => e1(Op::Ld8 { dst: Loc8::Reg(idx.high()), src: Loc8::Imm }, Imm8, 11),
        0x2C => e1(Op::Inc8(Loc8::Reg(idx.low())), NoOps, 8),
        0x2D => e1(Op::Dec8(Loc8::Reg(idx.low())), NoOps, 8),
        0x2E => e1(Op::Ld8 { dst: Loc8::Reg(idx.low()), src: Loc8::Imm }, Imm8, 11),
        0x34 => e1(Op::Inc8(mem), Disp, 23),
        0x35 => e1(Op::Dec8(mem), Disp, 23),
        0x36 => e1(Op::Ld8 { dst: mem, src: Loc8::Imm }, DispImm8, 19),
        0x76 => e1(Op::Halt, NoOps, 8),
        // LD r,(IX+d) and LD (IX+d),r keep plain H/L on the register side.
        0x40..=0x7F => {
            if z == 6 {
                e1(Op::Ld8 { dst: R[y], src: mem }, Disp, 19)
            } else if y == 6 {
                e1(Op::Ld8 { dst: mem, src: R[z] }, Disp, 19)
            } else {
                let dst = index_half(R[y], idx);
                let src = index_half(R[z], idx);
                e1(Op::Ld8 { dst, src }, NoOps, 8)
            }
        }
        0x80..=0xBF => {
            if z == 6 {
                e1(Op::Alu { op: ALU[y], src: mem }, Disp, 19)
            } else {
                e1(Op::Alu { op: ALU[y], src: index_half(R[z], idx) }, NoOps, 8)
            }
        }
        0xCB => OpEntry::marker(Op::IndexedCb(idx), 1),
        0xDD | 0xED | 0xFD => OpEntry::new(Op::IgnoredPrefix, NoOps, 0, 4),
        0xE1 => e1(Op::Pop(ir), NoOps, 14),
        0xE3 => e1(Op::ExSp(ir), NoOps, 23),
        0xE5 => e1(Op::Push(ir), NoOps, 15),
        0xE9 => e1(Op::JpInd(ir), NoOps, 8),
        0xF9 => e1(Op::LdSp(ir), NoOps, 10),
        // Opcodes that never touch HL: the prefix is a 4 T-state passenger.
        _ => {
            let base = unprefixed_entry(opcode);
            OpEntry {
                len: base.len + 1,
                cycles: base.cycles + 4,
                cycles_not_taken: base.cycles_not_taken + 4,
                ..base
            }
        }
    }
}

const fn copy_target(loc: Loc8) -> Option<Reg8> {
    match loc {
        Loc8::Reg(r) => Some(r),
        _ => None,
    }
}

/// DD CB d op / FD CB d op: the CB operation applied to (IX+d)/(IY+d).
/// Register-target encodings also store the result in that register.
pub const fn indexed_cb_entry(cb: OpEntry, idx: Index) -> Option<OpEntry> {
    let mem = Loc8::Indexed(idx);
    let (op, cycles) = match cb.op {
        Op::Rot { op, loc, .. } => (Op::Rot { op, loc: mem, copy: copy_target(loc) }, 23),
        Op::Bit { bit, .. } => (Op::Bit { bit, loc: mem }, 20),
        Op::Res { bit, loc, .. } => (Op::Res { bit, loc: mem, copy: copy_target(loc) }, 23),
        Op::Set { bit, loc, .. } => (Op::Set { bit, loc: mem, copy: copy_target(loc) }, 23),
        _ => return None,
    };
    Some(OpEntry {
        op,
        operands: OperandShape::Disp,
        len: 4,
        cycles,
        cycles_not_taken: cycles,
    })
}
