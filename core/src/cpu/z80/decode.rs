use std::fmt;

use super::Z80;
use super::op::{Index, Op, OperandShape, Prefix};
use super::table::OpEntry;
use crate::core::{ExecutionError, Memory};

/// Operand bytes read after the opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operands {
    None,
    Byte(u8),
    Word(u16),
    Disp(i8),
    DispByte(i8, u8),
}

impl Operands {
    pub fn byte(&self) -> u8 {
        match *self {
            Operands::Byte(n) | Operands::DispByte(_, n) => n,
            _ => 0,
        }
    }

    pub fn word(&self) -> u16 {
        match *self {
            Operands::Word(nn) => nn,
            _ => 0,
        }
    }

    pub fn displacement(&self) -> i8 {
        match *self {
            Operands::Disp(d) | Operands::DispByte(d, _) => d,
            _ => 0,
        }
    }
}

/// A fully resolved instruction, ready to execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Address of the first byte (first prefix, if any).
    pub pc: u16,
    pub prefix: Prefix,
    pub opcode: u8,
    pub operands: Operands,
    pub entry: OpEntry,
}

impl Instruction {
    pub fn op(&self) -> Op {
        self.entry.op
    }

    pub fn len(&self) -> u16 {
        self.entry.len as u16
    }

    pub fn next_pc(&self) -> u16 {
        self.pc.wrapping_add(self.len())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}  {}{:02X}", self.pc, self.prefix.mnemonic_bytes(), self.opcode)?;
        match self.operands {
            Operands::None => {}
            Operands::Byte(n) => write!(f, " {n:02X}")?,
            Operands::Word(nn) => write!(f, " {:02X} {:02X}", nn as u8, nn >> 8)?,
            Operands::Disp(d) => write!(f, " d={d:+}")?,
            Operands::DispByte(d, n) => write!(f, " d={d:+} {n:02X}")?,
        }
        write!(f, "  {:?}", self.entry.op)
    }
}

impl Z80 {
    /// Resolve the instruction at PC through the prefix chain.
    ///
    /// Only reads memory; CPU state is untouched so a failed decode can be
    /// retried after the tables are fixed.
    pub fn decode<B: Memory + ?Sized>(&self, bus: &mut B) -> Result<Instruction, ExecutionError> {
        let pc = self.regs.pc;
        let unsupported = |prefix, opcode| ExecutionError::UnsupportedOpcode { prefix, opcode, pc };

        let first = bus.read_byte(pc);
        let mut entry = self.tables.lookup(Prefix::None, first).ok_or(unsupported(Prefix::None, first))?;
        let mut prefix = Prefix::None;
        let mut opcode = first;
        // Address of the first operand byte.
        let mut cursor = pc.wrapping_add(1);

        if let Op::Prefix(p) = entry.op {
            prefix = p;
            opcode = bus.read_byte(cursor);
            cursor = cursor.wrapping_add(1);
            entry = self.tables.lookup(p, opcode).ok_or(unsupported(p, opcode))?;

            if let Op::IndexedCb(index) = entry.op {
                // DD CB d op: displacement comes before the operation byte.
                let d = bus.read_byte(cursor) as i8;
                let cb_prefix = match index {
                    Index::IX => Prefix::DDCB,
                    Index::IY => Prefix::FDCB,
                };
                let cb_opcode = bus.read_byte(cursor.wrapping_add(1));
                let entry = self
                    .tables
                    .lookup(cb_prefix, cb_opcode)
                    .filter(|e| !e.op.is_marker())
                    .ok_or(unsupported(cb_prefix, cb_opcode))?;
                return Ok(Instruction {
                    pc,
                    prefix: cb_prefix,
                    opcode: cb_opcode,
                    operands: Operands::Disp(d),
                    entry,
                });
            }
        }

        // A prefix marker left over here came from a malformed custom table.
        if entry.op.is_marker() {
            return Err(unsupported(prefix, opcode));
        }

        let operands = match entry.operands {
            OperandShape::None => Operands::None,
            OperandShape::Imm8 => Operands::Byte(bus.read_byte(cursor)),
            OperandShape::Imm16 => Operands::Word(bus.read_word(cursor)),
            OperandShape::Disp => Operands::Disp(bus.read_byte(cursor) as i8),
            OperandShape::DispImm8 => Operands::DispByte(
                bus.read_byte(cursor) as i8,
                bus.read_byte(cursor.wrapping_add(1)),
            ),
        };

        Ok(Instruction { pc, prefix, opcode, operands, entry })
    }
}
