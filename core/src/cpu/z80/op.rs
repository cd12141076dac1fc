//! Decoded operation descriptors.
//!
//! Each Z80 instruction class is one `Op` variant; the operand addressing
//! mode travels with it as data so execution is a single exhaustive match.

/// Which table an opcode byte was resolved through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prefix {
    None,
    CB,
    ED,
    DD,
    FD,
    DDCB,
    FDCB,
}

impl Prefix {
    /// Prefix bytes as they appear before the opcode, for diagnostics.
    pub fn mnemonic_bytes(self) -> &'static str {
        match self {
            Prefix::None => "",
            Prefix::CB => "CB ",
            Prefix::ED => "ED ",
            Prefix::DD => "DD ",
            Prefix::FD => "FD ",
            Prefix::DDCB => "DD CB ",
            Prefix::FDCB => "FD CB ",
        }
    }

    /// M1 cycles spent fetching this instruction (each bumps R).
    pub const fn m1_fetches(self) -> u8 {
        match self {
            Prefix::None => 1,
            _ => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Index {
    IX,
    IY,
}

impl Index {
    pub const fn reg16(self) -> Reg16 {
        match self {
            Index::IX => Reg16::IX,
            Index::IY => Reg16::IY,
        }
    }

    pub const fn high(self) -> Reg8 {
        match self {
            Index::IX => Reg8::IXH,
            Index::IY => Reg8::IYH,
        }
    }

    pub const fn low(self) -> Reg8 {
        match self {
            Index::IX => Reg8::IXL,
            Index::IY => Reg8::IYL,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    IXH,
    IXL,
    IYH,
    IYL,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
    IX,
    IY,
}

/// An 8-bit operand location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loc8 {
    Reg(Reg8),
    /// Immediate byte following the opcode.
    Imm,
    /// (BC), (DE) or (HL).
    Ind(Reg16),
    /// (IX+d) / (IY+d).
    Indexed(Index),
    /// (nn), only used with A.
    Abs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cond {
    NZ,
    Z,
    NC,
    C,
    PO,
    PE,
    P,
    M,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Sll,
    Srl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockOp {
    Ld,
    Cp,
    In,
    Out,
}

/// The I and R special registers, for LD A,I / LD I,A and friends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialReg {
    I,
    R,
}

/// Bytes following the opcode that the instruction consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandShape {
    None,
    Imm8,
    Imm16,
    /// Signed index displacement.
    Disp,
    /// Displacement then immediate: LD (IX+d),n.
    DispImm8,
}

impl OperandShape {
    pub const fn len(self) -> u8 {
        match self {
            OperandShape::None => 0,
            OperandShape::Imm8 | OperandShape::Disp => 1,
            OperandShape::Imm16 | OperandShape::DispImm8 => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    // --- Prefix markers ---
    /// CB/ED/DD/FD in the unprefixed table.
    Prefix(Prefix),
    /// DD CB / FD CB: displacement then CB opcode follow.
    IndexedCb(Index),
    /// DD/FD directly followed by DD, FD or ED: the first prefix is dropped.
    IgnoredPrefix,

    // --- Misc / CPU control ---
    Nop,
    /// Undefined ED opcode, behaves as two NOPs.
    EdNop,
    Halt,
    Di,
    Ei,
    Im(u8),
    Daa,
    Cpl,
    Neg,
    Scf,
    Ccf,

    // --- Loads and exchanges ---
    Ld8 { dst: Loc8, src: Loc8 },
    /// LD rr,nn
    Ld16Imm(Reg16),
    /// LD (nn),rr
    Ld16Store(Reg16),
    /// LD rr,(nn)
    Ld16Load(Reg16),
    /// LD SP,HL / LD SP,IX / LD SP,IY
    LdSp(Reg16),
    /// LD A,I / LD A,R
    LdASpecial(SpecialReg),
    /// LD I,A / LD R,A
    LdSpecialA(SpecialReg),
    ExAf,
    Exx,
    ExDeHl,
    /// EX (SP),HL / IX / IY
    ExSp(Reg16),
    Push(Reg16),
    Pop(Reg16),

    // --- Arithmetic and logic ---
    Alu { op: AluOp, src: Loc8 },
    Inc8(Loc8),
    Dec8(Loc8),
    Inc16(Reg16),
    Dec16(Reg16),
    Add16 { dst: Reg16, src: Reg16 },
    Adc16(Reg16),
    Sbc16(Reg16),

    // --- Rotate, shift and bit ---
    /// RLCA, RRCA, RLA, RRA
    RotA(RotOp),
    /// `copy` receives the result as well (undocumented DDCB/FDCB forms).
    Rot { op: RotOp, loc: Loc8, copy: Option<Reg8> },
    Bit { bit: u8, loc: Loc8 },
    Res { bit: u8, loc: Loc8, copy: Option<Reg8> },
    Set { bit: u8, loc: Loc8, copy: Option<Reg8> },
    Rld,
    Rrd,

    // --- Block transfer, search and I/O ---
    Block { op: BlockOp, decrement: bool, repeat: bool },

    // --- I/O ---
    /// IN A,(n)
    InImm,
    /// OUT (n),A
    OutImm,
    /// IN r,(C); `None` only sets flags (ED 70).
    InC(Option<Reg8>),
    /// OUT (C),r; `None` outputs zero (ED 71).
    OutC(Option<Reg8>),

    // --- Control flow ---
    Jp(Option<Cond>),
    /// JP (HL) / (IX) / (IY)
    JpInd(Reg16),
    Jr(Option<Cond>),
    Djnz,
    Call(Option<Cond>),
    Ret(Option<Cond>),
    Retn,
    Reti,
    Rst(u8),
}

impl Op {
    /// Table markers that only steer decoding and never execute.
    pub const fn is_marker(self) -> bool {
        matches!(self, Op::Prefix(_) | Op::IndexedCb(_))
    }
}
