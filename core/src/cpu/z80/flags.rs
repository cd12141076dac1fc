//! Flag computation for the Z80 ALU.
//!
//! Every helper returns the complete F byte, undocumented bits 5 and 3
//! included, so callers never merge partial results by hand unless the
//! instruction itself preserves some flags.

use super::op::RotOp;
use super::registers::Flag;

const C: u8 = Flag::C as u8;
const N: u8 = Flag::N as u8;
const PV: u8 = Flag::PV as u8;
const X: u8 = Flag::X as u8;
const H: u8 = Flag::H as u8;
const Y: u8 = Flag::Y as u8;
const Z: u8 = Flag::Z as u8;
const S: u8 = Flag::S as u8;

/// Bits 5 and 3 of F.
pub const XY: u8 = X | Y;

/// True when `val` has an even number of set bits.
pub const fn parity(val: u8) -> bool {
    val.count_ones() % 2 == 0
}

/// S and Z from `val`, X/Y copied from it.
pub const fn szxy(val: u8) -> u8 {
    let mut f = val & (S | XY);
    if val == 0 {
        f |= Z;
    }
    f
}

/// `szxy` plus P/V as parity.
pub const fn szxyp(val: u8) -> u8 {
    let mut f = szxy(val);
    if parity(val) {
        f |= PV;
    }
    f
}

pub fn add8(a: u8, b: u8, carry: bool) -> (u8, u8) {
    let c = carry as u16;
    let wide = a as u16 + b as u16 + c;
    let result = wide as u8;

    let mut f = szxy(result);
    if (a & 0x0F) as u16 + (b & 0x0F) as u16 + c > 0x0F { f |= H; }
    if (a ^ result) & (b ^ result) & 0x80 != 0 { f |= PV; }
    if wide > 0xFF { f |= C; }
    (result, f)
}

pub fn sub8(a: u8, b: u8, carry: bool) -> (u8, u8) {
    let c = carry as u16;
    let result = a.wrapping_sub(b).wrapping_sub(c as u8);

    let mut f = szxy(result) | N;
    if ((a & 0x0F) as u16) < (b & 0x0F) as u16 + c { f |= H; }
    if (a ^ b) & (a ^ result) & 0x80 != 0 { f |= PV; }
    if (a as u16) < b as u16 + c { f |= C; }
    (result, f)
}

/// CP: flags of `a - b`, but X/Y come from the operand rather than the result.
pub fn cp8(a: u8, b: u8) -> u8 {
    let (_, f) = sub8(a, b, false);
    (f & !XY) | (b & XY)
}

pub fn and8(a: u8, b: u8) -> (u8, u8) {
    let result = a & b;
    (result, szxyp(result) | H)
}

pub fn xor8(a: u8, b: u8) -> (u8, u8) {
    let result = a ^ b;
    (result, szxyp(result))
}

pub fn or8(a: u8, b: u8) -> (u8, u8) {
    let result = a | b;
    (result, szxyp(result))
}

/// INC r: carry is preserved from `f`.
pub fn inc8(val: u8, f: u8) -> (u8, u8) {
    let result = val.wrapping_add(1);
    let mut flags = (f & C) | szxy(result);
    if val & 0x0F == 0x0F { flags |= H; }
    if val == 0x7F { flags |= PV; }
    (result, flags)
}

/// DEC r: carry is preserved from `f`.
pub fn dec8(val: u8, f: u8) -> (u8, u8) {
    let result = val.wrapping_sub(1);
    let mut flags = (f & C) | szxy(result) | N;
    if val & 0x0F == 0x00 { flags |= H; }
    if val == 0x80 { flags |= PV; }
    (result, flags)
}

/// ADD HL/IX/IY,rr: S, Z and P/V survive; H is the carry out of bit 11.
pub fn add16(a: u16, b: u16, f: u8) -> (u16, u8) {
    let wide = a as u32 + b as u32;
    let result = wide as u16;

    let mut flags = (f & (S | Z | PV)) | ((result >> 8) as u8 & XY);
    if (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF { flags |= H; }
    if wide > 0xFFFF { flags |= C; }
    (result, flags)
}

pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = carry as u32;
    let wide = a as u32 + b as u32 + c;
    let result = wide as u16;

    let mut f = (result >> 8) as u8 & (S | XY);
    if result == 0 { f |= Z; }
    if (a & 0x0FFF) as u32 + (b & 0x0FFF) as u32 + c > 0x0FFF { f |= H; }
    if (a ^ result) & (b ^ result) & 0x8000 != 0 { f |= PV; }
    if wide > 0xFFFF { f |= C; }
    (result, f)
}

pub fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = carry as u32;
    let result = a.wrapping_sub(b).wrapping_sub(c as u16);

    let mut f = ((result >> 8) as u8 & (S | XY)) | N;
    if result == 0 { f |= Z; }
    if ((a & 0x0FFF) as u32) < (b & 0x0FFF) as u32 + c { f |= H; }
    if (a ^ b) & (a ^ result) & 0x8000 != 0 { f |= PV; }
    if (a as u32) < b as u32 + c { f |= C; }
    (result, f)
}

/// DAA: BCD-correct A after an add (N=0) or subtract (N=1).
pub fn daa(a: u8, f: u8) -> (u8, u8) {
    let subtract = f & N != 0;
    let mut diff = 0u8;
    let mut carry = f & C != 0;

    if f & H != 0 || (a & 0x0F) > 9 {
        diff |= 0x06;
    }
    if carry || a > 0x99 {
        diff |= 0x60;
        carry = true;
    }

    let result = if subtract { a.wrapping_sub(diff) } else { a.wrapping_add(diff) };
    let half = if subtract {
        f & H != 0 && (a & 0x0F) < 6
    } else {
        (a & 0x0F) > 9
    };

    let mut flags = szxyp(result) | (f & N);
    if half { flags |= H; }
    if carry { flags |= C; }
    (result, flags)
}

/// Core of the rotate/shift family: returns (result, carry out).
fn rotate(op: RotOp, val: u8, carry_in: bool) -> (u8, bool) {
    let c = carry_in as u8;
    match op {
        RotOp::Rlc => (val.rotate_left(1), val & 0x80 != 0),
        RotOp::Rrc => (val.rotate_right(1), val & 0x01 != 0),
        RotOp::Rl => ((val << 1) | c, val & 0x80 != 0),
        RotOp::Rr => ((val >> 1) | (c << 7), val & 0x01 != 0),
        RotOp::Sla => (val << 1, val & 0x80 != 0),
        RotOp::Sra => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
        // Undocumented: shifts a 1 into bit 0.
        RotOp::Sll => ((val << 1) | 0x01, val & 0x80 != 0),
        RotOp::Srl => (val >> 1, val & 0x01 != 0),
    }
}

/// CB-prefixed rotate/shift: S, Z, P from the result; H = N = 0.
pub fn rot(op: RotOp, val: u8, f: u8) -> (u8, u8) {
    let (result, carry) = rotate(op, val, f & C != 0);
    (result, szxyp(result) | carry as u8)
}

/// RLCA/RRCA/RLA/RRA: S, Z and P/V are left alone.
pub fn rot_a(op: RotOp, a: u8, f: u8) -> (u8, u8) {
    let (result, carry) = rotate(op, a, f & C != 0);
    (result, (f & (S | Z | PV)) | (result & XY) | carry as u8)
}
