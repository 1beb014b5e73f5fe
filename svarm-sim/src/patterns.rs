// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pattern-based A64/SVE instruction decoder.
//!
//! Each instruction encoding is described by a 32-character pattern string
//! where `0`/`1` are fixed bits and any other character is a wildcard. The
//! table is sorted by specificity and bucketed by a 12-bit hash for lookup.

use std::sync::OnceLock;

use svarm_core::LaneSize;

use crate::decoder::{
    bit, bits, decode_bitmask_imm, sign_extend, BinOp, BitwiseOp, CmpOp, DecodeError, ImmArithOp,
    Instruction, MinMaxImmOp, PredOp, ReduceOp, UnpredArithOp,
};

type DecodeResult = Result<Instruction, DecodeError>;

// ---------------------------------------------------------------------------
// Pattern infrastructure
// ---------------------------------------------------------------------------

/// Parse a 32-character pattern string into (mask, expected) at compile time.
/// '0' → mask bit set, expected bit clear.
/// '1' → mask bit set, expected bit set.
/// Any other char → mask bit clear (wildcard).
const fn parse_pattern(pat: &[u8; 32]) -> (u32, u32) {
    let mut mask: u32 = 0;
    let mut expected: u32 = 0;
    let mut i: usize = 0;
    while i < 32 {
        let bit_pos = 31 - i;
        match pat[i] {
            b'0' => {
                mask |= 1 << bit_pos;
            }
            b'1' => {
                mask |= 1 << bit_pos;
                expected |= 1 << bit_pos;
            }
            _ => {}
        }
        i += 1;
    }
    (mask, expected)
}

struct Matcher {
    mask: u32,
    expected: u32,
    handler: fn(u32) -> DecodeResult,
}

macro_rules! inst {
    ($pat:expr, $handler:expr) => {{
        const P: (u32, u32) = parse_pattern($pat);
        Matcher {
            mask: P.0,
            expected: P.1,
            handler: $handler,
        }
    }};
}

#[inline]
fn unallocated(raw: u32) -> DecodeResult {
    Err(DecodeError::Unallocated { raw })
}

#[inline]
fn reserved(raw: u32) -> DecodeResult {
    Err(DecodeError::Reserved { raw })
}

#[inline]
fn lane(raw: u32) -> LaneSize {
    LaneSize::from_field(bits(raw, 23, 22))
}

// ---------------------------------------------------------------------------
// Scalar handlers
// ---------------------------------------------------------------------------

fn h_movn(raw: u32) -> DecodeResult {
    Ok(Instruction::Movn {
        sf: bit(raw, 31) != 0,
        rd: bits(raw, 4, 0) as u8,
        imm16: bits(raw, 20, 5) as u16,
        hw: bits(raw, 22, 21) as u8,
    })
}

fn h_movz(raw: u32) -> DecodeResult {
    Ok(Instruction::Movz {
        sf: bit(raw, 31) != 0,
        rd: bits(raw, 4, 0) as u8,
        imm16: bits(raw, 20, 5) as u16,
        hw: bits(raw, 22, 21) as u8,
    })
}

fn h_movk(raw: u32) -> DecodeResult {
    Ok(Instruction::Movk {
        sf: bit(raw, 31) != 0,
        rd: bits(raw, 4, 0) as u8,
        imm16: bits(raw, 20, 5) as u16,
        hw: bits(raw, 22, 21) as u8,
    })
}

fn h_nop(_raw: u32) -> DecodeResult {
    Ok(Instruction::Nop)
}

fn h_hlt(raw: u32) -> DecodeResult {
    Ok(Instruction::Hlt { imm: bits(raw, 20, 5) as u16 })
}

// ---------------------------------------------------------------------------
// SVE integer arithmetic handlers
// ---------------------------------------------------------------------------

fn h_bin_pred(raw: u32) -> DecodeResult {
    let size = lane(raw);
    let group = bits(raw, 20, 19);
    let opc = bits(raw, 18, 16);
    let op = match (group, opc) {
        (0b00, 0b000) => BinOp::Add,
        (0b00, 0b001) => BinOp::Sub,
        (0b00, 0b011) => BinOp::Subr,
        (0b01, 0b000) => BinOp::Smax,
        (0b01, 0b001) => BinOp::Umax,
        (0b01, 0b010) => BinOp::Smin,
        (0b01, 0b011) => BinOp::Umin,
        (0b01, 0b100) => BinOp::Sabd,
        (0b01, 0b101) => BinOp::Uabd,
        (0b10, 0b000) => BinOp::Mul,
        (0b10, 0b010) => BinOp::Smulh,
        (0b10, 0b011) => BinOp::Umulh,
        (0b10, 0b100) => BinOp::Sdiv,
        (0b10, 0b101) => BinOp::Udiv,
        (0b10, 0b110) => BinOp::Sdivr,
        (0b10, 0b111) => BinOp::Udivr,
        (0b11, 0b000) => BinOp::Orr,
        (0b11, 0b001) => BinOp::Eor,
        (0b11, 0b010) => BinOp::And,
        (0b11, 0b011) => BinOp::Bic,
        _ => return unallocated(raw),
    };
    // Divides only exist at S and D lane sizes.
    if matches!(op, BinOp::Sdiv | BinOp::Udiv | BinOp::Sdivr | BinOp::Udivr)
        && size < LaneSize::S
    {
        return reserved(raw);
    }
    Ok(Instruction::BinPred {
        size,
        op,
        pg: bits(raw, 12, 10) as u8,
        zm: bits(raw, 9, 5) as u8,
        zdn: bits(raw, 4, 0) as u8,
    })
}

fn h_reduce(raw: u32) -> DecodeResult {
    let size = lane(raw);
    let group = bits(raw, 20, 19);
    let opc = bits(raw, 18, 16);
    let op = match (group, opc) {
        (0b00, 0b000) => ReduceOp::Saddv,
        (0b00, 0b001) => ReduceOp::Uaddv,
        (0b01, 0b000) => ReduceOp::Smaxv,
        (0b01, 0b001) => ReduceOp::Umaxv,
        (0b01, 0b010) => ReduceOp::Sminv,
        (0b01, 0b011) => ReduceOp::Uminv,
        (0b11, 0b000) => ReduceOp::Orv,
        (0b11, 0b001) => ReduceOp::Eorv,
        (0b11, 0b010) => ReduceOp::Andv,
        _ => return unallocated(raw),
    };
    // SADDV widens to a 64-bit accumulator; the D-lane form is reserved.
    if op == ReduceOp::Saddv && size == LaneSize::D {
        return reserved(raw);
    }
    Ok(Instruction::Reduce {
        size,
        op,
        pg: bits(raw, 12, 10) as u8,
        zn: bits(raw, 9, 5) as u8,
        vd: bits(raw, 4, 0) as u8,
    })
}

fn h_movprfx(raw: u32) -> DecodeResult {
    Ok(Instruction::Movprfx {
        zn: bits(raw, 9, 5) as u8,
        zd: bits(raw, 4, 0) as u8,
    })
}

fn h_arith_unpred(raw: u32) -> DecodeResult {
    let op = match bits(raw, 12, 10) {
        0b000 => UnpredArithOp::Add,
        0b001 => UnpredArithOp::Sub,
        0b100 => UnpredArithOp::Sqadd,
        0b101 => UnpredArithOp::Uqadd,
        0b110 => UnpredArithOp::Sqsub,
        0b111 => UnpredArithOp::Uqsub,
        _ => return unallocated(raw),
    };
    Ok(Instruction::ArithUnpred {
        size: lane(raw),
        op,
        zm: bits(raw, 20, 16) as u8,
        zn: bits(raw, 9, 5) as u8,
        zd: bits(raw, 4, 0) as u8,
    })
}

fn h_logical_unpred(raw: u32) -> DecodeResult {
    let op = match bits(raw, 23, 22) {
        0b00 => BitwiseOp::And,
        0b01 => BitwiseOp::Orr,
        0b10 => BitwiseOp::Eor,
        _ => BitwiseOp::Bic,
    };
    Ok(Instruction::LogicalUnpred {
        op,
        zm: bits(raw, 20, 16) as u8,
        zn: bits(raw, 9, 5) as u8,
        zd: bits(raw, 4, 0) as u8,
    })
}

fn h_logical_imm(raw: u32) -> DecodeResult {
    let op = match bits(raw, 23, 22) {
        0b00 => BitwiseOp::Orr,
        0b01 => BitwiseOp::Eor,
        0b10 => BitwiseOp::And,
        _ => return unallocated(raw),
    };
    let imm = match decode_bitmask_imm(bits(raw, 17, 5)) {
        Some(v) => v,
        None => return reserved(raw),
    };
    Ok(Instruction::LogicalImm { op, imm, zdn: bits(raw, 4, 0) as u8 })
}

fn h_arith_imm(raw: u32) -> DecodeResult {
    let op = match bits(raw, 18, 16) {
        0b000 => ImmArithOp::Add,
        0b001 => ImmArithOp::Sub,
        0b011 => ImmArithOp::Subr,
        0b100 => ImmArithOp::Sqadd,
        0b101 => ImmArithOp::Uqadd,
        0b110 => ImmArithOp::Sqsub,
        0b111 => ImmArithOp::Uqsub,
        _ => return unallocated(raw),
    };
    let size = lane(raw);
    let sh = bit(raw, 13) != 0;
    // A shifted immediate has no room in a byte lane.
    if sh && size == LaneSize::B {
        return reserved(raw);
    }
    Ok(Instruction::ArithImm {
        size,
        op,
        sh,
        imm8: bits(raw, 12, 5) as u8,
        zdn: bits(raw, 4, 0) as u8,
    })
}

fn h_minmax_imm(raw: u32) -> DecodeResult {
    let op = match bits(raw, 18, 16) {
        0b000 => MinMaxImmOp::Smax,
        0b001 => MinMaxImmOp::Umax,
        0b010 => MinMaxImmOp::Smin,
        0b011 => MinMaxImmOp::Umin,
        _ => return unallocated(raw),
    };
    Ok(Instruction::MinMaxImm {
        size: lane(raw),
        op,
        imm8: bits(raw, 12, 5) as u8,
        zdn: bits(raw, 4, 0) as u8,
    })
}

fn h_mul_imm(raw: u32) -> DecodeResult {
    Ok(Instruction::MulImm {
        size: lane(raw),
        imm8: bits(raw, 12, 5) as u8,
        zdn: bits(raw, 4, 0) as u8,
    })
}

// ---------------------------------------------------------------------------
// SVE move / permute handlers
// ---------------------------------------------------------------------------

fn h_dup_imm(raw: u32) -> DecodeResult {
    let size = lane(raw);
    let sh = bit(raw, 13) != 0;
    if sh && size == LaneSize::B {
        return reserved(raw);
    }
    Ok(Instruction::DupImm {
        size,
        sh,
        imm8: bits(raw, 12, 5) as u8,
        zd: bits(raw, 4, 0) as u8,
    })
}

fn h_cpy_imm(raw: u32) -> DecodeResult {
    let size = lane(raw);
    let sh = bit(raw, 13) != 0;
    if sh && size == LaneSize::B {
        return reserved(raw);
    }
    Ok(Instruction::CpyImm {
        size,
        pg: bits(raw, 19, 16) as u8,
        merging: bit(raw, 14) != 0,
        sh,
        imm8: bits(raw, 12, 5) as u8,
        zd: bits(raw, 4, 0) as u8,
    })
}

fn h_dup_scalar(raw: u32) -> DecodeResult {
    Ok(Instruction::DupScalar {
        size: lane(raw),
        rn: bits(raw, 9, 5) as u8,
        zd: bits(raw, 4, 0) as u8,
    })
}

fn h_insr(raw: u32) -> DecodeResult {
    Ok(Instruction::Insr {
        size: lane(raw),
        rm: bits(raw, 9, 5) as u8,
        zdn: bits(raw, 4, 0) as u8,
    })
}

fn h_tbl(raw: u32) -> DecodeResult {
    Ok(Instruction::Tbl {
        size: lane(raw),
        zm: bits(raw, 20, 16) as u8,
        zn: bits(raw, 9, 5) as u8,
        zd: bits(raw, 4, 0) as u8,
    })
}

fn h_sel(raw: u32) -> DecodeResult {
    Ok(Instruction::Sel {
        size: lane(raw),
        zm: bits(raw, 20, 16) as u8,
        pg: bits(raw, 13, 10) as u8,
        zn: bits(raw, 9, 5) as u8,
        zd: bits(raw, 4, 0) as u8,
    })
}

// ---------------------------------------------------------------------------
// SVE compare handlers
// ---------------------------------------------------------------------------

fn h_cmp_vec(raw: u32) -> DecodeResult {
    let ne = bit(raw, 4) != 0;
    let op = match (bits(raw, 15, 13), ne) {
        (0b000, false) => CmpOp::Hs,
        (0b000, true) => CmpOp::Hi,
        (0b100, false) => CmpOp::Ge,
        (0b100, true) => CmpOp::Gt,
        (0b101, false) => CmpOp::Eq,
        (0b101, true) => CmpOp::Ne,
        _ => return unallocated(raw),
    };
    Ok(Instruction::CmpVec {
        size: lane(raw),
        op,
        zm: bits(raw, 20, 16) as u8,
        pg: bits(raw, 12, 10) as u8,
        zn: bits(raw, 9, 5) as u8,
        pd: bits(raw, 3, 0) as u8,
    })
}

fn h_cterm(raw: u32) -> DecodeResult {
    Ok(Instruction::Cterm {
        is64: bit(raw, 22) != 0,
        ne: bit(raw, 4) != 0,
        rm: bits(raw, 20, 16) as u8,
        rn: bits(raw, 9, 5) as u8,
    })
}

// ---------------------------------------------------------------------------
// Predicate handlers
// ---------------------------------------------------------------------------

fn h_ptrue(raw: u32) -> DecodeResult {
    Ok(Instruction::Ptrue {
        size: lane(raw),
        set_flags: bit(raw, 16) != 0,
        pattern: bits(raw, 9, 5) as u8,
        pd: bits(raw, 3, 0) as u8,
    })
}

fn h_pfalse(raw: u32) -> DecodeResult {
    Ok(Instruction::Pfalse { pd: bits(raw, 3, 0) as u8 })
}

fn h_ptest(raw: u32) -> DecodeResult {
    Ok(Instruction::Ptest {
        pg: bits(raw, 13, 10) as u8,
        pn: bits(raw, 8, 5) as u8,
    })
}

fn h_pfirst(raw: u32) -> DecodeResult {
    Ok(Instruction::Pfirst {
        pg: bits(raw, 8, 5) as u8,
        pdn: bits(raw, 3, 0) as u8,
    })
}

fn h_pnext(raw: u32) -> DecodeResult {
    Ok(Instruction::Pnext {
        size: lane(raw),
        pg: bits(raw, 8, 5) as u8,
        pdn: bits(raw, 3, 0) as u8,
    })
}

fn h_pred_logical(raw: u32) -> DecodeResult {
    let set_flags = bit(raw, 22) != 0;
    let key = (bit(raw, 23), bit(raw, 9), bit(raw, 4));
    let op = match key {
        (0, 0, 0) => PredOp::And,
        (0, 0, 1) => PredOp::Bic,
        (0, 1, 0) => PredOp::Eor,
        (0, 1, 1) => PredOp::Sel,
        (1, 0, 0) => PredOp::Orr,
        (1, 0, 1) => PredOp::Orn,
        (1, 1, 0) => PredOp::Nor,
        _ => PredOp::Nand,
    };
    // SEL has no flag-setting form.
    if op == PredOp::Sel && set_flags {
        return unallocated(raw);
    }
    Ok(Instruction::PredLogical {
        op,
        set_flags,
        pm: bits(raw, 19, 16) as u8,
        pg: bits(raw, 13, 10) as u8,
        pn: bits(raw, 8, 5) as u8,
        pd: bits(raw, 3, 0) as u8,
    })
}

// ---------------------------------------------------------------------------
// Counting handlers
// ---------------------------------------------------------------------------

fn h_cntp(raw: u32) -> DecodeResult {
    Ok(Instruction::Cntp {
        size: lane(raw),
        pg: bits(raw, 13, 10) as u8,
        pn: bits(raw, 8, 5) as u8,
        rd: bits(raw, 4, 0) as u8,
    })
}

fn h_incdec_p(raw: u32) -> DecodeResult {
    Ok(Instruction::IncDecP {
        size: lane(raw),
        dec: bit(raw, 16) != 0,
        pm: bits(raw, 8, 5) as u8,
        rdn: bits(raw, 4, 0) as u8,
    })
}

fn h_incdec_p_vec(raw: u32) -> DecodeResult {
    let size = lane(raw);
    // Vector forms only exist at H/S/D.
    if size == LaneSize::B {
        return reserved(raw);
    }
    Ok(Instruction::IncDecPVec {
        size,
        dec: bit(raw, 16) != 0,
        pm: bits(raw, 8, 5) as u8,
        zdn: bits(raw, 4, 0) as u8,
    })
}

fn h_sat_incdec_p(raw: u32) -> DecodeResult {
    Ok(Instruction::SatIncDecP {
        size: lane(raw),
        dec: bit(raw, 17) != 0,
        unsigned: bit(raw, 16) != 0,
        fx32: bit(raw, 10) == 0,
        pm: bits(raw, 8, 5) as u8,
        rdn: bits(raw, 4, 0) as u8,
    })
}

fn h_sat_incdec_p_vec(raw: u32) -> DecodeResult {
    let size = lane(raw);
    if size == LaneSize::B {
        return reserved(raw);
    }
    Ok(Instruction::SatIncDecPVec {
        size,
        dec: bit(raw, 17) != 0,
        unsigned: bit(raw, 16) != 0,
        pm: bits(raw, 8, 5) as u8,
        zdn: bits(raw, 4, 0) as u8,
    })
}

fn h_cnt_elem(raw: u32) -> DecodeResult {
    Ok(Instruction::CntElem {
        size: lane(raw),
        mul: (bits(raw, 19, 16) + 1) as u8,
        pattern: bits(raw, 9, 5) as u8,
        rd: bits(raw, 4, 0) as u8,
    })
}

fn h_incdec_elem(raw: u32) -> DecodeResult {
    Ok(Instruction::IncDecElem {
        size: lane(raw),
        dec: bit(raw, 10) != 0,
        mul: (bits(raw, 19, 16) + 1) as u8,
        pattern: bits(raw, 9, 5) as u8,
        rdn: bits(raw, 4, 0) as u8,
    })
}

fn h_rdvl(raw: u32) -> DecodeResult {
    Ok(Instruction::Rdvl {
        imm: sign_extend(bits(raw, 10, 5), 6) as i8,
        rd: bits(raw, 4, 0) as u8,
    })
}

// ---------------------------------------------------------------------------
// Memory handlers
// ---------------------------------------------------------------------------

#[inline]
fn mul_vl_imm9(raw: u32) -> i16 {
    let imm9 = (bits(raw, 21, 16) << 3) | bits(raw, 12, 10);
    sign_extend(imm9, 9) as i16
}

fn h_ldr_z(raw: u32) -> DecodeResult {
    Ok(Instruction::LdrZ {
        imm9: mul_vl_imm9(raw),
        rn: bits(raw, 9, 5) as u8,
        zt: bits(raw, 4, 0) as u8,
    })
}

fn h_str_z(raw: u32) -> DecodeResult {
    Ok(Instruction::StrZ {
        imm9: mul_vl_imm9(raw),
        rn: bits(raw, 9, 5) as u8,
        zt: bits(raw, 4, 0) as u8,
    })
}

fn h_ldr_p(raw: u32) -> DecodeResult {
    Ok(Instruction::LdrP {
        imm9: mul_vl_imm9(raw),
        rn: bits(raw, 9, 5) as u8,
        pt: bits(raw, 3, 0) as u8,
    })
}

fn h_str_p(raw: u32) -> DecodeResult {
    Ok(Instruction::StrP {
        imm9: mul_vl_imm9(raw),
        rn: bits(raw, 9, 5) as u8,
        pt: bits(raw, 3, 0) as u8,
    })
}

// ---------------------------------------------------------------------------
// Pattern table
// ---------------------------------------------------------------------------

fn make_decode_table() -> Vec<Matcher> {
    vec![
        // == Scalar ==
        // MOVN: sf 00 100101 hw imm16 Rd
        inst!(b"x00100101xxxxxxxxxxxxxxxxxxxxxxx", h_movn),
        // MOVZ: sf 10 100101 hw imm16 Rd
        inst!(b"x10100101xxxxxxxxxxxxxxxxxxxxxxx", h_movz),
        // MOVK: sf 11 100101 hw imm16 Rd
        inst!(b"x11100101xxxxxxxxxxxxxxxxxxxxxxx", h_movk),
        // NOP: exact encoding
        inst!(b"11010101000000110010000000011111", h_nop),
        // HLT: 11010100 010 imm16 00000
        inst!(b"11010100010xxxxxxxxxxxxxxxx00000", h_hlt),

        // == SVE integer arithmetic ==
        // Binary predicated: 00000100 size 0 gg ooo 000 Pg Zm Zdn
        inst!(b"00000100xx0xxxxx000xxxxxxxxxxxxx", h_bin_pred),
        // Reduction: 00000100 size 0 gg ooo 001 Pg Zn Vd
        inst!(b"00000100xx0xxxxx001xxxxxxxxxxxxx", h_reduce),
        // MOVPRFX (unpredicated): 00000100 00100000 101111 Zn Zd
        inst!(b"0000010000100000101111xxxxxxxxxx", h_movprfx),
        // Add/sub/saturating unpredicated: 00000100 size 1 Zm 000 ooo Zn Zd
        inst!(b"00000100xx1xxxxx000xxxxxxxxxxxxx", h_arith_unpred),
        // Bitwise unpredicated: 00000100 op 1 Zm 001100 Zn Zd
        inst!(b"00000100xx1xxxxx001100xxxxxxxxxx", h_logical_unpred),
        // CNTB/H/W/D: 00000100 size 10 imm4 111000 pattern Rd
        inst!(b"00000100xx10xxxx111000xxxxxxxxxx", h_cnt_elem),
        // INCB/DECB...: 00000100 size 11 imm4 11100 D pattern Rdn
        inst!(b"00000100xx11xxxx11100xxxxxxxxxxx", h_incdec_elem),
        // RDVL: 00000100 101 11111 01010 imm6 Rd
        inst!(b"000001001011111101010xxxxxxxxxxx", h_rdvl),

        // == SVE moves / permutes ==
        // Bitwise with bitmask immediate: 00000101 op 0000 imm13 Zdn
        inst!(b"00000101xx0000xxxxxxxxxxxxxxxxxx", h_logical_imm),
        // CPY (imm, predicated): 00000101 size 01 Pg 0 M sh imm8 Zd
        inst!(b"00000101xx01xxxx0xxxxxxxxxxxxxxx", h_cpy_imm),
        // DUP (scalar): 00000101 size 100000 001110 Rn Zd
        inst!(b"00000101xx100000001110xxxxxxxxxx", h_dup_scalar),
        // INSR (scalar): 00000101 size 100100 001110 Rm Zdn
        inst!(b"00000101xx100100001110xxxxxxxxxx", h_insr),
        // TBL: 00000101 size 1 Zm 001100 Zn Zd
        inst!(b"00000101xx1xxxxx001100xxxxxxxxxx", h_tbl),
        // SEL (vector): 00000101 size 1 Zm 11 Pg Zn Zd
        inst!(b"00000101xx1xxxxx11xxxxxxxxxxxxxx", h_sel),

        // == SVE compares ==
        // Integer compare vectors: 00100100 size 0 Zm ooo Pg Zn ne Pd
        inst!(b"00100100xx0xxxxxxxxxxxxxxxxxxxxx", h_cmp_vec),
        // CTERMEQ/CTERMNE: 00100101 1 sz 1 Rm 001000 Rn ne 0000
        inst!(b"001001011x1xxxxx001000xxxxxx0000", h_cterm),

        // == SVE wide immediates ==
        // Add/sub/saturating imm: 00100101 size 100 ooo 11 sh imm8 Zdn
        inst!(b"00100101xx100xxx11xxxxxxxxxxxxxx", h_arith_imm),
        // Min/max imm: 00100101 size 101 ooo 110 imm8 Zdn
        inst!(b"00100101xx101xxx110xxxxxxxxxxxxx", h_minmax_imm),
        // MUL imm: 00100101 size 110000 110 imm8 Zdn
        inst!(b"00100101xx110000110xxxxxxxxxxxxx", h_mul_imm),
        // DUP imm: 00100101 size 111000 11 sh imm8 Zd
        inst!(b"00100101xx11100011xxxxxxxxxxxxxx", h_dup_imm),

        // == Predicate group ==
        // PTRUE/PTRUES: 00100101 size 01100 S 111000 pattern 0 Pd
        inst!(b"00100101xx01100x111000xxxxx0xxxx", h_ptrue),
        // PFALSE: 00100101 00011000 111001 000000 Pd
        inst!(b"0010010100011000111001000000xxxx", h_pfalse),
        // PTEST: 00100101 01010000 11 Pg 0 Pn 00000
        inst!(b"001001010101000011xxxx0xxxx00000", h_ptest),
        // PFIRST: 00100101 01011000 1100000 Pg 0 Pdn
        inst!(b"00100101010110001100000xxxx0xxxx", h_pfirst),
        // PNEXT: 00100101 size 011001 1100010 Pg 0 Pdn
        inst!(b"00100101xx0110011100010xxxx0xxxx", h_pnext),
        // Predicate logical: 00100101 op S 00 Pm 01 Pg o Pn u Pd
        inst!(b"00100101xx00xxxx01xxxxxxxxxxxxxx", h_pred_logical),

        // == Counting ==
        // CNTP: 00100101 size 100000 10 Pg 0 Pn Rd
        inst!(b"00100101xx10000010xxxx0xxxxxxxxx", h_cntp),
        // INCP/DECP (scalar): 00100101 size 10110 D 10001 00 Pm Rdn
        inst!(b"00100101xx10110x1000100xxxxxxxxx", h_incdec_p),
        // INCP/DECP (vector): 00100101 size 10110 D 10000 00 Pm Zdn
        inst!(b"00100101xx10110x1000000xxxxxxxxx", h_incdec_p_vec),
        // SQINCP/UQINCP/SQDECP/UQDECP (scalar): 00100101 size 1010 D U 10001 sf 0 Pm Rdn
        inst!(b"00100101xx1010xx10001x0xxxxxxxxx", h_sat_incdec_p),
        // SQINCP/... (vector): 00100101 size 1010 D U 10000 00 Pm Zdn
        inst!(b"00100101xx1010xx1000000xxxxxxxxx", h_sat_incdec_p_vec),

        // == Memory ==
        // LDR (vector): 10000101 10 imm9h 010 imm9l Rn Zt
        inst!(b"1000010110xxxxxx010xxxxxxxxxxxxx", h_ldr_z),
        // LDR (predicate): 10000101 10 imm9h 000 imm9l Rn 0 Pt
        inst!(b"1000010110xxxxxx000xxxxxxxx0xxxx", h_ldr_p),
        // STR (vector): 11100101 10 imm9h 010 imm9l Rn Zt
        inst!(b"1110010110xxxxxx010xxxxxxxxxxxxx", h_str_z),
        // STR (predicate): 11100101 10 imm9h 000 imm9l Rn 0 Pt
        inst!(b"1110010110xxxxxx000xxxxxxxx0xxxx", h_str_p),
    ]
}

// ---------------------------------------------------------------------------
// Fast lookup table
// ---------------------------------------------------------------------------

/// Extract a 12-bit hash from bits [29:22] and [13:10] of an instruction word.
fn fast_index(raw: u32) -> usize {
    (((raw >> 10) & 0x00F) | ((raw >> 18) & 0xFF0)) as usize
}

struct LookupTable {
    buckets: Vec<Vec<u16>>,
    entries: Vec<Matcher>,
}

/// Bit positions that contribute to the fast index.
const HASH_BITS: u32 = 0x3FC0_3C00; // bits 29:22 and 13:10

fn build_lookup_table() -> LookupTable {
    let mut entries = make_decode_table();
    // Sort by specificity: most fixed bits first.
    entries.sort_by(|a, b| b.mask.count_ones().cmp(&a.mask.count_ones()));

    let mut buckets: Vec<Vec<u16>> = vec![Vec::new(); 4096];
    for (idx, entry) in entries.iter().enumerate() {
        let relevant_mask = entry.mask & HASH_BITS;
        let relevant_expected = entry.expected & HASH_BITS;
        for slot in 0..4096u32 {
            // Reconstruct raw bits at hash positions from the slot index.
            let test_raw = ((slot & 0xF) << 10) | (((slot >> 4) & 0xFF) << 22);
            if (test_raw & relevant_mask) == relevant_expected {
                buckets[slot as usize].push(idx as u16);
            }
        }
    }
    for bucket in &mut buckets {
        bucket.dedup();
    }
    LookupTable { buckets, entries }
}

fn get_lookup() -> &'static LookupTable {
    static LOOKUP: OnceLock<LookupTable> = OnceLock::new();
    LOOKUP.get_or_init(build_lookup_table)
}

// ---------------------------------------------------------------------------
// Public decode function
// ---------------------------------------------------------------------------

/// Decode a 32-bit instruction word.
pub fn decode(raw: u32) -> DecodeResult {
    let table = get_lookup();
    let bucket = &table.buckets[fast_index(raw)];
    for &idx in bucket {
        let m = &table.entries[idx as usize];
        if (raw & m.mask) == m.expected {
            return (m.handler)(raw);
        }
    }
    Err(DecodeError::Unallocated { raw })
}
