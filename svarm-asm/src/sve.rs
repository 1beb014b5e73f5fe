// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! A64/SVE instruction encoder.
//!
//! One method per instruction form. Each method validates its operands
//! against the encoding's field constraints and, on success, emits exactly
//! one 32-bit little-endian word; on failure nothing is written. Encoding
//! selection between equivalent forms is the MacroAssembler's job -- these
//! methods only produce the single canonical pattern for already-resolved
//! operands.

use svarm_core::{Gp, LaneSize, PReg, Predication, ZReg};

use crate::buffer::CodeBuffer;
use crate::error::EncodeError;

/// Predicate-constraint pattern field values.
pub mod pattern {
    pub const POW2: u8 = 0b00000;
    pub const VL1: u8 = 1;
    pub const VL2: u8 = 2;
    pub const VL3: u8 = 3;
    pub const VL4: u8 = 4;
    pub const VL5: u8 = 5;
    pub const VL6: u8 = 6;
    pub const VL7: u8 = 7;
    pub const VL8: u8 = 8;
    pub const VL16: u8 = 9;
    pub const VL32: u8 = 10;
    pub const VL64: u8 = 11;
    pub const VL128: u8 = 12;
    pub const VL256: u8 = 13;
    pub const MUL4: u8 = 0b11101;
    pub const MUL3: u8 = 0b11110;
    pub const ALL: u8 = 0b11111;
}

// ---------------------------------------------------------------------------
// Bitmask immediate encoder
// ---------------------------------------------------------------------------

/// Encode a 64-bit-replicated value as a 13-bit `N:immr:imms` logical
/// immediate, if one exists. Inverse of the decoder's bitmask expansion.
pub fn encode_logical_imm(value: u64) -> Option<u32> {
    // All-zeros and all-ones have no encoding.
    if value == 0 || value == u64::MAX {
        return None;
    }

    // Smallest element size the value is a replication of.
    let mut esize = 64u32;
    while esize > 2 {
        let half = esize / 2;
        let mask = (1u64 << half) - 1;
        if (value & mask) != ((value >> half) & mask) {
            break;
        }
        esize = half;
    }

    let mask = if esize == 64 { u64::MAX } else { (1u64 << esize) - 1 };
    let elem = value & mask;
    let ones = elem.count_ones();
    if ones == 0 || ones == esize {
        return None;
    }
    let welem: u64 = (1u64 << ones) - 1;

    // The element must be a rotation of a contiguous run of ones.
    for r in 0..esize {
        let rotated = if r == 0 {
            welem
        } else {
            ((welem >> r) | (welem << (esize - r))) & mask
        };
        if rotated == elem {
            let len = 31 - esize.leading_zeros();
            let n = u32::from(len == 6);
            let imms = if len == 6 {
                ones - 1
            } else {
                (!((1u32 << (len + 1)) - 1) & 0x3F) | (ones - 1)
            };
            return Some((n << 12) | (r << 6) | imms);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Operand checks
// ---------------------------------------------------------------------------

fn check_z(z: ZReg) -> Result<u32, EncodeError> {
    if z.is_valid() {
        Ok(z.0 as u32)
    } else {
        Err(EncodeError::RegisterClass("Z register index out of range"))
    }
}

fn check_p(p: PReg) -> Result<u32, EncodeError> {
    if p.is_valid() {
        Ok(p.0 as u32)
    } else {
        Err(EncodeError::RegisterClass("P register index out of range"))
    }
}

/// Governing-predicate fields are only 3 bits wide.
fn check_pg3(p: PReg) -> Result<u32, EncodeError> {
    if p.is_governing() {
        Ok(p.0 as u32)
    } else {
        Err(EncodeError::RegisterClass("governing predicate must be P0-P7"))
    }
}

fn check_gp(r: Gp) -> Result<u32, EncodeError> {
    if r.is_valid() {
        Ok(r.0 as u32)
    } else {
        Err(EncodeError::RegisterClass("general register index out of range"))
    }
}

fn check_div_lane(size: LaneSize) -> Result<(), EncodeError> {
    if size < LaneSize::S {
        Err(EncodeError::LaneSize("divide only exists at S and D lanes"))
    } else {
        Ok(())
    }
}

fn check_shifted_lane(size: LaneSize, sh: bool) -> Result<(), EncodeError> {
    if sh && size == LaneSize::B {
        Err(EncodeError::LaneSize("shifted immediate has no room in B lanes"))
    } else {
        Ok(())
    }
}

fn check_vec_count_lane(size: LaneSize) -> Result<(), EncodeError> {
    if size == LaneSize::B {
        Err(EncodeError::LaneSize("vector count-by-predicate has no B form"))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// A64/SVE assembler over a little-endian code buffer.
#[derive(Debug, Default)]
pub struct Assembler {
    buf: CodeBuffer,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        self.buf.bytes()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current position, usable to discard a failed expansion.
    pub fn mark(&self) -> usize {
        self.buf.mark()
    }

    pub fn rewind_to(&mut self, mark: usize) {
        self.buf.rewind_to(mark)
    }

    // -- Scalar --------------------------------------------------------------

    fn mov_wide(
        &mut self,
        opc: u32,
        sf: bool,
        rd: Gp,
        imm16: u16,
        hw: u8,
    ) -> Result<(), EncodeError> {
        let rd = check_gp(rd)?;
        let limit = if sf { 3 } else { 1 };
        if hw > limit {
            return Err(EncodeError::ImmediateRange { value: hw as i64, field: "hw" });
        }
        self.buf.emit32(
            (u32::from(sf) << 31)
                | (opc << 29)
                | (0b100101 << 23)
                | ((hw as u32) << 21)
                | ((imm16 as u32) << 5)
                | rd,
        );
        Ok(())
    }

    pub fn movn(&mut self, sf: bool, rd: Gp, imm16: u16, hw: u8) -> Result<(), EncodeError> {
        self.mov_wide(0b00, sf, rd, imm16, hw)
    }

    pub fn movz(&mut self, sf: bool, rd: Gp, imm16: u16, hw: u8) -> Result<(), EncodeError> {
        self.mov_wide(0b10, sf, rd, imm16, hw)
    }

    pub fn movk(&mut self, sf: bool, rd: Gp, imm16: u16, hw: u8) -> Result<(), EncodeError> {
        self.mov_wide(0b11, sf, rd, imm16, hw)
    }

    pub fn nop(&mut self) {
        self.buf.emit32(0xD503_201F);
    }

    /// Simulator halt marker.
    pub fn hlt(&mut self, imm: u16) {
        self.buf.emit32(0xD440_0000 | (imm as u32) << 5);
    }

    // -- SVE integer binary, predicated --------------------------------------

    fn bin_pred(
        &mut self,
        size: LaneSize,
        group: u32,
        opc: u32,
        zdn: ZReg,
        pg: PReg,
        zm: ZReg,
    ) -> Result<(), EncodeError> {
        let zdn = check_z(zdn)?;
        let zm = check_z(zm)?;
        let pg = check_pg3(pg)?;
        self.buf.emit32(
            0x0400_0000
                | (size.field() << 22)
                | (group << 19)
                | (opc << 16)
                | (pg << 10)
                | (zm << 5)
                | zdn,
        );
        Ok(())
    }

    pub fn add(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b00, 0b000, zdn, pg, zm)
    }

    pub fn sub(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b00, 0b001, zdn, pg, zm)
    }

    pub fn subr(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b00, 0b011, zdn, pg, zm)
    }

    pub fn smax(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b01, 0b000, zdn, pg, zm)
    }

    pub fn umax(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b01, 0b001, zdn, pg, zm)
    }

    pub fn smin(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b01, 0b010, zdn, pg, zm)
    }

    pub fn umin(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b01, 0b011, zdn, pg, zm)
    }

    pub fn sabd(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b01, 0b100, zdn, pg, zm)
    }

    pub fn uabd(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b01, 0b101, zdn, pg, zm)
    }

    pub fn mul(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b10, 0b000, zdn, pg, zm)
    }

    pub fn smulh(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b10, 0b010, zdn, pg, zm)
    }

    pub fn umulh(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b10, 0b011, zdn, pg, zm)
    }

    pub fn sdiv(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        check_div_lane(size)?;
        self.bin_pred(size, 0b10, 0b100, zdn, pg, zm)
    }

    pub fn udiv(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        check_div_lane(size)?;
        self.bin_pred(size, 0b10, 0b101, zdn, pg, zm)
    }

    pub fn sdivr(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        check_div_lane(size)?;
        self.bin_pred(size, 0b10, 0b110, zdn, pg, zm)
    }

    pub fn udivr(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        check_div_lane(size)?;
        self.bin_pred(size, 0b10, 0b111, zdn, pg, zm)
    }

    pub fn orr(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b11, 0b000, zdn, pg, zm)
    }

    pub fn eor(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b11, 0b001, zdn, pg, zm)
    }

    pub fn and(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b11, 0b010, zdn, pg, zm)
    }

    pub fn bic(&mut self, size: LaneSize, zdn: ZReg, pg: PReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, 0b11, 0b011, zdn, pg, zm)
    }

    // -- SVE reductions ------------------------------------------------------

    fn reduce(
        &mut self,
        size: LaneSize,
        group: u32,
        opc: u32,
        vd: ZReg,
        pg: PReg,
        zn: ZReg,
    ) -> Result<(), EncodeError> {
        let vd = check_z(vd)?;
        let zn = check_z(zn)?;
        let pg = check_pg3(pg)?;
        self.buf.emit32(
            0x0400_2000
                | (size.field() << 22)
                | (group << 19)
                | (opc << 16)
                | (pg << 10)
                | (zn << 5)
                | vd,
        );
        Ok(())
    }

    pub fn saddv(&mut self, size: LaneSize, vd: ZReg, pg: PReg, zn: ZReg) -> Result<(), EncodeError> {
        // SADDV widens into a 64-bit accumulator; there is no D form.
        if size == LaneSize::D {
            return Err(EncodeError::LaneSize("saddv has no D-lane form"));
        }
        self.reduce(size, 0b00, 0b000, vd, pg, zn)
    }

    pub fn uaddv(&mut self, size: LaneSize, vd: ZReg, pg: PReg, zn: ZReg) -> Result<(), EncodeError> {
        self.reduce(size, 0b00, 0b001, vd, pg, zn)
    }

    pub fn smaxv(&mut self, size: LaneSize, vd: ZReg, pg: PReg, zn: ZReg) -> Result<(), EncodeError> {
        self.reduce(size, 0b01, 0b000, vd, pg, zn)
    }

    pub fn umaxv(&mut self, size: LaneSize, vd: ZReg, pg: PReg, zn: ZReg) -> Result<(), EncodeError> {
        self.reduce(size, 0b01, 0b001, vd, pg, zn)
    }

    pub fn sminv(&mut self, size: LaneSize, vd: ZReg, pg: PReg, zn: ZReg) -> Result<(), EncodeError> {
        self.reduce(size, 0b01, 0b010, vd, pg, zn)
    }

    pub fn uminv(&mut self, size: LaneSize, vd: ZReg, pg: PReg, zn: ZReg) -> Result<(), EncodeError> {
        self.reduce(size, 0b01, 0b011, vd, pg, zn)
    }

    pub fn orv(&mut self, size: LaneSize, vd: ZReg, pg: PReg, zn: ZReg) -> Result<(), EncodeError> {
        self.reduce(size, 0b11, 0b000, vd, pg, zn)
    }

    pub fn eorv(&mut self, size: LaneSize, vd: ZReg, pg: PReg, zn: ZReg) -> Result<(), EncodeError> {
        self.reduce(size, 0b11, 0b001, vd, pg, zn)
    }

    pub fn andv(&mut self, size: LaneSize, vd: ZReg, pg: PReg, zn: ZReg) -> Result<(), EncodeError> {
        self.reduce(size, 0b11, 0b010, vd, pg, zn)
    }

    // -- SVE arithmetic, unpredicated ----------------------------------------

    fn arith_unpred(
        &mut self,
        size: LaneSize,
        opc: u32,
        zd: ZReg,
        zn: ZReg,
        zm: ZReg,
    ) -> Result<(), EncodeError> {
        let zd = check_z(zd)?;
        let zn = check_z(zn)?;
        let zm = check_z(zm)?;
        self.buf.emit32(
            0x0420_0000 | (size.field() << 22) | (zm << 16) | (opc << 10) | (zn << 5) | zd,
        );
        Ok(())
    }

    pub fn add_unpred(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.arith_unpred(size, 0b000, zd, zn, zm)
    }

    pub fn sub_unpred(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.arith_unpred(size, 0b001, zd, zn, zm)
    }

    pub fn sqadd(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.arith_unpred(size, 0b100, zd, zn, zm)
    }

    pub fn uqadd(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.arith_unpred(size, 0b101, zd, zn, zm)
    }

    pub fn sqsub(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.arith_unpred(size, 0b110, zd, zn, zm)
    }

    pub fn uqsub(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.arith_unpred(size, 0b111, zd, zn, zm)
    }

    // -- SVE bitwise logical, unpredicated -----------------------------------

    fn logical_unpred(&mut self, opc: u32, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        let zd = check_z(zd)?;
        let zn = check_z(zn)?;
        let zm = check_z(zm)?;
        self.buf.emit32(0x0420_3000 | (opc << 22) | (zm << 16) | (zn << 5) | zd);
        Ok(())
    }

    pub fn and_unpred(&mut self, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.logical_unpred(0b00, zd, zn, zm)
    }

    pub fn orr_unpred(&mut self, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.logical_unpred(0b01, zd, zn, zm)
    }

    pub fn eor_unpred(&mut self, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.logical_unpred(0b10, zd, zn, zm)
    }

    pub fn bic_unpred(&mut self, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.logical_unpred(0b11, zd, zn, zm)
    }

    /// Whole-vector register move (ORR alias).
    pub fn mov_z(&mut self, zd: ZReg, zn: ZReg) -> Result<(), EncodeError> {
        self.orr_unpred(zd, zn, zn)
    }

    // -- SVE bitwise logical with bitmask immediate --------------------------

    fn logical_imm(&mut self, opc: u32, zdn: ZReg, imm: u64) -> Result<(), EncodeError> {
        let zdn = check_z(zdn)?;
        let imm13 = encode_logical_imm(imm).ok_or(EncodeError::ImmediateRange {
            value: imm as i64,
            field: "bitmask immediate",
        })?;
        self.buf.emit32(0x0500_0000 | (opc << 22) | (imm13 << 5) | zdn);
        Ok(())
    }

    pub fn orr_imm(&mut self, zdn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.logical_imm(0b00, zdn, imm)
    }

    pub fn eor_imm(&mut self, zdn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.logical_imm(0b01, zdn, imm)
    }

    pub fn and_imm(&mut self, zdn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.logical_imm(0b10, zdn, imm)
    }

    // -- SVE wide immediates -------------------------------------------------

    fn arith_imm(
        &mut self,
        size: LaneSize,
        opc: u32,
        zdn: ZReg,
        imm8: u8,
        sh: bool,
    ) -> Result<(), EncodeError> {
        let zdn = check_z(zdn)?;
        check_shifted_lane(size, sh)?;
        self.buf.emit32(
            0x2500_C000
                | (size.field() << 22)
                | (0b100 << 19)
                | (opc << 16)
                | (u32::from(sh) << 13)
                | ((imm8 as u32) << 5)
                | zdn,
        );
        Ok(())
    }

    pub fn add_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: u8, sh: bool) -> Result<(), EncodeError> {
        self.arith_imm(size, 0b000, zdn, imm8, sh)
    }

    pub fn sub_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: u8, sh: bool) -> Result<(), EncodeError> {
        self.arith_imm(size, 0b001, zdn, imm8, sh)
    }

    pub fn subr_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: u8, sh: bool) -> Result<(), EncodeError> {
        self.arith_imm(size, 0b011, zdn, imm8, sh)
    }

    pub fn sqadd_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: u8, sh: bool) -> Result<(), EncodeError> {
        self.arith_imm(size, 0b100, zdn, imm8, sh)
    }

    pub fn uqadd_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: u8, sh: bool) -> Result<(), EncodeError> {
        self.arith_imm(size, 0b101, zdn, imm8, sh)
    }

    pub fn sqsub_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: u8, sh: bool) -> Result<(), EncodeError> {
        self.arith_imm(size, 0b110, zdn, imm8, sh)
    }

    pub fn uqsub_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: u8, sh: bool) -> Result<(), EncodeError> {
        self.arith_imm(size, 0b111, zdn, imm8, sh)
    }

    fn minmax_imm(&mut self, size: LaneSize, opc: u32, zdn: ZReg, imm8: u8) -> Result<(), EncodeError> {
        let zdn = check_z(zdn)?;
        self.buf.emit32(
            0x2500_C000
                | (size.field() << 22)
                | (0b101 << 19)
                | (opc << 16)
                | ((imm8 as u32) << 5)
                | zdn,
        );
        Ok(())
    }

    pub fn smax_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: i8) -> Result<(), EncodeError> {
        self.minmax_imm(size, 0b000, zdn, imm8 as u8)
    }

    pub fn umax_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: u8) -> Result<(), EncodeError> {
        self.minmax_imm(size, 0b001, zdn, imm8)
    }

    pub fn smin_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: i8) -> Result<(), EncodeError> {
        self.minmax_imm(size, 0b010, zdn, imm8 as u8)
    }

    pub fn umin_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: u8) -> Result<(), EncodeError> {
        self.minmax_imm(size, 0b011, zdn, imm8)
    }

    pub fn mul_imm(&mut self, size: LaneSize, zdn: ZReg, imm8: i8) -> Result<(), EncodeError> {
        let zdn = check_z(zdn)?;
        self.buf.emit32(
            0x2530_C000 | (size.field() << 22) | ((imm8 as u8 as u32) << 5) | zdn,
        );
        Ok(())
    }

    // -- SVE moves / permutes ------------------------------------------------

    pub fn dup_imm(&mut self, size: LaneSize, zd: ZReg, imm8: i8, sh: bool) -> Result<(), EncodeError> {
        let zd = check_z(zd)?;
        check_shifted_lane(size, sh)?;
        self.buf.emit32(
            0x2538_C000
                | (size.field() << 22)
                | (u32::from(sh) << 13)
                | ((imm8 as u8 as u32) << 5)
                | zd,
        );
        Ok(())
    }

    pub fn cpy_imm(
        &mut self,
        size: LaneSize,
        zd: ZReg,
        pg: PReg,
        pred: Predication,
        imm8: i8,
        sh: bool,
    ) -> Result<(), EncodeError> {
        let zd = check_z(zd)?;
        let pg = check_p(pg)?;
        check_shifted_lane(size, sh)?;
        let merging = pred == Predication::Merging;
        self.buf.emit32(
            0x0510_0000
                | (size.field() << 22)
                | (pg << 16)
                | (u32::from(merging) << 14)
                | (u32::from(sh) << 13)
                | ((imm8 as u8 as u32) << 5)
                | zd,
        );
        Ok(())
    }

    pub fn dup_scalar(&mut self, size: LaneSize, zd: ZReg, rn: Gp) -> Result<(), EncodeError> {
        let zd = check_z(zd)?;
        let rn = check_gp(rn)?;
        self.buf.emit32(0x0520_3800 | (size.field() << 22) | (rn << 5) | zd);
        Ok(())
    }

    pub fn insr(&mut self, size: LaneSize, zdn: ZReg, rm: Gp) -> Result<(), EncodeError> {
        let zdn = check_z(zdn)?;
        let rm = check_gp(rm)?;
        self.buf.emit32(0x0524_3800 | (size.field() << 22) | (rm << 5) | zdn);
        Ok(())
    }

    pub fn tbl(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        let zd = check_z(zd)?;
        let zn = check_z(zn)?;
        let zm = check_z(zm)?;
        self.buf.emit32(
            0x0520_3000 | (size.field() << 22) | (zm << 16) | (zn << 5) | zd,
        );
        Ok(())
    }

    pub fn sel(
        &mut self,
        size: LaneSize,
        zd: ZReg,
        pg: PReg,
        zn: ZReg,
        zm: ZReg,
    ) -> Result<(), EncodeError> {
        let zd = check_z(zd)?;
        let zn = check_z(zn)?;
        let zm = check_z(zm)?;
        let pg = check_p(pg)?;
        self.buf.emit32(
            0x0520_C000 | (size.field() << 22) | (zm << 16) | (pg << 10) | (zn << 5) | zd,
        );
        Ok(())
    }

    /// Unpredicated constructive prefix (whole-vector move).
    pub fn movprfx(&mut self, zd: ZReg, zn: ZReg) -> Result<(), EncodeError> {
        let zd = check_z(zd)?;
        let zn = check_z(zn)?;
        self.buf.emit32(0x0420_BC00 | (zn << 5) | zd);
        Ok(())
    }

    // -- SVE compares --------------------------------------------------------

    fn cmp_vec(
        &mut self,
        size: LaneSize,
        opc: u32,
        ne: bool,
        pd: PReg,
        pg: PReg,
        zn: ZReg,
        zm: ZReg,
    ) -> Result<(), EncodeError> {
        let pd = check_p(pd)?;
        let pg = check_pg3(pg)?;
        let zn = check_z(zn)?;
        let zm = check_z(zm)?;
        self.buf.emit32(
            0x2400_0000
                | (size.field() << 22)
                | (zm << 16)
                | (opc << 13)
                | (pg << 10)
                | (zn << 5)
                | (u32::from(ne) << 4)
                | pd,
        );
        Ok(())
    }

    pub fn cmpeq(&mut self, size: LaneSize, pd: PReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.cmp_vec(size, 0b101, false, pd, pg, zn, zm)
    }

    pub fn cmpne(&mut self, size: LaneSize, pd: PReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.cmp_vec(size, 0b101, true, pd, pg, zn, zm)
    }

    pub fn cmpge(&mut self, size: LaneSize, pd: PReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.cmp_vec(size, 0b100, false, pd, pg, zn, zm)
    }

    pub fn cmpgt(&mut self, size: LaneSize, pd: PReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.cmp_vec(size, 0b100, true, pd, pg, zn, zm)
    }

    pub fn cmphs(&mut self, size: LaneSize, pd: PReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.cmp_vec(size, 0b000, false, pd, pg, zn, zm)
    }

    pub fn cmphi(&mut self, size: LaneSize, pd: PReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.cmp_vec(size, 0b000, true, pd, pg, zn, zm)
    }

    fn cterm(&mut self, is64: bool, ne: bool, rn: Gp, rm: Gp) -> Result<(), EncodeError> {
        let rn = check_gp(rn)?;
        let rm = check_gp(rm)?;
        self.buf.emit32(
            0x25A0_2000
                | (u32::from(is64) << 22)
                | (rm << 16)
                | (rn << 5)
                | (u32::from(ne) << 4),
        );
        Ok(())
    }

    pub fn ctermeq(&mut self, is64: bool, rn: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.cterm(is64, false, rn, rm)
    }

    pub fn ctermne(&mut self, is64: bool, rn: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.cterm(is64, true, rn, rm)
    }

    // -- Predicate group -----------------------------------------------------

    fn ptrue_inner(&mut self, size: LaneSize, s: bool, pd: PReg, pat: u8) -> Result<(), EncodeError> {
        let pd = check_p(pd)?;
        if pat > 0b11111 {
            return Err(EncodeError::ImmediateRange { value: pat as i64, field: "pattern" });
        }
        self.buf.emit32(
            0x2518_E000
                | (size.field() << 22)
                | (u32::from(s) << 16)
                | ((pat as u32) << 5)
                | pd,
        );
        Ok(())
    }

    pub fn ptrue(&mut self, size: LaneSize, pd: PReg, pat: u8) -> Result<(), EncodeError> {
        self.ptrue_inner(size, false, pd, pat)
    }

    /// Flag-setting PTRUE.
    pub fn ptrues(&mut self, size: LaneSize, pd: PReg, pat: u8) -> Result<(), EncodeError> {
        self.ptrue_inner(size, true, pd, pat)
    }

    pub fn pfalse(&mut self, pd: PReg) -> Result<(), EncodeError> {
        let pd = check_p(pd)?;
        self.buf.emit32(0x2518_E400 | pd);
        Ok(())
    }

    pub fn ptest(&mut self, pg: PReg, pn: PReg) -> Result<(), EncodeError> {
        let pg = check_p(pg)?;
        let pn = check_p(pn)?;
        self.buf.emit32(0x2550_C000 | (pg << 10) | (pn << 5));
        Ok(())
    }

    pub fn pfirst(&mut self, pdn: PReg, pg: PReg) -> Result<(), EncodeError> {
        let pdn = check_p(pdn)?;
        let pg = check_p(pg)?;
        self.buf.emit32(0x2558_C000 | (pg << 5) | pdn);
        Ok(())
    }

    pub fn pnext(&mut self, size: LaneSize, pdn: PReg, pg: PReg) -> Result<(), EncodeError> {
        let pdn = check_p(pdn)?;
        let pg = check_p(pg)?;
        self.buf.emit32(0x2519_C400 | (size.field() << 22) | (pg << 5) | pdn);
        Ok(())
    }

    fn pred_logical(
        &mut self,
        key: (u32, u32, u32),
        s: bool,
        pd: PReg,
        pg: PReg,
        pn: PReg,
        pm: PReg,
    ) -> Result<(), EncodeError> {
        let pd = check_p(pd)?;
        let pg = check_p(pg)?;
        let pn = check_p(pn)?;
        let pm = check_p(pm)?;
        let (hi, o, u) = key;
        self.buf.emit32(
            0x2500_4000
                | (hi << 23)
                | (u32::from(s) << 22)
                | (pm << 16)
                | (pg << 10)
                | (o << 9)
                | (pn << 5)
                | (u << 4)
                | pd,
        );
        Ok(())
    }

    pub fn pred_and(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((0, 0, 0), false, pd, pg, pn, pm)
    }

    pub fn pred_ands(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((0, 0, 0), true, pd, pg, pn, pm)
    }

    pub fn pred_bic(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((0, 0, 1), false, pd, pg, pn, pm)
    }

    pub fn pred_bics(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((0, 0, 1), true, pd, pg, pn, pm)
    }

    pub fn pred_eor(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((0, 1, 0), false, pd, pg, pn, pm)
    }

    pub fn pred_eors(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((0, 1, 0), true, pd, pg, pn, pm)
    }

    /// Predicate select has no flag-setting form.
    pub fn pred_sel(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((0, 1, 1), false, pd, pg, pn, pm)
    }

    pub fn pred_orr(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((1, 0, 0), false, pd, pg, pn, pm)
    }

    pub fn pred_orrs(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((1, 0, 0), true, pd, pg, pn, pm)
    }

    pub fn pred_orn(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((1, 0, 1), false, pd, pg, pn, pm)
    }

    pub fn pred_orns(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((1, 0, 1), true, pd, pg, pn, pm)
    }

    pub fn pred_nor(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((1, 1, 0), false, pd, pg, pn, pm)
    }

    pub fn pred_nors(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((1, 1, 0), true, pd, pg, pn, pm)
    }

    pub fn pred_nand(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((1, 1, 1), false, pd, pg, pn, pm)
    }

    pub fn pred_nands(&mut self, pd: PReg, pg: PReg, pn: PReg, pm: PReg) -> Result<(), EncodeError> {
        self.pred_logical((1, 1, 1), true, pd, pg, pn, pm)
    }

    // -- Counting ------------------------------------------------------------

    pub fn cntp(&mut self, size: LaneSize, rd: Gp, pg: PReg, pn: PReg) -> Result<(), EncodeError> {
        let rd = check_gp(rd)?;
        let pg = check_p(pg)?;
        let pn = check_p(pn)?;
        self.buf.emit32(
            0x2520_8000 | (size.field() << 22) | (pg << 10) | (pn << 5) | rd,
        );
        Ok(())
    }

    fn incdec_p(&mut self, size: LaneSize, dec: bool, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        let rdn = check_gp(rdn)?;
        let pm = check_p(pm)?;
        self.buf.emit32(
            0x252C_8800 | (size.field() << 22) | (u32::from(dec) << 16) | (pm << 5) | rdn,
        );
        Ok(())
    }

    pub fn incp(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.incdec_p(size, false, rdn, pm)
    }

    pub fn decp(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.incdec_p(size, true, rdn, pm)
    }

    fn incdec_p_vec(&mut self, size: LaneSize, dec: bool, zdn: ZReg, pm: PReg) -> Result<(), EncodeError> {
        check_vec_count_lane(size)?;
        let zdn = check_z(zdn)?;
        let pm = check_p(pm)?;
        self.buf.emit32(
            0x252C_8000 | (size.field() << 22) | (u32::from(dec) << 16) | (pm << 5) | zdn,
        );
        Ok(())
    }

    pub fn incp_z(&mut self, size: LaneSize, zdn: ZReg, pm: PReg) -> Result<(), EncodeError> {
        self.incdec_p_vec(size, false, zdn, pm)
    }

    pub fn decp_z(&mut self, size: LaneSize, zdn: ZReg, pm: PReg) -> Result<(), EncodeError> {
        self.incdec_p_vec(size, true, zdn, pm)
    }

    fn sat_incdec_p(
        &mut self,
        size: LaneSize,
        dec: bool,
        unsigned: bool,
        fx32: bool,
        rdn: Gp,
        pm: PReg,
    ) -> Result<(), EncodeError> {
        let rdn = check_gp(rdn)?;
        let pm = check_p(pm)?;
        self.buf.emit32(
            0x2528_8800
                | (size.field() << 22)
                | (u32::from(dec) << 17)
                | (u32::from(unsigned) << 16)
                | (u32::from(!fx32) << 10)
                | (pm << 5)
                | rdn,
        );
        Ok(())
    }

    pub fn sqincp(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p(size, false, false, false, rdn, pm)
    }

    pub fn uqincp(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p(size, false, true, false, rdn, pm)
    }

    pub fn sqdecp(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p(size, true, false, false, rdn, pm)
    }

    pub fn uqdecp(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p(size, true, true, false, rdn, pm)
    }

    /// 32-bit form: the saturated low word is extended into the X register.
    pub fn sqincp_w(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p(size, false, false, true, rdn, pm)
    }

    pub fn uqincp_w(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p(size, false, true, true, rdn, pm)
    }

    pub fn sqdecp_w(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p(size, true, false, true, rdn, pm)
    }

    pub fn uqdecp_w(&mut self, size: LaneSize, rdn: Gp, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p(size, true, true, true, rdn, pm)
    }

    fn sat_incdec_p_vec(
        &mut self,
        size: LaneSize,
        dec: bool,
        unsigned: bool,
        zdn: ZReg,
        pm: PReg,
    ) -> Result<(), EncodeError> {
        check_vec_count_lane(size)?;
        let zdn = check_z(zdn)?;
        let pm = check_p(pm)?;
        self.buf.emit32(
            0x2528_8000
                | (size.field() << 22)
                | (u32::from(dec) << 17)
                | (u32::from(unsigned) << 16)
                | (pm << 5)
                | zdn,
        );
        Ok(())
    }

    pub fn sqincp_z(&mut self, size: LaneSize, zdn: ZReg, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p_vec(size, false, false, zdn, pm)
    }

    pub fn uqincp_z(&mut self, size: LaneSize, zdn: ZReg, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p_vec(size, false, true, zdn, pm)
    }

    pub fn sqdecp_z(&mut self, size: LaneSize, zdn: ZReg, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p_vec(size, true, false, zdn, pm)
    }

    pub fn uqdecp_z(&mut self, size: LaneSize, zdn: ZReg, pm: PReg) -> Result<(), EncodeError> {
        self.sat_incdec_p_vec(size, true, true, zdn, pm)
    }

    fn check_elem_mul(mul: u8) -> Result<u32, EncodeError> {
        if (1..=16).contains(&mul) {
            Ok(mul as u32 - 1)
        } else {
            Err(EncodeError::ImmediateRange { value: mul as i64, field: "multiplier" })
        }
    }

    fn cnt_elem(&mut self, size: LaneSize, rd: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        let rd = check_gp(rd)?;
        let imm4 = Self::check_elem_mul(mul)?;
        if pat > 0b11111 {
            return Err(EncodeError::ImmediateRange { value: pat as i64, field: "pattern" });
        }
        self.buf.emit32(
            0x0420_E000 | (size.field() << 22) | (imm4 << 16) | ((pat as u32) << 5) | rd,
        );
        Ok(())
    }

    pub fn cntb(&mut self, rd: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.cnt_elem(LaneSize::B, rd, pat, mul)
    }

    pub fn cnth(&mut self, rd: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.cnt_elem(LaneSize::H, rd, pat, mul)
    }

    pub fn cntw(&mut self, rd: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.cnt_elem(LaneSize::S, rd, pat, mul)
    }

    pub fn cntd(&mut self, rd: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.cnt_elem(LaneSize::D, rd, pat, mul)
    }

    fn incdec_elem(
        &mut self,
        size: LaneSize,
        dec: bool,
        rdn: Gp,
        pat: u8,
        mul: u8,
    ) -> Result<(), EncodeError> {
        let rdn = check_gp(rdn)?;
        let imm4 = Self::check_elem_mul(mul)?;
        if pat > 0b11111 {
            return Err(EncodeError::ImmediateRange { value: pat as i64, field: "pattern" });
        }
        self.buf.emit32(
            0x0430_E000
                | (size.field() << 22)
                | (imm4 << 16)
                | (u32::from(dec) << 10)
                | ((pat as u32) << 5)
                | rdn,
        );
        Ok(())
    }

    pub fn incb(&mut self, rdn: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.incdec_elem(LaneSize::B, false, rdn, pat, mul)
    }

    pub fn inch(&mut self, rdn: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.incdec_elem(LaneSize::H, false, rdn, pat, mul)
    }

    pub fn incw(&mut self, rdn: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.incdec_elem(LaneSize::S, false, rdn, pat, mul)
    }

    pub fn incd(&mut self, rdn: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.incdec_elem(LaneSize::D, false, rdn, pat, mul)
    }

    pub fn decb(&mut self, rdn: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.incdec_elem(LaneSize::B, true, rdn, pat, mul)
    }

    pub fn dech(&mut self, rdn: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.incdec_elem(LaneSize::H, true, rdn, pat, mul)
    }

    pub fn decw(&mut self, rdn: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.incdec_elem(LaneSize::S, true, rdn, pat, mul)
    }

    pub fn decd(&mut self, rdn: Gp, pat: u8, mul: u8) -> Result<(), EncodeError> {
        self.incdec_elem(LaneSize::D, true, rdn, pat, mul)
    }

    pub fn rdvl(&mut self, rd: Gp, imm: i8) -> Result<(), EncodeError> {
        let rd = check_gp(rd)?;
        if !(-32..=31).contains(&imm) {
            return Err(EncodeError::ImmediateRange { value: imm as i64, field: "imm6" });
        }
        self.buf.emit32(0x04BF_5000 | (((imm as u32) & 0x3F) << 5) | rd);
        Ok(())
    }

    // -- Memory --------------------------------------------------------------

    fn check_imm9(imm9: i16) -> Result<(u32, u32), EncodeError> {
        if !(-256..=255).contains(&imm9) {
            return Err(EncodeError::ImmediateRange { value: imm9 as i64, field: "imm9" });
        }
        let raw = (imm9 as u32) & 0x1FF;
        Ok((raw >> 3, raw & 0x7))
    }

    pub fn ldr_z(&mut self, zt: ZReg, rn: Gp, imm9: i16) -> Result<(), EncodeError> {
        let zt = check_z(zt)?;
        let rn = check_gp(rn)?;
        let (hi, lo) = Self::check_imm9(imm9)?;
        self.buf.emit32(0x8580_4000 | (hi << 16) | (lo << 10) | (rn << 5) | zt);
        Ok(())
    }

    pub fn str_z(&mut self, zt: ZReg, rn: Gp, imm9: i16) -> Result<(), EncodeError> {
        let zt = check_z(zt)?;
        let rn = check_gp(rn)?;
        let (hi, lo) = Self::check_imm9(imm9)?;
        self.buf.emit32(0xE580_4000 | (hi << 16) | (lo << 10) | (rn << 5) | zt);
        Ok(())
    }

    pub fn ldr_p(&mut self, pt: PReg, rn: Gp, imm9: i16) -> Result<(), EncodeError> {
        let pt = check_p(pt)?;
        let rn = check_gp(rn)?;
        let (hi, lo) = Self::check_imm9(imm9)?;
        self.buf.emit32(0x8580_0000 | (hi << 16) | (lo << 10) | (rn << 5) | pt);
        Ok(())
    }

    pub fn str_p(&mut self, pt: PReg, rn: Gp, imm9: i16) -> Result<(), EncodeError> {
        let pt = check_p(pt)?;
        let rn = check_gp(rn)?;
        let (hi, lo) = Self::check_imm9(imm9)?;
        self.buf.emit32(0xE580_0000 | (hi << 16) | (lo << 10) | (rn << 5) | pt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_word(asm: &Assembler) -> u32 {
        let bytes = asm.bytes();
        let tail: [u8; 4] = bytes[bytes.len() - 4..].try_into().unwrap();
        u32::from_le_bytes(tail)
    }

    #[test]
    fn test_movz_canonical_word() {
        let mut asm = Assembler::new();
        asm.movz(true, Gp(0), 42, 0).unwrap();
        assert_eq!(last_word(&asm), 0xD2800540);
    }

    #[test]
    fn test_hw_range_depends_on_sf() {
        let mut asm = Assembler::new();
        assert!(asm.movz(false, Gp(0), 1, 2).is_err());
        assert!(asm.movz(true, Gp(0), 1, 2).is_ok());
        // The failed call emitted nothing.
        assert_eq!(asm.len(), 4);
    }

    #[test]
    fn test_add_predicated_word() {
        let mut asm = Assembler::new();
        asm.add(LaneSize::B, ZReg(0), PReg(0), ZReg(1)).unwrap();
        assert_eq!(last_word(&asm), 0x04000020);
    }

    #[test]
    fn test_add_unpredicated_word() {
        let mut asm = Assembler::new();
        asm.add_unpred(LaneSize::B, ZReg(0), ZReg(1), ZReg(2)).unwrap();
        assert_eq!(last_word(&asm), 0x04220020);
    }

    #[test]
    fn test_ptrue_all_word() {
        let mut asm = Assembler::new();
        asm.ptrue(LaneSize::B, PReg(0), pattern::ALL).unwrap();
        assert_eq!(last_word(&asm), 0x2518E3E0);
    }

    #[test]
    fn test_ptest_word() {
        let mut asm = Assembler::new();
        asm.ptest(PReg(1), PReg(1)).unwrap();
        assert_eq!(last_word(&asm), 0x2550C420);
    }

    #[test]
    fn test_movprfx_word() {
        let mut asm = Assembler::new();
        asm.movprfx(ZReg(1), ZReg(2)).unwrap();
        assert_eq!(last_word(&asm), 0x0420BC41);
    }

    #[test]
    fn test_ldr_z_word() {
        let mut asm = Assembler::new();
        asm.ldr_z(ZReg(0), Gp(1), 0).unwrap();
        assert_eq!(last_word(&asm), 0x85804020);
    }

    #[test]
    fn test_divide_rejects_narrow_lanes() {
        let mut asm = Assembler::new();
        assert_eq!(
            asm.sdiv(LaneSize::B, ZReg(0), PReg(0), ZReg(1)),
            Err(EncodeError::LaneSize("divide only exists at S and D lanes"))
        );
        assert!(asm.is_empty());
        assert!(asm.sdiv(LaneSize::S, ZReg(0), PReg(0), ZReg(1)).is_ok());
    }

    #[test]
    fn test_governing_predicate_field_width() {
        let mut asm = Assembler::new();
        assert!(asm.add(LaneSize::B, ZReg(0), PReg(8), ZReg(1)).is_err());
        // The 4-bit field forms accept P8-P15.
        assert!(asm.ptest(PReg(8), PReg(0)).is_ok());
    }

    #[test]
    fn test_shifted_imm_rejected_for_b_lanes() {
        let mut asm = Assembler::new();
        assert!(asm.add_imm(LaneSize::B, ZReg(0), 1, true).is_err());
        assert!(asm.add_imm(LaneSize::H, ZReg(0), 1, true).is_ok());
        assert!(asm.dup_imm(LaneSize::B, ZReg(0), 1, true).is_err());
    }

    #[test]
    fn test_saddv_d_rejected() {
        let mut asm = Assembler::new();
        assert!(asm.saddv(LaneSize::D, ZReg(0), PReg(0), ZReg(1)).is_err());
        assert!(asm.uaddv(LaneSize::D, ZReg(0), PReg(0), ZReg(1)).is_ok());
    }

    #[test]
    fn test_vector_count_b_rejected() {
        let mut asm = Assembler::new();
        assert!(asm.sqincp_z(LaneSize::B, ZReg(0), PReg(0)).is_err());
        assert!(asm.incp_z(LaneSize::B, ZReg(0), PReg(0)).is_err());
        assert!(asm.sqincp_z(LaneSize::H, ZReg(0), PReg(0)).is_ok());
    }

    #[test]
    fn test_imm9_bounds() {
        let mut asm = Assembler::new();
        assert!(asm.ldr_z(ZReg(0), Gp(0), 255).is_ok());
        assert!(asm.ldr_z(ZReg(0), Gp(0), -256).is_ok());
        assert!(asm.ldr_z(ZReg(0), Gp(0), 256).is_err());
        assert!(asm.str_p(PReg(0), Gp(0), -257).is_err());
    }

    #[test]
    fn test_encode_logical_imm_round_trip() {
        // Spot values with known encodings.
        assert_eq!(encode_logical_imm(0x5555_5555_5555_5555), Some(0b0_000000_111100));
        assert_eq!(encode_logical_imm(0x00FF_00FF_00FF_00FF), Some(0b0_000000_100111));
        assert_eq!(encode_logical_imm(0), None);
        assert_eq!(encode_logical_imm(u64::MAX), None);
        // 0x1234 has no contiguous-run rotation.
        assert_eq!(encode_logical_imm(0x1234_1234_1234_1234), None);
    }

    #[test]
    fn test_logical_imm_unencodable_reported() {
        let mut asm = Assembler::new();
        assert!(matches!(
            asm.and_imm(ZReg(0), 0x1234),
            Err(EncodeError::ImmediateRange { .. })
        ));
        assert!(asm.is_empty());
        assert!(asm.and_imm(ZReg(0), 0x00FF_00FF_00FF_00FF).is_ok());
    }

    #[test]
    fn test_register_bounds_rejected() {
        let mut asm = Assembler::new();
        assert!(asm.add(LaneSize::B, ZReg(32), PReg(0), ZReg(1)).is_err());
        assert!(asm.ptest(PReg(16), PReg(0)).is_err());
        assert!(asm.movz(true, Gp(32), 0, 0).is_err());
        assert!(asm.is_empty());
    }
}
