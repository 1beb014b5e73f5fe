// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! SVE integer arithmetic and logical execution.

use svarm_core::LaneSize;

use crate::decoder::{BinOp, BitwiseOp, ImmArithOp, MinMaxImmOp, UnpredArithOp};
use crate::state::ArchState;

use super::{mask_lane, require_vl, sat_signed, sat_unsigned, sign_extend_lane, SimError, Step};

/// Widest possible lane count (B lanes at the maximum vector length).
const MAX_LANES: usize = 256;

/// Apply a binary operation to one pair of lane values.
fn apply_bin_op(op: BinOp, size: LaneSize, a: u64, b: u64) -> u64 {
    let sa = sign_extend_lane(a, size);
    let sb = sign_extend_lane(b, size);
    match op {
        BinOp::Add => mask_lane(a.wrapping_add(b), size),
        BinOp::Sub => mask_lane(a.wrapping_sub(b), size),
        BinOp::Subr => mask_lane(b.wrapping_sub(a), size),
        BinOp::Smax => mask_lane(sa.max(sb) as u64, size),
        BinOp::Umax => a.max(b),
        BinOp::Smin => mask_lane(sa.min(sb) as u64, size),
        BinOp::Umin => a.min(b),
        BinOp::Sabd => mask_lane((sa as i128 - sb as i128).unsigned_abs() as u64, size),
        BinOp::Uabd => a.abs_diff(b),
        BinOp::Mul => mask_lane(a.wrapping_mul(b), size),
        BinOp::Smulh => {
            let wide = (sa as i128) * (sb as i128);
            mask_lane((wide >> size.bits()) as u64, size)
        }
        BinOp::Umulh => {
            let wide = (a as u128) * (b as u128);
            mask_lane((wide >> size.bits()) as u64, size)
        }
        BinOp::Sdiv | BinOp::Sdivr => {
            let (num, den) = if op == BinOp::Sdiv { (sa, sb) } else { (sb, sa) };
            if den == 0 {
                0
            } else {
                mask_lane(((num as i128) / (den as i128)) as u64, size)
            }
        }
        BinOp::Udiv | BinOp::Udivr => {
            let (num, den) = if op == BinOp::Udiv { (a, b) } else { (b, a) };
            if den == 0 {
                0
            } else {
                num / den
            }
        }
        BinOp::Orr => a | b,
        BinOp::Eor => a ^ b,
        BinOp::And => a & b,
        BinOp::Bic => a & !b,
    }
}

/// Predicated binary op, merging form: inactive lanes keep the destination's
/// prior value. Sources are read before any write so register aliasing is
/// safe.
pub fn exec_bin_pred(
    state: &mut ArchState,
    size: LaneSize,
    op: BinOp,
    pg: u8,
    zm: u8,
    zdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);

    let mut results = [0u64; MAX_LANES];
    for i in 0..lanes {
        let a = state.get_z_lane(zdn, i, size);
        let b = state.get_z_lane(zm, i, size);
        results[i] = if state.pred_lane_active(pg, size, i) {
            apply_bin_op(op, size, a, b)
        } else {
            a
        };
    }
    for i in 0..lanes {
        state.set_z_lane(zdn, i, size, results[i]);
    }
    Ok(Step::Continue)
}

pub fn exec_arith_unpred(
    state: &mut ArchState,
    size: LaneSize,
    op: UnpredArithOp,
    zm: u8,
    zn: u8,
    zd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);

    let mut results = [0u64; MAX_LANES];
    for i in 0..lanes {
        let a = state.get_z_lane(zn, i, size);
        let b = state.get_z_lane(zm, i, size);
        let sa = sign_extend_lane(a, size) as i128;
        let sb = sign_extend_lane(b, size) as i128;
        results[i] = match op {
            UnpredArithOp::Add => mask_lane(a.wrapping_add(b), size),
            UnpredArithOp::Sub => mask_lane(a.wrapping_sub(b), size),
            UnpredArithOp::Sqadd => sat_signed(sa + sb, size),
            UnpredArithOp::Uqadd => sat_unsigned(a as i128 + b as i128, size),
            UnpredArithOp::Sqsub => sat_signed(sa - sb, size),
            UnpredArithOp::Uqsub => sat_unsigned(a as i128 - b as i128, size),
        };
    }
    for i in 0..lanes {
        state.set_z_lane(zd, i, size, results[i]);
    }
    Ok(Step::Continue)
}

/// Unpredicated bitwise logical; operates on the whole vector, so lane size
/// is irrelevant.
pub fn exec_logical_unpred(
    state: &mut ArchState,
    op: BitwiseOp,
    zm: u8,
    zn: u8,
    zd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let bytes = vl.bytes();

    let mut result = [0u8; crate::state::Z_MAX_BYTES];
    for i in 0..bytes {
        let a = state.z_bytes(zn)[i];
        let b = state.z_bytes(zm)[i];
        result[i] = match op {
            BitwiseOp::And => a & b,
            BitwiseOp::Orr => a | b,
            BitwiseOp::Eor => a ^ b,
            BitwiseOp::Bic => a & !b,
        };
    }
    state.z_bytes_mut(zd)[..bytes].copy_from_slice(&result[..bytes]);
    Ok(Step::Continue)
}

/// Bitwise logical with the 64-bit-replicated bitmask immediate.
pub fn exec_logical_imm(
    state: &mut ArchState,
    op: BitwiseOp,
    imm: u64,
    zdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(LaneSize::D);

    for i in 0..lanes {
        let a = state.get_z_lane(zdn, i, LaneSize::D);
        let r = match op {
            BitwiseOp::And => a & imm,
            BitwiseOp::Orr => a | imm,
            BitwiseOp::Eor => a ^ imm,
            BitwiseOp::Bic => a & !imm,
        };
        state.set_z_lane(zdn, i, LaneSize::D, r);
    }
    Ok(Step::Continue)
}

pub fn exec_arith_imm(
    state: &mut ArchState,
    size: LaneSize,
    op: ImmArithOp,
    sh: bool,
    imm8: u8,
    zdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);
    let imm = (imm8 as u64) << if sh { 8 } else { 0 };

    for i in 0..lanes {
        let a = state.get_z_lane(zdn, i, size);
        let sa = sign_extend_lane(a, size) as i128;
        let r = match op {
            ImmArithOp::Add => mask_lane(a.wrapping_add(imm), size),
            ImmArithOp::Sub => mask_lane(a.wrapping_sub(imm), size),
            ImmArithOp::Subr => mask_lane(imm.wrapping_sub(a), size),
            ImmArithOp::Sqadd => sat_signed(sa + imm as i128, size),
            ImmArithOp::Uqadd => sat_unsigned(a as i128 + imm as i128, size),
            ImmArithOp::Sqsub => sat_signed(sa - imm as i128, size),
            ImmArithOp::Uqsub => sat_unsigned(a as i128 - imm as i128, size),
        };
        state.set_z_lane(zdn, i, size, r);
    }
    Ok(Step::Continue)
}

pub fn exec_minmax_imm(
    state: &mut ArchState,
    size: LaneSize,
    op: MinMaxImmOp,
    imm8: u8,
    zdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);
    let simm = imm8 as i8 as i64;
    let uimm = imm8 as u64;

    for i in 0..lanes {
        let a = state.get_z_lane(zdn, i, size);
        let sa = sign_extend_lane(a, size);
        let r = match op {
            MinMaxImmOp::Smax => mask_lane(sa.max(simm) as u64, size),
            MinMaxImmOp::Smin => mask_lane(sa.min(simm) as u64, size),
            MinMaxImmOp::Umax => a.max(uimm),
            MinMaxImmOp::Umin => a.min(uimm),
        };
        state.set_z_lane(zdn, i, size, r);
    }
    Ok(Step::Continue)
}

pub fn exec_mul_imm(
    state: &mut ArchState,
    size: LaneSize,
    imm8: u8,
    zdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);
    let imm = imm8 as i8 as i64 as u64;

    for i in 0..lanes {
        let a = state.get_z_lane(zdn, i, size);
        state.set_z_lane(zdn, i, size, mask_lane(a.wrapping_mul(imm), size));
    }
    Ok(Step::Continue)
}
