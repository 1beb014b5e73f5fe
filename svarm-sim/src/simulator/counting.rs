// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Predicate- and element-counting execution, including the saturating
//! increment/decrement family.

use svarm_core::{predicate, LaneSize};

use crate::state::ArchState;

use super::predicate::pattern_lanes;
use super::{mask_lane, require_vl, sat_signed, sat_unsigned, sign_extend_lane, SimError, Step};

pub fn exec_cntp(
    state: &mut ArchState,
    size: LaneSize,
    pg: u8,
    pn: u8,
    rd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);
    let count = (0..lanes)
        .filter(|&i| {
            state.pred_lane_active(pg, size, i) && state.pred_lane_active(pn, size, i)
        })
        .count() as u64;
    state.set_x(rd, count);
    Ok(Step::Continue)
}

pub fn exec_incdec_p(
    state: &mut ArchState,
    size: LaneSize,
    dec: bool,
    pm: u8,
    rdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let count = predicate::count_active(state.p_bytes(pm), size, vl.lanes(size));
    let old = state.get_x(rdn);
    let new = if dec { old.wrapping_sub(count) } else { old.wrapping_add(count) };
    state.set_x(rdn, new);
    Ok(Step::Continue)
}

pub fn exec_incdec_p_vec(
    state: &mut ArchState,
    size: LaneSize,
    dec: bool,
    pm: u8,
    zdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);
    let count = predicate::count_active(state.p_bytes(pm), size, lanes);

    for i in 0..lanes {
        let a = state.get_z_lane(zdn, i, size);
        let r = if dec { a.wrapping_sub(count) } else { a.wrapping_add(count) };
        state.set_z_lane(zdn, i, size, mask_lane(r, size));
    }
    Ok(Step::Continue)
}

/// Saturating inc/dec of a scalar register by the active-lane count.
///
/// The 64-bit form saturates in 64 bits. The 32-bit form operates on the low
/// word and extends its saturated result into the full register: sign-extended
/// for the signed flavors, zero-extended for the unsigned ones.
pub fn exec_sat_incdec_p(
    state: &mut ArchState,
    size: LaneSize,
    dec: bool,
    unsigned: bool,
    fx32: bool,
    pm: u8,
    rdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let count = predicate::count_active(state.p_bytes(pm), size, vl.lanes(size)) as i128;
    let delta = if dec { -count } else { count };
    let old = state.get_x(rdn);

    let new = match (unsigned, fx32) {
        (false, false) => sat_signed((old as i64 as i128) + delta, LaneSize::D),
        (true, false) => sat_unsigned(old as i128 + delta, LaneSize::D),
        (false, true) => {
            let v = sat_signed((old as u32 as i32 as i128) + delta, LaneSize::S);
            v as u32 as i32 as i64 as u64
        }
        (true, true) => sat_unsigned((old as u32 as i128) + delta, LaneSize::S),
    };
    state.set_x(rdn, new);
    Ok(Step::Continue)
}

pub fn exec_sat_incdec_p_vec(
    state: &mut ArchState,
    size: LaneSize,
    dec: bool,
    unsigned: bool,
    pm: u8,
    zdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);
    let count = predicate::count_active(state.p_bytes(pm), size, lanes) as i128;
    let delta = if dec { -count } else { count };

    for i in 0..lanes {
        let a = state.get_z_lane(zdn, i, size);
        let r = if unsigned {
            sat_unsigned(a as i128 + delta, size)
        } else {
            sat_signed(sign_extend_lane(a, size) as i128 + delta, size)
        };
        state.set_z_lane(zdn, i, size, r);
    }
    Ok(Step::Continue)
}

pub fn exec_cnt_elem(
    state: &mut ArchState,
    size: LaneSize,
    mul: u8,
    pattern: u8,
    rd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let count = pattern_lanes(pattern, vl.lanes(size)) as u64 * mul as u64;
    state.set_x(rd, count);
    Ok(Step::Continue)
}

pub fn exec_incdec_elem(
    state: &mut ArchState,
    size: LaneSize,
    dec: bool,
    mul: u8,
    pattern: u8,
    rdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let count = pattern_lanes(pattern, vl.lanes(size)) as u64 * mul as u64;
    let old = state.get_x(rdn);
    let new = if dec { old.wrapping_sub(count) } else { old.wrapping_add(count) };
    state.set_x(rdn, new);
    Ok(Step::Continue)
}

/// Vector-length read: Xd = VL in bytes times the signed multiplier.
pub fn exec_rdvl(state: &mut ArchState, imm: i8, rd: u8) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    state.set_x(rd, (vl.bytes() as i64).wrapping_mul(imm as i64) as u64);
    Ok(Step::Continue)
}
