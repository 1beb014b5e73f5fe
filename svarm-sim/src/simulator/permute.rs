// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Vector moves, element insertion, table lookup and select.

use svarm_core::LaneSize;

use crate::state::ArchState;

use super::{mask_lane, require_vl, SimError, Step};

const MAX_LANES: usize = 256;

/// The immediate operand of DUP/CPY: signed imm8, optionally shifted left 8.
#[inline]
fn expand_imm(size: LaneSize, sh: bool, imm8: u8) -> u64 {
    let val = (imm8 as i8 as i64) << if sh { 8 } else { 0 };
    mask_lane(val as u64, size)
}

pub fn exec_dup_imm(
    state: &mut ArchState,
    size: LaneSize,
    sh: bool,
    imm8: u8,
    zd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let val = expand_imm(size, sh, imm8);
    for i in 0..vl.lanes(size) {
        state.set_z_lane(zd, i, size, val);
    }
    Ok(Step::Continue)
}

pub fn exec_cpy_imm(
    state: &mut ArchState,
    size: LaneSize,
    pg: u8,
    merging: bool,
    sh: bool,
    imm8: u8,
    zd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let val = expand_imm(size, sh, imm8);
    for i in 0..vl.lanes(size) {
        if state.pred_lane_active(pg, size, i) {
            state.set_z_lane(zd, i, size, val);
        } else if !merging {
            state.set_z_lane(zd, i, size, 0);
        }
    }
    Ok(Step::Continue)
}

pub fn exec_dup_scalar(
    state: &mut ArchState,
    size: LaneSize,
    rn: u8,
    zd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let val = mask_lane(state.get_x(rn), size);
    for i in 0..vl.lanes(size) {
        state.set_z_lane(zd, i, size, val);
    }
    Ok(Step::Continue)
}

/// Shift every lane up one position and insert the scalar at lane 0.
pub fn exec_insr(
    state: &mut ArchState,
    size: LaneSize,
    rm: u8,
    zdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);
    let val = mask_lane(state.get_x(rm), size);

    for i in (1..lanes).rev() {
        let below = state.get_z_lane(zdn, i - 1, size);
        state.set_z_lane(zdn, i, size, below);
    }
    state.set_z_lane(zdn, 0, size, val);
    Ok(Step::Continue)
}

/// Table lookup: out-of-range indices produce zero, never a wrapped read.
pub fn exec_tbl(
    state: &mut ArchState,
    size: LaneSize,
    zm: u8,
    zn: u8,
    zd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);

    let mut results = [0u64; MAX_LANES];
    for i in 0..lanes {
        let idx = state.get_z_lane(zm, i, size) as usize;
        results[i] = if idx < lanes { state.get_z_lane(zn, idx, size) } else { 0 };
    }
    for i in 0..lanes {
        state.set_z_lane(zd, i, size, results[i]);
    }
    Ok(Step::Continue)
}

pub fn exec_sel(
    state: &mut ArchState,
    size: LaneSize,
    zm: u8,
    pg: u8,
    zn: u8,
    zd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);

    let mut results = [0u64; MAX_LANES];
    for i in 0..lanes {
        results[i] = if state.pred_lane_active(pg, size, i) {
            state.get_z_lane(zn, i, size)
        } else {
            state.get_z_lane(zm, i, size)
        };
    }
    for i in 0..lanes {
        state.set_z_lane(zd, i, size, results[i]);
    }
    Ok(Step::Continue)
}

/// Standalone MOVPRFX behaves as a whole-vector move.
pub fn exec_movprfx(state: &mut ArchState, zn: u8, zd: u8) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let bytes = vl.bytes();
    let src = *state.z_bytes(zn);
    state.z_bytes_mut(zd)[..bytes].copy_from_slice(&src[..bytes]);
    Ok(Step::Continue)
}
