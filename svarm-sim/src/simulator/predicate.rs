// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Predicate generation and testing.

use svarm_core::{predicate, Flags, LaneSize};

use crate::decoder::PredOp;
use crate::state::ArchState;

use super::{require_vl, SimError, Step};

/// The architectural predicate-test flag computation, shared by `ptest`,
/// `pfirst`, `pnext`, the flag-setting predicate logicals and the vector
/// compares.
///
/// First = the result is active at the governing predicate's first active
/// lane; None = governing predicate and result share no active lane;
/// NotLast = the result is not active at the governing predicate's last
/// active lane (or the governing predicate is empty). V is always cleared.
pub(crate) fn pred_test(mask: &[u8], result: &[u8], size: LaneSize, lanes: usize) -> Flags {
    let first = predicate::first_active(mask, size, lanes);
    let last = predicate::last_active(mask, size, lanes);

    let n = first.map_or(false, |i| predicate::lane_active(result, size, i));
    let z = (0..lanes).all(|i| {
        !(predicate::lane_active(mask, size, i) && predicate::lane_active(result, size, i))
    });
    let c = !last.map_or(false, |i| predicate::lane_active(result, size, i));
    Flags::from_nzcv(n, z, c, false)
}

/// Number of lanes selected by a predicate-constraint pattern.
pub(crate) fn pattern_lanes(pattern: u8, elems: usize) -> usize {
    match pattern {
        0b00000 => {
            // POW2: largest power of two not above the lane count.
            let mut n = 1;
            while n * 2 <= elems {
                n *= 2;
            }
            if elems == 0 {
                0
            } else {
                n
            }
        }
        n @ 1..=8 => {
            let n = n as usize;
            if elems >= n {
                n
            } else {
                0
            }
        }
        9 => {
            if elems >= 16 {
                16
            } else {
                0
            }
        }
        10 => {
            if elems >= 32 {
                32
            } else {
                0
            }
        }
        11 => {
            if elems >= 64 {
                64
            } else {
                0
            }
        }
        12 => {
            if elems >= 128 {
                128
            } else {
                0
            }
        }
        13 => {
            if elems >= 256 {
                256
            } else {
                0
            }
        }
        0b11101 => elems - elems % 4,
        0b11110 => elems - elems % 3,
        0b11111 => elems,
        _ => 0,
    }
}

pub fn exec_ptrue(
    state: &mut ArchState,
    size: LaneSize,
    set_flags: bool,
    pattern: u8,
    pd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);
    let active = pattern_lanes(pattern, lanes);

    *state.p_bytes_mut(pd) = [0; crate::state::P_MAX_BYTES];
    for i in 0..active {
        state.set_pred_lane(pd, size, i, true);
    }
    if set_flags {
        let result = *state.p_bytes(pd);
        state.nzcv = pred_test(&result, &result, size, lanes);
    }
    Ok(Step::Continue)
}

pub fn exec_pfalse(state: &mut ArchState, pd: u8) -> Result<Step, SimError> {
    require_vl(state)?;
    *state.p_bytes_mut(pd) = [0; crate::state::P_MAX_BYTES];
    Ok(Step::Continue)
}

pub fn exec_ptest(state: &mut ArchState, pg: u8, pn: u8) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(LaneSize::B);
    state.nzcv = pred_test(state.p_bytes(pg), state.p_bytes(pn), LaneSize::B, lanes);
    Ok(Step::Continue)
}

/// Activate the governing predicate's first active lane in the destination,
/// leaving every other lane unchanged. Flags as `ptest` of the result.
pub fn exec_pfirst(state: &mut ArchState, pg: u8, pdn: u8) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(LaneSize::B);

    if let Some(i) = predicate::first_active(state.p_bytes(pg), LaneSize::B, lanes) {
        state.set_pred_lane(pdn, LaneSize::B, i, true);
    }
    state.nzcv = pred_test(state.p_bytes(pg), state.p_bytes(pdn), LaneSize::B, lanes);
    Ok(Step::Continue)
}

/// Activate the governing predicate's next active lane strictly after the
/// destination's last active lane (searching from lane 0 when the
/// destination is empty); all other destination lanes become inactive.
/// Flags as `ptest` of the result.
pub fn exec_pnext(
    state: &mut ArchState,
    size: LaneSize,
    pg: u8,
    pdn: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);

    let start = predicate::last_active(state.p_bytes(pdn), size, lanes)
        .map(|i| i + 1)
        .unwrap_or(0);
    let next =
        (start..lanes).find(|&i| predicate::lane_active(state.p_bytes(pg), size, i));

    *state.p_bytes_mut(pdn) = [0; crate::state::P_MAX_BYTES];
    if let Some(i) = next {
        state.set_pred_lane(pdn, size, i, true);
    }
    state.nzcv = pred_test(state.p_bytes(pg), state.p_bytes(pdn), size, lanes);
    Ok(Step::Continue)
}

pub fn exec_pred_logical(
    state: &mut ArchState,
    op: PredOp,
    set_flags: bool,
    pm: u8,
    pg: u8,
    pn: u8,
    pd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(LaneSize::B);

    let gov = *state.p_bytes(pg);
    let a = *state.p_bytes(pn);
    let b = *state.p_bytes(pm);

    let mut result = [0u8; crate::state::P_MAX_BYTES];
    for i in 0..lanes {
        let g = predicate::lane_active(&gov, LaneSize::B, i);
        let n = predicate::lane_active(&a, LaneSize::B, i);
        let m = predicate::lane_active(&b, LaneSize::B, i);
        let val = match op {
            PredOp::And => g && (n && m),
            PredOp::Bic => g && (n && !m),
            PredOp::Eor => g && (n ^ m),
            // SEL is not zeroing: inactive lanes take the second source.
            PredOp::Sel => {
                if g {
                    n
                } else {
                    m
                }
            }
            PredOp::Orr => g && (n || m),
            PredOp::Orn => g && (n || !m),
            PredOp::Nor => g && !(n || m),
            PredOp::Nand => g && !(n && m),
        };
        predicate::set_lane(&mut result, LaneSize::B, i, val);
    }
    *state.p_bytes_mut(pd) = result;
    if set_flags {
        state.nzcv = pred_test(&gov, &result, LaneSize::B, lanes);
    }
    Ok(Step::Continue)
}
