// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Vector compares and the compare-and-terminate pair.

use svarm_core::{Flags, LaneSize};

use crate::decoder::CmpOp;
use crate::state::ArchState;

use super::predicate::pred_test;
use super::{require_vl, sign_extend_lane, SimError, Step};

pub fn exec_cmp_vec(
    state: &mut ArchState,
    size: LaneSize,
    op: CmpOp,
    zm: u8,
    pg: u8,
    zn: u8,
    pd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);
    let gov = *state.p_bytes(pg);

    let mut result = [0u8; crate::state::P_MAX_BYTES];
    for i in 0..lanes {
        let hit = if svarm_core::predicate::lane_active(&gov, size, i) {
            let a = state.get_z_lane(zn, i, size);
            let b = state.get_z_lane(zm, i, size);
            let sa = sign_extend_lane(a, size);
            let sb = sign_extend_lane(b, size);
            match op {
                CmpOp::Eq => a == b,
                CmpOp::Ne => a != b,
                CmpOp::Ge => sa >= sb,
                CmpOp::Gt => sa > sb,
                CmpOp::Hs => a >= b,
                CmpOp::Hi => a > b,
            }
        } else {
            false
        };
        svarm_core::predicate::set_lane(&mut result, size, i, hit);
    }
    *state.p_bytes_mut(pd) = result;
    state.nzcv = pred_test(&gov, &result, size, lanes);
    Ok(Step::Continue)
}

/// Compare-and-terminate. Touches only N and V: N reports whether the
/// termination condition held, V becomes !C on mismatch. Z and C keep their
/// prior values; this deliberate exception is not routed through the
/// predicate-test path.
pub fn exec_cterm(
    state: &mut ArchState,
    is64: bool,
    ne: bool,
    rm: u8,
    rn: u8,
) -> Result<Step, SimError> {
    let mut a = state.get_x(rn);
    let mut b = state.get_x(rm);
    if !is64 {
        a &= 0xFFFF_FFFF;
        b &= 0xFFFF_FFFF;
    }
    let term = if ne { a != b } else { a == b };

    if term {
        state.nzcv.insert(Flags::N);
        state.nzcv.remove(Flags::V);
    } else {
        state.nzcv.remove(Flags::N);
        let v = !state.nzcv.contains(Flags::C);
        state.nzcv.set(Flags::V, v);
    }
    Ok(Step::Continue)
}
