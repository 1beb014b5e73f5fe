// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Across-lane reductions.
//!
//! Active lanes of the source fold into a single scalar written to the
//! destination's V-register view: the value lands in the low bits and every
//! higher bit of the Z register is cleared, never sign-extended.

use svarm_core::LaneSize;

use crate::decoder::ReduceOp;
use crate::state::ArchState;

use super::{mask_lane, require_vl, sign_extend_lane, SimError, Step};

pub fn exec_reduce(
    state: &mut ArchState,
    size: LaneSize,
    op: ReduceOp,
    pg: u8,
    zn: u8,
    vd: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let lanes = vl.lanes(size);

    // The additive reductions accumulate into a 64-bit result; the others
    // stay at the lane width and start from the operation's identity.
    let mut acc: u64 = match op {
        ReduceOp::Saddv | ReduceOp::Uaddv | ReduceOp::Orv | ReduceOp::Eorv => 0,
        ReduceOp::Umaxv => 0,
        ReduceOp::Andv | ReduceOp::Uminv => mask_lane(u64::MAX, size),
        ReduceOp::Smaxv => mask_lane(1u64 << (size.bits() - 1), size),
        ReduceOp::Sminv => mask_lane((1u64 << (size.bits() - 1)) - 1, size),
    };

    for i in 0..lanes {
        if !state.pred_lane_active(pg, size, i) {
            continue;
        }
        let v = state.get_z_lane(zn, i, size);
        acc = match op {
            ReduceOp::Saddv => acc.wrapping_add(sign_extend_lane(v, size) as u64),
            ReduceOp::Uaddv => acc.wrapping_add(v),
            ReduceOp::Smaxv => {
                let best = sign_extend_lane(acc, size).max(sign_extend_lane(v, size));
                mask_lane(best as u64, size)
            }
            ReduceOp::Sminv => {
                let best = sign_extend_lane(acc, size).min(sign_extend_lane(v, size));
                mask_lane(best as u64, size)
            }
            ReduceOp::Umaxv => acc.max(v),
            ReduceOp::Uminv => acc.min(v),
            ReduceOp::Orv => acc | v,
            ReduceOp::Eorv => acc ^ v,
            ReduceOp::Andv => acc & v,
        };
    }

    let result_size = match op {
        ReduceOp::Saddv | ReduceOp::Uaddv => LaneSize::D,
        _ => size,
    };
    state.write_z_scalar(vd, result_size, acc);
    Ok(Step::Continue)
}
