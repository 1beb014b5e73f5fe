// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Whole-register vector and predicate loads/stores.
//!
//! Addressing is base-plus-immediate with the immediate scaled by the
//! register's size at the current vector length (`MUL VL`).

use crate::memory::MemoryAccess;
use crate::state::ArchState;

use super::{require_vl, SimError, Step};

pub fn exec_ldr_z(
    state: &mut ArchState,
    mem: &mut dyn MemoryAccess,
    imm9: i16,
    rn: u8,
    zt: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let bytes = vl.bytes();
    let addr = state
        .get_x(rn)
        .wrapping_add((imm9 as i64 as u64).wrapping_mul(bytes as u64));

    let pc = state.pc;
    let mut buf = [0u8; crate::state::Z_MAX_BYTES];
    mem.read_bytes(addr, &mut buf[..bytes])
        .map_err(|source| SimError::Data { pc, source })?;
    let dst = state.z_bytes_mut(zt);
    *dst = [0; crate::state::Z_MAX_BYTES];
    dst[..bytes].copy_from_slice(&buf[..bytes]);
    Ok(Step::Continue)
}

pub fn exec_str_z(
    state: &mut ArchState,
    mem: &mut dyn MemoryAccess,
    imm9: i16,
    rn: u8,
    zt: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let bytes = vl.bytes();
    let addr = state
        .get_x(rn)
        .wrapping_add((imm9 as i64 as u64).wrapping_mul(bytes as u64));

    let src = *state.z_bytes(zt);
    mem.write_bytes(addr, &src[..bytes])
        .map_err(|source| SimError::Data { pc: state.pc, source })?;
    Ok(Step::Continue)
}

pub fn exec_ldr_p(
    state: &mut ArchState,
    mem: &mut dyn MemoryAccess,
    imm9: i16,
    rn: u8,
    pt: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let bytes = vl.pred_bytes();
    let addr = state
        .get_x(rn)
        .wrapping_add((imm9 as i64 as u64).wrapping_mul(bytes as u64));

    let pc = state.pc;
    let mut buf = [0u8; crate::state::P_MAX_BYTES];
    mem.read_bytes(addr, &mut buf[..bytes])
        .map_err(|source| SimError::Data { pc, source })?;
    let dst = state.p_bytes_mut(pt);
    *dst = [0; crate::state::P_MAX_BYTES];
    dst[..bytes].copy_from_slice(&buf[..bytes]);
    Ok(Step::Continue)
}

pub fn exec_str_p(
    state: &mut ArchState,
    mem: &mut dyn MemoryAccess,
    imm9: i16,
    rn: u8,
    pt: u8,
) -> Result<Step, SimError> {
    let vl = require_vl(state)?;
    let bytes = vl.pred_bytes();
    let addr = state
        .get_x(rn)
        .wrapping_add((imm9 as i64 as u64).wrapping_mul(bytes as u64));

    let src = *state.p_bytes(pt);
    mem.write_bytes(addr, &src[..bytes])
        .map_err(|source| SimError::Data { pc: state.pc, source })?;
    Ok(Step::Continue)
}
