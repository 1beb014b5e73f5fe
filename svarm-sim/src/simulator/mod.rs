// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Instruction-level execution engine.
//!
//! Fetch-decode-dispatch loop over [`ArchState`]: each decoded instruction is
//! routed to a handler implementing its architectural pseudocode. Decode
//! failures and handler precondition violations stop the run; silent wrong
//! execution is never an option for a correctness-validation tool.

pub mod arith;
pub mod compare;
pub mod counting;
pub mod mem;
pub mod permute;
pub mod predicate;
pub mod reduce;
pub mod scalar;

use svarm_core::{LaneSize, VectorLength};
use thiserror::Error;

use crate::decoder::{DecodeError, Instruction};
use crate::memory::{MemoryAccess, MemoryFault};
use crate::patterns;
use crate::state::ArchState;

/// Fatal simulation failure. The engine halts rather than guessing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    #[error("decode failed at pc {pc:#x}: {source}")]
    Decode {
        pc: u64,
        #[source]
        source: DecodeError,
    },
    #[error("unimplemented instruction at pc {pc:#x}")]
    Unimplemented { pc: u64 },
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
    #[error("instruction fetch failed at pc {pc:#x}: {source}")]
    Fetch {
        pc: u64,
        #[source]
        source: MemoryFault,
    },
    #[error("data access failed at pc {pc:#x}: {source}")]
    Data {
        pc: u64,
        #[source]
        source: MemoryFault,
    },
}

/// Reason a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The halt marker instruction was executed; carries its immediate.
    Explicit(u16),
    /// The configured instruction budget ran out.
    BudgetExhausted,
}

/// Result of one instruction.
#[derive(Debug)]
pub(crate) enum Step {
    Continue,
    Halt(u16),
}

/// Synchronous, single-threaded execution engine. One instance exclusively
/// owns the architectural state it runs against.
pub struct Simulator {
    /// Instructions remaining in this run; 0 means unlimited.
    budget: u64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self { budget: 0 }
    }

    /// Set the instruction budget for the next `run` call. 0 = unlimited.
    pub fn set_budget(&mut self, n: u64) {
        self.budget = n;
    }

    /// Execute a single decoded instruction.
    pub fn execute(
        &self,
        state: &mut ArchState,
        mem: &mut dyn MemoryAccess,
        inst: Instruction,
    ) -> Result<Step, SimError> {
        use Instruction::*;

        match inst {
            // -- Scalar ------------------------------------------------------
            Movz { sf, rd, imm16, hw } => scalar::exec_movz(state, sf, rd, imm16, hw),
            Movk { sf, rd, imm16, hw } => scalar::exec_movk(state, sf, rd, imm16, hw),
            Movn { sf, rd, imm16, hw } => scalar::exec_movn(state, sf, rd, imm16, hw),
            Nop => Ok(Step::Continue),
            Hlt { imm } => Ok(Step::Halt(imm)),

            // -- SVE integer arithmetic --------------------------------------
            BinPred { size, op, pg, zm, zdn } => {
                arith::exec_bin_pred(state, size, op, pg, zm, zdn)
            }
            ArithUnpred { size, op, zm, zn, zd } => {
                arith::exec_arith_unpred(state, size, op, zm, zn, zd)
            }
            LogicalUnpred { op, zm, zn, zd } => {
                arith::exec_logical_unpred(state, op, zm, zn, zd)
            }
            LogicalImm { op, imm, zdn } => arith::exec_logical_imm(state, op, imm, zdn),
            ArithImm { size, op, sh, imm8, zdn } => {
                arith::exec_arith_imm(state, size, op, sh, imm8, zdn)
            }
            MinMaxImm { size, op, imm8, zdn } => {
                arith::exec_minmax_imm(state, size, op, imm8, zdn)
            }
            MulImm { size, imm8, zdn } => arith::exec_mul_imm(state, size, imm8, zdn),
            Reduce { size, op, pg, zn, vd } => reduce::exec_reduce(state, size, op, pg, zn, vd),

            // -- SVE moves / permutes ----------------------------------------
            DupImm { size, sh, imm8, zd } => permute::exec_dup_imm(state, size, sh, imm8, zd),
            CpyImm { size, pg, merging, sh, imm8, zd } => {
                permute::exec_cpy_imm(state, size, pg, merging, sh, imm8, zd)
            }
            DupScalar { size, rn, zd } => permute::exec_dup_scalar(state, size, rn, zd),
            Insr { size, rm, zdn } => permute::exec_insr(state, size, rm, zdn),
            Tbl { size, zm, zn, zd } => permute::exec_tbl(state, size, zm, zn, zd),
            Sel { size, zm, pg, zn, zd } => permute::exec_sel(state, size, zm, pg, zn, zd),
            Movprfx { zn, zd } => permute::exec_movprfx(state, zn, zd),

            // -- SVE compares ------------------------------------------------
            CmpVec { size, op, zm, pg, zn, pd } => {
                compare::exec_cmp_vec(state, size, op, zm, pg, zn, pd)
            }
            Cterm { is64, ne, rm, rn } => compare::exec_cterm(state, is64, ne, rm, rn),

            // -- Predicate group ---------------------------------------------
            Ptrue { size, set_flags, pattern, pd } => {
                predicate::exec_ptrue(state, size, set_flags, pattern, pd)
            }
            Pfalse { pd } => predicate::exec_pfalse(state, pd),
            Ptest { pg, pn } => predicate::exec_ptest(state, pg, pn),
            Pfirst { pg, pdn } => predicate::exec_pfirst(state, pg, pdn),
            Pnext { size, pg, pdn } => predicate::exec_pnext(state, size, pg, pdn),
            PredLogical { op, set_flags, pm, pg, pn, pd } => {
                predicate::exec_pred_logical(state, op, set_flags, pm, pg, pn, pd)
            }

            // -- Counting ----------------------------------------------------
            Cntp { size, pg, pn, rd } => counting::exec_cntp(state, size, pg, pn, rd),
            IncDecP { size, dec, pm, rdn } => counting::exec_incdec_p(state, size, dec, pm, rdn),
            IncDecPVec { size, dec, pm, zdn } => {
                counting::exec_incdec_p_vec(state, size, dec, pm, zdn)
            }
            SatIncDecP { size, dec, unsigned, fx32, pm, rdn } => {
                counting::exec_sat_incdec_p(state, size, dec, unsigned, fx32, pm, rdn)
            }
            SatIncDecPVec { size, dec, unsigned, pm, zdn } => {
                counting::exec_sat_incdec_p_vec(state, size, dec, unsigned, pm, zdn)
            }
            CntElem { size, mul, pattern, rd } => {
                counting::exec_cnt_elem(state, size, mul, pattern, rd)
            }
            IncDecElem { size, dec, mul, pattern, rdn } => {
                counting::exec_incdec_elem(state, size, dec, mul, pattern, rdn)
            }
            Rdvl { imm, rd } => counting::exec_rdvl(state, imm, rd),

            // -- Memory ------------------------------------------------------
            LdrZ { imm9, rn, zt } => mem::exec_ldr_z(state, mem, imm9, rn, zt),
            StrZ { imm9, rn, zt } => mem::exec_str_z(state, mem, imm9, rn, zt),
            LdrP { imm9, rn, pt } => mem::exec_ldr_p(state, mem, imm9, rn, pt),
            StrP { imm9, rn, pt } => mem::exec_str_p(state, mem, imm9, rn, pt),
        }
    }

    /// Run until the halt marker, a fatal error, or budget exhaustion.
    pub fn run(
        &mut self,
        state: &mut ArchState,
        mem: &mut dyn MemoryAccess,
    ) -> Result<Halt, SimError> {
        let mut remaining = self.budget;

        loop {
            if self.budget > 0 {
                if remaining == 0 {
                    return Ok(Halt::BudgetExhausted);
                }
                remaining -= 1;
            }

            // Fetch
            let pc = state.pc;
            let raw = mem.read_u32(pc).map_err(|source| SimError::Fetch { pc, source })?;

            // Decode
            let inst = match patterns::decode(raw) {
                Ok(inst) => inst,
                Err(source) => {
                    log::warn!("decode failed at pc={pc:#x}: word {raw:#010x}: {source}");
                    return Err(SimError::Decode { pc, source });
                }
            };

            // Execute
            match self.execute(state, mem, inst)? {
                Step::Continue => state.pc = pc.wrapping_add(4),
                Step::Halt(imm) => {
                    state.pc = pc.wrapping_add(4);
                    return Ok(Halt::Explicit(imm));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared lane helpers
// ---------------------------------------------------------------------------

/// Vector length, or the illegal-state error every SVE handler reports when
/// it was never configured.
#[inline]
pub(crate) fn require_vl(state: &ArchState) -> Result<VectorLength, SimError> {
    state
        .vector_length()
        .ok_or(SimError::IllegalState("vector length not configured"))
}

/// Mask a value to the lane width.
#[inline]
pub(crate) fn mask_lane(val: u64, size: LaneSize) -> u64 {
    if size == LaneSize::D {
        val
    } else {
        val & ((1u64 << size.bits()) - 1)
    }
}

/// Sign-extend a lane value to i64.
#[inline]
pub(crate) fn sign_extend_lane(val: u64, size: LaneSize) -> i64 {
    let shift = 64 - size.bits();
    ((val as i64) << shift) >> shift
}

/// Clamp to the signed range of the lane width, then mask.
#[inline]
pub(crate) fn sat_signed(val: i128, size: LaneSize) -> u64 {
    let max = (1i128 << (size.bits() - 1)) - 1;
    let min = -(1i128 << (size.bits() - 1));
    mask_lane(val.clamp(min, max) as u64, size)
}

/// Clamp to the unsigned range of the lane width.
#[inline]
pub(crate) fn sat_unsigned(val: i128, size: LaneSize) -> u64 {
    let max = if size == LaneSize::D {
        u64::MAX as i128
    } else {
        (1i128 << size.bits()) - 1
    };
    val.clamp(0, max) as u64
}
