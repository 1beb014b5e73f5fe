// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! MacroAssembler: encoding selection on top of the raw encoder.
//!
//! Callers name any (zd, zn, zm) alias combination and any immediate value;
//! the macro layer picks a destructive form, swaps commutative operands,
//! switches to the architectural reverse form, or synthesizes through a
//! scratch register so the architectural result is always the one asked for.
//! Every fallback is value-equivalent; only the instruction count differs.
//!
//! Scratch registers (x16/x17, z30/z31, p7) are a bounded, caller-invisible
//! pool. Each claim is scoped to one expansion and returned even when the
//! expansion fails, and a failed expansion leaves no partial bytes behind.

use svarm_core::{Gp, LaneSize, PReg, ZReg};

use crate::error::EncodeError;
use crate::sve::{pattern, Assembler};

/// Emitter signature of a destructive predicated binary op.
type BinEmit = fn(&mut Assembler, LaneSize, ZReg, PReg, ZReg) -> Result<(), EncodeError>;

/// Which encoding shape satisfies the caller's operand aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AliasForm {
    /// `zd` aliases `zn`: the destructive form applies directly.
    Destructive,
    /// `zd` aliases `zm`: commutative operand swap.
    Swapped,
    /// `zd` aliases `zm`: architectural reverse form.
    Reverse,
    /// No alias: prefix with a move, then the destructive form.
    Prefixed,
    /// `zd` aliases `zm` and neither swap nor reverse exists: copy `zm`
    /// aside first.
    ScratchCopy,
}

/// Pure aliasing analysis; the operand identities are all known at emission
/// time.
fn select_alias_form(
    zd: ZReg,
    zn: ZReg,
    zm: ZReg,
    commutative: bool,
    has_reverse: bool,
) -> AliasForm {
    if zd == zn {
        AliasForm::Destructive
    } else if zd == zm {
        if commutative {
            AliasForm::Swapped
        } else if has_reverse {
            AliasForm::Reverse
        } else {
            AliasForm::ScratchCopy
        }
    } else {
        AliasForm::Prefixed
    }
}

pub struct MacroAssembler {
    asm: Assembler,
    gp_scratch: Vec<u8>,
    z_scratch: Vec<u8>,
    p_scratch: Vec<u8>,
}

impl Default for MacroAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroAssembler {
    pub fn new() -> Self {
        Self {
            asm: Assembler::new(),
            // Claimed from the back: x16, z31, p7 first.
            gp_scratch: vec![17, 16],
            z_scratch: vec![30, 31],
            p_scratch: vec![7],
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.asm.bytes()
    }

    /// The raw encoder, for instructions that need no macro treatment.
    pub fn raw(&mut self) -> &mut Assembler {
        &mut self.asm
    }

    // -- Scratch and rewind discipline ---------------------------------------

    /// Run an expansion, discarding any partially emitted bytes on failure.
    fn attempt<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, EncodeError>,
    ) -> Result<R, EncodeError> {
        let mark = self.asm.mark();
        let result = f(self);
        if result.is_err() {
            self.asm.rewind_to(mark);
        }
        result
    }

    fn with_gp_scratch<R>(
        &mut self,
        f: impl FnOnce(&mut Self, Gp) -> Result<R, EncodeError>,
    ) -> Result<R, EncodeError> {
        let reg = self.gp_scratch.pop().ok_or(EncodeError::ScratchExhausted)?;
        let result = f(self, Gp(reg));
        self.gp_scratch.push(reg);
        result
    }

    fn with_z_scratch<R>(
        &mut self,
        f: impl FnOnce(&mut Self, ZReg) -> Result<R, EncodeError>,
    ) -> Result<R, EncodeError> {
        let reg = self.z_scratch.pop().ok_or(EncodeError::ScratchExhausted)?;
        let result = f(self, ZReg(reg));
        self.z_scratch.push(reg);
        result
    }

    fn with_p_scratch<R>(
        &mut self,
        f: impl FnOnce(&mut Self, PReg) -> Result<R, EncodeError>,
    ) -> Result<R, EncodeError> {
        let reg = self.p_scratch.pop().ok_or(EncodeError::ScratchExhausted)?;
        let result = f(self, PReg(reg));
        self.p_scratch.push(reg);
        result
    }

    // -- Predicated binary ops, any aliasing ---------------------------------

    fn bin_pred(
        &mut self,
        size: LaneSize,
        zd: ZReg,
        pg: PReg,
        zn: ZReg,
        zm: ZReg,
        name: &'static str,
        commutative: bool,
        emit: BinEmit,
        emit_rev: Option<BinEmit>,
    ) -> Result<(), EncodeError> {
        let form = select_alias_form(zd, zn, zm, commutative, emit_rev.is_some());
        log::trace!("{name} zd=z{} zn=z{} zm=z{}: {form:?}", zd.0, zn.0, zm.0);
        self.attempt(|m| match form {
            AliasForm::Destructive => emit(&mut m.asm, size, zd, pg, zm),
            AliasForm::Swapped => emit(&mut m.asm, size, zd, pg, zn),
            AliasForm::Reverse => {
                // Checked by select_alias_form.
                let rev = emit_rev.ok_or(EncodeError::RegisterClass("no reverse form"))?;
                rev(&mut m.asm, size, zd, pg, zn)
            }
            AliasForm::Prefixed => {
                m.asm.movprfx(zd, zn)?;
                emit(&mut m.asm, size, zd, pg, zm)
            }
            AliasForm::ScratchCopy => m.with_z_scratch(|m, tmp| {
                m.asm.mov_z(tmp, zm)?;
                m.asm.movprfx(zd, zn)?;
                emit(&mut m.asm, size, zd, pg, tmp)
            }),
        })
    }

    pub fn add(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "add", true, Assembler::add, None)
    }

    pub fn sub(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "sub", false, Assembler::sub, Some(Assembler::subr))
    }

    pub fn mul(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "mul", true, Assembler::mul, None)
    }

    pub fn smulh(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "smulh", true, Assembler::smulh, None)
    }

    pub fn umulh(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "umulh", true, Assembler::umulh, None)
    }

    pub fn sdiv(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "sdiv", false, Assembler::sdiv, Some(Assembler::sdivr))
    }

    pub fn udiv(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "udiv", false, Assembler::udiv, Some(Assembler::udivr))
    }

    pub fn smax(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "smax", true, Assembler::smax, None)
    }

    pub fn umax(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "umax", true, Assembler::umax, None)
    }

    pub fn smin(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "smin", true, Assembler::smin, None)
    }

    pub fn umin(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "umin", true, Assembler::umin, None)
    }

    pub fn sabd(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "sabd", true, Assembler::sabd, None)
    }

    pub fn uabd(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "uabd", true, Assembler::uabd, None)
    }

    pub fn orr(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "orr", true, Assembler::orr, None)
    }

    pub fn eor(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "eor", true, Assembler::eor, None)
    }

    pub fn and(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "and", true, Assembler::and, None)
    }

    /// BIC neither commutes nor has a reverse form; the `zd == zm` case goes
    /// through a scratch copy.
    pub fn bic(&mut self, size: LaneSize, zd: ZReg, pg: PReg, zn: ZReg, zm: ZReg) -> Result<(), EncodeError> {
        self.bin_pred(size, zd, pg, zn, zm, "bic", false, Assembler::bic, None)
    }

    // -- Immediate materialization -------------------------------------------

    /// Load an arbitrary 64-bit constant into a general register with the
    /// shortest MOVZ/MOVN/MOVK sequence.
    pub fn mov_imm(&mut self, rd: Gp, imm: u64) -> Result<(), EncodeError> {
        self.attempt(|m| {
            let halves = [
                (imm & 0xFFFF) as u16,
                ((imm >> 16) & 0xFFFF) as u16,
                ((imm >> 32) & 0xFFFF) as u16,
                ((imm >> 48) & 0xFFFF) as u16,
            ];
            let ones = halves.iter().filter(|&&h| h == 0xFFFF).count();
            let zeros = halves.iter().filter(|&&h| h == 0).count();

            if ones > zeros {
                // MOVN seed: start from all-ones.
                let first = halves.iter().position(|&h| h != 0xFFFF).unwrap_or(0);
                m.asm.movn(true, rd, !halves[first], first as u8)?;
                for (i, &h) in halves.iter().enumerate().skip(first + 1) {
                    if h != 0xFFFF {
                        m.asm.movk(true, rd, h, i as u8)?;
                    }
                }
            } else {
                let first = halves.iter().position(|&h| h != 0).unwrap_or(0);
                m.asm.movz(true, rd, halves[first], first as u8)?;
                for (i, &h) in halves.iter().enumerate().skip(first + 1) {
                    if h != 0 {
                        m.asm.movk(true, rd, h, i as u8)?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Broadcast a lane-width constant to every lane of `zd`.
    ///
    /// Tries the DUP immediate field at shift 0 and shift 8, then
    /// materializes through a general scratch register.
    pub fn mov_z_imm(&mut self, size: LaneSize, zd: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.attempt(|m| {
            if let Some((imm8, sh)) = encode_dup_imm(size, imm) {
                log::trace!("mov_z_imm {imm:#x}: dup #{imm8}, sh={sh}");
                return m.asm.dup_imm(size, zd, imm8, sh);
            }
            log::trace!("mov_z_imm {imm:#x}: materialize via scratch");
            m.with_gp_scratch(|m, tmp| {
                m.mov_imm(tmp, imm)?;
                m.asm.dup_scalar(size, zd, tmp)
            })
        })
    }

    // -- Arithmetic with arbitrary immediates --------------------------------

    /// `zd = zn + imm` over all lanes, by whichever encoding reaches `imm`:
    /// the ADD immediate field at shift 0 or 8, SUB of the negated value, or
    /// synthesis through a scratch vector and the register form.
    pub fn add_imm(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.arith_imm_chain(
            size, zd, zn, imm, "add",
            Assembler::add_imm, Assembler::sub_imm, Assembler::add_unpred,
        )
    }

    /// `zd = zn - imm`, with ADD of the negated value as the second try.
    pub fn sub_imm(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.arith_imm_chain(
            size, zd, zn, imm, "sub",
            Assembler::sub_imm, Assembler::add_imm, Assembler::sub_unpred,
        )
    }

    fn arith_imm_chain(
        &mut self,
        size: LaneSize,
        zd: ZReg,
        zn: ZReg,
        imm: u64,
        name: &'static str,
        direct: fn(&mut Assembler, LaneSize, ZReg, u8, bool) -> Result<(), EncodeError>,
        negated: fn(&mut Assembler, LaneSize, ZReg, u8, bool) -> Result<(), EncodeError>,
        register: fn(&mut Assembler, LaneSize, ZReg, ZReg, ZReg) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        self.attempt(|m| {
            if let Some((imm8, sh)) = encode_wide_imm(size, imm) {
                log::trace!("{name}_imm {imm:#x}: direct #{imm8}, sh={sh}");
                m.prefix_unless_aliased(zd, zn)?;
                return direct(&mut m.asm, size, zd, imm8, sh);
            }
            let neg = imm.wrapping_neg() & lane_mask(size);
            if let Some((imm8, sh)) = encode_wide_imm(size, neg) {
                log::trace!("{name}_imm {imm:#x}: negated #{imm8}, sh={sh}");
                m.prefix_unless_aliased(zd, zn)?;
                return negated(&mut m.asm, size, zd, imm8, sh);
            }
            log::trace!("{name}_imm {imm:#x}: synthesized register form");
            m.with_z_scratch(|m, tmp| {
                m.mov_z_imm(size, tmp, imm)?;
                register(&mut m.asm, size, zd, zn, tmp)
            })
        })
    }

    /// Saturating immediate forms. Negation is not value-equivalent under
    /// saturation, so the chain is only the direct field then the register
    /// form.
    pub fn sqadd_imm(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.sat_imm_chain(size, zd, zn, imm, "sqadd", Assembler::sqadd_imm, Assembler::sqadd)
    }

    pub fn uqadd_imm(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.sat_imm_chain(size, zd, zn, imm, "uqadd", Assembler::uqadd_imm, Assembler::uqadd)
    }

    pub fn sqsub_imm(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.sat_imm_chain(size, zd, zn, imm, "sqsub", Assembler::sqsub_imm, Assembler::sqsub)
    }

    pub fn uqsub_imm(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.sat_imm_chain(size, zd, zn, imm, "uqsub", Assembler::uqsub_imm, Assembler::uqsub)
    }

    fn sat_imm_chain(
        &mut self,
        size: LaneSize,
        zd: ZReg,
        zn: ZReg,
        imm: u64,
        name: &'static str,
        direct: fn(&mut Assembler, LaneSize, ZReg, u8, bool) -> Result<(), EncodeError>,
        register: fn(&mut Assembler, LaneSize, ZReg, ZReg, ZReg) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        self.attempt(|m| {
            if let Some((imm8, sh)) = encode_wide_imm(size, imm) {
                log::trace!("{name}_imm {imm:#x}: direct #{imm8}, sh={sh}");
                m.prefix_unless_aliased(zd, zn)?;
                return direct(&mut m.asm, size, zd, imm8, sh);
            }
            log::trace!("{name}_imm {imm:#x}: synthesized register form");
            m.with_z_scratch(|m, tmp| {
                m.mov_z_imm(size, tmp, imm)?;
                register(&mut m.asm, size, zd, zn, tmp)
            })
        })
    }

    // -- Logical with arbitrary immediates -----------------------------------

    pub fn and_imm(&mut self, zd: ZReg, zn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.logical_imm_chain(zd, zn, imm, "and", Assembler::and_imm, Assembler::and_unpred)
    }

    pub fn orr_imm(&mut self, zd: ZReg, zn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.logical_imm_chain(zd, zn, imm, "orr", Assembler::orr_imm, Assembler::orr_unpred)
    }

    pub fn eor_imm(&mut self, zd: ZReg, zn: ZReg, imm: u64) -> Result<(), EncodeError> {
        self.logical_imm_chain(zd, zn, imm, "eor", Assembler::eor_imm, Assembler::eor_unpred)
    }

    fn logical_imm_chain(
        &mut self,
        zd: ZReg,
        zn: ZReg,
        imm: u64,
        name: &'static str,
        direct: fn(&mut Assembler, ZReg, u64) -> Result<(), EncodeError>,
        register: fn(&mut Assembler, ZReg, ZReg, ZReg) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        self.attempt(|m| {
            let mark = m.asm.mark();
            m.prefix_unless_aliased(zd, zn)?;
            match direct(&mut m.asm, zd, imm) {
                Ok(()) => return Ok(()),
                Err(EncodeError::ImmediateRange { .. }) => m.asm.rewind_to(mark),
                Err(e) => return Err(e),
            }
            log::trace!("{name}_imm {imm:#x}: synthesized register form");
            m.with_z_scratch(|m, tmp| {
                m.mov_z_imm(LaneSize::D, tmp, imm)?;
                register(&mut m.asm, zd, zn, tmp)
            })
        })
    }

    // -- Unpredicated min/max/mul with immediates ----------------------------

    /// `zd = max(zn, imm)` over all lanes (signed). The immediate field only
    /// holds -128..=127; anything else goes through a scratch vector and an
    /// all-true scratch predicate.
    pub fn smax_imm(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, imm: i64) -> Result<(), EncodeError> {
        self.attempt(|m| {
            if let Ok(imm8) = i8::try_from(imm) {
                m.prefix_unless_aliased(zd, zn)?;
                return m.asm.smax_imm(size, zd, imm8);
            }
            m.with_z_scratch(|m, tmp| {
                m.mov_z_imm(size, tmp, imm as u64 & lane_mask(size))?;
                m.with_p_scratch(|m, pg| {
                    m.asm.ptrue(size, pg, pattern::ALL)?;
                    m.prefix_unless_aliased(zd, zn)?;
                    m.asm.smax(size, zd, pg, tmp)
                })
            })
        })
    }

    pub fn smin_imm(&mut self, size: LaneSize, zd: ZReg, zn: ZReg, imm: i64) -> Result<(), EncodeError> {
        self.attempt(|m| {
            if let Ok(imm8) = i8::try_from(imm) {
                m.prefix_unless_aliased(zd, zn)?;
                return m.asm.smin_imm(size, zd, imm8);
            }
            m.with_z_scratch(|m, tmp| {
                m.mov_z_imm(size, tmp, imm as u64 & lane_mask(size))?;
                m.with_p_scratch(|m, pg| {
                    m.asm.ptrue(size, pg, pattern::ALL)?;
                    m.prefix_unless_aliased(zd, zn)?;
                    m.asm.smin(size, zd, pg, tmp)
                })
            })
        })
    }

    // -- Helpers -------------------------------------------------------------

    fn prefix_unless_aliased(&mut self, zd: ZReg, zn: ZReg) -> Result<(), EncodeError> {
        if zd == zn {
            Ok(())
        } else {
            self.asm.movprfx(zd, zn)
        }
    }
}

/// Mask of a lane's value bits.
fn lane_mask(size: LaneSize) -> u64 {
    if size == LaneSize::D {
        u64::MAX
    } else {
        (1u64 << size.bits()) - 1
    }
}

/// Fit `imm` into the unsigned 8-bit wide-immediate field, at shift 0 or 8.
fn encode_wide_imm(size: LaneSize, imm: u64) -> Option<(u8, bool)> {
    let masked = imm & lane_mask(size);
    if masked != imm {
        return None;
    }
    if masked <= 0xFF {
        return Some((masked as u8, false));
    }
    if size != LaneSize::B && masked & 0xFF == 0 && masked >> 8 <= 0xFF {
        return Some(((masked >> 8) as u8, true));
    }
    None
}

/// Fit `imm` into the signed 8-bit DUP field, at shift 0 or 8.
fn encode_dup_imm(size: LaneSize, imm: u64) -> Option<(i8, bool)> {
    let mask = lane_mask(size);
    let masked = imm & mask;
    if masked != imm {
        return None;
    }
    for (sh, shift) in [(false, 0u32), (true, 8u32)] {
        if sh && size == LaneSize::B {
            break;
        }
        for candidate in i8::MIN..=i8::MAX {
            let expanded = ((candidate as i64) << shift) as u64 & mask;
            if expanded == masked {
                return Some((candidate, sh));
            }
        }
    }
    None
}
