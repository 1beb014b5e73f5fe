// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! T32 (Thumb) encoder for the 16-bit data-processing subset.
//!
//! The assembler is stateful: an IT instruction opens a block whose condition
//! must be matched, in order, by the following data-processing instructions.
//! A conditional instruction outside an IT block, a mismatched condition, or
//! a high register are all encode-time errors -- the 16-bit encodings can
//! only name r0-r7 and carry no condition field of their own.

use svarm_core::{Condition, Gp};

use crate::buffer::CodeBuffer;
use crate::error::EncodeError;

/// T32 assembler over a little-endian halfword buffer.
#[derive(Debug, Default)]
pub struct T32Assembler {
    buf: CodeBuffer,
    /// Conditions still owed to instructions of an open IT block, in order.
    pending: Vec<Condition>,
}

impl T32Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        self.buf.bytes()
    }

    pub fn in_it_block(&self) -> bool {
        !self.pending.is_empty()
    }

    fn open_it_block(&mut self, cond: Condition, mask: u16) -> Result<(), EncodeError> {
        if self.in_it_block() {
            return Err(EncodeError::ConditionContext("IT inside an open IT block"));
        }
        self.buf.emit16(0xBF00 | (cond.field() as u16) << 4 | mask);
        Ok(())
    }

    /// IT: one following conditional instruction.
    pub fn it(&mut self, cond: Condition) -> Result<(), EncodeError> {
        self.open_it_block(cond, 0b1000)?;
        self.pending.push(cond);
        Ok(())
    }

    /// ITT: two following instructions, both on `cond`.
    pub fn itt(&mut self, cond: Condition) -> Result<(), EncodeError> {
        let lsb = (cond.field() & 1) as u16;
        self.open_it_block(cond, (lsb << 3) | 0b100)?;
        self.pending.push(cond);
        self.pending.push(cond);
        Ok(())
    }

    /// ITE: a `cond` instruction followed by one on the inverse condition.
    pub fn ite(&mut self, cond: Condition) -> Result<(), EncodeError> {
        let inverse = Condition::from_field(cond.field() ^ 1)
            .ok_or(EncodeError::ConditionContext("AL has no inverse condition"))?;
        let lsb = (cond.field() & 1) as u16;
        self.open_it_block(cond, ((lsb ^ 1) << 3) | 0b100)?;
        self.pending.push(cond);
        self.pending.push(inverse);
        Ok(())
    }

    /// Check `cond` against the IT-block state and consume one slot.
    fn consume_condition(&mut self, cond: Condition) -> Result<(), EncodeError> {
        match self.pending.first() {
            Some(&expected) => {
                if cond != expected {
                    return Err(EncodeError::ConditionContext(
                        "condition does not match the open IT block",
                    ));
                }
                self.pending.remove(0);
                Ok(())
            }
            None if cond == Condition::Al => Ok(()),
            None => Err(EncodeError::ConditionContext(
                "conditional encoding requires an open IT block",
            )),
        }
    }

    fn data_proc(
        &mut self,
        op: u16,
        cond: Condition,
        rdn: Gp,
        rm: Gp,
    ) -> Result<(), EncodeError> {
        if !rdn.is_low() || !rm.is_low() {
            return Err(EncodeError::RegisterClass(
                "16-bit data processing only reaches r0-r7",
            ));
        }
        self.consume_condition(cond)?;
        self.buf.emit16(0x4000 | op << 6 | (rm.0 as u16) << 3 | rdn.0 as u16);
        Ok(())
    }

    pub fn and(&mut self, cond: Condition, rdn: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.data_proc(0b0000, cond, rdn, rm)
    }

    pub fn eor(&mut self, cond: Condition, rdn: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.data_proc(0b0001, cond, rdn, rm)
    }

    pub fn tst(&mut self, cond: Condition, rn: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.data_proc(0b1000, cond, rn, rm)
    }

    pub fn cmp(&mut self, cond: Condition, rn: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.data_proc(0b1010, cond, rn, rm)
    }

    pub fn cmn(&mut self, cond: Condition, rn: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.data_proc(0b1011, cond, rn, rm)
    }

    pub fn orr(&mut self, cond: Condition, rdn: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.data_proc(0b1100, cond, rdn, rm)
    }

    pub fn mul(&mut self, cond: Condition, rdm: Gp, rn: Gp) -> Result<(), EncodeError> {
        self.data_proc(0b1101, cond, rdm, rn)
    }

    pub fn bic(&mut self, cond: Condition, rdn: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.data_proc(0b1110, cond, rdn, rm)
    }

    pub fn mvn(&mut self, cond: Condition, rd: Gp, rm: Gp) -> Result<(), EncodeError> {
        self.data_proc(0b1111, cond, rd, rm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_it_cmn_reference_bytes() {
        let mut asm = T32Assembler::new();
        asm.it(Condition::Eq).unwrap();
        asm.cmn(Condition::Eq, Gp(0), Gp(0)).unwrap();
        assert_eq!(asm.bytes(), &[0x08, 0xBF, 0xC0, 0x42]);
        assert!(!asm.in_it_block());
    }

    #[test]
    fn test_unconditional_needs_no_it() {
        let mut asm = T32Assembler::new();
        asm.cmn(Condition::Al, Gp(1), Gp(4)).unwrap();
        assert_eq!(asm.bytes(), &[0xE1, 0x42]);
    }

    #[test]
    fn test_conditional_outside_it_block_rejected() {
        let mut asm = T32Assembler::new();
        assert_eq!(
            asm.cmn(Condition::Eq, Gp(0), Gp(0)),
            Err(EncodeError::ConditionContext(
                "conditional encoding requires an open IT block"
            ))
        );
        assert!(asm.bytes().is_empty());
    }

    #[test]
    fn test_condition_mismatch_rejected() {
        let mut asm = T32Assembler::new();
        asm.it(Condition::Eq).unwrap();
        assert!(asm.cmn(Condition::Ne, Gp(0), Gp(0)).is_err());
        // The slot is still owed; the matching condition succeeds.
        assert!(asm.cmn(Condition::Eq, Gp(0), Gp(0)).is_ok());
    }

    #[test]
    fn test_al_inside_it_block_rejected() {
        let mut asm = T32Assembler::new();
        asm.it(Condition::Eq).unwrap();
        assert!(asm.cmn(Condition::Al, Gp(0), Gp(0)).is_err());
    }

    #[test]
    fn test_high_register_rejected() {
        let mut asm = T32Assembler::new();
        assert!(asm.cmn(Condition::Al, Gp(8), Gp(0)).is_err());
        assert!(asm.cmn(Condition::Al, Gp(0), Gp(13)).is_err());
        assert!(asm.bytes().is_empty());
    }

    #[test]
    fn test_it_inside_it_block_rejected() {
        let mut asm = T32Assembler::new();
        asm.it(Condition::Eq).unwrap();
        assert!(asm.it(Condition::Ne).is_err());
    }

    #[test]
    fn test_itt_consumes_two_slots() {
        let mut asm = T32Assembler::new();
        asm.itt(Condition::Ne).unwrap();
        asm.tst(Condition::Ne, Gp(0), Gp(0)).unwrap();
        asm.tst(Condition::Ne, Gp(0), Gp(0)).unwrap();
        assert!(!asm.in_it_block());
        assert_eq!(asm.bytes()[..2], [0x1C, 0xBF]);
    }

    #[test]
    fn test_ite_inverts_second_slot() {
        let mut asm = T32Assembler::new();
        asm.ite(Condition::Eq).unwrap();
        asm.tst(Condition::Eq, Gp(0), Gp(0)).unwrap();
        asm.tst(Condition::Ne, Gp(0), Gp(0)).unwrap();
        assert_eq!(asm.bytes()[..2], [0x0C, 0xBF]);
    }

    #[test]
    fn test_ite_al_rejected() {
        let mut asm = T32Assembler::new();
        assert!(asm.ite(Condition::Al).is_err());
    }

    #[test]
    fn test_failed_encode_leaves_it_state() {
        let mut asm = T32Assembler::new();
        asm.it(Condition::Eq).unwrap();
        // High register: the error must not consume the IT slot.
        assert!(asm.cmn(Condition::Eq, Gp(9), Gp(0)).is_err());
        assert!(asm.in_it_block());
        assert!(asm.cmn(Condition::Eq, Gp(0), Gp(0)).is_ok());
    }
}
