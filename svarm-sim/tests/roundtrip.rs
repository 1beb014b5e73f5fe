// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Round-trip law: decoding any word the encoder produces reconstructs the
//! encoder's inputs bit-exactly, across the whole instruction inventory.

use svarm_asm::sve::pattern;
use svarm_asm::{Assembler, EncodeError, T32Assembler};
use svarm_core::{Condition, Gp, LaneSize, PReg, Predication, ZReg};
use svarm_sim::decode;
use svarm_sim::decoder::{
    BinOp, BitwiseOp, CmpOp, ImmArithOp, Instruction, MinMaxImmOp, PredOp, ReduceOp,
    UnpredArithOp,
};
use svarm_sim::thumb::{ThumbDecoder, ThumbInstruction, ThumbOp};

const ALL_SIZES: [LaneSize; 4] = [LaneSize::B, LaneSize::H, LaneSize::S, LaneSize::D];

fn encode_one(f: impl FnOnce(&mut Assembler) -> Result<(), EncodeError>) -> u32 {
    let mut asm = Assembler::new();
    f(&mut asm).unwrap();
    assert_eq!(asm.len(), 4, "expected exactly one word");
    u32::from_le_bytes(asm.bytes().try_into().unwrap())
}

fn roundtrip(f: impl FnOnce(&mut Assembler) -> Result<(), EncodeError>) -> Instruction {
    let raw = encode_one(f);
    decode(raw).unwrap_or_else(|e| panic!("decode of {raw:#010x} failed: {e}"))
}

#[test]
fn test_scalar_moves() {
    for sf in [false, true] {
        assert_eq!(
            roundtrip(|a| a.movz(sf, Gp(3), 0xBEEF, 0)),
            Instruction::Movz { sf, rd: 3, imm16: 0xBEEF, hw: 0 }
        );
        assert_eq!(
            roundtrip(|a| a.movn(sf, Gp(30), 1, 1)),
            Instruction::Movn { sf, rd: 30, imm16: 1, hw: 1 }
        );
    }
    assert_eq!(
        roundtrip(|a| a.movk(true, Gp(0), 0x1234, 3)),
        Instruction::Movk { sf: true, rd: 0, imm16: 0x1234, hw: 3 }
    );
    assert_eq!(
        roundtrip(|a| {
            a.nop();
            Ok(())
        }),
        Instruction::Nop
    );
    assert_eq!(
        roundtrip(|a| {
            a.hlt(7);
            Ok(())
        }),
        Instruction::Hlt { imm: 7 }
    );
}

type BinEmit = fn(&mut Assembler, LaneSize, ZReg, PReg, ZReg) -> Result<(), EncodeError>;

#[test]
fn test_binary_predicated() {
    let cases: &[(BinEmit, BinOp)] = &[
        (Assembler::add, BinOp::Add),
        (Assembler::sub, BinOp::Sub),
        (Assembler::subr, BinOp::Subr),
        (Assembler::smax, BinOp::Smax),
        (Assembler::umax, BinOp::Umax),
        (Assembler::smin, BinOp::Smin),
        (Assembler::umin, BinOp::Umin),
        (Assembler::sabd, BinOp::Sabd),
        (Assembler::uabd, BinOp::Uabd),
        (Assembler::mul, BinOp::Mul),
        (Assembler::smulh, BinOp::Smulh),
        (Assembler::umulh, BinOp::Umulh),
        (Assembler::orr, BinOp::Orr),
        (Assembler::eor, BinOp::Eor),
        (Assembler::and, BinOp::And),
        (Assembler::bic, BinOp::Bic),
    ];
    for &(emit, op) in cases {
        for size in ALL_SIZES {
            assert_eq!(
                roundtrip(|a| emit(a, size, ZReg(3), PReg(2), ZReg(5))),
                Instruction::BinPred { size, op, pg: 2, zm: 5, zdn: 3 },
                "{op:?} {size:?}"
            );
        }
    }

    let divides: &[(BinEmit, BinOp)] = &[
        (Assembler::sdiv, BinOp::Sdiv),
        (Assembler::udiv, BinOp::Udiv),
        (Assembler::sdivr, BinOp::Sdivr),
        (Assembler::udivr, BinOp::Udivr),
    ];
    for &(emit, op) in divides {
        for size in [LaneSize::S, LaneSize::D] {
            assert_eq!(
                roundtrip(|a| emit(a, size, ZReg(0), PReg(7), ZReg(31))),
                Instruction::BinPred { size, op, pg: 7, zm: 31, zdn: 0 },
            );
        }
    }
}

#[test]
fn test_reductions() {
    let cases: &[(BinEmit, ReduceOp)] = &[
        (Assembler::uaddv, ReduceOp::Uaddv),
        (Assembler::smaxv, ReduceOp::Smaxv),
        (Assembler::umaxv, ReduceOp::Umaxv),
        (Assembler::sminv, ReduceOp::Sminv),
        (Assembler::uminv, ReduceOp::Uminv),
        (Assembler::orv, ReduceOp::Orv),
        (Assembler::eorv, ReduceOp::Eorv),
        (Assembler::andv, ReduceOp::Andv),
    ];
    for &(emit, op) in cases {
        for size in ALL_SIZES {
            assert_eq!(
                roundtrip(|a| emit(a, size, ZReg(1), PReg(3), ZReg(7))),
                Instruction::Reduce { size, op, pg: 3, zn: 7, vd: 1 },
            );
        }
    }
    for size in [LaneSize::B, LaneSize::H, LaneSize::S] {
        assert_eq!(
            roundtrip(|a| a.saddv(size, ZReg(1), PReg(3), ZReg(7))),
            Instruction::Reduce { size, op: ReduceOp::Saddv, pg: 3, zn: 7, vd: 1 },
        );
    }
}

#[test]
fn test_unpredicated_arithmetic() {
    type Emit = fn(&mut Assembler, LaneSize, ZReg, ZReg, ZReg) -> Result<(), EncodeError>;
    let cases: &[(Emit, UnpredArithOp)] = &[
        (Assembler::add_unpred, UnpredArithOp::Add),
        (Assembler::sub_unpred, UnpredArithOp::Sub),
        (Assembler::sqadd, UnpredArithOp::Sqadd),
        (Assembler::uqadd, UnpredArithOp::Uqadd),
        (Assembler::sqsub, UnpredArithOp::Sqsub),
        (Assembler::uqsub, UnpredArithOp::Uqsub),
    ];
    for &(emit, op) in cases {
        for size in ALL_SIZES {
            assert_eq!(
                roundtrip(|a| emit(a, size, ZReg(2), ZReg(4), ZReg(6))),
                Instruction::ArithUnpred { size, op, zm: 6, zn: 4, zd: 2 },
            );
        }
    }
}

#[test]
fn test_unpredicated_logical() {
    type Emit = fn(&mut Assembler, ZReg, ZReg, ZReg) -> Result<(), EncodeError>;
    let cases: &[(Emit, BitwiseOp)] = &[
        (Assembler::and_unpred, BitwiseOp::And),
        (Assembler::orr_unpred, BitwiseOp::Orr),
        (Assembler::eor_unpred, BitwiseOp::Eor),
        (Assembler::bic_unpred, BitwiseOp::Bic),
    ];
    for &(emit, op) in cases {
        assert_eq!(
            roundtrip(|a| emit(a, ZReg(10), ZReg(20), ZReg(30))),
            Instruction::LogicalUnpred { op, zm: 30, zn: 20, zd: 10 },
        );
    }
}

#[test]
fn test_logical_immediates() {
    type Emit = fn(&mut Assembler, ZReg, u64) -> Result<(), EncodeError>;
    let cases: &[(Emit, BitwiseOp)] = &[
        (Assembler::orr_imm, BitwiseOp::Orr),
        (Assembler::eor_imm, BitwiseOp::Eor),
        (Assembler::and_imm, BitwiseOp::And),
    ];
    let values = [
        0x5555_5555_5555_5555u64,
        0x00FF_00FF_00FF_00FFu64,
        0x0000_0001_0000_0001u64,
        0xFFFF_FFFE_FFFF_FFFEu64,
        0x7FFF_FFFF_FFFF_FFFFu64,
    ];
    for &(emit, op) in cases {
        for imm in values {
            assert_eq!(
                roundtrip(|a| emit(a, ZReg(9), imm)),
                Instruction::LogicalImm { op, imm, zdn: 9 },
                "{op:?} {imm:#x}"
            );
        }
    }
}

#[test]
fn test_wide_immediates() {
    type Emit = fn(&mut Assembler, LaneSize, ZReg, u8, bool) -> Result<(), EncodeError>;
    let cases: &[(Emit, ImmArithOp)] = &[
        (Assembler::add_imm, ImmArithOp::Add),
        (Assembler::sub_imm, ImmArithOp::Sub),
        (Assembler::subr_imm, ImmArithOp::Subr),
        (Assembler::sqadd_imm, ImmArithOp::Sqadd),
        (Assembler::uqadd_imm, ImmArithOp::Uqadd),
        (Assembler::sqsub_imm, ImmArithOp::Sqsub),
        (Assembler::uqsub_imm, ImmArithOp::Uqsub),
    ];
    for &(emit, op) in cases {
        for size in ALL_SIZES {
            assert_eq!(
                roundtrip(|a| emit(a, size, ZReg(11), 0xAB, false)),
                Instruction::ArithImm { size, op, sh: false, imm8: 0xAB, zdn: 11 },
            );
        }
        assert_eq!(
            roundtrip(|a| emit(a, LaneSize::S, ZReg(0), 1, true)),
            Instruction::ArithImm { size: LaneSize::S, op, sh: true, imm8: 1, zdn: 0 },
        );
    }

    assert_eq!(
        roundtrip(|a| a.smax_imm(LaneSize::H, ZReg(4), -5)),
        Instruction::MinMaxImm { size: LaneSize::H, op: MinMaxImmOp::Smax, imm8: 0xFB, zdn: 4 }
    );
    assert_eq!(
        roundtrip(|a| a.umax_imm(LaneSize::B, ZReg(4), 200)),
        Instruction::MinMaxImm { size: LaneSize::B, op: MinMaxImmOp::Umax, imm8: 200, zdn: 4 }
    );
    assert_eq!(
        roundtrip(|a| a.smin_imm(LaneSize::D, ZReg(4), 127)),
        Instruction::MinMaxImm { size: LaneSize::D, op: MinMaxImmOp::Smin, imm8: 127, zdn: 4 }
    );
    assert_eq!(
        roundtrip(|a| a.umin_imm(LaneSize::S, ZReg(4), 0)),
        Instruction::MinMaxImm { size: LaneSize::S, op: MinMaxImmOp::Umin, imm8: 0, zdn: 4 }
    );
    assert_eq!(
        roundtrip(|a| a.mul_imm(LaneSize::S, ZReg(8), -3)),
        Instruction::MulImm { size: LaneSize::S, imm8: 0xFD, zdn: 8 }
    );
}

#[test]
fn test_moves_and_permutes() {
    assert_eq!(
        roundtrip(|a| a.dup_imm(LaneSize::H, ZReg(0), -42, false)),
        Instruction::DupImm { size: LaneSize::H, sh: false, imm8: 0xD6, zd: 0 }
    );
    assert_eq!(
        roundtrip(|a| a.dup_imm(LaneSize::S, ZReg(31), 0x12, true)),
        Instruction::DupImm { size: LaneSize::S, sh: true, imm8: 0x12, zd: 31 }
    );
    for (pred, merging) in [(Predication::Zeroing, false), (Predication::Merging, true)] {
        assert_eq!(
            roundtrip(|a| a.cpy_imm(LaneSize::B, ZReg(5), PReg(15), pred, 5, false)),
            Instruction::CpyImm {
                size: LaneSize::B,
                pg: 15,
                merging,
                sh: false,
                imm8: 5,
                zd: 5,
            }
        );
    }
    for size in ALL_SIZES {
        assert_eq!(
            roundtrip(|a| a.dup_scalar(size, ZReg(1), Gp(30))),
            Instruction::DupScalar { size, rn: 30, zd: 1 }
        );
        assert_eq!(
            roundtrip(|a| a.insr(size, ZReg(2), Gp(0))),
            Instruction::Insr { size, rm: 0, zdn: 2 }
        );
        assert_eq!(
            roundtrip(|a| a.tbl(size, ZReg(0), ZReg(1), ZReg(2))),
            Instruction::Tbl { size, zm: 2, zn: 1, zd: 0 }
        );
        assert_eq!(
            roundtrip(|a| a.sel(size, ZReg(3), PReg(9), ZReg(4), ZReg(5))),
            Instruction::Sel { size, zm: 5, pg: 9, zn: 4, zd: 3 }
        );
    }
    assert_eq!(
        roundtrip(|a| a.movprfx(ZReg(1), ZReg(2))),
        Instruction::Movprfx { zn: 2, zd: 1 }
    );
}

#[test]
fn test_compares() {
    type Emit = fn(&mut Assembler, LaneSize, PReg, PReg, ZReg, ZReg) -> Result<(), EncodeError>;
    let cases: &[(Emit, CmpOp)] = &[
        (Assembler::cmpeq, CmpOp::Eq),
        (Assembler::cmpne, CmpOp::Ne),
        (Assembler::cmpge, CmpOp::Ge),
        (Assembler::cmpgt, CmpOp::Gt),
        (Assembler::cmphs, CmpOp::Hs),
        (Assembler::cmphi, CmpOp::Hi),
    ];
    for &(emit, op) in cases {
        for size in ALL_SIZES {
            assert_eq!(
                roundtrip(|a| emit(a, size, PReg(14), PReg(6), ZReg(7), ZReg(8))),
                Instruction::CmpVec { size, op, zm: 8, pg: 6, zn: 7, pd: 14 },
            );
        }
    }
    for is64 in [false, true] {
        assert_eq!(
            roundtrip(|a| a.ctermeq(is64, Gp(1), Gp(2))),
            Instruction::Cterm { is64, ne: false, rm: 2, rn: 1 }
        );
        assert_eq!(
            roundtrip(|a| a.ctermne(is64, Gp(30), Gp(0))),
            Instruction::Cterm { is64, ne: true, rm: 0, rn: 30 }
        );
    }
}

#[test]
fn test_predicate_group() {
    for pat in [pattern::POW2, pattern::VL3, pattern::VL16, pattern::MUL3, pattern::ALL] {
        for size in ALL_SIZES {
            assert_eq!(
                roundtrip(|a| a.ptrue(size, PReg(0), pat)),
                Instruction::Ptrue { size, set_flags: false, pattern: pat, pd: 0 }
            );
        }
    }
    assert_eq!(
        roundtrip(|a| a.ptrues(LaneSize::B, PReg(15), pattern::ALL)),
        Instruction::Ptrue {
            size: LaneSize::B,
            set_flags: true,
            pattern: pattern::ALL,
            pd: 15,
        }
    );
    assert_eq!(roundtrip(|a| a.pfalse(PReg(9))), Instruction::Pfalse { pd: 9 });
    assert_eq!(
        roundtrip(|a| a.ptest(PReg(3), PReg(12))),
        Instruction::Ptest { pg: 3, pn: 12 }
    );
    assert_eq!(
        roundtrip(|a| a.pfirst(PReg(1), PReg(2))),
        Instruction::Pfirst { pg: 2, pdn: 1 }
    );
    for size in ALL_SIZES {
        assert_eq!(
            roundtrip(|a| a.pnext(size, PReg(4), PReg(5))),
            Instruction::Pnext { size, pg: 5, pdn: 4 }
        );
    }
}

#[test]
fn test_predicate_logical() {
    type Emit = fn(&mut Assembler, PReg, PReg, PReg, PReg) -> Result<(), EncodeError>;
    let cases: &[(Emit, PredOp, bool)] = &[
        (Assembler::pred_and, PredOp::And, false),
        (Assembler::pred_ands, PredOp::And, true),
        (Assembler::pred_bic, PredOp::Bic, false),
        (Assembler::pred_bics, PredOp::Bic, true),
        (Assembler::pred_eor, PredOp::Eor, false),
        (Assembler::pred_eors, PredOp::Eor, true),
        (Assembler::pred_sel, PredOp::Sel, false),
        (Assembler::pred_orr, PredOp::Orr, false),
        (Assembler::pred_orrs, PredOp::Orr, true),
        (Assembler::pred_orn, PredOp::Orn, false),
        (Assembler::pred_orns, PredOp::Orn, true),
        (Assembler::pred_nor, PredOp::Nor, false),
        (Assembler::pred_nors, PredOp::Nor, true),
        (Assembler::pred_nand, PredOp::Nand, false),
        (Assembler::pred_nands, PredOp::Nand, true),
    ];
    for &(emit, op, set_flags) in cases {
        assert_eq!(
            roundtrip(|a| emit(a, PReg(1), PReg(2), PReg(3), PReg(4))),
            Instruction::PredLogical { op, set_flags, pm: 4, pg: 2, pn: 3, pd: 1 },
            "{op:?} s={set_flags}"
        );
    }
}

#[test]
fn test_counting() {
    for size in ALL_SIZES {
        assert_eq!(
            roundtrip(|a| a.cntp(size, Gp(5), PReg(6), PReg(7))),
            Instruction::Cntp { size, pg: 6, pn: 7, rd: 5 }
        );
        assert_eq!(
            roundtrip(|a| a.incp(size, Gp(1), PReg(8))),
            Instruction::IncDecP { size, dec: false, pm: 8, rdn: 1 }
        );
        assert_eq!(
            roundtrip(|a| a.decp(size, Gp(1), PReg(8))),
            Instruction::IncDecP { size, dec: true, pm: 8, rdn: 1 }
        );
    }
    for size in [LaneSize::H, LaneSize::S, LaneSize::D] {
        assert_eq!(
            roundtrip(|a| a.incp_z(size, ZReg(3), PReg(0))),
            Instruction::IncDecPVec { size, dec: false, pm: 0, zdn: 3 }
        );
        assert_eq!(
            roundtrip(|a| a.decp_z(size, ZReg(3), PReg(0))),
            Instruction::IncDecPVec { size, dec: true, pm: 0, zdn: 3 }
        );
    }
}

#[test]
fn test_saturating_counting() {
    type Emit = fn(&mut Assembler, LaneSize, Gp, PReg) -> Result<(), EncodeError>;
    let scalar: &[(Emit, bool, bool, bool)] = &[
        (Assembler::sqincp, false, false, false),
        (Assembler::uqincp, false, true, false),
        (Assembler::sqdecp, true, false, false),
        (Assembler::uqdecp, true, true, false),
        (Assembler::sqincp_w, false, false, true),
        (Assembler::uqincp_w, false, true, true),
        (Assembler::sqdecp_w, true, false, true),
        (Assembler::uqdecp_w, true, true, true),
    ];
    for &(emit, dec, unsigned, fx32) in scalar {
        for size in ALL_SIZES {
            assert_eq!(
                roundtrip(|a| emit(a, size, Gp(2), PReg(9))),
                Instruction::SatIncDecP { size, dec, unsigned, fx32, pm: 9, rdn: 2 },
            );
        }
    }

    type VecEmit = fn(&mut Assembler, LaneSize, ZReg, PReg) -> Result<(), EncodeError>;
    let vector: &[(VecEmit, bool, bool)] = &[
        (Assembler::sqincp_z, false, false),
        (Assembler::uqincp_z, false, true),
        (Assembler::sqdecp_z, true, false),
        (Assembler::uqdecp_z, true, true),
    ];
    for &(emit, dec, unsigned) in vector {
        for size in [LaneSize::H, LaneSize::S, LaneSize::D] {
            assert_eq!(
                roundtrip(|a| emit(a, size, ZReg(6), PReg(11))),
                Instruction::SatIncDecPVec { size, dec, unsigned, pm: 11, zdn: 6 },
            );
        }
    }
}

#[test]
fn test_element_counting() {
    type Emit = fn(&mut Assembler, Gp, u8, u8) -> Result<(), EncodeError>;
    let counts: &[(Emit, LaneSize)] = &[
        (Assembler::cntb, LaneSize::B),
        (Assembler::cnth, LaneSize::H),
        (Assembler::cntw, LaneSize::S),
        (Assembler::cntd, LaneSize::D),
    ];
    for &(emit, size) in counts {
        for mul in [1, 7, 16] {
            assert_eq!(
                roundtrip(|a| emit(a, Gp(0), pattern::ALL, mul)),
                Instruction::CntElem { size, mul, pattern: pattern::ALL, rd: 0 }
            );
        }
    }

    let incdec: &[(Emit, LaneSize, bool)] = &[
        (Assembler::incb, LaneSize::B, false),
        (Assembler::inch, LaneSize::H, false),
        (Assembler::incw, LaneSize::S, false),
        (Assembler::incd, LaneSize::D, false),
        (Assembler::decb, LaneSize::B, true),
        (Assembler::dech, LaneSize::H, true),
        (Assembler::decw, LaneSize::S, true),
        (Assembler::decd, LaneSize::D, true),
    ];
    for &(emit, size, dec) in incdec {
        assert_eq!(
            roundtrip(|a| emit(a, Gp(7), pattern::POW2, 2)),
            Instruction::IncDecElem { size, dec, mul: 2, pattern: pattern::POW2, rdn: 7 }
        );
    }

    for imm in [-32i8, -17, 0, 1, 31] {
        assert_eq!(
            roundtrip(|a| a.rdvl(Gp(4), imm)),
            Instruction::Rdvl { imm, rd: 4 }
        );
    }
}

#[test]
fn test_memory() {
    for imm9 in [-256i16, -13, 0, 3, 255] {
        assert_eq!(
            roundtrip(|a| a.ldr_z(ZReg(0), Gp(1), imm9)),
            Instruction::LdrZ { imm9, rn: 1, zt: 0 }
        );
        assert_eq!(
            roundtrip(|a| a.str_z(ZReg(31), Gp(31), imm9)),
            Instruction::StrZ { imm9, rn: 31, zt: 31 }
        );
        assert_eq!(
            roundtrip(|a| a.ldr_p(PReg(15), Gp(2), imm9)),
            Instruction::LdrP { imm9, rn: 2, pt: 15 }
        );
        assert_eq!(
            roundtrip(|a| a.str_p(PReg(0), Gp(0), imm9)),
            Instruction::StrP { imm9, rn: 0, pt: 0 }
        );
    }
}

#[test]
fn test_t32_stream_round_trip() {
    let mut asm = T32Assembler::new();
    asm.it(Condition::Eq).unwrap();
    asm.cmn(Condition::Eq, Gp(0), Gp(0)).unwrap();
    asm.itt(Condition::Ne).unwrap();
    asm.tst(Condition::Ne, Gp(1), Gp(2)).unwrap();
    asm.orr(Condition::Ne, Gp(3), Gp(4)).unwrap();
    asm.ite(Condition::Lt).unwrap();
    asm.mvn(Condition::Lt, Gp(5), Gp(6)).unwrap();
    asm.bic(Condition::Ge, Gp(7), Gp(0)).unwrap();
    asm.cmp(Condition::Al, Gp(1), Gp(1)).unwrap();

    let mut dec = ThumbDecoder::new();
    let insts = dec.decode_stream(asm.bytes()).unwrap();
    assert_eq!(
        insts,
        vec![
            ThumbInstruction::It { cond: Condition::Eq },
            ThumbInstruction::DataProc { op: ThumbOp::Cmn, cond: Condition::Eq, rn: 0, rm: 0 },
            ThumbInstruction::It { cond: Condition::Ne },
            ThumbInstruction::DataProc { op: ThumbOp::Tst, cond: Condition::Ne, rn: 1, rm: 2 },
            ThumbInstruction::DataProc { op: ThumbOp::Orr, cond: Condition::Ne, rn: 3, rm: 4 },
            ThumbInstruction::It { cond: Condition::Lt },
            ThumbInstruction::DataProc { op: ThumbOp::Mvn, cond: Condition::Lt, rn: 5, rm: 6 },
            ThumbInstruction::DataProc { op: ThumbOp::Bic, cond: Condition::Ge, rn: 7, rm: 0 },
            ThumbInstruction::DataProc { op: ThumbOp::Cmp, cond: Condition::Al, rn: 1, rm: 1 },
        ]
    );
}
