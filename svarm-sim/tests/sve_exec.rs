// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end scenarios: assemble with `svarm-asm`, execute with the
//! simulator, assert on architectural state.

use svarm_asm::sve::pattern;
use svarm_asm::MacroAssembler;
use svarm_core::{Flags, Gp, LaneSize, PReg, VectorLength, ZReg};
use svarm_sim::state::Z_MAX_BYTES;
use svarm_sim::{ArchState, FlatMemory, Halt, Simulator};

fn state_vl128() -> ArchState {
    ArchState::with_vl(VectorLength::new(128).unwrap())
}

/// Load the program at address 0 and run it to the halt marker.
fn run_program(state: &mut ArchState, code: &[u8]) {
    let mut mem = FlatMemory::new(0x4000);
    mem.write_code(0, code);
    state.pc = 0;
    let mut sim = Simulator::new();
    let halt = sim.run(state, &mut mem).unwrap();
    assert_eq!(halt, Halt::Explicit(0));
}

#[test]
fn test_insr_lane_order() {
    // Inserting 1, 2, 0xef, -42, 0 one by one leaves the first value in the
    // highest of the five low lanes: read back lowest-lane-first the bytes
    // are 00 d6 ef 02 01.
    let mut m = MacroAssembler::new();
    for v in [1u64, 2, 0xEF, (-42i64) as u64, 0] {
        m.mov_imm(Gp(0), v).unwrap();
        m.raw().insr(LaneSize::B, ZReg(0), Gp(0)).unwrap();
    }
    m.raw().hlt(0);

    let mut state = state_vl128();
    run_program(&mut state, m.bytes());

    assert_eq!(state.get_z_lane(0, 4, LaneSize::B), 0x01);
    assert_eq!(state.get_z_lane(0, 3, LaneSize::B), 0x02);
    assert_eq!(state.get_z_lane(0, 2, LaneSize::B), 0xEF);
    assert_eq!(state.get_z_lane(0, 1, LaneSize::B), 0xD6);
    assert_eq!(state.get_z_lane(0, 0, LaneSize::B), 0x00);
}

#[test]
fn test_sqdecp_preserves_high_bits() {
    let mut state = state_vl128();
    for lane in [0, 1, 2, 3, 5, 6, 8, 9, 12] {
        state.set_pred_lane(0, LaneSize::B, lane, true);
    }

    let mut m = MacroAssembler::new();
    m.mov_imm(Gp(0), 0x1234_5678_0000_002A).unwrap();
    m.raw().sqdecp(LaneSize::B, Gp(0), PReg(0)).unwrap();
    m.raw().hlt(0);

    run_program(&mut state, m.bytes());
    assert_eq!(state.get_x(0), 0x1234_5678_0000_002A - 9);
}

#[test]
fn test_ptest_all_inactive_governing() {
    // With an all-inactive governing predicate the tested predicate's
    // content is irrelevant: None and NotLast, nothing else.
    let mut m = MacroAssembler::new();
    m.raw().ptrue(LaneSize::B, PReg(1), pattern::ALL).unwrap();
    m.raw().pfalse(PReg(0)).unwrap();
    m.raw().ptest(PReg(0), PReg(1)).unwrap();
    m.raw().hlt(0);

    let mut state = state_vl128();
    state.nzcv = Flags::all();
    run_program(&mut state, m.bytes());
    assert_eq!(state.nzcv, Flags::NONE | Flags::NOT_LAST);
}

#[test]
fn test_tbl_out_of_range_index_reads_zero() {
    let mut state = state_vl128();
    for i in 0..16 {
        state.set_z_lane(1, i, LaneSize::B, 0x40 + i as u64);
    }
    state.set_z_lane(2, 0, LaneSize::B, 3);
    state.set_z_lane(2, 1, LaneSize::B, 255);
    state.set_z_lane(2, 2, LaneSize::B, 16);

    let mut m = MacroAssembler::new();
    m.raw().tbl(LaneSize::B, ZReg(0), ZReg(1), ZReg(2)).unwrap();
    m.raw().hlt(0);

    run_program(&mut state, m.bytes());
    assert_eq!(state.get_z_lane(0, 0, LaneSize::B), 0x43);
    assert_eq!(state.get_z_lane(0, 1, LaneSize::B), 0);
    assert_eq!(state.get_z_lane(0, 2, LaneSize::B), 0);
}

#[test]
fn test_reduction_write_clears_full_scalable_width() {
    // A V-register-view write must clear every Z byte above the result, all
    // the way up to the maximum architectural width.
    let mut state = state_vl128();
    for lane in 0..32 {
        state.set_z_lane(0, lane, LaneSize::D, u64::MAX);
    }
    for i in 0..16 {
        state.set_z_lane(1, i, LaneSize::B, 0xD6); // -42
    }

    let mut m = MacroAssembler::new();
    m.raw().ptrue(LaneSize::B, PReg(0), pattern::ALL).unwrap();
    m.raw().smaxv(LaneSize::B, ZReg(0), PReg(0), ZReg(1)).unwrap();
    m.raw().hlt(0);

    run_program(&mut state, m.bytes());
    assert_eq!(state.get_z_lane(0, 0, LaneSize::B), 0xD6);
    for byte in 1..Z_MAX_BYTES {
        assert_eq!(state.get_z_lane(0, byte, LaneSize::B), 0, "byte {byte}");
    }
}

#[test]
fn test_saturating_add_boundary_through_pipeline() {
    // SQADD at INT8_MAX and UQSUB at zero, through encode, decode and
    // execute rather than handler calls.
    let mut state = state_vl128();
    for i in 0..16 {
        state.set_z_lane(1, i, LaneSize::B, 0x7F);
        state.set_z_lane(2, i, LaneSize::B, 1);
        state.set_z_lane(3, i, LaneSize::B, 0);
    }

    let mut m = MacroAssembler::new();
    m.raw().sqadd(LaneSize::B, ZReg(4), ZReg(1), ZReg(2)).unwrap();
    m.raw().uqsub(LaneSize::B, ZReg(5), ZReg(3), ZReg(2)).unwrap();
    m.raw().hlt(0);

    run_program(&mut state, m.bytes());
    for i in 0..16 {
        assert_eq!(state.get_z_lane(4, i, LaneSize::B), 0x7F);
        assert_eq!(state.get_z_lane(5, i, LaneSize::B), 0);
    }
}

#[test]
fn test_flags_preserved_by_non_flag_setting_instructions() {
    let mut state = state_vl128();

    let mut m = MacroAssembler::new();
    let a = m.raw();
    a.ptrue(LaneSize::B, PReg(0), pattern::ALL).unwrap();
    a.cmpeq(LaneSize::B, PReg(1), PReg(0), ZReg(0), ZReg(0)).unwrap();
    // None of the following set flags.
    a.dup_imm(LaneSize::B, ZReg(1), 7, false).unwrap();
    a.add(LaneSize::B, ZReg(1), PReg(0), ZReg(1)).unwrap();
    a.tbl(LaneSize::B, ZReg(2), ZReg(1), ZReg(1)).unwrap();
    a.insr(LaneSize::B, ZReg(2), Gp(0)).unwrap();
    a.incp(LaneSize::B, Gp(1), PReg(0)).unwrap();
    a.smaxv(LaneSize::B, ZReg(3), PReg(0), ZReg(1)).unwrap();
    a.hlt(0);

    run_program(&mut state, m.bytes());
    // cmpeq on identical registers under a full predicate: First only.
    assert_eq!(state.nzcv, Flags::FIRST);
}

/// The MacroAssembler alias matrix: every (zd, zn, zm) aliasing pattern of a
/// commutative, a reversible and a scratch-copy op must produce the same
/// architectural result.
#[test]
fn test_masm_alias_matrix() {
    type MasmOp = fn(
        &mut MacroAssembler,
        LaneSize,
        ZReg,
        PReg,
        ZReg,
        ZReg,
    ) -> Result<(), svarm_asm::EncodeError>;

    fn seed(reg: u8, lane: usize) -> u64 {
        (reg as u64 * 0x1111) ^ (lane as u64 * 0x0107) ^ 0x00F0
    }

    let ops: &[(MasmOp, fn(u64, u64) -> u64)] = &[
        (MacroAssembler::add, |n, m| (n.wrapping_add(m)) & 0xFFFF_FFFF),
        (MacroAssembler::sub, |n, m| (n.wrapping_sub(m)) & 0xFFFF_FFFF),
        (MacroAssembler::bic, |n, m| n & !m & 0xFFFF_FFFF),
    ];
    let combos: &[(u8, u8, u8)] = &[(0, 1, 2), (3, 3, 4), (5, 6, 5), (7, 7, 7)];

    for &(op, model) in ops {
        for &(zd, zn, zm) in combos {
            let mut state = state_vl128();
            for reg in 0..8 {
                for lane in 0..4 {
                    state.set_z_lane(reg, lane, LaneSize::S, seed(reg, lane));
                }
            }

            let mut m = MacroAssembler::new();
            m.raw().ptrue(LaneSize::S, PReg(0), pattern::ALL).unwrap();
            op(&mut m, LaneSize::S, ZReg(zd), PReg(0), ZReg(zn), ZReg(zm)).unwrap();
            m.raw().hlt(0);

            run_program(&mut state, m.bytes());
            for lane in 0..4 {
                assert_eq!(
                    state.get_z_lane(zd, lane, LaneSize::S),
                    model(seed(zn, lane), seed(zm, lane)),
                    "zd=z{zd} zn=z{zn} zm=z{zm} lane {lane}"
                );
            }
        }
    }
}

#[test]
fn test_masm_immediate_paths_are_value_equivalent() {
    // The same logical addition through three different encoding paths must
    // land on identical lane values.
    let immediates: [u64; 3] = [5, 0x500, 0x1234];
    let mut results = Vec::new();
    for imm in immediates {
        let mut state = state_vl128();
        for lane in 0..8 {
            state.set_z_lane(1, lane, LaneSize::H, 0x4000 + lane as u64);
        }
        let mut m = MacroAssembler::new();
        m.add_imm(LaneSize::H, ZReg(0), ZReg(1), imm).unwrap();
        m.raw().hlt(0);
        run_program(&mut state, m.bytes());
        let lanes: Vec<u64> =
            (0..8).map(|i| state.get_z_lane(0, i, LaneSize::H)).collect();
        results.push(lanes);
    }
    for (imm, lanes) in immediates.iter().zip(&results) {
        for (i, &v) in lanes.iter().enumerate() {
            assert_eq!(v, (0x4000 + i as u64 + imm) & 0xFFFF, "imm {imm:#x} lane {i}");
        }
    }
}

#[test]
fn test_vector_store_load_through_pipeline() {
    let mut state = state_vl128();
    for i in 0..16 {
        state.set_z_lane(1, i, LaneSize::B, (0x80 + i) as u64);
    }
    state.set_x(0, 0x1000);

    let mut m = MacroAssembler::new();
    m.raw().str_z(ZReg(1), Gp(0), 0).unwrap();
    m.raw().ldr_z(ZReg(2), Gp(0), 0).unwrap();
    m.raw().hlt(0);

    run_program(&mut state, m.bytes());
    for i in 0..16 {
        assert_eq!(state.get_z_lane(2, i, LaneSize::B), (0x80 + i) as u64);
    }
}

#[test]
fn test_pfirst_pnext_walk_through_pipeline() {
    let mut state = state_vl128();
    for lane in [2, 5, 11] {
        state.set_pred_lane(0, LaneSize::B, lane, true);
    }

    let mut m = MacroAssembler::new();
    m.raw().pfalse(PReg(1)).unwrap();
    m.raw().pfirst(PReg(1), PReg(0)).unwrap();
    m.raw().pnext(LaneSize::B, PReg(1), PReg(0)).unwrap();
    m.raw().hlt(0);

    run_program(&mut state, m.bytes());
    // pfirst activated lane 2; pnext moved on to lane 5 alone.
    assert!(!state.pred_lane_active(1, LaneSize::B, 2));
    assert!(state.pred_lane_active(1, LaneSize::B, 5));
    assert!(!state.pred_lane_active(1, LaneSize::B, 11));
    assert_eq!(state.nzcv, Flags::NOT_LAST);
}
