// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shared operand and register model for the svarm toolkit.
//!
//! Pure value types: register references, lane sizes, the configured vector
//! length, condition codes, predication disciplines and the NZCV flag word.
//! No execution behavior lives here beyond validation predicates.

pub mod flags;
pub mod predicate;
pub mod register;

pub use flags::Flags;
pub use register::{
    Condition, Gp, InvalidVectorLength, LaneSize, PReg, Predication, VectorLength, ZReg,
};
