// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! The NZCV flag word, with the SVE predicate-test aliases.

use bitflags::bitflags;

bitflags! {
    /// Condition flags at their architectural PSTATE bit positions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u32 {
        const N = 1 << 31;
        const Z = 1 << 30;
        const C = 1 << 29;
        const V = 1 << 28;
    }
}

impl Flags {
    /// SVE alias: the first active lane of the governing predicate is set in
    /// the result.
    pub const FIRST: Flags = Flags::N;
    /// SVE alias: no active lane of the governing predicate is set in the
    /// result.
    pub const NONE: Flags = Flags::Z;
    /// SVE alias: the last active lane of the governing predicate is not set
    /// in the result.
    pub const NOT_LAST: Flags = Flags::C;

    pub fn from_nzcv(n: bool, z: bool, c: bool, v: bool) -> Self {
        let mut f = Flags::empty();
        f.set(Flags::N, n);
        f.set(Flags::Z, z);
        f.set(Flags::C, c);
        f.set(Flags::V, v);
        f
    }
}
