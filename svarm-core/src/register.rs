// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Register references, lane sizes and the vector-length configuration.

use thiserror::Error;

/// General-purpose register reference (X0-X30, index 31 = SP or XZR depending
/// on the consuming instruction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gp(pub u8);

impl Gp {
    /// Architectural register-file bound.
    pub fn is_valid(self) -> bool {
        self.0 <= 31
    }

    /// Low registers (r0-r7) are the only ones reachable from the 16-bit
    /// Thumb data-processing encodings.
    pub fn is_low(self) -> bool {
        self.0 <= 7
    }
}

/// Scalable vector register reference (Z0-Z31).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZReg(pub u8);

impl ZReg {
    pub fn is_valid(self) -> bool {
        self.0 <= 31
    }
}

/// Predicate register reference (P0-P15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PReg(pub u8);

impl PReg {
    pub fn is_valid(self) -> bool {
        self.0 <= 15
    }

    /// Several predicate encodings only have a 3-bit governing-predicate
    /// field (P0-P7).
    pub fn is_governing(self) -> bool {
        self.0 <= 7
    }
}

/// Lane width of a vector or predicate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LaneSize {
    B = 0,
    H = 1,
    S = 2,
    D = 3,
}

impl LaneSize {
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::B),
            16 => Some(Self::H),
            32 => Some(Self::S),
            64 => Some(Self::D),
            _ => None,
        }
    }

    /// Decode the standard 2-bit `size` field.
    pub fn from_field(val: u32) -> Self {
        match val & 3 {
            0 => Self::B,
            1 => Self::H,
            2 => Self::S,
            _ => Self::D,
        }
    }

    #[inline]
    pub fn bits(self) -> u32 {
        8 << (self as u32)
    }

    #[inline]
    pub fn bytes(self) -> u32 {
        1 << (self as u32)
    }

    /// A predicate register holds one bit per byte of the vector, so a lane's
    /// predicate segment is as many bits wide as the lane is bytes wide.
    #[inline]
    pub fn pred_bits_per_lane(self) -> u32 {
        self.bytes()
    }

    /// The 2-bit `size` field value.
    #[inline]
    pub fn field(self) -> u32 {
        self as u32
    }
}

/// Vector length out of the architectural range.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid vector length: {0} bits (must be a multiple of 128 in 128..=2048)")]
pub struct InvalidVectorLength(pub u32);

/// Configured vector length in bits. One value per execution context; every
/// register in that context shares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorLength(u32);

/// Largest architectural vector length, in bits.
pub const MAX_VL_BITS: u32 = 2048;

impl VectorLength {
    pub fn new(bits: u32) -> Result<Self, InvalidVectorLength> {
        if bits >= 128 && bits <= MAX_VL_BITS && bits % 128 == 0 {
            Ok(Self(bits))
        } else {
            Err(InvalidVectorLength(bits))
        }
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn bytes(self) -> usize {
        (self.0 / 8) as usize
    }

    /// Size of one predicate register at this vector length.
    #[inline]
    pub fn pred_bytes(self) -> usize {
        (self.0 / 64) as usize
    }

    /// Lane count for a given lane width.
    #[inline]
    pub fn lanes(self, lane: LaneSize) -> usize {
        (self.0 / lane.bits()) as usize
    }
}

/// A32/T32 condition code (4-bit encoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq = 0,
    Ne = 1,
    Cs = 2,
    Cc = 3,
    Mi = 4,
    Pl = 5,
    Vs = 6,
    Vc = 7,
    Hi = 8,
    Ls = 9,
    Ge = 10,
    Lt = 11,
    Gt = 12,
    Le = 13,
    Al = 14,
}

impl Condition {
    pub fn from_field(val: u32) -> Option<Self> {
        match val & 0xF {
            0 => Some(Self::Eq),
            1 => Some(Self::Ne),
            2 => Some(Self::Cs),
            3 => Some(Self::Cc),
            4 => Some(Self::Mi),
            5 => Some(Self::Pl),
            6 => Some(Self::Vs),
            7 => Some(Self::Vc),
            8 => Some(Self::Hi),
            9 => Some(Self::Ls),
            10 => Some(Self::Ge),
            11 => Some(Self::Lt),
            12 => Some(Self::Gt),
            13 => Some(Self::Le),
            14 => Some(Self::Al),
            _ => None,
        }
    }

    #[inline]
    pub fn field(self) -> u32 {
        self as u32
    }
}

/// Predication discipline for inactive destination lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predication {
    /// Inactive lanes are forced to zero.
    Zeroing,
    /// Inactive lanes keep the destination's prior value.
    Merging,
}
