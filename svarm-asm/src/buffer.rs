// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Little-endian code emission buffer.

use byteorder::{LittleEndian, WriteBytesExt};

/// Grow-only byte buffer for encoded instructions, with a rewind point so a
/// failed multi-instruction expansion can be discarded whole.
#[derive(Debug, Default, Clone)]
pub struct CodeBuffer {
    bytes: Vec<u8>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit one 16-bit little-endian halfword.
    pub fn emit16(&mut self, hw: u16) {
        // Writing to a Vec cannot fail.
        self.bytes.write_u16::<LittleEndian>(hw).unwrap();
    }

    /// Emit one 32-bit little-endian word.
    pub fn emit32(&mut self, word: u32) {
        self.bytes.write_u32::<LittleEndian>(word).unwrap();
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Current position, usable as a rewind mark.
    pub fn mark(&self) -> usize {
        self.bytes.len()
    }

    /// Drop everything emitted after `mark`.
    pub fn rewind_to(&mut self, mark: usize) {
        self.bytes.truncate(mark);
    }
}
