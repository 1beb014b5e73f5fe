// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Memory access trait for the simulator.
//!
//! Abstracts memory so the execution engine can fetch instructions and move
//! vector-register-sized byte runs without committing to a backing store.
//! All multi-byte accesses are little-endian.

use thiserror::Error;

/// Memory access error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryFault {
    #[error("unmapped address: 0x{0:016X}")]
    Unmapped(u64),
    #[error("permission denied at 0x{0:016X}")]
    PermissionDenied(u64),
}

/// Trait for simulated memory access.
pub trait MemoryAccess {
    /// Instruction fetch (little-endian word).
    fn read_u32(&self, addr: u64) -> Result<u32, MemoryFault>;

    /// Fill `out` from consecutive bytes at `addr`.
    fn read_bytes(&self, addr: u64, out: &mut [u8]) -> Result<(), MemoryFault>;

    /// Store `data` at consecutive bytes from `addr`.
    fn write_bytes(&mut self, addr: u64, data: &[u8]) -> Result<(), MemoryFault>;
}

/// Flat little-endian memory over a plain byte buffer, for test programs.
#[derive(Debug, Clone)]
pub struct FlatMemory {
    data: Vec<u8>,
}

impl FlatMemory {
    pub fn new(size: usize) -> Self {
        Self { data: vec![0; size] }
    }

    /// Write an instruction word at `addr`.
    pub fn write_inst(&mut self, addr: u64, inst: u32) {
        let off = addr as usize;
        self.data[off..off + 4].copy_from_slice(&inst.to_le_bytes());
    }

    /// Write an already-encoded byte stream at `addr`.
    pub fn write_code(&mut self, addr: u64, code: &[u8]) {
        let off = addr as usize;
        self.data[off..off + code.len()].copy_from_slice(code);
    }
}

impl MemoryAccess for FlatMemory {
    fn read_u32(&self, addr: u64) -> Result<u32, MemoryFault> {
        let off = addr as usize;
        let slice = self.data.get(off..off + 4).ok_or(MemoryFault::Unmapped(addr))?;
        Ok(u32::from_le_bytes(slice.try_into().unwrap()))
    }

    fn read_bytes(&self, addr: u64, out: &mut [u8]) -> Result<(), MemoryFault> {
        let off = addr as usize;
        let slice = self
            .data
            .get(off..off + out.len())
            .ok_or(MemoryFault::Unmapped(addr))?;
        out.copy_from_slice(slice);
        Ok(())
    }

    fn write_bytes(&mut self, addr: u64, data: &[u8]) -> Result<(), MemoryFault> {
        let off = addr as usize;
        let slice = self
            .data
            .get_mut(off..off + data.len())
            .ok_or(MemoryFault::Unmapped(addr))?;
        slice.copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_memory_round_trip() {
        let mut mem = FlatMemory::new(0x100);
        mem.write_bytes(0x10, &[1, 2, 3, 4]).unwrap();
        let mut buf = [0u8; 4];
        mem.read_bytes(0x10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(mem.read_u32(0x10), Ok(0x04030201));
    }

    #[test]
    fn test_flat_memory_out_of_bounds() {
        let mem = FlatMemory::new(0x10);
        assert_eq!(mem.read_u32(0x10), Err(MemoryFault::Unmapped(0x10)));
        let mut buf = [0u8; 8];
        assert_eq!(mem.read_bytes(0xC, &mut buf), Err(MemoryFault::Unmapped(0xC)));
    }
}
