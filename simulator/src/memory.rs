//! The 65536-word address space, including the memory-mapped keyboard
//! registers KBSR/KBDR.

use crate::error::RuntimeError;
use crate::keysource::KeySource;

pub const KBSR_ADDR: u16 = 0xFE00;
pub const KBDR_ADDR: u16 = 0xFE02;

/// Stores below this address are rejected with `IllegalMemory`, per
/// `lc3memory.hpp`'s `assert(address >= START_OF_USER_PROGRAMS)`.
pub const USER_SPACE_START: u16 = 0x3000;

pub struct Memory {
    cells: Box<[u16; 65536]>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            cells: Box::new([0u16; 65536]),
        }
    }

    /// Reads a word, resolving KBSR/KBDR against `keys` instead of backing
    /// storage. KBSR's bit 15 is set iff a keystroke is pending; reading
    /// KBDR consumes it.
    pub fn read(&mut self, addr: u16, keys: &mut dyn KeySource) -> u16 {
        match addr {
            KBSR_ADDR => {
                if keys.has_key() {
                    0x8000
                } else {
                    0
                }
            }
            KBDR_ADDR => keys.take_key().map(|b| b as u16).unwrap_or(0),
            _ => self.cells[addr as usize],
        }
    }

    /// Reads backing storage directly, without consulting `keys`. Used by
    /// TRAP routines (`PUTS`, `PUTSP`) that scan a string already in memory.
    pub fn peek(&self, addr: u16) -> u16 {
        self.cells[addr as usize]
    }

    /// Write gated by the user-space floor; this is what `ST`/`STI`/`STR`
    /// go through.
    pub fn write(&mut self, addr: u16, value: u16) -> Result<(), RuntimeError> {
        if addr < USER_SPACE_START {
            return Err(RuntimeError::IllegalMemory { address: addr });
        }
        self.cells[addr as usize] = value;
        Ok(())
    }

    /// Unchecked write used by the loader, which may legitimately place an
    /// image origin anywhere in the address space.
    pub fn write_raw(&mut self, addr: u16, value: u16) {
        self.cells[addr as usize] = value;
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
