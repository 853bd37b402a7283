//! Loads an assembled object image into memory.
//!
//! The format is the flat little-endian word stream produced by
//! `lc3-assembler`: the first word is the origin address, every word after
//! it is placed sequentially starting there.

use crate::error::RuntimeError;
use crate::memory::Memory;

pub struct LoadResult {
    pub origin: u16,
    pub word_count: usize,
}

pub fn load(bytes: &[u8], memory: &mut Memory) -> Result<LoadResult, RuntimeError> {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return Err(RuntimeError::Io(
            "object file must contain an even, non-empty number of bytes".to_string(),
        ));
    }

    let words: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    let origin = words[0];
    let mut addr = origin;
    for &word in &words[1..] {
        memory.write_raw(addr, word);
        addr = addr.wrapping_add(1);
    }

    Ok(LoadResult {
        origin,
        word_count: words.len() - 1,
    })
}
