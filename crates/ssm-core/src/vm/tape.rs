//! VM Tape
//!
//! Fixed-capacity byte memory holding both program code and data.
//! Every access is bounds-checked before memory is touched; nothing wraps
//! and nothing is truncated.

use crate::error::{SsmError, SsmResult};
use super::{Word, WORD_SIZE};

/// Byte-addressable machine memory
#[derive(Debug, Clone)]
pub struct Tape {
    bytes: Box<[u8]>,
}

impl Tape {
    /// Zero-filled tape of `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Tape {
            bytes: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Fail unless `width` bytes starting at `address` lie on the tape.
    pub fn check(&self, address: usize, width: usize) -> SsmResult<()> {
        match address.checked_add(width) {
            Some(end) if end <= self.capacity() => Ok(()),
            _ => Err(SsmError::out_of_bounds(
                i64::try_from(address).unwrap_or(i64::MAX),
                width,
                self.capacity(),
            )),
        }
    }

    /// Interpret a stack Word as an address for a `width`-byte access.
    pub fn resolve(&self, address: Word, width: usize) -> SsmResult<usize> {
        let out_of_bounds = || SsmError::out_of_bounds(address, width, self.capacity());
        let address = usize::try_from(address).map_err(|_| out_of_bounds())?;
        self.check(address, width).map_err(|_| out_of_bounds())?;
        Ok(address)
    }

    pub fn read_byte(&self, address: usize) -> SsmResult<u8> {
        self.check(address, 1)?;
        Ok(self.bytes[address])
    }

    pub fn write_byte(&mut self, address: usize, value: u8) -> SsmResult<()> {
        self.check(address, 1)?;
        self.bytes[address] = value;
        Ok(())
    }

    /// Read a little-endian Word
    pub fn read_word(&self, address: usize) -> SsmResult<Word> {
        let raw = self.read_bytes(address, WORD_SIZE)?;
        let mut buf = [0u8; WORD_SIZE];
        buf.copy_from_slice(raw);
        Ok(Word::from_le_bytes(buf))
    }

    /// Write a little-endian Word
    pub fn write_word(&mut self, address: usize, value: Word) -> SsmResult<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn read_bytes(&self, address: usize, len: usize) -> SsmResult<&[u8]> {
        self.check(address, len)?;
        Ok(&self.bytes[address..address + len])
    }

    pub fn write_bytes(&mut self, address: usize, data: &[u8]) -> SsmResult<()> {
        self.check(address, data.len())?;
        self.bytes[address..address + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Replace the whole tape: `program` at address 0, zeroes after it.
    pub(crate) fn reload(&mut self, program: &[u8]) -> SsmResult<()> {
        if program.len() > self.capacity() {
            return Err(SsmError::ProgramTooLarge {
                len: program.len(),
                capacity: self.capacity(),
            });
        }
        self.bytes[..program.len()].copy_from_slice(program);
        self.bytes[program.len()..].fill(0);
        Ok(())
    }
}
