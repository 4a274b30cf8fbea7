//! Program Builder
//!
//! Byte-level program emitter. Words are written little-endian, matching
//! what the tape decodes. This layer contains no execution semantics.

use super::opcode::OpCode;
use crate::vm::{Word, WORD_SIZE};

/// Location of an inline operand to be filled in later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Patch {
    offset: usize,
}

/// Growable program image
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    code: Vec<u8>,
    position: usize,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the next byte will be emitted at
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the emission point. A gap past the end is zero-filled only once
    /// something is emitted beyond it; a trailing move adds no bytes.
    pub fn set_position(&mut self, position: usize) -> &mut Self {
        self.position = position;
        self
    }

    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.put(&[value]);
        self
    }

    pub fn word(&mut self, value: Word) -> &mut Self {
        self.put(&value.to_le_bytes());
        self
    }

    /// Opcode without operands
    pub fn op(&mut self, op: OpCode) -> &mut Self {
        self.byte(op as u8)
    }

    /// `push value`
    pub fn push(&mut self, value: Word) -> &mut Self {
        self.op(OpCode::Push).word(value)
    }

    /// Conditional jump with a known target
    pub fn jump(&mut self, op: OpCode, target: Word) -> &mut Self {
        debug_assert!(op.is_conditional_jump());
        self.op(op).word(target)
    }

    /// Conditional jump whose target is patched later
    pub fn jump_forward(&mut self, op: OpCode) -> Patch {
        debug_assert!(op.is_conditional_jump());
        self.op(op);
        self.placeholder()
    }

    /// `push` whose value is patched later (typically a `call`/`jmp` target)
    pub fn push_forward(&mut self) -> Patch {
        self.op(OpCode::Push);
        self.placeholder()
    }

    /// Fill a placeholder Word
    pub fn patch(&mut self, patch: Patch, value: Word) -> &mut Self {
        self.code[patch.offset..patch.offset + WORD_SIZE].copy_from_slice(&value.to_le_bytes());
        self
    }

    /// Raw text bytes at the current position
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.put(text.as_bytes());
        self
    }

    /// Raw text bytes at `address`; the emission point does not move.
    pub fn text_at(&mut self, address: usize, text: &str) -> &mut Self {
        let saved = self.position;
        self.position = address;
        self.put(text.as_bytes());
        self.position = saved;
        self
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    pub fn finish(self) -> Vec<u8> {
        self.code
    }

    fn placeholder(&mut self) -> Patch {
        let patch = Patch {
            offset: self.position,
        };
        self.word(0);
        patch
    }

    fn put(&mut self, bytes: &[u8]) {
        let end = self.position + bytes.len();
        if self.code.len() < end {
            self.code.resize(end, 0);
        }
        self.code[self.position..end].copy_from_slice(bytes);
        self.position = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_encodes_little_endian_word() {
        let mut b = ProgramBuilder::new();
        b.push(0x0A0B_0C0D).op(OpCode::Halt);
        assert_eq!(b.finish(), vec![0x01, 0x0D, 0x0C, 0x0B, 0x0A, 0xFF]);
    }

    #[test]
    fn forward_patch_fills_target() {
        let mut b = ProgramBuilder::new();
        let exit = b.jump_forward(OpCode::Je);
        b.op(OpCode::Nop);
        let here = b.position() as Word;
        b.patch(exit, here).op(OpCode::Halt);
        assert_eq!(b.as_bytes(), &[0xF2, 6, 0, 0, 0, 0x00, 0xFF]);
    }

    #[test]
    fn text_at_zero_fills_and_keeps_position() {
        let mut b = ProgramBuilder::new();
        b.op(OpCode::Halt).text_at(4, "hi");
        assert_eq!(b.position(), 1);
        assert_eq!(b.as_bytes(), &[0xFF, 0, 0, 0, b'h', b'i']);
    }

    #[test]
    fn trailing_move_adds_nothing() {
        let mut b = ProgramBuilder::new();
        b.op(OpCode::Halt).set_position(32);
        assert_eq!(b.len(), 1);
        b.op(OpCode::Nop);
        assert_eq!(b.len(), 33);
    }
}
