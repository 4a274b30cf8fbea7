//! VM Stack Implementation
//!
//! Operand stack of Words.
//! No execution semantics.

use crate::error::{SsmError, SsmResult};
use super::Word;

/// Operand stack; also carries `call` return addresses.
#[derive(Debug, Clone)]
pub struct OperandStack {
    values: Vec<Word>,
    max_depth: usize,
}

impl OperandStack {
    /// Create new stack with maximum depth
    pub fn new(max_depth: usize) -> Self {
        OperandStack {
            values: Vec::new(),
            max_depth,
        }
    }

    /// Fail unless at least `required` values are present
    pub fn require(&self, required: usize) -> SsmResult<()> {
        if self.values.len() < required {
            return Err(SsmError::StackUnderflow {
                required,
                depth: self.values.len(),
            });
        }
        Ok(())
    }

    /// Fail unless `count` more values fit under the depth limit
    pub fn require_room(&self, count: usize) -> SsmResult<()> {
        if self.values.len() + count > self.max_depth {
            return Err(SsmError::StackOverflow {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    /// Push value onto stack
    pub fn push(&mut self, value: Word) -> SsmResult<()> {
        self.require_room(1)?;
        self.values.push(value);
        Ok(())
    }

    /// Pop value from stack
    pub fn pop(&mut self) -> SsmResult<Word> {
        self.require(1)?;
        self.values.pop().ok_or(SsmError::StackUnderflow {
            required: 1,
            depth: 0,
        })
    }

    /// Peek at top of stack without removing
    pub fn peek(&self) -> SsmResult<Word> {
        self.peek_at(0)
    }

    /// Peek `depth` entries below the top (0 is the top)
    pub fn peek_at(&self, depth: usize) -> SsmResult<Word> {
        self.require(depth + 1)?;
        Ok(self.values[self.values.len() - 1 - depth])
    }

    /// Drop the top `count` values
    pub fn discard(&mut self, count: usize) -> SsmResult<()> {
        self.require(count)?;
        self.values.truncate(self.values.len() - count);
        Ok(())
    }

    /// Exchange the two topmost values
    pub fn swap_top(&mut self) -> SsmResult<()> {
        self.require(2)?;
        let len = self.values.len();
        self.values.swap(len - 1, len - 2);
        Ok(())
    }

    /// Get current stack depth
    pub fn depth(&self) -> usize {
        self.values.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values bottom to top
    pub fn as_slice(&self) -> &[Word] {
        &self.values
    }

    /// Clear stack
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
