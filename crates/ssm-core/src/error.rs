//! SSM Error Types
//!
//! Defines every error condition produced by the stack machine core.
//! All of them are fatal to the current `run`; none are retried internally.

use std::io;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SsmError {
    // Load errors
    #[error("program of {len} bytes does not fit a tape of {capacity} bytes")]
    ProgramTooLarge { len: usize, capacity: usize },

    // Execution errors
    #[error("tape access of {width} byte(s) at address {address} exceeds capacity {capacity}")]
    TapeOutOfBounds {
        address: i64,
        width: usize,
        capacity: usize,
    },

    #[error("stack underflow: need {required} value(s), have {depth}")]
    StackUnderflow { required: usize, depth: usize },

    #[error("stack overflow: depth limit {limit} reached")]
    StackOverflow { limit: usize },

    #[error("unknown opcode 0x{opcode:02X} at address {address}")]
    UnknownOpcode { opcode: u8, address: usize },

    #[error("division by zero")]
    DivisionByZero,

    // Host boundary
    #[error("input format error: {0}")]
    InputFormat(String),

    #[error("io error: {0}")]
    Io(String),

    // Assembler
    #[error("line {line}: {message}")]
    Assembly { line: usize, message: String },
}

impl SsmError {
    /// Out-of-bounds error for an access of `width` bytes at `address`.
    pub fn out_of_bounds(address: impl Into<i64>, width: usize, capacity: usize) -> Self {
        SsmError::TapeOutOfBounds {
            address: address.into(),
            width,
            capacity,
        }
    }

    pub(crate) fn assembly(line: usize, message: impl Into<String>) -> Self {
        SsmError::Assembly {
            line,
            message: message.into(),
        }
    }
}

impl From<io::Error> for SsmError {
    fn from(err: io::Error) -> Self {
        SsmError::Io(err.to_string())
    }
}

pub type SsmResult<T> = Result<T, SsmError>;
