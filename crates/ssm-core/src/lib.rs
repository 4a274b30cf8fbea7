//! Simple Stack Machine - Core Library
//!
//! Public API surface for the SSM core: a byte tape shared by code and data,
//! an operand stack of 32-bit Words, and a table-dispatched instruction set.

pub mod error;
pub mod config;
pub mod bytecode;
pub mod vm;
pub mod io;

// Re-export commonly used types
pub use error::{SsmError, SsmResult};
pub use config::{MachineConfig, TAPE_CAPACITY};
pub use bytecode::{assemble, OpCode, ProgramBuilder};
pub use vm::{Machine, Word, WORD_SIZE};
pub use io::{BufferedIo, HostIo};
