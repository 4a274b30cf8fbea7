pub mod flags;
pub mod instructions;
pub mod machine;
pub mod stack;
pub mod table;
pub mod tape;

pub use flags::{JumpCondition, ProcessorFlags};
pub use machine::Machine;
pub use stack::OperandStack;
pub use table::{Handler, OpcodeTable};
pub use tape::Tape;

/// Native machine integer: stack values, addresses and inline operands.
pub type Word = i32;

/// Encoded width of a Word on the tape (little-endian).
pub const WORD_SIZE: usize = std::mem::size_of::<Word>();

/// Pushed by `sin` when the line does not fit the buffer.
pub const SIN_OVERFLOW: Word = Word::MIN;
