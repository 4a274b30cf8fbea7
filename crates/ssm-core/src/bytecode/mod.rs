pub mod assembler;
pub mod builder;
pub mod opcode;

pub use assembler::{assemble, assemble_for_capacity};
pub use builder::{Patch, ProgramBuilder};
pub use opcode::OpCode;
