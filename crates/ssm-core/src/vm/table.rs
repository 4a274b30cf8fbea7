//! Opcode Table
//!
//! Fixed byte-to-behavior mapping, built once per machine from the
//! exhaustive opcode enumeration.

use std::fmt;

use crate::bytecode::opcode::OpCode;
use crate::io::HostIo;

use super::instructions;
use super::machine::Machine;

/// Instruction behavior
pub type Handler<H> = fn(&mut Machine<H>) -> crate::error::SsmResult<()>;

pub struct OpcodeTable<H> {
    handlers: [Option<Handler<H>>; 256],
}

impl<H: HostIo> OpcodeTable<H> {
    pub fn new() -> Self {
        let mut handlers: [Option<Handler<H>>; 256] = [None; 256];
        for op in OpCode::ALL {
            handlers[op as usize] = Some(instructions::handler::<H>(op));
        }
        OpcodeTable { handlers }
    }
}

impl<H: HostIo> Default for OpcodeTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> OpcodeTable<H> {
    pub fn lookup(&self, opcode: u8) -> Option<Handler<H>> {
        self.handlers[opcode as usize]
    }

    /// Number of registered opcodes
    pub fn len(&self) -> usize {
        self.handlers.iter().filter(|h| h.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H> fmt::Debug for OpcodeTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpcodeTable")
            .field("registered", &self.len())
            .finish()
    }
}
