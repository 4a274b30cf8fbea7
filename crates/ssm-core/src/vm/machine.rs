//! Virtual Machine Core
//!
//! Owns tape, operand stack, flags, instruction pointer and halt flag, and
//! runs the fetch-decode-execute loop.
//!
//! Instruction behaviors are self-advancing: the loop fetches and dispatches
//! but never moves the pointer. Each behavior checks everything it needs
//! (tape reserve, stack depth, addresses) before its first mutation and then
//! leaves the pointer exactly past its opcode and inline operands, or at its
//! jump target.

use std::fmt;

use tracing::{debug, trace};

use crate::bytecode::opcode::OpCode;
use crate::config::MachineConfig;
use crate::error::{SsmError, SsmResult};
use crate::io::HostIo;

use super::flags::ProcessorFlags;
use super::stack::OperandStack;
use super::table::OpcodeTable;
use super::tape::Tape;
use super::{Word, WORD_SIZE};

/// Stack machine bound to a host I/O collaborator
pub struct Machine<H> {
    config: MachineConfig,
    tape: Tape,
    stack: OperandStack,
    flags: ProcessorFlags,
    ip: usize,
    halted: bool,
    steps: u64,
    host: H,
    table: OpcodeTable<H>,
}

impl<H: HostIo> Machine<H> {
    /// Create a new machine with an empty (zeroed) tape
    pub fn new(config: MachineConfig, host: H) -> Self {
        Machine {
            tape: Tape::new(config.tape_capacity),
            stack: OperandStack::new(config.max_stack_depth),
            flags: ProcessorFlags::new(),
            ip: 0,
            halted: false,
            steps: 0,
            host,
            table: OpcodeTable::new(),
            config,
        }
    }

    /// Default limits with a tape of `tape_capacity` bytes
    pub fn with_capacity(tape_capacity: usize, host: H) -> Self {
        Self::new(MachineConfig::with_tape_capacity(tape_capacity), host)
    }

    /// Copy `program` to address 0 and reset execution state.
    ///
    /// A program larger than the tape is rejected and the tape keeps its
    /// previous contents.
    pub fn load(&mut self, program: &[u8]) -> SsmResult<()> {
        self.tape.reload(program)?;
        self.stack.clear();
        self.flags.clear_all();
        self.ip = 0;
        self.halted = false;
        self.steps = 0;
        debug!(len = program.len(), capacity = self.tape.capacity(), "program loaded");
        Ok(())
    }

    /// Execute until `halt` or the first error
    pub fn run(&mut self) -> SsmResult<()> {
        debug!(ip = self.ip, "run started");
        while !self.halted {
            if let Err(err) = self.step() {
                debug!(ip = self.ip, steps = self.steps, %err, "run aborted");
                return Err(err);
            }
        }
        debug!(ip = self.ip, steps = self.steps, depth = self.stack.depth(), "halted");
        Ok(())
    }

    /// Execute exactly one instruction
    pub fn step(&mut self) -> SsmResult<()> {
        let address = self.ip;
        let opcode = self.tape.read_byte(address)?;
        let handler = self
            .table
            .lookup(opcode)
            .ok_or(SsmError::UnknownOpcode { opcode, address })?;

        trace!(
            address,
            op = OpCode::from_u8(opcode).map_or("?", OpCode::mnemonic),
            depth = self.stack.depth(),
            "step"
        );

        handler(self)?;
        self.steps += 1;
        Ok(())
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Instructions completed since the last load
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    pub fn flags(&self) -> &ProcessorFlags {
        &self.flags
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    // Primitives used by instruction behaviors.

    /// Fail unless `width` bytes (opcode plus inline operands) remain at the pointer.
    pub(crate) fn reserve(&self, width: usize) -> SsmResult<()> {
        self.tape.check(self.ip, width)
    }

    pub(crate) fn advance(&mut self, width: usize) {
        self.ip += width;
    }

    /// Inline Word immediately after the current opcode byte
    pub(crate) fn inline_word(&self) -> SsmResult<Word> {
        self.tape.read_word(self.ip + 1)
    }

    /// Validate a jump destination without moving the pointer.
    pub(crate) fn jump_target(&self, target: Word) -> SsmResult<usize> {
        self.tape.resolve(target, 1)
    }

    pub(crate) fn jump_to(&mut self, address: usize) {
        self.ip = address;
    }

    /// Address of the byte after a `width`-byte instruction at the pointer, as a Word.
    pub(crate) fn address_after(&self, width: usize) -> SsmResult<Word> {
        let next = self.ip + width;
        Word::try_from(next).map_err(|_| {
            SsmError::out_of_bounds(i64::try_from(next).unwrap_or(i64::MAX), WORD_SIZE, self.tape.capacity())
        })
    }

    pub(crate) fn stack_mut(&mut self) -> &mut OperandStack {
        &mut self.stack
    }

    pub(crate) fn tape_mut(&mut self) -> &mut Tape {
        &mut self.tape
    }

    pub(crate) fn flags_mut(&mut self) -> &mut ProcessorFlags {
        &mut self.flags
    }

    pub(crate) fn request_halt(&mut self) {
        self.halted = true;
    }
}

impl<H> fmt::Debug for Machine<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("ip", &self.ip)
            .field("halted", &self.halted)
            .field("steps", &self.steps)
            .field("stack", &self.stack.as_slice())
            .field("flags", &self.flags)
            .field("tape_capacity", &self.tape.capacity())
            .finish_non_exhaustive()
    }
}
