//! Bytecode Opcode Definitions
//!
//! Defines the opcode set of the stack machine.
//! This file contains no execution semantics.
//! Opcode values are a stable contract shared with every program encoder.

use crate::vm::WORD_SIZE;

/// Bytecode opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Nop = 0x00,

    // Stack and tape
    Push  = 0x01,
    Pop   = 0x02,
    Test  = 0x03,
    Load  = 0x04,
    Store = 0x05,

    // Arithmetic
    Add = 0x06,
    Sub = 0x07,
    Mul = 0x08,
    Div = 0x09,
    Mod = 0x0A,

    // Procedures
    Call   = 0x0B,
    Return = 0x0C,

    Dup     = 0x0D,
    Swap    = 0x0E,
    Compare = 0x0F,

    // Control flow
    Jmp = 0x10,
    Jz  = 0x11,
    Jnz = 0x12,
    Jbz = 0x13,
    Jaz = 0x14,

    // Host I/O
    Iout = 0x15,
    Sout = 0x16,
    Iin  = 0x17,
    Sin  = 0x18,

    // Flag jumps
    Jl  = 0xF0,
    Jle = 0xF1,
    Je  = 0xF2,
    Jne = 0xF3,
    Ja  = 0xF4,
    Jae = 0xF5,

    Halt = 0xFF,
}

impl OpCode {
    /// Every opcode, in byte order.
    pub const ALL: [OpCode; 32] = [
        OpCode::Nop,
        OpCode::Push,
        OpCode::Pop,
        OpCode::Test,
        OpCode::Load,
        OpCode::Store,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mul,
        OpCode::Div,
        OpCode::Mod,
        OpCode::Call,
        OpCode::Return,
        OpCode::Dup,
        OpCode::Swap,
        OpCode::Compare,
        OpCode::Jmp,
        OpCode::Jz,
        OpCode::Jnz,
        OpCode::Jbz,
        OpCode::Jaz,
        OpCode::Iout,
        OpCode::Sout,
        OpCode::Iin,
        OpCode::Sin,
        OpCode::Jl,
        OpCode::Jle,
        OpCode::Je,
        OpCode::Jne,
        OpCode::Ja,
        OpCode::Jae,
        OpCode::Halt,
    ];

    /// Convert raw byte to opcode
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(OpCode::Nop),
            0x01 => Some(OpCode::Push),
            0x02 => Some(OpCode::Pop),
            0x03 => Some(OpCode::Test),
            0x04 => Some(OpCode::Load),
            0x05 => Some(OpCode::Store),

            0x06 => Some(OpCode::Add),
            0x07 => Some(OpCode::Sub),
            0x08 => Some(OpCode::Mul),
            0x09 => Some(OpCode::Div),
            0x0A => Some(OpCode::Mod),

            0x0B => Some(OpCode::Call),
            0x0C => Some(OpCode::Return),
            0x0D => Some(OpCode::Dup),
            0x0E => Some(OpCode::Swap),
            0x0F => Some(OpCode::Compare),

            0x10 => Some(OpCode::Jmp),
            0x11 => Some(OpCode::Jz),
            0x12 => Some(OpCode::Jnz),
            0x13 => Some(OpCode::Jbz),
            0x14 => Some(OpCode::Jaz),

            0x15 => Some(OpCode::Iout),
            0x16 => Some(OpCode::Sout),
            0x17 => Some(OpCode::Iin),
            0x18 => Some(OpCode::Sin),

            0xF0 => Some(OpCode::Jl),
            0xF1 => Some(OpCode::Jle),
            0xF2 => Some(OpCode::Je),
            0xF3 => Some(OpCode::Jne),
            0xF4 => Some(OpCode::Ja),
            0xF5 => Some(OpCode::Jae),

            0xFF => Some(OpCode::Halt),

            _ => None,
        }
    }

    /// Assembly mnemonic
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Nop => "nop",
            OpCode::Push => "push",
            OpCode::Pop => "pop",
            OpCode::Test => "test",
            OpCode::Load => "load",
            OpCode::Store => "store",
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Mod => "mod",
            OpCode::Call => "call",
            OpCode::Return => "return",
            OpCode::Dup => "dup",
            OpCode::Swap => "swap",
            OpCode::Compare => "compare",
            OpCode::Jmp => "jmp",
            OpCode::Jz => "jz",
            OpCode::Jnz => "jnz",
            OpCode::Jbz => "jbz",
            OpCode::Jaz => "jaz",
            OpCode::Iout => "iout",
            OpCode::Sout => "sout",
            OpCode::Iin => "iin",
            OpCode::Sin => "sin",
            OpCode::Jl => "jl",
            OpCode::Jle => "jle",
            OpCode::Je => "je",
            OpCode::Jne => "jne",
            OpCode::Ja => "ja",
            OpCode::Jae => "jae",
            OpCode::Halt => "halt",
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive).
    ///
    /// `const` is accepted as an alias of `push`, `ret` of `return` and
    /// `cmp` of `compare`; aliases encode to the same byte.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "const" => return Some(OpCode::Push),
            "ret" => return Some(OpCode::Return),
            "cmp" => return Some(OpCode::Compare),
            _ => {}
        }
        OpCode::ALL.iter().copied().find(|op| op.mnemonic() == lower)
    }

    /// Number of inline operand bytes following the opcode byte.
    pub fn operand_width(self) -> usize {
        match self {
            OpCode::Push
            | OpCode::Jz
            | OpCode::Jnz
            | OpCode::Jbz
            | OpCode::Jaz
            | OpCode::Jl
            | OpCode::Jle
            | OpCode::Je
            | OpCode::Jne
            | OpCode::Ja
            | OpCode::Jae => WORD_SIZE,
            _ => 0,
        }
    }

    /// Full encoded length: opcode byte plus inline operands.
    pub fn encoded_len(self) -> usize {
        1 + self.operand_width()
    }

    /// True for the conditional jumps that carry an inline target.
    pub fn is_conditional_jump(self) -> bool {
        matches!(
            self,
            OpCode::Jz
                | OpCode::Jnz
                | OpCode::Jbz
                | OpCode::Jaz
                | OpCode::Jl
                | OpCode::Jle
                | OpCode::Je
                | OpCode::Jne
                | OpCode::Ja
                | OpCode::Jae
        )
    }
}
