//! Instruction Set
//!
//! One behavior per opcode. Stack operands are named in pop order reversed:
//! for `a OP b`, `b` is the top of the stack and `a` the value beneath it.
//!
//! Every behavior runs its checks (tape reserve, stack depth, addresses,
//! host I/O) before it mutates anything, then advances the pointer past
//! itself. A jump sets the pointer only after every check has passed.
//!
//! `call` keeps its return address on the operand stack. A callee that
//! leaves extra values above it, or pops it, returns to the wrong place.

use crate::bytecode::opcode::OpCode;
use crate::error::{SsmError, SsmResult};
use crate::io::HostIo;

use super::flags::JumpCondition;
use super::machine::Machine;
use super::table::Handler;
use super::{Word, SIN_OVERFLOW, WORD_SIZE};

/// Behavior for `op`
pub(crate) fn handler<H: HostIo>(op: OpCode) -> Handler<H> {
    match op {
        OpCode::Nop => nop::<H>,
        OpCode::Push => push::<H>,
        OpCode::Pop => pop::<H>,
        OpCode::Test => test::<H>,
        OpCode::Load => load::<H>,
        OpCode::Store => store::<H>,
        OpCode::Add => add::<H>,
        OpCode::Sub => sub::<H>,
        OpCode::Mul => mul::<H>,
        OpCode::Div => div::<H>,
        OpCode::Mod => modulo::<H>,
        OpCode::Call => call::<H>,
        OpCode::Return => ret::<H>,
        OpCode::Dup => dup::<H>,
        OpCode::Swap => swap::<H>,
        OpCode::Compare => compare::<H>,
        OpCode::Jmp => jmp::<H>,
        OpCode::Jz => jz::<H>,
        OpCode::Jnz => jnz::<H>,
        OpCode::Jbz => jbz::<H>,
        OpCode::Jaz => jaz::<H>,
        OpCode::Iout => iout::<H>,
        OpCode::Sout => sout::<H>,
        OpCode::Iin => iin::<H>,
        OpCode::Sin => sin::<H>,
        OpCode::Jl => jl::<H>,
        OpCode::Jle => jle::<H>,
        OpCode::Je => je::<H>,
        OpCode::Jne => jne::<H>,
        OpCode::Ja => ja::<H>,
        OpCode::Jae => jae::<H>,
        OpCode::Halt => halt::<H>,
    }
}

const OPCODE: usize = 1;
const OPCODE_AND_WORD: usize = 1 + WORD_SIZE;

// Stack and tape

fn nop<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    m.advance(OPCODE);
    Ok(())
}

fn push<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE_AND_WORD)?;
    let value = m.inline_word()?;
    m.stack_mut().push(value)?;
    m.advance(OPCODE_AND_WORD);
    Ok(())
}

fn pop<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    m.stack_mut().pop()?;
    m.advance(OPCODE);
    Ok(())
}

fn dup<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let top = m.stack().peek()?;
    m.stack_mut().push(top)?;
    m.advance(OPCODE);
    Ok(())
}

fn swap<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    m.stack_mut().swap_top()?;
    m.advance(OPCODE);
    Ok(())
}

fn load<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let address = m.stack().peek()?;
    let address = m.tape().resolve(address, WORD_SIZE)?;
    let value = m.tape().read_word(address)?;

    let stack = m.stack_mut();
    stack.pop()?;
    stack.push(value)?;
    m.advance(OPCODE);
    Ok(())
}

fn store<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let value = m.stack().peek_at(0)?;
    let address = m.stack().peek_at(1)?;
    let address = m.tape().resolve(address, WORD_SIZE)?;

    m.tape_mut().write_word(address, value)?;
    m.stack_mut().discard(2)?;
    m.advance(OPCODE);
    Ok(())
}

// Arithmetic

/// Replace `a b` with `f(a, b)`.
fn arithmetic<H: HostIo>(
    m: &mut Machine<H>,
    f: fn(Word, Word) -> SsmResult<Word>,
) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let b = m.stack().peek_at(0)?;
    let a = m.stack().peek_at(1)?;
    let result = f(a, b)?;

    let stack = m.stack_mut();
    stack.discard(2)?;
    stack.push(result)?;
    m.advance(OPCODE);
    Ok(())
}

fn add<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    arithmetic(m, |a, b| Ok(a.wrapping_add(b)))
}

fn sub<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    arithmetic(m, |a, b| Ok(a.wrapping_sub(b)))
}

fn mul<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    arithmetic(m, |a, b| Ok(a.wrapping_mul(b)))
}

// Truncates toward zero; `MIN / -1` wraps to `MIN`.
fn div<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    arithmetic(m, |a, b| {
        if b == 0 {
            return Err(SsmError::DivisionByZero);
        }
        Ok(a.wrapping_div(b))
    })
}

// Remainder takes the sign of the dividend.
fn modulo<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    arithmetic(m, |a, b| {
        if b == 0 {
            return Err(SsmError::DivisionByZero);
        }
        Ok(a.wrapping_rem(b))
    })
}

// Comparison

fn compare<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let b = m.stack().peek_at(0)?;
    let a = m.stack().peek_at(1)?;
    m.stack_mut().discard(2)?;
    m.flags_mut().record_comparison(a, b);
    m.advance(OPCODE);
    Ok(())
}

fn test<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let a = m.stack_mut().pop()?;
    m.flags_mut().record_test(a);
    m.advance(OPCODE);
    Ok(())
}

// Control flow

/// Pop a destination from the stack and jump to it.
fn jmp<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let target = m.stack().peek()?;
    let target = m.jump_target(target)?;
    m.stack_mut().pop()?;
    m.advance(OPCODE);
    m.jump_to(target);
    Ok(())
}

/// Jump to the inline target if `condition` holds, else fall through.
fn conditional_jump<H: HostIo>(m: &mut Machine<H>, condition: JumpCondition) -> SsmResult<()> {
    m.reserve(OPCODE_AND_WORD)?;
    let target = m.inline_word()?;
    let destination = if condition.holds(m.flags()) {
        Some(m.jump_target(target)?)
    } else {
        None
    };

    m.advance(OPCODE_AND_WORD);
    if let Some(address) = destination {
        m.jump_to(address);
    }
    Ok(())
}

fn jz<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::Zero)
}

fn jnz<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::NotZero)
}

fn jbz<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::BelowZero)
}

fn jaz<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::AboveZero)
}

fn jl<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::Below)
}

fn jle<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::BelowOrEqual)
}

fn je<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::Equal)
}

fn jne<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::NotEqual)
}

fn ja<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::Above)
}

fn jae<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    conditional_jump(m, JumpCondition::AboveOrEqual)
}

// Procedures

/// Replace the target on top of the stack with the return address, then jump.
fn call<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let target = m.stack().peek()?;
    let target = m.jump_target(target)?;
    let return_address = m.address_after(OPCODE)?;

    let stack = m.stack_mut();
    stack.pop()?;
    stack.push(return_address)?;
    m.advance(OPCODE);
    m.jump_to(target);
    Ok(())
}

fn ret<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let return_address = m.stack().peek()?;
    let return_address = m.jump_target(return_address)?;
    m.stack_mut().pop()?;
    m.advance(OPCODE);
    m.jump_to(return_address);
    Ok(())
}

// Host I/O

fn iout<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let value = m.stack().peek()?;
    m.host_mut().write_integer(value)?;
    m.stack_mut().pop()?;
    m.advance(OPCODE);
    Ok(())
}

/// Print `length` tape bytes starting at `start`: `start length sout`.
fn sout<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let length = m.stack().peek_at(0)?;
    let start = m.stack().peek_at(1)?;
    let capacity = m.tape().capacity();
    let length = usize::try_from(length)
        .map_err(|_| SsmError::out_of_bounds(start, 0, capacity))?;
    let start = m.tape().resolve(start, length)?;
    let text = decode_text(m.tape().read_bytes(start, length)?);

    m.host_mut().write_text(&text)?;
    m.stack_mut().discard(2)?;
    m.advance(OPCODE);
    Ok(())
}

fn iin<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    m.stack().require_room(1)?;
    let value = m.host_mut().read_integer()?;
    m.stack_mut().push(value)?;
    m.advance(OPCODE);
    Ok(())
}

/// Read a line into `dest`: `dest capacity sin` leaves the line length, or
/// [`SIN_OVERFLOW`] with the tape untouched when the line exceeds `capacity`.
fn sin<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    let capacity = m.stack().peek_at(0)?;
    let dest = m.stack().peek_at(1)?;
    m.tape().resolve(dest, 0)?;

    let line = m.host_mut().read_line()?;
    let bytes = encode_text(&line)?;
    let fits = Word::try_from(bytes.len()).map_or(false, |len| len <= capacity);

    let outcome = if fits {
        let dest = m.tape().resolve(dest, bytes.len())?;
        m.tape_mut().write_bytes(dest, &bytes)?;
        bytes.len() as Word
    } else {
        SIN_OVERFLOW
    };

    let stack = m.stack_mut();
    stack.discard(2)?;
    stack.push(outcome)?;
    m.advance(OPCODE);
    Ok(())
}

fn halt<H: HostIo>(m: &mut Machine<H>) -> SsmResult<()> {
    m.reserve(OPCODE)?;
    m.advance(OPCODE);
    m.request_halt();
    Ok(())
}

/// Tape bytes are 8-bit text: each byte is the code point of the same value.
fn decode_text(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

fn encode_text(line: &str) -> SsmResult<Vec<u8>> {
    line.chars()
        .map(|c| {
            u8::try_from(c).map_err(|_| {
                SsmError::InputFormat(format!("character {:?} is not 8-bit text", c))
            })
        })
        .collect()
}
