//! Assembler
//!
//! Turns mnemonic source into a flat program image.
//!
//! # Syntax
//!
//! ```text
//! ; comment (also `#`)
//! start:              ; label, may share a line with an instruction
//!     push 5          ; decimal, 0x hex, 'c' char literal or label
//!     push msg
//!     push 6
//!     sout
//!     call print      ; sugar for `push print` followed by `call`
//!     je start        ; conditional jumps take an inline target
//!     halt
//! .org 900            ; move the emission point
//! msg: .string "Hello!"
//! .word -1            ; raw little-endian Word
//! ```
//!
//! Mnemonics are case-insensitive. `const`, `ret` and `cmp` are aliases of
//! `push`, `return` and `compare`.

use std::collections::HashMap;

use tracing::debug;

use super::builder::ProgramBuilder;
use super::opcode::OpCode;
use crate::error::{SsmError, SsmResult};
use crate::vm::{Word, WORD_SIZE};

/// Assemble `source` into a program image.
pub fn assemble(source: &str) -> SsmResult<Vec<u8>> {
    let items = parse(source)?;
    let layout = layout(&items)?;
    emit(&items, &layout)
}

/// Assemble and reject images that do not fit a tape of `capacity` bytes.
///
/// The image size is known after layout, so an oversized program is
/// rejected before any bytes are emitted.
pub fn assemble_for_capacity(source: &str, capacity: usize) -> SsmResult<Vec<u8>> {
    let items = parse(source)?;
    let layout = layout(&items)?;
    if layout.len > capacity {
        return Err(SsmError::ProgramTooLarge {
            len: layout.len,
            capacity,
        });
    }
    emit(&items, &layout)
}

fn emit(items: &[Item], layout: &Layout) -> SsmResult<Vec<u8>> {
    let labels = &layout.labels;
    let mut builder = ProgramBuilder::new();
    for item in items {
        match &item.kind {
            ItemKind::Label(_) => {}
            ItemKind::Org(address) => {
                builder.set_position(*address);
            }
            ItemKind::Bytes(bytes) => {
                for byte in bytes {
                    builder.byte(*byte);
                }
            }
            ItemKind::Word(operand) => {
                builder.word(resolve(operand, labels, item.line)?);
            }
            ItemKind::Instruction { op, operand } => match operand {
                None => {
                    builder.op(*op);
                }
                Some(operand) => {
                    let value = resolve(operand, labels, item.line)?;
                    if op.operand_width() > 0 {
                        builder.op(*op).word(value);
                    } else {
                        builder.push(value).op(*op);
                    }
                }
            },
        }
    }

    debug!(bytes = builder.len(), labels = labels.len(), "assembled");
    Ok(builder.finish())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Literal(Word),
    Label(String),
}

#[derive(Debug)]
enum ItemKind {
    Label(String),
    Org(usize),
    Bytes(Vec<u8>),
    Word(Operand),
    Instruction { op: OpCode, operand: Option<Operand> },
}

#[derive(Debug)]
struct Item {
    line: usize,
    kind: ItemKind,
}

impl Item {
    fn size(&self) -> usize {
        match &self.kind {
            ItemKind::Label(_) | ItemKind::Org(_) => 0,
            ItemKind::Bytes(bytes) => bytes.len(),
            ItemKind::Word(_) => WORD_SIZE,
            ItemKind::Instruction { op, operand } => match operand {
                // `call x` / `jmp x` expand to `push x` + op
                Some(_) if op.operand_width() == 0 => OpCode::Push.encoded_len() + 1,
                _ => op.encoded_len(),
            },
        }
    }
}

/// Label addresses and image length from the first pass
#[derive(Debug)]
struct Layout {
    labels: HashMap<String, Word>,
    len: usize,
}

/// First pass: assign every label its address and size the image.
fn layout(items: &[Item]) -> SsmResult<Layout> {
    let mut labels = HashMap::new();
    let mut position = 0usize;
    let mut len = 0usize;
    for item in items {
        match &item.kind {
            ItemKind::Org(address) => position = *address,
            ItemKind::Label(name) => {
                let address = Word::try_from(position)
                    .map_err(|_| SsmError::assembly(item.line, "label address out of range"))?;
                if labels.insert(name.clone(), address).is_some() {
                    return Err(SsmError::assembly(item.line, format!("duplicate label `{}`", name)));
                }
            }
            _ => {
                let size = item.size();
                position += size;
                // a move past the end only counts once bytes land there
                if size > 0 {
                    len = len.max(position);
                }
            }
        }
    }
    Ok(Layout { labels, len })
}

fn resolve(operand: &Operand, labels: &HashMap<String, Word>, line: usize) -> SsmResult<Word> {
    match operand {
        Operand::Literal(value) => Ok(*value),
        Operand::Label(name) => labels
            .get(name)
            .copied()
            .ok_or_else(|| SsmError::assembly(line, format!("undefined label `{}`", name))),
    }
}

fn parse(source: &str) -> SsmResult<Vec<Item>> {
    let mut items = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let mut text = strip_comment(raw).trim();

        if let Some((name, rest)) = split_label(text) {
            items.push(Item {
                line,
                kind: ItemKind::Label(name.to_string()),
            });
            text = rest.trim();
        }
        if text.is_empty() {
            continue;
        }

        let (head, rest) = match text.find(char::is_whitespace) {
            Some(split) => (&text[..split], text[split..].trim()),
            None => (text, ""),
        };

        let kind = match head.to_ascii_lowercase().as_str() {
            ".org" => {
                let address = parse_literal(single_operand(rest, line)?, line)?;
                let address = usize::try_from(address)
                    .map_err(|_| SsmError::assembly(line, ".org address must not be negative"))?;
                ItemKind::Org(address)
            }
            ".string" => ItemKind::Bytes(parse_string(rest, line)?),
            ".word" => ItemKind::Word(parse_operand(single_operand(rest, line)?, line)?),
            mnemonic => {
                let op = OpCode::from_mnemonic(mnemonic)
                    .ok_or_else(|| SsmError::assembly(line, format!("unknown mnemonic `{}`", head)))?;
                let operand = if rest.is_empty() {
                    None
                } else {
                    Some(parse_operand(single_operand(rest, line)?, line)?)
                };
                check_arity(op, operand.is_some(), line)?;
                ItemKind::Instruction { op, operand }
            }
        };
        items.push(Item { line, kind });
    }
    Ok(items)
}

fn check_arity(op: OpCode, has_operand: bool, line: usize) -> SsmResult<()> {
    let accepts = op.operand_width() > 0 || matches!(op, OpCode::Call | OpCode::Jmp);
    let requires = op.operand_width() > 0;
    if requires && !has_operand {
        return Err(SsmError::assembly(line, format!("`{}` needs an operand", op.mnemonic())));
    }
    if has_operand && !accepts {
        return Err(SsmError::assembly(line, format!("`{}` takes no operand", op.mnemonic())));
    }
    Ok(())
}

fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                ';' | '#' => return &line[..i],
                _ => {}
            },
        }
    }
    line
}

fn split_label(text: &str) -> Option<(&str, &str)> {
    let colon = text.find(':')?;
    let name = &text[..colon];
    is_identifier(name).then(|| (name, &text[colon + 1..]))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn single_operand(rest: &str, line: usize) -> SsmResult<&str> {
    // char literals may contain a space or comma
    if rest.starts_with('\'') {
        return Ok(rest);
    }
    let mut parts = rest.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty());
    match (parts.next(), parts.next()) {
        (Some(operand), None) => Ok(operand),
        (None, _) => Err(SsmError::assembly(line, "missing operand")),
        (Some(_), Some(_)) => Err(SsmError::assembly(line, "expected a single operand")),
    }
}

fn parse_operand(token: &str, line: usize) -> SsmResult<Operand> {
    if is_identifier(token) {
        return Ok(Operand::Label(token.to_string()));
    }
    parse_literal(token, line).map(Operand::Literal)
}

fn parse_literal(token: &str, line: usize) -> SsmResult<Word> {
    let bad = || SsmError::assembly(line, format!("malformed literal `{}`", token));

    if let Some(body) = token.strip_prefix('\'') {
        let body = body.strip_suffix('\'').ok_or_else(bad)?;
        let bytes = unescape(body, line)?;
        return match bytes.as_slice() {
            [byte] => Ok(Word::from(*byte)),
            _ => Err(bad()),
        };
    }

    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        // hex literals are raw bit patterns: 0xFFFFFFFF is -1
        Some(hex) => u32::from_str_radix(hex, 16).map(|v| v as Word).map_err(|_| bad())?,
        None => {
            let value = digits.parse::<i64>().map_err(|_| bad())?;
            let value = if negative { -value } else { value };
            return Word::try_from(value).map_err(|_| bad());
        }
    };
    Ok(if negative { magnitude.wrapping_neg() } else { magnitude })
}

fn parse_string(rest: &str, line: usize) -> SsmResult<Vec<u8>> {
    let body = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .ok_or_else(|| SsmError::assembly(line, ".string expects a quoted literal"))?;
    unescape(body, line)
}

fn unescape(body: &str, line: usize) -> SsmResult<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        let c = if c == '\\' {
            match chars.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('0') => '\0',
                Some('\\') => '\\',
                Some('"') => '"',
                Some('\'') => '\'',
                other => {
                    return Err(SsmError::assembly(line, format!("unknown escape `\\{}`", other.unwrap_or(' '))))
                }
            }
        } else {
            c
        };
        let byte = u8::try_from(c)
            .map_err(|_| SsmError::assembly(line, format!("character {:?} is not 8-bit text", c)))?;
        out.push(byte);
    }
    Ok(out)
}
