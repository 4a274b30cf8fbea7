//! Host I/O boundary
//!
//! The machine never touches a console. `iin`/`sin` read and `iout`/`sout`
//! write through a [`HostIo`] implementation supplied by the embedder.

use std::collections::VecDeque;

use crate::error::{SsmError, SsmResult};
use crate::vm::Word;

/// Capability the machine needs from its host
pub trait HostIo {
    /// Read one integer; `InputFormat` if the input is not a Word.
    fn read_integer(&mut self) -> SsmResult<Word>;

    /// Read one line of text without its line terminator.
    fn read_line(&mut self) -> SsmResult<String>;

    fn write_integer(&mut self, value: Word) -> SsmResult<()>;

    fn write_text(&mut self, text: &str) -> SsmResult<()>;
}

impl<T: HostIo + ?Sized> HostIo for &mut T {
    fn read_integer(&mut self) -> SsmResult<Word> {
        (**self).read_integer()
    }

    fn read_line(&mut self) -> SsmResult<String> {
        (**self).read_line()
    }

    fn write_integer(&mut self, value: Word) -> SsmResult<()> {
        (**self).write_integer(value)
    }

    fn write_text(&mut self, text: &str) -> SsmResult<()> {
        (**self).write_text(text)
    }
}

impl<T: HostIo + ?Sized> HostIo for Box<T> {
    fn read_integer(&mut self) -> SsmResult<Word> {
        (**self).read_integer()
    }

    fn read_line(&mut self) -> SsmResult<String> {
        (**self).read_line()
    }

    fn write_integer(&mut self, value: Word) -> SsmResult<()> {
        (**self).write_integer(value)
    }

    fn write_text(&mut self, text: &str) -> SsmResult<()> {
        (**self).write_text(text)
    }
}

/// Parse a host-supplied line as a decimal Word.
pub fn parse_integer(line: &str) -> SsmResult<Word> {
    let trimmed = line.trim();
    trimmed
        .parse::<Word>()
        .map_err(|_| SsmError::InputFormat(format!("expected an integer, got {:?}", trimmed)))
}

/// In-memory host: scripted input lines, captured output.
#[derive(Debug, Default, Clone)]
pub struct BufferedIo {
    input: VecDeque<String>,
    output: String,
}

impl BufferedIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose input yields `lines` in order
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BufferedIo {
            input: lines.into_iter().map(Into::into).collect(),
            output: String::new(),
        }
    }

    pub fn push_input(&mut self, line: impl Into<String>) {
        self.input.push_back(line.into());
    }

    /// Everything written so far
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn next_line(&mut self) -> SsmResult<String> {
        self.input
            .pop_front()
            .ok_or_else(|| SsmError::InputFormat("input exhausted".to_string()))
    }
}

impl HostIo for BufferedIo {
    fn read_integer(&mut self) -> SsmResult<Word> {
        let line = self.next_line()?;
        parse_integer(&line)
    }

    fn read_line(&mut self) -> SsmResult<String> {
        self.next_line()
    }

    fn write_integer(&mut self, value: Word) -> SsmResult<()> {
        self.output.push_str(&value.to_string());
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> SsmResult<()> {
        self.output.push_str(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_integers() {
        assert_eq!(parse_integer(" -42\n"), Ok(-42));
        assert!(matches!(parse_integer("4x"), Err(SsmError::InputFormat(_))));
        assert!(matches!(parse_integer("99999999999"), Err(SsmError::InputFormat(_))));
    }

    #[test]
    fn buffered_io_scripts_and_captures() {
        let mut io = BufferedIo::with_input(["7", "hello"]);
        assert_eq!(io.read_integer(), Ok(7));
        assert_eq!(io.read_line(), Ok("hello".to_string()));
        assert!(io.read_line().is_err());
        io.write_integer(-3).expect("write failed");
        io.write_text(" ok").expect("write failed");
        assert_eq!(io.take_output(), "-3 ok");
        assert_eq!(io.output(), "");
    }
}
