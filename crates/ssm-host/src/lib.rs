//! Host crate: stream-backed I/O for the SSM core
//!
//! Adapts any `BufRead` / `Write` pair to the core's `HostIo` capability.
//! The machine stays console-agnostic; this crate is where bytes meet a
//! terminal, a file or a pipe.

use std::io::{self, BufRead, Stdin, Stdout, Write};

use tracing::trace;

pub use ssm_core::{HostIo, SsmError, SsmResult, Word};

/// `HostIo` over a reader and a writer
#[derive(Debug)]
pub struct StreamIo<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StreamIo<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        StreamIo { reader, writer }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Next line without its terminator; `None` at end of input.
    ///
    /// Bytes are taken as 8-bit text, one character per byte, so any input
    /// the tape can hold reads back unchanged.
    fn next_line(&mut self) -> SsmResult<Option<String>> {
        let mut bytes = Vec::new();
        let read = self.reader.read_until(b'\n', &mut bytes)?;
        if read == 0 {
            return Ok(None);
        }
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }
        trace!(len = bytes.len(), "line read");
        Ok(Some(bytes.iter().map(|&b| char::from(b)).collect()))
    }
}

/// Console host over stdin / stdout
pub type ConsoleIo = StreamIo<io::BufReader<Stdin>, Stdout>;

/// Host bound to the process console
pub fn console() -> ConsoleIo {
    StreamIo::new(io::BufReader::new(io::stdin()), io::stdout())
}

impl<R: BufRead, W: Write> HostIo for StreamIo<R, W> {
    fn read_integer(&mut self) -> SsmResult<Word> {
        // Prompts written with `sout` must be visible before blocking.
        self.writer.flush()?;
        match self.next_line()? {
            Some(line) => ssm_core::io::parse_integer(&line),
            None => Err(SsmError::InputFormat("end of input while reading an integer".to_string())),
        }
    }

    fn read_line(&mut self) -> SsmResult<String> {
        self.writer.flush()?;
        self.next_line()?
            .ok_or_else(|| SsmError::InputFormat("end of input while reading a line".to_string()))
    }

    fn write_integer(&mut self, value: Word) -> SsmResult<()> {
        write!(self.writer, "{}", value)?;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> SsmResult<()> {
        // Tape text goes out byte for byte; anything wider falls back to UTF-8.
        match text.chars().map(u8::try_from).collect::<Result<Vec<u8>, _>>() {
            Ok(bytes) => self.writer.write_all(&bytes)?,
            Err(_) => self.writer.write_all(text.as_bytes())?,
        }
        Ok(())
    }
}

impl<R, W: Write> StreamIo<R, W> {
    pub fn flush(&mut self) -> SsmResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
