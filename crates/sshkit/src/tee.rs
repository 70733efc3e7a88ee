//! Fan-out writer.

use std::io::{self, Write};

/// Writes every byte to two sinks.
///
/// Used to show remote stdout live while also keeping a copy of it,
/// since the channel stream cannot be read twice.
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    /// Create a tee over two writers.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Recover both writers.
    pub fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}
