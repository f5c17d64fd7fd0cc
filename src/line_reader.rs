use std::io::{self, Read};
use std::mem;

use bytes::{Buf, BytesMut};

const CHUNK: usize = 4096;

/// Longest accepted line, terminator excluded.
pub const MAX_LINE: usize = 4096;

/// Reads newline-terminated lines from any byte source.
///
/// Invalid UTF-8 is replaced rather than rejected, and the line terminator (`\n` or
/// `\r\n`) is stripped. A final line without a terminator is still returned.
pub struct LineReader<R> {
    input: R,
    buffer: BytesMut,
    // bytes of `buffer` already known to hold no newline
    scanned: usize,
    max_line: usize,
    // inside an overlong line that was already reported
    skipping: bool,
    eof: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(input: R) -> Self {
        Self::with_limit(input, MAX_LINE)
    }

    pub fn with_limit(input: R, max_line: usize) -> Self {
        Self {
            input,
            buffer: BytesMut::with_capacity(CHUNK),
            scanned: 0,
            max_line,
            skipping: false,
            eof: false,
        }
    }

    /// `Ok(None)` once the input is exhausted.
    ///
    /// A line longer than the limit fails with [`io::ErrorKind::InvalidData`] once; the
    /// rest of it is discarded and the next call continues with the following line.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            let unscanned = &self.buffer[self.scanned..];
            if let Some(offset) = unscanned.iter().position(|&byte| byte == b'\n') {
                let end = self.scanned + offset;
                self.scanned = 0;
                let mut line = self.buffer.split_to(end + 1);

                if mem::take(&mut self.skipping) {
                    continue;
                }
                if end > self.max_line {
                    return Err(self.overlong());
                }
                line.truncate(end);
                return Ok(Some(decode(line)));
            }
            self.scanned = self.buffer.len();

            if self.buffer.len() > self.max_line {
                self.buffer.clear();
                self.scanned = 0;
                if !mem::replace(&mut self.skipping, true) {
                    return Err(self.overlong());
                }
            }

            if self.eof {
                self.scanned = 0;
                if mem::take(&mut self.skipping) || self.buffer.is_empty() {
                    self.buffer.clear();
                    return Ok(None);
                }
                let line = self.buffer.split();
                return Ok(Some(decode(line)));
            }

            self.fill()?;
        }
    }

    fn overlong(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line longer than {} bytes", self.max_line),
        )
    }

    fn fill(&mut self) -> io::Result<()> {
        let start = self.buffer.len();
        self.buffer.resize(start + CHUNK, 0);

        let read = loop {
            match self.input.read(&mut self.buffer[start..]) {
                Ok(read) => break read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buffer.truncate(start);
                    return Err(err);
                }
            }
        };

        self.buffer.truncate(start + read);
        self.eof = read == 0;
        Ok(())
    }
}

fn decode(mut line: BytesMut) -> String {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }

    String::from_utf8_lossy(line.chunk()).into_owned()
}
