use std::fmt::Display;
use std::io::{self, Read, Write};

use crate::dispatch::Dispatcher;
use crate::line_reader::LineReader;
use crate::session::Session;
use crate::tokenizer::tokenize;

/// The read loop: prompt, read a line, run it, repeat until end of input or `exit`.
pub struct Shell<O: Write, E: Write> {
    dispatcher: Dispatcher,
    session: Session,
    output: O,
    errors: E,
}

impl Shell<io::Stdout, io::Stderr> {
    pub fn with_stdio(dispatcher: Dispatcher, session: Session) -> Self {
        Self::new(dispatcher, session, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Shell<O, E> {
    pub fn new(dispatcher: Dispatcher, session: Session, output: O, errors: E) -> Self {
        Self {
            dispatcher,
            session,
            output,
            errors,
        }
    }

    pub fn repl<R: Read>(&mut self, input: R) -> anyhow::Result<()> {
        let mut reader = LineReader::new(input);

        self.print()?;
        loop {
            match reader.read_line() {
                Ok(Some(line)) => self.eval(&line)?,
                Ok(None) => break,
                // the reader skips the rest of the offending line on the next call
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    self.session.last_status = 1;
                    self.report(&err)?;
                }
                Err(err) => return Err(err.into()),
            }
            if self.session.should_exit {
                log::debug!("exit requested at line {}", self.session.line_number);
                break;
            }

            self.session.line_number += 1;
            self.print()?;
        }

        Ok(())
    }

    /// Runs one line. Command failures are reported and recorded, never returned.
    pub fn eval(&mut self, line: &str) -> io::Result<()> {
        let tokens = tokenize(line);

        let result = self
            .dispatcher
            .dispatch_to(&mut self.session, &tokens, &mut self.output);
        match result {
            Ok(outcome) => {
                self.session.last_status = outcome.status();
            }
            Err(err) => {
                log::debug!("line {}: {err:?}", self.session.line_number);
                self.session.last_status = err.status();
                if !err.reported_by_child() {
                    self.report(&err)?;
                }
            }
        }

        Ok(())
    }

    fn report(&mut self, err: &dyn Display) -> io::Result<()> {
        writeln!(self.errors, "{err}")?;
        self.errors.flush()
    }

    fn print(&mut self) -> io::Result<()> {
        if !self.session.interactive {
            return Ok(());
        }

        write!(self.output, "{}: ", self.session.line_number)?;
        self.output.flush()
    }
}
