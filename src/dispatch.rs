use std::io::{self, Write};
use std::path::PathBuf;

use crate::argv::{ArgVector, Argv0};
use crate::bin_path;
use crate::builtin::{Builtin, BuiltinCall, Builtins};
use crate::runner::{self, ExitOutcome};
use crate::session::Session;
use crate::tokenizer::Tokens;
use crate::{ExitCode, ShellError};

pub const PATH_SEPARATOR: char = '/';

/// How the first word of a command line will be run.
#[derive(Debug, Clone)]
pub enum Resolved {
    BuiltIn(Builtin),
    /// The command already names a file, relative or absolute.
    DirectPath(PathBuf),
    /// Found by walking `PATH`.
    SearchedPath(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    NoOp,
    BuiltIn(ExitCode),
    External(ExitOutcome),
}

impl DispatchOutcome {
    pub fn status(&self) -> ExitCode {
        match self {
            DispatchOutcome::NoOp => 0,
            DispatchOutcome::BuiltIn(code) => *code,
            DispatchOutcome::External(outcome) => outcome.code(),
        }
    }
}

/// Resolution order: a name containing `/` is used as is, then builtins, then `PATH`.
pub fn classify(builtins: &Builtins, session: &Session, command: &str) -> Option<Resolved> {
    if command.contains(PATH_SEPARATOR) {
        return Some(Resolved::DirectPath(PathBuf::from(command)));
    }

    if let Some(builtin) = builtins.get(command) {
        return Some(Resolved::BuiltIn(*builtin));
    }

    bin_path::resolve_from(session.cwd(), command, session.var("PATH")).map(Resolved::SearchedPath)
}

pub struct Dispatcher {
    builtins: Builtins,
    argv0: Argv0,
}

impl Dispatcher {
    pub fn new(builtins: Builtins, argv0: Argv0) -> Self {
        Self { builtins, argv0 }
    }

    /// Runs one command line with builtin output going to stdout.
    pub fn dispatch(
        &self,
        session: &mut Session,
        tokens: &Tokens,
    ) -> Result<DispatchOutcome, ShellError> {
        self.dispatch_to(session, tokens, &mut io::stdout().lock())
    }

    /// Runs one command line, blocking until it finishes. Nothing is shared between
    /// calls: the same tokens twice mean two independent runs.
    pub fn dispatch_to(
        &self,
        session: &mut Session,
        tokens: &Tokens,
        out: &mut dyn Write,
    ) -> Result<DispatchOutcome, ShellError> {
        let Some(command) = tokens.command() else {
            return Ok(DispatchOutcome::NoOp);
        };

        let resolved = classify(&self.builtins, session, command)
            .ok_or_else(|| ShellError::CommandNotFound(command.to_owned()))?;

        let path = match resolved {
            Resolved::BuiltIn(builtin) => {
                log::debug!("{command}: builtin");
                let code = (builtin.handler)(BuiltinCall {
                    session,
                    tokens,
                    out: &mut *out,
                    builtins: &self.builtins,
                })
                .map_err(ShellError::Builtin)?;
                out.flush()?;
                return Ok(DispatchOutcome::BuiltIn(code));
            }
            Resolved::DirectPath(path) => {
                log::debug!("{command}: direct path");
                path
            }
            Resolved::SearchedPath(path) => {
                log::debug!("{command}: resolved to {}", path.display());
                path
            }
        };

        // builtin output must not interleave with the child's
        out.flush()?;
        let argv = ArgVector::build(&path, tokens, self.argv0)?;
        let outcome = runner::run(&argv, session.working_dir())?;

        Ok(DispatchOutcome::External(outcome))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Builtins::default(), Argv0::default())
    }
}
