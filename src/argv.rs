use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use crate::ShellError;
use crate::tokenizer::Tokens;

/// What a launched program receives as its own name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Argv0 {
    /// The path the executable was found at, e.g. `/bin/ls` for `ls`.
    #[default]
    Resolved,
    /// The command name exactly as typed.
    Invoked,
}

/// Owned, terminator-ended argument list for `execv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgVector {
    program: CString,
    args: Vec<CString>,
}

impl ArgVector {
    /// Builds argv from the tokens of one command. Tokens 1.. are copied unchanged;
    /// element 0 follows `argv0`.
    ///
    /// Empty `tokens` produce a vector holding only the terminator, which has nothing
    /// to run; callers must not hand it to the runner.
    pub fn build(resolved: &Path, tokens: &Tokens, argv0: Argv0) -> Result<Self, ShellError> {
        let program = c_string(&resolved.to_string_lossy())?;

        let mut args = Vec::with_capacity(tokens.len());
        if let Some(command) = tokens.command() {
            args.push(match argv0 {
                Argv0::Resolved => program.clone(),
                Argv0::Invoked => c_string(command)?,
            });
        }
        for arg in tokens.args() {
            args.push(c_string(arg)?);
        }

        Ok(Self { program, args })
    }

    /// Path handed to `execv`.
    pub fn program(&self) -> &CStr {
        &self.program
    }

    /// Slot count, terminator included.
    pub fn len(&self) -> usize {
        self.args.len() + 1
    }

    /// True when there is nothing but the terminator.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Every argument as `Some`, then a single `None` for the terminator.
    pub fn slots(&self) -> impl Iterator<Item = Option<&CStr>> {
        self.args
            .iter()
            .map(|arg| Some(arg.as_c_str()))
            .chain(std::iter::once(None))
    }

    /// Null-terminated pointer array borrowing from `self`.
    pub fn as_ptrs(&self) -> Vec<*const c_char> {
        self.slots()
            .map(|slot| slot.map_or(ptr::null(), CStr::as_ptr))
            .collect()
    }
}

fn c_string(value: &str) -> Result<CString, ShellError> {
    CString::new(value).map_err(|_| ShellError::InvalidArgument {
        arg: value.to_owned(),
    })
}
