pub mod argv;
pub mod bin_path;
pub mod builtin;
pub mod config;
pub mod dispatch;
pub mod lexer;
pub mod line_reader;
pub mod runner;
pub mod session;
pub mod shell;
pub mod tokenizer;

use std::io;
use std::path::PathBuf;

/// Status code of a finished command, shell style: 0 is success.
pub type ExitCode = i32;

#[derive(thiserror::Error, Debug)]
pub enum ShellError {
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("{}: cannot start process: {source}", path.display())]
    Spawn {
        path: PathBuf,
        source: nix::Error,
    },
    #[error("{}: cannot execute: {source}", path.display())]
    ExecImage {
        path: PathBuf,
        source: nix::Error,
    },
    #[error("{}: cannot change directory: {source}", dir.display())]
    WorkingDir { dir: PathBuf, source: nix::Error },
    #[error("{arg:?}: argument contains a NUL byte")]
    InvalidArgument { arg: String },
    #[error("wait for child {pid}: {source}")]
    Wait { pid: i32, source: nix::Error },
    #[error("{0:#}")]
    Builtin(anyhow::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Status recorded for the command that failed with this error.
    pub fn status(&self) -> ExitCode {
        match self {
            ShellError::CommandNotFound(_)
            | ShellError::ExecImage { .. }
            | ShellError::WorkingDir { .. } => runner::EXEC_FAILURE_STATUS,
            _ => 1,
        }
    }

    /// True when the child already wrote this error to standard error before exiting.
    pub fn reported_by_child(&self) -> bool {
        matches!(
            self,
            ShellError::ExecImage { .. } | ShellError::WorkingDir { .. }
        )
    }
}
