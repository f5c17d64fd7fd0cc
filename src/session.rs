use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use crate::ExitCode;

/// An open directory together with the path it was reached by.
///
/// Children change into the handle, not the path, so they still start in the right
/// place after the directory is renamed or removed.
#[derive(Debug)]
pub struct WorkingDir {
    path: PathBuf,
    handle: File,
}

impl WorkingDir {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let handle = File::open(&path)?;
        if !handle.metadata()?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{}: not a directory", path.display()),
            ));
        }

        Ok(Self { path, handle })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRawFd for WorkingDir {
    fn as_raw_fd(&self) -> RawFd {
        self.handle.as_raw_fd()
    }
}

/// Interpreter state that outlives a single command.
///
/// The working directory here is authoritative: `cd` changes it, lookups of relative
/// paths are made against it and every spawned child starts in it.
#[derive(Debug)]
pub struct Session {
    cwd: WorkingDir,
    vars: HashMap<String, String>,
    pub interactive: bool,
    pub line_number: usize,
    pub last_status: ExitCode,
    pub should_exit: bool,
}

impl Session {
    pub fn new(cwd: impl Into<PathBuf>, vars: HashMap<String, String>) -> io::Result<Self> {
        Ok(Self {
            cwd: WorkingDir::open(cwd)?,
            vars,
            interactive: false,
            line_number: 0,
            last_status: 0,
            should_exit: false,
        })
    }

    /// Snapshot of the running process: environment, working directory and whether
    /// standard input is a terminal. Variables whose name or value is not UTF-8 are
    /// left out of the snapshot; children still inherit them.
    pub fn from_env() -> io::Result<Self> {
        let vars = env::vars_os()
            .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    log::debug!("skipping non UTF-8 environment entry {name:?}");
                    None
                }
            })
            .collect();

        let mut session = Self::new(env::current_dir()?, vars)?;
        session.interactive = io::stdin().is_terminal();

        Ok(session)
    }

    pub fn cwd(&self) -> &Path {
        self.cwd.path()
    }

    pub fn working_dir(&self) -> &WorkingDir {
        &self.cwd
    }

    pub fn set_cwd(&mut self, cwd: WorkingDir) {
        log::debug!(
            "working directory {} -> {}",
            self.cwd.path().display(),
            cwd.path().display()
        );
        self.cwd = cwd;
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}
