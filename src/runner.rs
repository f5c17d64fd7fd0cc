use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::libc;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};

use crate::argv::ArgVector;
use crate::session::WorkingDir;
use crate::{ExitCode, ShellError};

/// Status the child exits with when it cannot start the program.
pub const EXEC_FAILURE_STATUS: ExitCode = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(ExitCode),
    /// Terminated by the given signal number.
    Signaled(i32),
    /// The child was reaped by someone else before we could wait for it.
    Vanished,
}

impl ExitOutcome {
    pub fn code(&self) -> ExitCode {
        match *self {
            ExitOutcome::Exited(code) => code,
            ExitOutcome::Signaled(signal) => 128 + signal,
            ExitOutcome::Vanished => -1,
        }
    }

    pub fn success(&self) -> bool {
        *self == ExitOutcome::Exited(0)
    }
}

/// Step of the child's startup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildStage {
    EnterDir = 0,
    Exec = 1,
}

/// Stage byte followed by the native-endian errno.
const REPORT_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChildReport {
    stage: ChildStage,
    errno: Errno,
}

impl ChildReport {
    fn encode(&self) -> [u8; REPORT_LEN] {
        let mut bytes = [0; REPORT_LEN];
        bytes[0] = self.stage as u8;
        bytes[1..].copy_from_slice(&(self.errno as i32).to_ne_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let (&stage, errno) = bytes.split_first()?;
        let errno = Errno::from_raw(i32::from_ne_bytes(errno.try_into().ok()?));
        let stage = match stage {
            0 => ChildStage::EnterDir,
            _ => ChildStage::Exec,
        };

        Some(Self { stage, errno })
    }

    fn into_error(self, path: PathBuf, dir: &Path) -> ShellError {
        match self.stage {
            ChildStage::EnterDir => ShellError::WorkingDir {
                dir: dir.to_owned(),
                source: self.errno,
            },
            ChildStage::Exec => ShellError::ExecImage {
                path,
                source: self.errno,
            },
        }
    }
}

/// Everything the child needs, built before the fork so the child only makes
/// async-signal-safe calls.
struct ChildPlan<'a> {
    argv: &'a ArgVector,
    ptrs: Vec<*const libc::c_char>,
    dir: RawFd,
    enter_dir_prefix: Vec<u8>,
    exec_prefix: Vec<u8>,
    // close-on-exec: the parent reads EOF once execv succeeds
    status_pipe: File,
}

impl<'a> ChildPlan<'a> {
    fn new(argv: &'a ArgVector, path: &Path, cwd: &WorkingDir, status_pipe: File) -> Self {
        Self {
            argv,
            ptrs: argv.as_ptrs(),
            dir: cwd.as_raw_fd(),
            enter_dir_prefix: format!("{}: cannot change directory: ", cwd.path().display())
                .into_bytes(),
            exec_prefix: format!("{}: cannot execute: ", path.display()).into_bytes(),
            status_pipe,
        }
    }

    /// Child side of the fork. Never returns.
    fn exec(&self) -> ! {
        if let Err(errno) = unistd::fchdir(self.dir) {
            self.fail(ChildStage::EnterDir, errno);
        }

        // SAFETY: program and every non-null entry of ptrs point into self.argv,
        // which outlives this call; ptrs ends with a null pointer.
        unsafe { libc::execv(self.argv.program().as_ptr(), self.ptrs.as_ptr()) };

        self.fail(ChildStage::Exec, Errno::last())
    }

    /// Reports on stderr for the user and on the status pipe for the parent, then exits.
    fn fail(&self, stage: ChildStage, errno: Errno) -> ! {
        let prefix = match stage {
            ChildStage::EnterDir => &self.enter_dir_prefix,
            ChildStage::Exec => &self.exec_prefix,
        };
        for part in [prefix.as_slice(), errno.desc().as_bytes(), &b"\n"[..]] {
            let _ = unistd::write(io::stderr(), part);
        }

        let report = ChildReport { stage, errno };
        let _ = (&self.status_pipe).write_all(&report.encode());

        // SAFETY: _exit skips atexit handlers and stdio flushing, which belong to the parent.
        unsafe { libc::_exit(EXEC_FAILURE_STATUS) }
    }
}

/// Runs `argv` in a child started in `cwd` and blocks until that child terminates.
///
/// The child shares the shell's standard streams. If the child cannot enter `cwd` or
/// replace its image, it says so on stderr and exits with [`EXEC_FAILURE_STATUS`]; the
/// parent then returns [`ShellError::WorkingDir`] or [`ShellError::ExecImage`] once the
/// child has been reaped.
pub fn run(argv: &ArgVector, cwd: &WorkingDir) -> Result<ExitOutcome, ShellError> {
    if argv.is_empty() {
        return Err(ShellError::InvalidArgument { arg: String::new() });
    }
    let path = PathBuf::from(argv.program().to_string_lossy().into_owned());

    let (reader, writer) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(|source| {
        ShellError::Spawn {
            path: path.clone(),
            source,
        }
    })?;
    let plan = ChildPlan::new(argv, &path, cwd, File::from(writer));

    // buffered prompt text would otherwise be written by both processes
    io::stdout().flush()?;

    // SAFETY: the child branch only calls fchdir, execv, write and _exit.
    match unsafe { unistd::fork() } {
        Ok(ForkResult::Child) => plan.exec(),
        Ok(ForkResult::Parent { child }) => {
            drop(plan);
            log::debug!("{}: started pid {child}", path.display());

            let report = read_child_report(File::from(reader));
            let outcome = wait_for(child)?;
            log::info!("{}: pid {child} finished: {outcome:?}", path.display());

            match report? {
                Some(report) => Err(report.into_error(path, cwd.path())),
                None => Ok(outcome),
            }
        }
        Err(source) => {
            log::warn!("{}: fork failed: {source}", path.display());
            Err(ShellError::Spawn { path, source })
        }
    }
}

/// `None` when the pipe closed without data, i.e. execv succeeded.
fn read_child_report(mut reader: File) -> io::Result<Option<ChildReport>> {
    let mut bytes = Vec::with_capacity(REPORT_LEN);
    reader.read_to_end(&mut bytes)?;

    Ok(ChildReport::decode(&bytes))
}

fn wait_for(child: Pid) -> Result<ExitOutcome, ShellError> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitOutcome::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(ExitOutcome::Signaled(signal as i32));
            }
            // stop/continue notifications are not requested, but keep waiting if one shows up
            Ok(status) => log::debug!("pid {child}: {status:?}"),
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => {
                log::warn!("pid {child}: child vanished before it could be waited for");
                return Ok(ExitOutcome::Vanished);
            }
            Err(source) => {
                return Err(ShellError::Wait {
                    pid: child.as_raw(),
                    source,
                });
            }
        }
    }
}
