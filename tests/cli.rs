use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;

struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("forksh_cli_{}_{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Self(fs::canonicalize(dir).unwrap())
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn forksh(input: &str, configure: impl FnOnce(&mut Command)) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_forksh"));
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env_remove("RUST_LOG")
        .env_remove("FORKSH_ARGV0")
        .env_remove("FORKSH_INTERACTIVE");
    configure(&mut command);

    let mut child = command.spawn().unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn runs_program_from_path() {
    let output = forksh("echo hello world\n", |cmd| {
        cmd.env("PATH", "/usr/bin:/bin");
    });

    assert!(output.status.success());
    assert_eq!(stdout(&output), "hello world\n");
    assert_eq!(stderr(&output), "");
}

#[test]
fn runs_program_by_path() {
    let output = forksh("/bin/sh -c 'printf fixed'\n", |_| {});

    assert!(output.status.success());
    assert_eq!(stdout(&output), "fixed");
}

#[test]
fn unknown_command_continues() {
    let output = forksh("nonexistent_xyz\n/bin/echo after\n", |cmd| {
        cmd.env("PATH", "/usr/bin:/bin");
    });

    assert!(output.status.success());
    assert_eq!(stdout(&output), "after\n");
    assert_eq!(stderr(&output), "nonexistent_xyz: command not found\n");
}

#[test]
fn exit_builtin_stops_with_zero() {
    let output = forksh("exit\n/bin/echo unreachable\n", |_| {});

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "");
}

#[test]
fn dot_slash_exit_is_not_the_builtin() {
    let tmp = TempDir::new("dot_exit");
    let script = tmp.0.join("exit");
    fs::write(&script, "#!/bin/sh\necho script ran\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let output = forksh("./exit\n/bin/echo still here\n", |cmd| {
        cmd.current_dir(&tmp.0);
    });

    assert_eq!(stdout(&output), "script ran\nstill here\n");
}

#[test]
fn cd_changes_child_directory() {
    let tmp = TempDir::new("cd");
    fs::create_dir(tmp.0.join("sub")).unwrap();

    let output = forksh("cd sub\npwd\n/bin/pwd -P\ncd missing\npwd\n", |cmd| {
        cmd.current_dir(&tmp.0);
    });

    let sub = tmp.0.join("sub").display().to_string();
    assert_eq!(stdout(&output), format!("{sub}\n{sub}\n{sub}\n"));
    assert_eq!(stderr(&output), "cd: missing: No such file or directory\n");
}

#[test]
fn exec_failure_is_reported_and_loop_continues() {
    let tmp = TempDir::new("noexec");
    fs::write(tmp.0.join("plain"), "not a program\n").unwrap();

    let output = forksh("./plain\n/bin/echo next\n", |cmd| {
        cmd.current_dir(&tmp.0);
    });

    assert!(output.status.success());
    assert_eq!(stdout(&output), "next\n");
    assert_eq!(stderr(&output), "./plain: cannot execute: Permission denied\n");
}

#[test]
fn commands_run_after_working_dir_is_removed() {
    let tmp = TempDir::new("rmdir");
    fs::create_dir(tmp.0.join("sub")).unwrap();

    let output = forksh("cd sub\n/bin/rmdir ../sub\n/bin/echo still-runs\n", |cmd| {
        cmd.current_dir(&tmp.0);
    });

    assert!(output.status.success());
    assert_eq!(stdout(&output), "still-runs\n");
    assert_eq!(stderr(&output), "");
    assert!(!tmp.0.join("sub").exists());
}

#[test]
fn non_utf8_environment_is_tolerated() {
    let output = forksh("/bin/echo ok\nsh -c 'test -n \"$LATIN1\" && echo inherited'\n", |cmd| {
        cmd.env("LATIN1", OsStr::from_bytes(b"caf\xe9"))
            .env("PATH", "/usr/bin:/bin");
    });

    assert!(output.status.success());
    assert_eq!(stdout(&output), "ok\ninherited\n");
    assert_eq!(stderr(&output), "");
}

#[test]
fn prompt_when_forced_interactive() {
    let output = forksh("pwd\n", |cmd| {
        cmd.env("FORKSH_INTERACTIVE", "1").current_dir("/");
    });

    assert_eq!(stdout(&output), "0: /\n1: ");
}

#[test]
fn argv0_policy_is_configurable() {
    let script = "/bin/sh -c 'echo $0' arg0\n";

    let invoked = forksh("sh -c 'echo $0'\n", |cmd| {
        cmd.env("PATH", "/bin").env("FORKSH_ARGV0", "invoked");
    });
    let resolved = forksh("sh -c 'echo $0'\n", |cmd| {
        cmd.env("PATH", "/bin");
    });
    let explicit = forksh(script, |_| {});

    assert_eq!(stdout(&invoked), "sh\n");
    assert_eq!(stdout(&resolved), "/bin/sh\n");
    assert_eq!(stdout(&explicit), "arg0\n");
}

#[test]
fn bad_config_fails_startup() {
    let output = forksh("", |cmd| {
        cmd.env("FORKSH_ARGV0", "typed");
    });

    assert!(!output.status.success());
}

#[test]
fn help_lists_builtins() {
    let output = forksh("?\n", |_| {});

    let out = stdout(&output);
    assert!(out.starts_with("? - show this help menu\nexit - exit the command shell\n"));
}
