use std::fs;
use std::io::Write;

use anyhow::bail;
use indexmap::IndexMap;

use crate::ExitCode;
use crate::dispatch::{Resolved, classify};
use crate::session::{Session, WorkingDir};
use crate::tokenizer::Tokens;

/// Arguments handed to a builtin handler.
pub struct BuiltinCall<'a> {
    pub session: &'a mut Session,
    pub tokens: &'a Tokens,
    pub out: &'a mut dyn Write,
    pub builtins: &'a Builtins,
}

pub type Handler = fn(BuiltinCall<'_>) -> anyhow::Result<ExitCode>;

#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub handler: Handler,
    pub doc: &'static str,
}

/// Commands run inside the interpreter. Lookup is by exact name; iteration follows
/// registration order.
#[derive(Clone)]
pub struct Builtins {
    table: IndexMap<&'static str, Builtin>,
}

impl Builtins {
    pub fn empty() -> Self {
        Self {
            table: IndexMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, handler: Handler, doc: &'static str) {
        self.table.insert(name, Builtin { handler, doc });
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.table.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Builtin)> {
        self.table.iter().map(|(name, builtin)| (*name, builtin))
    }
}

impl Default for Builtins {
    fn default() -> Self {
        let mut builtins = Self::empty();
        builtins.register("?", help, "show this help menu");
        builtins.register("exit", exit, "exit the command shell");
        builtins.register("pwd", pwd, "show current working directory");
        builtins.register("cd", cd, "change directory");
        builtins.register("type", type_builtin, "describe how each name would be run");
        builtins
    }
}

fn help(call: BuiltinCall<'_>) -> anyhow::Result<ExitCode> {
    for (name, builtin) in call.builtins.iter() {
        writeln!(call.out, "{name} - {}", builtin.doc)?;
    }

    Ok(0)
}

fn exit(call: BuiltinCall<'_>) -> anyhow::Result<ExitCode> {
    call.session.should_exit = true;
    Ok(0)
}

fn pwd(call: BuiltinCall<'_>) -> anyhow::Result<ExitCode> {
    writeln!(call.out, "{}", call.session.cwd().display())?;
    Ok(0)
}

fn cd(call: BuiltinCall<'_>) -> anyhow::Result<ExitCode> {
    let target = match call.tokens.get(1) {
        Some(target) if target != "~" => Some(target.to_owned()),
        _ => call.session.var("HOME").map(str::to_owned),
    };
    let Some(target) = target else {
        return Ok(0);
    };

    let candidate = call.session.cwd().join(&target);
    // physical path, like getcwd after chdir
    let Ok(dir) = fs::canonicalize(&candidate).and_then(WorkingDir::open) else {
        bail!("cd: {target}: No such file or directory");
    };
    call.session.set_cwd(dir);

    Ok(0)
}

fn type_builtin(call: BuiltinCall<'_>) -> anyhow::Result<ExitCode> {
    let mut status = 0;
    for name in call.tokens.args() {
        match classify(call.builtins, call.session, name) {
            Some(Resolved::BuiltIn(_)) => writeln!(call.out, "{name} is a shell builtin")?,
            Some(Resolved::DirectPath(path) | Resolved::SearchedPath(path)) => {
                writeln!(call.out, "{name} is {}", path.display())?
            }
            None => {
                writeln!(call.out, "{name}: not found")?;
                status = 1;
            }
        }
    }

    Ok(status)
}
