use std::io;

use forksh::builtin::Builtins;
use forksh::config::Config;
use forksh::dispatch::Dispatcher;
use forksh::session::Session;
use forksh::shell::Shell;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::from_env()?;
    let mut session = Session::from_env()?;
    if let Some(interactive) = config.interactive {
        session.interactive = interactive;
    }
    log::debug!("starting with {config:?}, interactive: {}", session.interactive);

    let dispatcher = Dispatcher::new(Builtins::default(), config.argv0);
    Shell::with_stdio(dispatcher, session).repl(io::stdin().lock())?;

    Ok(())
}
