use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use calc::actor::{Actor, Position};
use calc::calc::Notation;
use calc::cli::{self, ConfigFile};
use calc::command;
use calc::config::{self, Config};
use calc::logger::{self, LogLevel};
use calc::session::Session;

/// The terminal user: replies and `p` output go to stdout.
struct ConsoleActor {
    position: Position,
}

impl Actor for ConsoleActor {
    fn position(&self) -> Position {
        self.position
    }

    fn send_message(&self, message: &str) {
        println!("{message}");
    }
}

fn load_config(path: &Path) -> Config {
    match Config::load_file(path) {
        Ok((config, errors)) => {
            for e in errors {
                eprintln!("calc: {}: {e}", path.display());
            }
            config
        }
        Err(e) => {
            eprintln!("calc: warning: {}: {e}", path.display());
            Config::default()
        }
    }
}

/// Run one line and print its reply; returns false on failure.
fn run_line(session: &Session, actor: &Arc<dyn Actor>, line: &str) -> bool {
    match command::execute_line(session, Arc::clone(actor), line) {
        Ok(reply) => {
            if !reply.is_empty() {
                println!("{reply}");
            }
            true
        }
        Err(e) => {
            eprintln!("calc: {e}");
            false
        }
    }
}

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("calc: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(1);
        }
    };

    // ── Load user config ──────────────────────────────────────────────────────
    let config = match &args.config {
        ConfigFile::Skip => Config::default(),
        ConfigFile::Explicit(path) => load_config(path),
        ConfigFile::Search => config::find_user_config()
            .map(|path| load_config(&path))
            .unwrap_or_default(),
    };

    let level = if args.debug { LogLevel::Debug } else { config.log.unwrap_or_default() };
    logger::init(level);

    // ── Session ───────────────────────────────────────────────────────────────
    let session = Session::with_type(args.calculator.or(config.calculator).unwrap_or_default());
    if args.postfix {
        session.set_notation(Notation::Postfix);
    } else if let Some(notation) = config.notation {
        session.set_notation(notation);
    }
    let actor: Arc<dyn Actor> = Arc::new(ConsoleActor { position: config.position.unwrap_or_default() });

    for line in &config.commands {
        run_line(&session, &actor, line);
    }

    // ── One-shot command (-c<cmd>) ────────────────────────────────────────────
    if let Some(cmd) = &args.command {
        let ok = run_line(&session, &actor, cmd);
        std::process::exit(if ok { 0 } else { 1 });
    }

    // ── Interactive / piped input ─────────────────────────────────────────────
    let is_tty = unsafe {
        libc::isatty(libc::STDIN_FILENO) != 0 && libc::isatty(libc::STDOUT_FILENO) != 0
    };
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if is_tty {
            print!("{}> ", session.active_type());
            let _ = io::stdout().flush();
        }
        let Some(line) = lines.next() else { break };
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("calc: {e}");
                std::process::exit(1);
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        run_line(&session, &actor, line);
    }
}
