//! Line-oriented command surface over a [`Session`].
//!
//! | Command | Reply |
//! |---------|-------|
//! | `= <expr>` | remaining stack, bottom to top |
//! | `eval <expr>` | empty |
//! | `let <name> = <expr>` | `<name> = <value>` |
//! | `fun <name> <argc> = <expr>` | `<name>/<argc>` |
//! | `config type <kind>` | `calculator: <kind>` |
//! | `config mode <infix\|postfix>` | `mode: <notation>` |
//! | `config push` / `config pop` | `saved: <depth>` |
//! | `config prev` | `calculator: <kind>` |
//! | `config name <name>` / `config load <name>` | `<name>` |
//! | `config list` / `config symbols` | names, space separated |

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::actor::Actor;
use crate::calc::calculator::CalculatorType;
use crate::calc::compiler::Notation;
use crate::error::{CalcError, Result};
use crate::session::Session;

// ── Parsed commands ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Print(String),
    Eval(String),
    Let { name: String, expr: String },
    Fun { name: String, arg_count: usize, expr: String },
    Config(ConfigCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    Type(CalculatorType),
    Mode(Notation),
    Push,
    Pop,
    Prev,
    Name(String),
    Load(String),
    List,
    Symbols,
}

fn let_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_$][A-Za-z0-9_]*)\s*=\s*(\S.*)$").expect("valid let pattern")
    })
}

fn fun_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_$][A-Za-z0-9_]*)\s+(\d+)\s*=\s*(\S.*)$").expect("valid fun pattern")
    })
}

fn usage(text: &str) -> CalcError {
    CalcError::Command(format!("usage: {text}"))
}

fn single_word(rest: &str, text: &str) -> Result<String> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some(word), None) => Ok(word.to_owned()),
        _ => Err(usage(text)),
    }
}

impl FromStr for ConfigCommand {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (verb, rest) = s
            .split_once(|c: char| c.is_ascii_whitespace())
            .unwrap_or((s, ""));
        let rest = rest.trim();
        let bare = |cmd: ConfigCommand| {
            if rest.is_empty() {
                Ok(cmd)
            } else {
                Err(CalcError::Command(format!("config {verb} takes no arguments")))
            }
        };

        match verb {
            "type" => single_word(rest, "config type <double|fraction|bigint>")?
                .parse()
                .map(ConfigCommand::Type)
                .map_err(CalcError::Command),
            "mode" => single_word(rest, "config mode <infix|postfix>")?
                .parse()
                .map(ConfigCommand::Mode)
                .map_err(CalcError::Command),
            "push" => bare(ConfigCommand::Push),
            "pop" => bare(ConfigCommand::Pop),
            "prev" => bare(ConfigCommand::Prev),
            "name" => Ok(ConfigCommand::Name(single_word(rest, "config name <name>")?)),
            "load" => Ok(ConfigCommand::Load(single_word(rest, "config load <name>")?)),
            "list" => bare(ConfigCommand::List),
            "symbols" => bare(ConfigCommand::Symbols),
            "" => Err(usage("config <type|mode|push|pop|prev|name|load|list|symbols> ...")),
            other => Err(CalcError::Command(format!("unknown config command: {other}"))),
        }
    }
}

impl FromStr for Command {
    type Err = CalcError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();

        if let Some(expr) = line.strip_prefix('=') {
            let expr = expr.trim();
            if expr.is_empty() {
                return Err(usage("= <expr>"));
            }
            return Ok(Command::Print(expr.to_owned()));
        }

        let (verb, rest) = line
            .split_once(|c: char| c.is_ascii_whitespace())
            .unwrap_or((line, ""));
        let rest = rest.trim();

        match verb {
            "eval" if !rest.is_empty() => Ok(Command::Eval(rest.to_owned())),
            "eval" => Err(usage("eval <expr>")),
            "let" => {
                let caps = let_pattern().captures(rest).ok_or_else(|| usage("let <name> = <expr>"))?;
                Ok(Command::Let { name: caps[1].to_owned(), expr: caps[2].to_owned() })
            }
            "fun" => {
                let caps = fun_pattern()
                    .captures(rest)
                    .ok_or_else(|| usage("fun <name> <argc> = <expr>"))?;
                let arg_count = caps[2]
                    .parse()
                    .map_err(|_| CalcError::Command(format!("invalid argument count: {}", &caps[2])))?;
                Ok(Command::Fun { name: caps[1].to_owned(), arg_count, expr: caps[3].to_owned() })
            }
            "config" => Ok(Command::Config(rest.parse()?)),
            "" => Err(CalcError::Command("empty command".to_owned())),
            other => Err(CalcError::Command(format!("unknown command: {other}"))),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Print(expr) => write!(f, "= {expr}"),
            Command::Eval(expr) => write!(f, "eval {expr}"),
            Command::Let { name, expr } => write!(f, "let {name} = {expr}"),
            Command::Fun { name, arg_count, expr } => write!(f, "fun {name} {arg_count} = {expr}"),
            Command::Config(cmd) => write!(f, "config {cmd}"),
        }
    }
}

impl fmt::Display for ConfigCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigCommand::Type(kind) => write!(f, "type {kind}"),
            ConfigCommand::Mode(notation) => write!(f, "mode {notation}"),
            ConfigCommand::Push => f.write_str("push"),
            ConfigCommand::Pop => f.write_str("pop"),
            ConfigCommand::Prev => f.write_str("prev"),
            ConfigCommand::Name(name) => write!(f, "name {name}"),
            ConfigCommand::Load(name) => write!(f, "load {name}"),
            ConfigCommand::List => f.write_str("list"),
            ConfigCommand::Symbols => f.write_str("symbols"),
        }
    }
}

// ── Execution ─────────────────────────────────────────────────────────────────

impl Command {
    /// Run against `session` on behalf of `actor`; returns the reply line.
    ///
    /// Evaluation commands (`=`, `eval`, `let`, `fun`) run inside
    /// [`Session::with_invoking_actor`].  Config commands only touch session
    /// state, never evaluate anything and take the session lock directly.
    pub fn run(&self, session: &Session, actor: Arc<dyn Actor>) -> Result<String> {
        debug!(command = %self, "running command");
        match self {
            Command::Print(expr) => session.compile_execute_and_print(actor, expr),
            Command::Eval(expr) => session.compile_and_execute(actor, expr).map(|()| String::new()),
            Command::Let { name, expr } => {
                let value = session.compile_and_set_global_symbol(actor, name, expr)?;
                Ok(format!("{name} = {value}"))
            }
            Command::Fun { name, arg_count, expr } => {
                session.compile_and_define_global_function(actor, name, *arg_count, expr)?;
                Ok(format!("{name}/{arg_count}"))
            }
            Command::Config(cmd) => cmd.run(session),
        }
    }
}

impl ConfigCommand {
    fn run(&self, session: &Session) -> Result<String> {
        match self {
            ConfigCommand::Type(kind) => {
                session.create_calculator(*kind);
                Ok(format!("calculator: {kind}"))
            }
            ConfigCommand::Mode(notation) => {
                session.set_notation(*notation);
                Ok(format!("mode: {notation}"))
            }
            ConfigCommand::Push => Ok(format!("saved: {}", session.push_calculator())),
            ConfigCommand::Pop => Ok(format!("saved: {}", session.pop_calculator()?)),
            ConfigCommand::Prev => {
                if session.restore_previous_calculator() {
                    Ok(format!("calculator: {}", session.active_type()))
                } else {
                    Err(CalcError::Command("no previous calculator".to_owned()))
                }
            }
            ConfigCommand::Name(name) => {
                session.name_calculator(name);
                Ok(name.clone())
            }
            ConfigCommand::Load(name) => {
                session.load_calculator(name)?;
                Ok(name.clone())
            }
            ConfigCommand::List => Ok(join(session.calculator_names())),
            ConfigCommand::Symbols => Ok(join(session.symbol_names())),
        }
    }
}

fn join(names: impl IntoIterator<Item = String>) -> String {
    names.into_iter().collect::<Vec<_>>().join(" ")
}

/// Parse and run one line.
pub fn execute_line(session: &Session, actor: Arc<dyn Actor>, line: &str) -> Result<String> {
    line.parse::<Command>()?.run(session, actor)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Position;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Console {
        lines: Mutex<Vec<String>>,
    }

    impl Actor for Console {
        fn position(&self) -> Position {
            Position::new(10, 64, -3)
        }

        fn send_message(&self, message: &str) {
            self.lines.lock().push(message.to_owned());
        }
    }

    fn run(session: &Session, line: &str) -> Result<String> {
        execute_line(session, Arc::new(Console::default()), line)
    }

    #[test]
    fn parse_forms() {
        assert_eq!("= 1 + 2".parse::<Command>().unwrap(), Command::Print("1 + 2".into()));
        assert_eq!(
            "let  x=3*4".parse::<Command>().unwrap(),
            Command::Let { name: "x".into(), expr: "3*4".into() }
        );
        assert_eq!(
            "fun sq 1 = _1 * _1".parse::<Command>().unwrap(),
            Command::Fun { name: "sq".into(), arg_count: 1, expr: "_1 * _1".into() }
        );
        assert_eq!(
            "config type frac".parse::<Command>().unwrap(),
            Command::Config(ConfigCommand::Type(CalculatorType::Fraction))
        );
        assert_eq!(
            "config mode rpn".parse::<Command>().unwrap(),
            Command::Config(ConfigCommand::Mode(Notation::Postfix))
        );
    }

    #[test]
    fn display_is_surface_syntax() {
        for line in [
            "config type bigint",
            "config mode postfix",
            "config push",
            "config name ints",
            "config load ints",
            "config symbols",
            "let x = 3*4",
            "fun sq 1 = _1 * _1",
        ] {
            let cmd: Command = line.parse().unwrap();
            assert_eq!(cmd.to_string(), line);
            assert_eq!(cmd.to_string().parse::<Command>().unwrap(), cmd);
        }
        assert_eq!("config type frac".parse::<Command>().unwrap().to_string(), "config type fraction");
    }

    #[test]
    fn config_commands_run_while_evaluation_is_possible() {
        let session = Session::with_type(CalculatorType::BigInt);
        let console = Arc::new(Console::default());
        assert_eq!(run(&session, "config push").unwrap(), "saved: 1");
        assert_eq!(execute_line(&session, console.clone(), "= $x").unwrap(), "10");
        assert_eq!(run(&session, "config pop").unwrap(), "saved: 0");
        assert_eq!(execute_line(&session, console, "= $y").unwrap(), "64");
    }

    #[test]
    fn parse_errors() {
        for bad in ["", "=", "eval", "let x", "let 1x = 2", "fun f = 1", "config", "config push 1", "frob"] {
            assert!(
                matches!(bad.parse::<Command>(), Err(CalcError::Command(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn let_and_fun_replies() {
        let session = Session::new();
        assert_eq!(run(&session, "let x = 1 + 2").unwrap(), "x = 3.0");
        assert_eq!(run(&session, "fun sq 1 = _1 * _1").unwrap(), "sq/1");
        assert_eq!(run(&session, "= sq(x) + 1").unwrap(), "10.0");
    }

    #[test]
    fn config_flow() {
        let session = Session::new();
        assert_eq!(run(&session, "config type bigint").unwrap(), "calculator: bigint");
        assert_eq!(run(&session, "config push").unwrap(), "saved: 1");
        assert_eq!(run(&session, "config name ints").unwrap(), "ints");
        assert_eq!(run(&session, "config type fraction").unwrap(), "calculator: fraction");
        assert_eq!(run(&session, "= 1/3 + 1/6").unwrap(), "1/2");
        assert_eq!(run(&session, "config prev").unwrap(), "calculator: bigint");
        assert_eq!(run(&session, "config pop").unwrap(), "saved: 0");
        assert!(matches!(run(&session, "config pop"), Err(CalcError::EmptyStack)));
        assert_eq!(run(&session, "config list").unwrap(), "ints");
        assert!(matches!(run(&session, "config load nope"), Err(CalcError::NoSuchName(_))));
    }

    #[test]
    fn print_symbol_reaches_actor() {
        let session = Session::with_type(CalculatorType::BigInt);
        let console = Arc::new(Console::default());
        execute_line(&session, console.clone(), "config mode postfix").unwrap();
        assert_eq!(execute_line(&session, console.clone(), "eval $x $y $z + + p").unwrap(), "");
        assert_eq!(*console.lines.lock(), vec![": 71"]);
    }

    #[test]
    fn symbols_include_host_names() {
        let session = Session::new();
        let names = run(&session, "config symbols").unwrap();
        for name in ["$x", "$y", "$z", "p", "sum", "PI"] {
            assert!(names.split(' ').any(|n| n == name), "missing {name}");
        }
    }
}
