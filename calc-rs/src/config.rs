//! `.calcrc` startup file parser.
//!
//! | Line | Action |
//! |------|--------|
//! | `/set <name>=<value>` or `/set <name> <value>` | change a setting |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | silently skipped |
//! | Anything else | startup command, run before input is read |
//!
//! Settings: `notation`, `calculator`, `position`, `log`.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::actor::Position;
use crate::calc::calculator::CalculatorType;
use crate::calc::compiler::Notation;
use crate::logger::LogLevel;

pub const CONFIG_FILE_NAME: &str = ".calcrc";

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Settings and startup commands read from a `.calcrc`.
///
/// Unset fields leave the built-in default (or a CLI flag) in charge.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Config {
    pub calculator: Option<CalculatorType>,
    pub notation: Option<Notation>,
    pub position: Option<Position>,
    pub log: Option<LogLevel>,
    pub commands: Vec<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config text.  Bad `/set` lines are reported and skipped; the
    /// rest of the file still loads.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else {
                config.commands.push(line.to_owned());
                continue;
            };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));

            if cmd == "set" {
                let tokens = split_args(args_str.trim());
                if let Err(msg) = config.parse_set(&tokens) {
                    errors.push(ConfigError { line: lineno, message: msg });
                }
            }
        }

        (config, errors)
    }

    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    fn parse_set(&mut self, tokens: &[String]) -> Result<(), String> {
        if tokens.is_empty() {
            return Err("/set: requires an argument".into());
        }

        let (name, value) = if let Some((name, value)) = tokens[0].split_once('=') {
            (name.to_owned(), value.to_owned())
        } else if tokens.len() >= 2 {
            (tokens[0].clone(), tokens[1..].join(" "))
        } else {
            return Err(format!("/set: missing value for '{}'", tokens[0]));
        };

        match name.as_str() {
            "notation" => self.notation = Some(value.parse()?),
            "calculator" => self.calculator = Some(value.parse()?),
            "position" => self.position = Some(parse_position(&value)?),
            "log" => self.log = Some(value.parse()?),
            "" => return Err("/set: setting name cannot be empty".into()),
            other => return Err(format!("/set: unknown setting '{other}'")),
        }
        Ok(())
    }
}

/// `x,y,z` with optional spaces.
pub fn parse_position(s: &str) -> Result<Position, String> {
    let coords = s
        .split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format!("invalid position '{s}' (expected x,y,z)"))?;
    match coords[..] {
        [x, y, z] => Ok(Position::new(x, y, z)),
        _ => Err(format!("invalid position '{s}' (expected x,y,z)")),
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// First existing `.calcrc`: home directory, then the working directory.
pub fn find_user_config() -> Option<PathBuf> {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILE_NAME));
    home.into_iter()
        .chain(std::iter::once(PathBuf::from(".").join(CONFIG_FILE_NAME)))
        .find(|p| p.exists())
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
fn split_args(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        args.push(cur);
    }
    args
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn split_quoted() {
        assert_eq!(split_args(r#"position "1, 2, 3""#), ["position", "1, 2, 3"]);
        assert_eq!(split_args(r#""a \"b\"" c"#), [r#"a "b""#, "c"]);
    }

    #[test]
    fn settings_both_forms() {
        let (cfg, errs) = Config::load_str(
            "/set notation=postfix\n/set calculator frac\n/set position=10,64,-3\n/set log debug",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.notation, Some(Notation::Postfix));
        assert_eq!(cfg.calculator, Some(CalculatorType::Fraction));
        assert_eq!(cfg.position, Some(Position::new(10, 64, -3)));
        assert_eq!(cfg.log, Some(LogLevel::Debug));
    }

    #[test]
    fn comments_commands_and_unknown_directives() {
        let (cfg, errs) = Config::load_str(
            "; startup\n\nlet tau = 2 * PI\n/bind ^X quit\nfun sq 1 = _1 * _1\n",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.commands, ["let tau = 2 * PI", "fun sq 1 = _1 * _1"]);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let (cfg, errs) = Config::load_str(
            "/set notation=sideways\n/set colour=red\n/set\n/set position 1,2\n/set log=info",
        );
        let lines: Vec<usize> = errs.iter().map(|e| e.line).collect();
        assert_eq!(lines, [1, 2, 3, 4]);
        assert!(errs[1].to_string().starts_with("line 2: "));
        assert_eq!(cfg.log, Some(LogLevel::Info));
        assert_eq!(cfg.notation, None);
    }

    #[test]
    fn position_parsing() {
        assert_eq!(parse_position(" 1 , -2,3 "), Ok(Position::new(1, -2, 3)));
        assert!(parse_position("1,2,3,4").is_err());
        assert!(parse_position("a,b,c").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "/set calculator=bigint").unwrap();
        writeln!(file, "= 2 ^ 100").unwrap();
        let (cfg, errs) = Config::load_file(file.path()).unwrap();
        assert!(errs.is_empty());
        assert_eq!(cfg.calculator, Some(CalculatorType::BigInt));
        assert_eq!(cfg.commands, ["= 2 ^ 100"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_file(&dir.path().join("absent")).is_err());
    }
}
