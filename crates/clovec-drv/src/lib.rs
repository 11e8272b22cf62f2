//! clovec-drv - Tokenizer Driver
//!
//! The driver wires the core lexer to the outside world: it reads source
//! text from a file or stdin, optionally composes a TOML rules file over the
//! default rule set, and writes one JSON token object per line to a file or
//! stdout.
//!
//! Exit conventions: a clean run exits 0 with no diagnostics. A run whose
//! token stream ends in an Exception exits 1, with the reason written to
//! stderr, unless `exit0` suppresses both. Setup failures (unreadable input,
//! malformed rules, rule conflicts) are reported by the binary and exit 1.

pub mod error;

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use clovec_lex::{Lexer, RuleConfig, RuleTable};
use tracing::{debug, info};

pub use error::{DrvError, Result};

/// Options for one driver run, independent of the CLI layer.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Input file; stdin when absent.
    pub input: Option<PathBuf>,
    /// Output file; stdout when absent.
    pub output: Option<PathBuf>,
    /// TOML rules file overriding the default token rules.
    pub rules: Option<PathBuf>,
    /// Print the default rules as TOML and exit.
    pub make_rules: bool,
    /// Exit 0 and keep quiet even when tokenization halts.
    pub exit0: bool,
}

/// Runs the driver and returns the process exit code.
pub fn run(options: &Options) -> Result<i32> {
    if options.make_rules {
        let rendered = render_default_rules()?;
        io::stdout().write_all(rendered.as_bytes())?;
        return Ok(0);
    }

    let rules = match &options.rules {
        Some(path) => load_rules(path)?,
        None => RuleTable::default_rules(),
    };

    let source = read_source(options.input.as_deref())?;
    debug!(bytes = source.len(), "tokenizing");

    let outcome = Lexer::new(&source, &rules).tokenize();

    write_tokens(options.output.as_deref(), &outcome.tokens)?;

    if let Some(err) = &outcome.error {
        if options.exit0 {
            return Ok(0);
        }
        eprintln!("{}", err);
        return Ok(1);
    }
    Ok(0)
}

/// Renders the default rule set as TOML.
pub fn render_default_rules() -> Result<String> {
    let config = RuleTable::default_rules().to_config();
    Ok(toml::to_string_pretty(&config)?)
}

/// Loads a TOML rules file and composes it over the defaults.
pub fn load_rules(path: &Path) -> Result<RuleTable> {
    let content = fs::read_to_string(path)?;
    let config: RuleConfig = toml::from_str(&content)?;
    let table = RuleTable::compose(&config)?;
    info!(path = %path.display(), entries = table.len(), "rules loaded");
    Ok(table)
}

/// Reads the whole source, from a file or stdin. Invalid UTF-8 bytes are
/// replaced, never fatal; the replacement character matches no token and
/// surfaces as an Unclassified token instead.
fn read_source(input: Option<&Path>) -> Result<String> {
    let bytes = match input {
        Some(path) => fs::read(path)?,
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            buffer
        }
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes the tokens as JSON Lines: one object per line, no outer array.
fn write_tokens(output: Option<&Path>, tokens: &[clovec_lex::Token]) -> Result<()> {
    match output {
        Some(path) => {
            let file = fs::File::create(path)?;
            let mut writer = BufWriter::new(file);
            write_json_lines(&mut writer, tokens)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_json_lines(&mut writer, tokens)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn write_json_lines<W: Write>(writer: &mut W, tokens: &[clovec_lex::Token]) -> Result<()> {
    for token in tokens {
        serde_json::to_writer(&mut *writer, token)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
