//! Clovec CLI - the Clove tokenizer front end.
//!
//! Reads Clove source from a file or stdin and writes one JSON token object
//! per line. Argument parsing uses clap; logging goes to stderr through
//! tracing so the token stream on stdout stays clean.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clovec_drv::{run, Options};

/// Tokenizer for the Clove programming language.
///
/// Tokenizes the input and emits one JSON token object per line. The token
/// stream always ends either cleanly or with an Exception token describing
/// why tokenization halted.
#[derive(Parser, Debug)]
#[command(name = "clovec")]
#[command(author = "Clove Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tokenizer for the Clove programming language", long_about = None)]
struct Cli {
    /// Input file (defaults to stdin)
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// TOML rules file with custom tokenization rules
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Generate the default rules as TOML on stdout and exit
    #[arg(long)]
    make_rules: bool,

    /// Exit with code 0 even on tokenization errors (suppress stderr)
    #[arg(long)]
    exit0: bool,

    /// Enable verbose output
    #[arg(short, long, global = true, env = "CLOVEC_VERBOSE")]
    verbose: bool,

    /// Disable color output
    #[arg(long, global = true, env = "CLOVEC_NO_COLOR")]
    no_color: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.no_color) {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    let options = Options {
        input: cli.input,
        output: cli.output,
        rules: cli.rules,
        make_rules: cli.make_rules,
        exit0: cli.exit0,
    };

    match run(&options) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// Initialize the logging system.
///
/// Verbose mode lowers the filter to debug; otherwise the `CLOVEC_LOG`
/// environment variable controls it, defaulting to warnings only.
fn init_logging(verbose: bool, no_color: bool) -> Result<(), String> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("CLOVEC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let subscriber = fmt::layer()
        .with_ansi(!no_color)
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}
