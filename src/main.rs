use anyhow::{Context, Error, Result};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use logfilter::input::{Bounds, FileOrStdin};
use logfilter::{Highlight, Options, OutputMode};

/// Check if the error chain contains a broken pipe error.
#[inline(always)]
fn is_broken_pipe(err: &Error) -> bool {
    for cause in err.chain() {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::BrokenPipe {
                return true;
            }
        }
    }
    false
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Print only the first NUM lines (counted before filtering)
    #[clap(short, long, value_name = "NUM", conflicts_with = "last")]
    first: Option<usize>,

    /// Print only the last NUM lines (counted before filtering)
    #[clap(short, long, value_name = "NUM")]
    last: Option<usize>,

    /// Print only lines that contain a timestamp in HH:MM:SS format
    #[clap(short, long)]
    timestamps: bool,

    /// Print only lines that contain an IPv4 address; the address is underlined
    #[clap(short, long)]
    ipv4: bool,

    /// Print only lines that contain a full (uncompressed) IPv6 address; the address is underlined
    #[clap(short = 'I', long)]
    ipv6: bool,

    /// Underline matched addresses
    #[clap(short = 'C', long, value_enum, default_value_t = ArgsColorChoice::Always)]
    color: ArgsColorChoice,

    /// Output each surviving line as JSON with the matches found in it
    #[clap(long)]
    tag: bool,

    /// Print debug diagnostics to stderr
    #[clap(long)]
    debug: bool,

    /// Input file to filter. Leave empty or use "-" to read from stdin
    #[clap(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    input: Option<Utf8PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ArgsColorChoice {
    Always,
    Never,
    Auto,
}

/// Initialise diagnostics on stderr.
///
/// Priority: RUST_LOG env var > --debug flag > "warn".
fn init_logging(debug_flag: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let err = match run_main() {
        Ok(code) => return code,
        Err(err) => err,
    };

    // Handle broken pipe errors gracefully
    if is_broken_pipe(&err) {
        return ExitCode::SUCCESS;
    }

    let mut stderr = io::stderr();
    let _ = if std::env::var("RUST_BACKTRACE").is_ok_and(|v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        writeln!(stderr, "{:?}", err)
    } else {
        writeln!(stderr, "{:#}", err)
    };

    ExitCode::FAILURE
}

fn run_main() -> Result<ExitCode> {
    // usage errors exit here with status 2, before any input is opened
    let args = Args::parse();
    init_logging(args.debug);

    // determine appropriate colormode. auto simply
    // tests if stdout is a tty (if so, then yes underline)
    // or otherwise doesn't if it's to a file or another pipe
    let colormode = match args.color {
        ArgsColorChoice::Auto => {
            if io::stdout().is_terminal() {
                ColorChoice::Always
            } else {
                ColorChoice::Never
            }
        }
        ArgsColorChoice::Always => ColorChoice::Always,
        ArgsColorChoice::Never => ColorChoice::Never,
    };

    let options = Options {
        input: args
            .input
            .map(FileOrStdin::from_path)
            .unwrap_or_default(),
        bounds: Bounds::from_counts(args.first, args.last)?,
        timestamps: args.timestamps,
        ipv4: args.ipv4,
        ipv6: args.ipv6,
        highlight: Highlight::from(colormode),
        output: if args.tag {
            OutputMode::Json
        } else {
            OutputMode::Text
        },
    };
    tracing::debug!(?options, "options resolved");

    let mut out = io::BufWriter::with_capacity(65536, StandardStream::stdout(colormode));
    logfilter::run(options, &mut out)?;
    out.flush().context("failed to write output")?;

    Ok(ExitCode::SUCCESS)
}
