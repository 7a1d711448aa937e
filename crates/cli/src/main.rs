// callbill - call-detail reconciliation and billing reports

mod config;
mod exit_codes;
mod logging;
mod preview;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use callbill_io::IoError;
use callbill_recon::ReconError;

use exit_codes::{io_exit_code, recon_exit_code, EXIT_CONFIG, EXIT_IO, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "callbill")]
#[command(about = "Reconcile call-detail records against customer rosters and write billing reports")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). CALLBILL_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Run configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true, env = "CALLBILL_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bill toll-free call time per customer
    #[command(after_help = "\
Examples:
  callbill toll-free calls.csv customers.xlsx
  callbill toll-free calls.xlsx customers.csv --out-dir reports/
  callbill toll-free calls.csv customers.csv --format csv --preview")]
    TollFree {
        /// Call log with destination, response and duration columns
        calls: PathBuf,

        /// Customer roster with phone and customer columns
        customers: PathBuf,

        #[command(flatten)]
        output: run::OutputArgs,
    },

    /// Total duration and amount per ANI across one or more call logs
    #[command(after_help = "\
Examples:
  callbill ani week1.csv week2.csv
  callbill ani calls/*.xlsx --start 2025-10-01 --end 2025-10-07
  callbill ani calls.csv --json --dry-run")]
    Ani {
        /// Call logs with ani, duration and total_amount columns
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        dates: run::DateArgs,

        #[command(flatten)]
        output: run::OutputArgs,
    },

    /// Total the enabled numbers of a client list per domain
    #[command(after_help = "\
Examples:
  callbill compare clients.xlsx calls.csv
  callbill compare clients.csv calls.csv --start 2025-10-01")]
    Compare {
        /// Client list with phone number, domain and enable columns
        clients: PathBuf,

        /// Call log with ani, duration and total_amount columns
        calls: PathBuf,

        #[command(flatten)]
        dates: run::DateArgs,

        #[command(flatten)]
        output: run::OutputArgs,
    },

    /// Inspect run configuration files
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Flags shared by every subcommand.
pub struct GlobalArgs {
    pub quiet: bool,
    pub config: Option<PathBuf>,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  callbill-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  callbill-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let global = GlobalArgs {
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Commands::TollFree { calls, customers, output } => {
            run::cmd_toll_free(&global, calls, customers, output)
        }
        Commands::Ani { files, dates, output } => run::cmd_ani(&global, files, dates, output),
        Commands::Compare { clients, calls, dates, output } => {
            run::cmd_compare(&global, clients, calls, dates, output)
        }
        Commands::Config(cmd) => config::cmd_config(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with the matching exit code.
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::Schema { .. } => {
                Some("check the header row; column names are matched case-insensitively".to_string())
            }
            ReconError::NoMatch(_) => {
                Some("check that both files cover the same numbers and dates".to_string())
            }
            ReconError::InvalidDateRange(_) => {
                Some("dates are YYYY-MM-DD; --start must not be after --end".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Create error from a read/write failure.
    pub fn file(err: IoError) -> Self {
        let code = io_exit_code(&err);
        let hint = match &err {
            IoError::Unsupported { .. } => {
                Some("supported inputs: csv, txt, tsv, xlsx, xlsm, xls, xlsb, ods".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
