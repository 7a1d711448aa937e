//! `callbill toll-free | ani | compare`: read inputs, run a flow, write the report.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde::Serialize;

use callbill_io::{artifact_path, read_table, write_report, OutputFormat};
use callbill_recon::{
    run_ani_summary, run_domain_compare, run_toll_free, DateRange, RawTable, RunConfig, RunOptions,
    RunOutput,
};

use crate::exit_codes::EXIT_ERROR;
use crate::preview::{self, PREVIEW_ROWS};
use crate::{CliError, GlobalArgs};

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    Xlsx,
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Xlsx => OutputFormat::Xlsx,
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Args)]
pub struct OutputArgs {
    /// Directory for the report (default: [output] directory from config, else cwd)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Report file format
    #[arg(long, value_enum, default_value = "xlsx")]
    pub format: Format,

    /// Print the run (meta, summary, sheets, artifacts) as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Print the first rows of the main sheet to stdout
    #[arg(long, conflicts_with = "json")]
    pub preview: bool,

    /// Run everything but write no files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct DateArgs {
    /// Keep calls on or after this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Keep calls on or before this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,
}

impl DateArgs {
    fn options(&self) -> Result<RunOptions, CliError> {
        let date_range = match (self.start, self.end) {
            (None, None) => None,
            (start, end) => Some(DateRange::new(start, end).map_err(CliError::recon)?),
        };
        Ok(RunOptions { date_range })
    }
}

/// `--json` payload: the run itself plus the files written for it.
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    run: &'a RunOutput,
    artifacts: Vec<String>,
}

pub fn cmd_toll_free(
    global: &GlobalArgs,
    calls: PathBuf,
    customers: PathBuf,
    output: OutputArgs,
) -> Result<(), CliError> {
    let config = load_config(global.config.as_deref())?;
    let calls = read(&calls)?;
    let customers = read(&customers)?;

    let run = run_toll_free(&calls, &customers, &config).map_err(CliError::recon)?;
    emit(global, &config, &run, &output)
}

pub fn cmd_ani(
    global: &GlobalArgs,
    files: Vec<PathBuf>,
    dates: DateArgs,
    output: OutputArgs,
) -> Result<(), CliError> {
    let options = dates.options()?;
    let config = load_config(global.config.as_deref())?;
    let tables = files.iter().map(|p| read(p)).collect::<Result<Vec<_>, _>>()?;

    let run = run_ani_summary(&tables, &options, &config).map_err(CliError::recon)?;
    emit(global, &config, &run, &output)
}

pub fn cmd_compare(
    global: &GlobalArgs,
    clients: PathBuf,
    calls: PathBuf,
    dates: DateArgs,
    output: OutputArgs,
) -> Result<(), CliError> {
    let options = dates.options()?;
    let config = load_config(global.config.as_deref())?;
    let clients = read(&clients)?;
    let calls = read(&calls)?;

    let run = run_domain_compare(&clients, &calls, &options, &config).map_err(CliError::recon)?;
    emit(global, &config, &run, &output)
}

/// Read and validate the config file, or fall back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig, CliError> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::config(format!("cannot read config {}: {e}", path.display())))?;
    RunConfig::from_toml(&text).map_err(|e| {
        CliError::recon(e).with_hint(format!("run `callbill config check {}` for details", path.display()))
    })
}

fn read(path: &Path) -> Result<RawTable, CliError> {
    read_table(path).map_err(CliError::file)
}

fn output_dir(output: &OutputArgs, config: &RunConfig) -> PathBuf {
    output
        .out_dir
        .clone()
        .or_else(|| config.output.directory.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn emit(global: &GlobalArgs, config: &RunConfig, run: &RunOutput, output: &OutputArgs) -> Result<(), CliError> {
    let mut written = Vec::new();
    if !output.dry_run {
        let dir = output_dir(output, config);
        std::fs::create_dir_all(&dir)
            .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;
        let now = chrono::Local::now().naive_local();
        let path = artifact_path(&dir, &run.meta, now, output.format.into());
        written = write_report(run, &path, output.format.into()).map_err(CliError::file)?;
    }

    if output.json {
        let report = JsonReport {
            run,
            artifacts: written.iter().map(|p| p.display().to_string()).collect(),
        };
        let json = serde_json::to_string_pretty(&report).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{json}");
    }

    if output.preview {
        if let Some(sheet) = run.sheets.primary() {
            print!("{}", preview::render(sheet, PREVIEW_ROWS));
        }
    }

    if !global.quiet {
        print_summary(run, &written, output.dry_run);
    }
    Ok(())
}

/// Human summary to stderr.
fn print_summary(run: &RunOutput, written: &[PathBuf], dry_run: bool) {
    let s = &run.summary;
    eprintln!(
        "{}: {} row(s) from {} record(s) in {} file(s), {} aggregated over {} key(s)",
        run.meta.flow,
        s.output_rows,
        s.records_scanned,
        s.files_read,
        s.records_aggregated,
        s.unique_keys,
    );
    if let Some(range) = s.date_range {
        eprintln!("date range: {range} ({} record(s) outside)", s.rejected_date);
    }
    if s.files_skipped_empty > 0 {
        eprintln!("skipped {} empty file(s)", s.files_skipped_empty);
    }
    if s.roster_rows > 0 {
        eprintln!(
            "roster: {} entr(ies) from {} row(s), {} matched, {} unmatched",
            s.roster_entries, s.roster_rows, s.matched_keys, s.unmatched_references,
        );
    }
    if s.warnings.total() > 0 {
        eprintln!(
            "warnings: {} bad duration(s), {} bad amount(s), {} bad timestamp(s), {} invalid key(s)",
            s.warnings.bad_durations, s.warnings.bad_amounts, s.warnings.bad_timestamps, s.warnings.invalid_keys,
        );
    }
    if dry_run {
        eprintln!("dry run: no files written");
    }
    for path in written {
        eprintln!("wrote {}", path.display());
    }
}
