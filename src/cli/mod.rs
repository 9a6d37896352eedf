mod shell;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{AppError, LedgerSession, LevyConfig};
use crate::domain::{normalize_amount, BlankPolicy, CalculationResult};
use crate::io::{Exporter, ImportOptions, Importer};

pub use shell::{run_shell, ShellCommand};

/// Lodging Levy - overnight levy calculator
#[derive(Parser)]
#[command(name = "lodging-levy")]
#[command(about = "Validates nightly hotel charges and reports 5% of their per-night average")]
#[command(version)]
pub struct Cli {
    /// JSON config file (blank_policy, normalize_on_commit, labels)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Blank rows: strict (rejected) or lenient (count as zero)
    #[arg(long, global = true, value_name = "POLICY")]
    pub blank_policy: Option<BlankPolicy>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Calculate the levy for the given nightly amounts
    Calc {
        /// One amount per night (e.g., "89,90" or "89.90"); "" for a blank row
        #[arg(required = true)]
        amounts: Vec<String>,
    },

    /// Show the committed form of an amount
    Normalize {
        /// Amount as typed (e.g., "12.5")
        amount: String,
    },

    /// Load amounts from a CSV file (or a JSON snapshot) and calculate
    Import {
        /// Input file; `-` for stdin
        input: String,

        /// Input is a JSON snapshot written by `export`
        #[arg(long, conflicts_with = "dry_run")]
        snapshot: bool,

        /// Only check the values
        #[arg(long)]
        dry_run: bool,

        /// Field delimiter
        #[arg(long, default_value = ";")]
        delimiter: char,

        /// Write a JSON snapshot of the session after calculating
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Interactive row editor reading commands from stdin
    Shell,
}

impl Cli {
    /// Effective config: file (if any), then command-line overrides.
    pub fn levy_config(&self) -> Result<LevyConfig> {
        let mut config = match &self.config {
            Some(path) => LevyConfig::load(path)?,
            None => LevyConfig::default(),
        };
        if let Some(policy) = self.blank_policy {
            config.blank_policy = policy;
        }
        Ok(config)
    }

    pub fn run(self) -> Result<()> {
        let config = self.levy_config()?;

        match self.command {
            Commands::Calc { amounts } => {
                let mut session = LedgerSession::mount(config);
                run_calc_command(&mut session, &amounts)?;
                session.unmount();
            }

            Commands::Normalize { amount } => match normalize_amount(&amount) {
                Some(normalized) => println!("{}", normalized),
                None => bail!("Cannot normalize '{}': not a number", amount),
            },

            Commands::Import {
                input,
                snapshot,
                dry_run,
                delimiter,
                export,
            } => {
                let mut session = LedgerSession::mount(config);
                let source = if snapshot {
                    ImportSource::Snapshot
                } else {
                    ImportSource::Csv { dry_run, delimiter }
                };
                run_import_command(&mut session, &input, source, export)?;
                session.unmount();
            }

            Commands::Shell => {
                let mut session = LedgerSession::mount(config);
                let stdin = io::stdin();
                run_shell(&mut session, stdin.lock(), io::stdout())?;
                session.unmount();
            }
        }

        Ok(())
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the default level.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose {
        "lodging_levy=debug"
    } else {
        "lodging_levy=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_calc_command(session: &mut LedgerSession, amounts: &[String]) -> Result<()> {
    for (index, amount) in amounts.iter().enumerate() {
        let row = if index == 0 { 1 } else { session.add_row() };
        session
            .edit_row(row, amount)
            .with_context(|| format!("{}: cannot accept '{}'", session.row_label(row), amount))?;
        session.commit_row(row)?;
    }

    print_rows(session);
    let result = session.calculate()?;
    print_result(session.config(), &result);
    Ok(())
}

/// What an `import` input file holds.
enum ImportSource {
    Csv { dry_run: bool, delimiter: char },
    Snapshot,
}

fn open_input(input: &str) -> Result<Box<dyn Read>> {
    if input == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(input).with_context(|| format!("Cannot open {}", input))?;
    Ok(Box::new(BufReader::new(file)))
}

fn run_import_command(
    session: &mut LedgerSession,
    input: &str,
    source: ImportSource,
    export: Option<PathBuf>,
) -> Result<()> {
    match source {
        ImportSource::Snapshot => {
            let count = Importer::new(session).import_snapshot_json(open_input(input)?)?;
            println!("Restored {} rows", count);
        }
        ImportSource::Csv { dry_run, delimiter } => {
            if !delimiter.is_ascii() {
                bail!("Delimiter must be a single ASCII character");
            }
            let options = ImportOptions {
                dry_run,
                delimiter: delimiter as u8,
            };
            let result = Importer::new(session).import_amounts_csv(open_input(input)?, options)?;

            for error in &result.errors {
                eprintln!("Line {}: {}", error.line, error.error);
            }

            if dry_run {
                println!(
                    "Dry run: {} valid, {} invalid",
                    result.imported,
                    result.errors.len()
                );
                return Ok(());
            }
            println!("Imported {} amounts", result.imported);
        }
    }

    print_rows(session);

    let calculation = session.calculate();
    if let Some(path) = export {
        let file = File::create(&path)
            .with_context(|| format!("Cannot create {}", path.display()))?;
        Exporter::new(session).export_json(file)?;
        eprintln!("Exported snapshot to {}", path.display());
    }

    let result = calculation?;
    print_result(session.config(), &result);
    Ok(())
}

fn print_rows(session: &LedgerSession) {
    for row in session.rows() {
        let text = if row.entry.is_blank() {
            "-"
        } else {
            row.entry.text.as_str()
        };
        println!("{:<12} {:>12}", session.row_label(row.number), text);
    }
}

fn print_result(config: &LevyConfig, result: &CalculationResult) {
    println!("{}", "-".repeat(25));
    println!(
        "{}: {} {}",
        config.result_label, result.amount_text, result.currency_symbol
    );
}

/// Map an application error to a user-facing line for the shell.
pub(crate) fn describe_error(err: &AppError) -> String {
    match err {
        AppError::Edit(_) => format!("Input ignored: {}", err),
        _ => err.to_string(),
    }
}
