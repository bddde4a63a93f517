//! # Plate Selection CLI
//!
//! Command line driver for `plate_core`.
//!
//! ```text
//! plate_cli run --input members.xlsx --library plates.xlsx --config config.yaml --out selection.xlsx
//! plate_cli diagnose --input members.xlsx --library plates.xlsx --config config.yaml
//! ```
//!
//! ## Exit codes
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | Bad arguments or an unexpected panic                 |
//! | 2    | Configuration error                                  |
//! | 3    | Plate library error                                  |
//! | 4    | Invalid or missing input                             |
//! | 5    | File or serialization error                          |
//! | 6    | No segment has a feasible combination                |

mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use plate_core::report::write_report;
use plate_core::{PlateError, ReportSummary, RunInputs};

/// Exit code when every segment is infeasible
const EXIT_ALL_INFEASIBLE: u8 = 6;

#[derive(Parser, Debug)]
#[command(name = "plate_cli", version, about = "Select the lightest web + flange plate combination per member segment")]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Select plates and write the report
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        /// Report file (.xlsx, .csv or .json)
        #[arg(long)]
        out: PathBuf,

        /// Exit 0 even when no segment has a feasible combination
        #[arg(long)]
        allow_infeasible: bool,
    },
    /// Print per-segment search statistics as JSON
    Diagnose {
        #[command(flatten)]
        inputs: InputArgs,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Member input table (.xlsx, .xls or .csv)
    #[arg(long)]
    input: PathBuf,

    /// Plate library (.xlsx with web/flange sheets, or .csv with a kind column)
    #[arg(long)]
    library: PathBuf,

    /// Run configuration (.yaml, .yml or .json)
    #[arg(long)]
    config: PathBuf,

    /// Design-code limits (.json); all code checks report "Not evaluated" without it
    #[arg(long)]
    code_limits: Option<PathBuf>,
}

impl InputArgs {
    fn load(&self) -> Result<RunInputs, PlateError> {
        RunInputs::load(&self.input, &self.library, &self.config, self.code_limits.as_deref())
    }
}

#[derive(Serialize)]
struct RunOutput<'a> {
    #[serde(flatten)]
    summary: ReportSummary,
    out: &'a Path,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    ExitCode::from(execute(&cli))
}

/// Run the parsed command and map the outcome to a process exit code
fn execute(cli: &Cli) -> u8 {
    let result = match &cli.command {
        Commands::Run {
            inputs,
            out,
            allow_infeasible,
        } => run(inputs, out, *allow_infeasible),
        Commands::Diagnose { inputs } => diagnose(inputs),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(code = err.error_code(), "{}", err);
            eprintln!("Error: {}", err);
            if let Ok(json) = serde_json::to_string_pretty(&err) {
                eprintln!("{}", json);
            }
            err.exit_code()
        }
    }
}

fn run(inputs: &InputArgs, out: &Path, allow_infeasible: bool) -> Result<u8, PlateError> {
    let report = inputs.load()?.run()?;
    write_report(&report, out)?;

    let output = RunOutput {
        summary: report.summary(),
        out,
    };
    print_json(&output)?;

    if report.all_infeasible() && !allow_infeasible {
        tracing::warn!("no segment has a feasible combination");
        return Ok(EXIT_ALL_INFEASIBLE);
    }
    Ok(0)
}

fn diagnose(inputs: &InputArgs) -> Result<u8, PlateError> {
    let diagnosis = inputs.load()?.diagnose()?;
    print_json(&diagnosis)?;
    Ok(0)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PlateError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| PlateError::serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
