//! CLI definitions for the `xmlbench` and `xmlgen` binaries.

use crate::config::CliOverrides;
use clap::Parser;
use std::path::PathBuf;

/// Compare XML libraries by timing external subject programs
#[derive(Parser, Debug)]
#[command(name = "xmlbench", author, version, about, long_about = None)]
pub struct Cli {
    /// Repetitions per (dataset, subject) pair
    #[arg(short, long)]
    pub amount: Option<u32>,

    /// Extra pre-existing dataset appended after the generated ones
    #[arg(short, long, value_name = "PATH")]
    pub custom: Option<PathBuf>,

    /// Config file (default: ./xmlbench.yaml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Results CSV path
    #[arg(long, value_name = "PATH")]
    pub results: Option<PathBuf>,

    /// Kill a subject after this many seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Data generator program
    #[arg(long, value_name = "PATH")]
    pub generator: Option<PathBuf>,

    /// Subject as name=path or path (repeatable; replaces the default list)
    #[arg(long = "subject", value_name = "NAME=PATH")]
    pub subjects: Vec<String>,

    /// Directory for per-run output files
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Delete each per-run output file once its result is recorded
    #[arg(long)]
    pub clean_outputs: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Flags that feed the configuration layers.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            amount: self.amount,
            custom: self.custom.clone(),
            config: self.config.clone(),
            results: self.results.clone(),
            timeout_secs: self.timeout,
            generator: self.generator.clone(),
            subjects: self.subjects.clone(),
            work_dir: self.work_dir.clone(),
            clean_outputs: self.clean_outputs,
        }
    }
}

/// Generate a synthetic XML dataset of roughly the requested size
#[derive(Parser, Debug)]
#[command(name = "xmlgen", author, version, about, long_about = None)]
pub struct GenCli {
    /// File to write
    pub output: PathBuf,

    /// Target size in megabytes
    pub size_mb: u64,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parse the process arguments, exiting with status 1 on any usage error.
///
/// `--help` and `--version` still exit 0.
#[must_use]
pub fn parse_or_exit<P: Parser>() -> P {
    match P::try_parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            let code = i32::from(err.use_stderr());
            // Nothing useful to do if the terminal is gone.
            let _ = err.print();
            std::process::exit(code);
        }
    }
}
