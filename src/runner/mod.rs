//! Benchmark orchestration.
//!
//! A run moves through
//! `ParsingConfig -> EnsuringDatasets -> RunningMatrix -> Done`, or to
//! `Aborted` on a fatal error. Only configuration, generation and
//! persistence failures are fatal; a misbehaving subject is recorded with
//! sentinel timings and the matrix moves on.
//!
//! Everything runs strictly sequentially: concurrent subjects would contend
//! for CPU, cache and disk and invalidate the comparison.

pub mod contract;
pub mod process;

use crate::config::BenchmarkConfig;
use crate::error::{BenchError, Result};
use crate::model::{CellOutcome, Dataset, Subject, TimingRecord};
use crate::report::{Aggregator, CsvSink, ResultSink};
use crate::util::file_size_mb;
use contract::{SUMMARY_ENV, Summary};
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Orchestrator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ParsingConfig,
    EnsuringDatasets,
    RunningMatrix,
    Done,
    Aborted,
}

impl Phase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ParsingConfig => "parsing_config",
            Self::EnsuringDatasets => "ensuring_datasets",
            Self::RunningMatrix => "running_matrix",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one matrix cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellResult {
    pub record: TimingRecord,
    pub outcome: CellOutcome,
}

/// Totals for a completed matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    /// Records with both timings known.
    pub measured: usize,
    /// Records with one or both timings set to the sentinel.
    pub incomplete: usize,
    pub timed_out: usize,
    pub launch_failures: usize,
}

impl RunSummary {
    fn add(&mut self, cell: &CellResult) {
        self.records += 1;
        if cell.record.is_complete() {
            self.measured += 1;
        } else {
            self.incomplete += 1;
        }
        match cell.outcome {
            CellOutcome::TimedOut => self.timed_out += 1,
            CellOutcome::LaunchFailed => self.launch_failures += 1,
            _ => {}
        }
    }
}

/// Output path for one subject run: `temp_<subject>_<run>.xml`.
///
/// Reused across datasets; unique across subjects and repetitions.
#[must_use]
pub fn output_path(work_dir: &Path, subject: &Subject, run: u32) -> PathBuf {
    work_dir.join(format!("temp_{}_{run}.xml", subject.file_name()))
}

/// Drives dataset preparation and the (dataset x subject x run) matrix.
pub struct Orchestrator {
    config: BenchmarkConfig,
    phase: Phase,
    console: bool,
}

impl Orchestrator {
    /// Wrap an already-validated config.
    #[must_use]
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            phase: Phase::ParsingConfig,
            console: true,
        }
    }

    /// Enable or disable console progress lines.
    #[must_use]
    pub const fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    fn transition(&mut self, next: Phase) {
        info!(from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
    }

    fn abort<T>(&mut self, err: BenchError) -> Result<T> {
        warn!(
            phase = %self.phase,
            category = err.category().as_str(),
            error = %err,
            "Aborting run"
        );
        self.transition(Phase::Aborted);
        Err(err)
    }

    fn say(&self, line: &str) {
        if self.console {
            println!("{line}");
        }
    }

    /// Run everything: datasets, sink, matrix.
    ///
    /// The result sink is created only once every dataset is available.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, generation or persistence error.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.ensure_datasets()?;
        let sink = match CsvSink::create(&self.config.results_path) {
            Ok(sink) => sink,
            Err(err) => return self.abort(err),
        };
        let mut aggregator = Aggregator::new(sink, self.console);
        let summary = self.run_matrix(&mut aggregator)?;
        self.say(&format!(
            "\nResults saved to {}",
            self.config.results_path.display()
        ));
        if summary.incomplete > 0 {
            self.say(&format!(
                "{} of {} runs reported missing timings (-1), {} timed out",
                summary.incomplete, summary.records, summary.timed_out
            ));
        }
        Ok(summary)
    }

    /// Make sure every dataset exists, generating managed ones when absent.
    ///
    /// Unmanaged datasets are checked before any generator is spawned.
    /// Returns the paths that were generated.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::CustomDatasetMissing`] for an absent unmanaged
    /// dataset, or a generation error if the generator fails.
    pub fn ensure_datasets(&mut self) -> Result<Vec<PathBuf>> {
        self.transition(Phase::EnsuringDatasets);

        if let Some(missing) = self
            .config
            .datasets
            .iter()
            .find(|d| !d.is_managed() && !d.path.exists())
        {
            let err = BenchError::CustomDatasetMissing {
                path: missing.path.clone(),
            };
            return self.abort(err);
        }

        let pending: Vec<Dataset> = self
            .config
            .datasets
            .iter()
            .filter(|d| d.is_managed() && !d.path.exists())
            .cloned()
            .collect();

        let mut generated = Vec::with_capacity(pending.len());
        for dataset in pending {
            if let Err(err) = self.generate_dataset(&dataset) {
                return self.abort(err);
            }
            generated.push(dataset.path);
        }
        Ok(generated)
    }

    fn generate_dataset(&self, dataset: &Dataset) -> Result<()> {
        let generator = &self.config.generator;
        self.say(&format!("Generating test file: {}", dataset.id()));
        info!(
            dataset = %dataset.id(),
            size_mb = dataset.size_mb,
            generator = %generator.display(),
            "Generating missing dataset"
        );

        let size = dataset.size_mb.to_string();
        let args = [dataset.path.as_os_str(), OsStr::new(&size)];
        let no_env = std::iter::empty::<(&str, &str)>();
        let output = process::run_program(generator, args, no_env, None).map_err(|source| {
            BenchError::GeneratorLaunch {
                program: generator.clone(),
                source,
            }
        })?;

        if !output.success() {
            let detail = output.stderr.trim();
            return Err(BenchError::Generation {
                path: dataset.path.clone(),
                reason: match output.exit_code() {
                    Some(code) if detail.is_empty() => {
                        format!("generator exited with status {code}")
                    }
                    Some(code) => format!("generator exited with status {code}: {detail}"),
                    None => "generator terminated by signal".to_string(),
                },
            });
        }

        let Some(size_mb) = file_size_mb(&dataset.path) else {
            return Err(BenchError::Generation {
                path: dataset.path.clone(),
                reason: "generator succeeded but the file is missing".to_string(),
            });
        };
        self.say(&format!("Generated {}, size {size_mb} MB", dataset.id()));
        Ok(())
    }

    /// Execute every (dataset, subject, run) cell in order and record it.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if a record cannot be stored, or an I/O
    /// error if the scratch directory for summaries cannot be created.
    pub fn run_matrix<S: ResultSink>(
        &mut self,
        aggregator: &mut Aggregator<S>,
    ) -> Result<RunSummary> {
        self.transition(Phase::RunningMatrix);

        let scratch = match tempfile::Builder::new().prefix("xmlbench-").tempdir() {
            Ok(dir) => dir,
            Err(err) => return self.abort(err.into()),
        };

        let mut summary = RunSummary::default();
        let repetitions = self.config.repetitions;
        let datasets = self.config.datasets.clone();
        let subjects = self.config.subjects.clone();

        for dataset in &datasets {
            for subject in &subjects {
                aggregator.begin_pair(&subject.name, &dataset.id(), repetitions);
                for run in 1..=repetitions {
                    let cell = self.run_cell(dataset, subject, run, &scratch);
                    if let Err(err) = aggregator.accept(&cell.record) {
                        return self.abort(err);
                    }
                    summary.add(&cell);
                    self.discard_output(subject, run);
                }
            }
        }

        info!(
            records = summary.records,
            measured = summary.measured,
            incomplete = summary.incomplete,
            "Matrix complete"
        );
        self.transition(Phase::Done);
        Ok(summary)
    }

    /// Run one subject once against one dataset. Never fails: every problem
    /// is folded into the record's timings and the outcome.
    #[must_use]
    pub fn run_cell(
        &self,
        dataset: &Dataset,
        subject: &Subject,
        run: u32,
        scratch: &TempDir,
    ) -> CellResult {
        let output = output_path(&self.config.work_dir, subject, run);
        let summary_path = scratch.path().join("summary.json");
        remove_if_present(&summary_path);

        debug!(
            subject = %subject.name,
            dataset = %dataset.id(),
            run,
            output = %output.display(),
            "Running cell"
        );

        let args = [dataset.path.as_os_str(), output.as_os_str()];
        let envs = [(SUMMARY_ENV, summary_path.as_os_str())];
        let result = process::run_program(&subject.program, args, envs, self.config.timeout);

        let cell = match result {
            Err(err) => {
                warn!(
                    subject = %subject.name,
                    program = %subject.program.display(),
                    error = %err,
                    "Failed to launch subject"
                );
                CellResult {
                    record: TimingRecord::failed(&subject.name, dataset.id(), run),
                    outcome: CellOutcome::LaunchFailed,
                }
            }
            Ok(out) if out.timed_out => {
                warn!(
                    subject = %subject.name,
                    run,
                    elapsed_ms = out.elapsed.as_millis(),
                    "Subject timed out"
                );
                CellResult {
                    record: TimingRecord::failed(&subject.name, dataset.id(), run),
                    outcome: CellOutcome::TimedOut,
                }
            }
            Ok(out) if !out.success() => {
                // Tokens from a failed run are not trusted.
                warn!(
                    subject = %subject.name,
                    run,
                    code = ?out.exit_code(),
                    stderr = %out.stderr.trim(),
                    "Subject exited with failure"
                );
                CellResult {
                    record: TimingRecord::failed(&subject.name, dataset.id(), run),
                    outcome: CellOutcome::SubjectFailed,
                }
            }
            Ok(out) => {
                let timings = contract::resolve(Summary::read_from(&summary_path), &out.stdout);
                let record = TimingRecord::new(
                    &subject.name,
                    dataset.id(),
                    run,
                    timings.read_ms,
                    timings.write_ms,
                );
                let outcome = if record.is_complete() {
                    CellOutcome::Measured
                } else {
                    warn!(subject = %subject.name, run, "Subject output is missing timing tokens");
                    CellOutcome::ContractViolation
                };
                CellResult { record, outcome }
            }
        };

        remove_if_present(&summary_path);
        debug!(
            subject = %subject.name,
            run,
            read_ms = cell.record.read_or_sentinel(),
            write_ms = cell.record.write_or_sentinel(),
            outcome = %cell.outcome,
            "Cell finished"
        );
        cell
    }

    fn discard_output(&self, subject: &Subject, run: u32) {
        if self.config.keep_outputs {
            return;
        }
        remove_if_present(&output_path(&self.config.work_dir, subject, run));
    }
}

fn remove_if_present(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "Failed to remove file");
        }
    }
}
