//! Configuration management for `xmlbench`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`XMLBENCH_*`)
//! 3. Project config (`xmlbench.yaml`, or the file given by `--config`)
//! 4. Defaults
//!
//! Resolution yields an immutable [`BenchmarkConfig`].

use crate::error::{BenchError, Result};
use crate::model::{Dataset, Subject};
use crate::util::{sibling_executable, with_exe_suffix};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Project config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "xmlbench.yaml";
/// Default result sink.
pub const DEFAULT_RESULTS_FILENAME: &str = "results.csv";
/// Default repetition count.
pub const DEFAULT_REPETITIONS: u32 = 5;
/// Name of the data generator binary.
pub const GENERATOR_NAME: &str = "xmlgen";

/// Fixed datasets and their target sizes in MB.
pub const DEFAULT_DATASETS: &[(&str, u64)] = &[
    ("data_10mb.xml", 10),
    ("data_50mb.xml", 50),
    ("data_100mb.xml", 100),
    ("data_200mb.xml", 200),
];

/// Subjects benchmarked when none are configured.
pub const DEFAULT_SUBJECTS: &[&str] = &["pugixml_test", "tinyxml2_test", "rapidxml_test"];

const ENV_PREFIX: &str = "XMLBENCH_";

/// Fully resolved, immutable run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    /// Runs per (dataset, subject) pair, at least 1.
    pub repetitions: u32,
    /// Datasets in execution order; the custom dataset, if any, is last.
    pub datasets: Vec<Dataset>,
    pub subjects: Vec<Subject>,
    /// User-supplied extra dataset.
    pub custom: Option<PathBuf>,
    pub generator: PathBuf,
    pub results_path: PathBuf,
    /// Directory receiving per-run subject outputs.
    pub work_dir: PathBuf,
    /// Per-subject wall-clock limit; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Keep per-run subject outputs after their record is persisted.
    pub keep_outputs: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            repetitions: DEFAULT_REPETITIONS,
            datasets: default_datasets(),
            subjects: default_subjects(),
            custom: None,
            generator: default_generator(),
            results_path: PathBuf::from(DEFAULT_RESULTS_FILENAME),
            work_dir: PathBuf::from("."),
            timeout: None,
            keep_outputs: true,
        }
    }
}

#[must_use]
pub fn default_datasets() -> Vec<Dataset> {
    DEFAULT_DATASETS
        .iter()
        .map(|(path, size)| Dataset::generated(*path, *size))
        .collect()
}

#[must_use]
pub fn default_subjects() -> Vec<Subject> {
    DEFAULT_SUBJECTS
        .iter()
        .map(|name| Subject::new(*name, Path::new(".").join(with_exe_suffix(name))))
        .collect()
}

/// The generator next to the running executable, else whatever `xmlgen` is on PATH.
#[must_use]
pub fn default_generator() -> PathBuf {
    sibling_executable(GENERATOR_NAME)
        .unwrap_or_else(|| PathBuf::from(with_exe_suffix(GENERATOR_NAME)))
}

/// One configuration source. Unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLayer {
    pub amount: Option<u32>,
    pub datasets: Option<Vec<Dataset>>,
    pub subjects: Option<Vec<Subject>>,
    pub generator: Option<PathBuf>,
    pub results: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub keep_outputs: Option<bool>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field.clone_from(&other.$field);
                })*
            };
        }
        take!(
            amount,
            datasets,
            subjects,
            generator,
            results,
            work_dir,
            timeout_secs,
            keep_outputs
        );
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let layer: Self = serde_yaml::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(layer)
    }

    /// Build a layer from `XMLBENCH_*` variables.
    ///
    /// Takes the variables explicitly so callers (and tests) control the source;
    /// pass `std::env::vars()` for the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a recognized variable has an unparseable value.
    pub fn from_env<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "AMOUNT" => layer.amount = Some(parse_number(&key, &value)?),
                "RESULTS" => layer.results = Some(PathBuf::from(value)),
                "GENERATOR" => layer.generator = Some(PathBuf::from(value)),
                "WORK_DIR" => layer.work_dir = Some(PathBuf::from(value)),
                "TIMEOUT" => layer.timeout_secs = Some(parse_number(&key, &value)?),
                "KEEP_OUTPUTS" => {
                    let keep = parse_bool(&value).ok_or_else(|| {
                        BenchError::invalid_argument(
                            key.clone(),
                            format!("not a boolean: '{value}'"),
                        )
                    })?;
                    layer.keep_outputs = Some(keep);
                }
                _ => {}
            }
        }
        Ok(layer)
    }
}

/// CLI overrides for config loading.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub amount: Option<u32>,
    pub custom: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub results: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub generator: Option<PathBuf>,
    pub subjects: Vec<String>,
    pub work_dir: Option<PathBuf>,
    pub clean_outputs: bool,
}

impl CliOverrides {
    /// Convert to a config layer.
    ///
    /// # Errors
    ///
    /// Returns an error if a `--subject` value is malformed.
    pub fn as_layer(&self) -> Result<ConfigLayer> {
        let subjects = if self.subjects.is_empty() {
            None
        } else {
            Some(
                self.subjects
                    .iter()
                    .map(|s| s.parse::<Subject>())
                    .collect::<Result<Vec<_>>>()?,
            )
        };

        Ok(ConfigLayer {
            amount: self.amount,
            datasets: None,
            subjects,
            generator: self.generator.clone(),
            results: self.results.clone(),
            work_dir: self.work_dir.clone(),
            timeout_secs: self.timeout_secs,
            keep_outputs: self.clean_outputs.then_some(false),
        })
    }
}

/// Load the project config: the explicit file (which must exist) or the
/// default file in the working directory (which may not).
///
/// # Errors
///
/// Returns an error if an explicit file is missing, or a file cannot be parsed.
pub fn load_project_config(explicit: Option<&Path>) -> Result<ConfigLayer> {
    match explicit {
        Some(path) if !path.is_file() => Err(BenchError::Config(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => ConfigLayer::from_yaml(path),
        None => ConfigLayer::from_yaml(Path::new(DEFAULT_CONFIG_FILENAME)),
    }
}

impl BenchmarkConfig {
    /// Resolve defaults, project file, environment and CLI into a config.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unparseable sources, zero repetitions,
    /// an empty subject or dataset list, or a custom dataset missing on disk.
    pub fn resolve<I>(cli: &CliOverrides, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let project = load_project_config(cli.config.as_deref())?;
        let env = ConfigLayer::from_env(vars)?;
        let merged = ConfigLayer::merge_layers(&[project, env, cli.as_layer()?]);
        Self::from_layer(&merged, cli.custom.clone())
    }

    /// Apply a merged layer on top of defaults and validate.
    ///
    /// # Errors
    ///
    /// See [`BenchmarkConfig::resolve`].
    pub fn from_layer(layer: &ConfigLayer, custom: Option<PathBuf>) -> Result<Self> {
        let defaults = Self::default();

        let repetitions = layer.amount.unwrap_or(defaults.repetitions);
        if repetitions == 0 {
            return Err(BenchError::invalid_argument("amount", "must be at least 1"));
        }

        let mut datasets = layer.datasets.clone().unwrap_or(defaults.datasets);
        if let Some(path) = &custom {
            if !path.exists() {
                return Err(BenchError::CustomDatasetMissing { path: path.clone() });
            }
            datasets.push(Dataset::custom(path.clone()));
        }
        if datasets.is_empty() {
            return Err(BenchError::Config("no datasets configured".to_string()));
        }

        let subjects = layer.subjects.clone().unwrap_or(defaults.subjects);
        if subjects.is_empty() {
            return Err(BenchError::Config("no subjects configured".to_string()));
        }
        check_unique_subjects(&subjects)?;

        let timeout = match layer.timeout_secs {
            Some(0) | None => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            repetitions,
            datasets,
            subjects,
            custom,
            generator: layer.generator.clone().unwrap_or(defaults.generator),
            results_path: layer.results.clone().unwrap_or(defaults.results_path),
            work_dir: layer.work_dir.clone().unwrap_or(defaults.work_dir),
            timeout,
            keep_outputs: layer.keep_outputs.unwrap_or(defaults.keep_outputs),
        })
    }

    /// Number of records a completed run produces.
    #[must_use]
    pub fn expected_records(&self) -> usize {
        self.datasets.len() * self.subjects.len() * self.repetitions as usize
    }
}

/// Two subjects sharing a name (or a file-name form) would overwrite each
/// other's outputs and produce indistinguishable rows.
fn check_unique_subjects(subjects: &[Subject]) -> Result<()> {
    let mut seen: HashMap<String, &Subject> = HashMap::new();
    for subject in subjects {
        for key in [subject.name.clone(), subject.file_name()] {
            if let Some(previous) = seen.get(&key) {
                if !std::ptr::eq(*previous, subject) {
                    return Err(BenchError::Config(format!(
                        "subjects '{}' ({}) and '{}' ({}) share the name '{key}'",
                        previous.name,
                        previous.program.display(),
                        subject.name,
                        subject.program.display()
                    )));
                }
            }
            seen.insert(key, subject);
        }
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BenchError::invalid_argument(key, format!("not a number: '{value}'")))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
