//! Comparative XML benchmark.
//!
//! Generates synthetic XML datasets, runs each subject program against each
//! dataset a configured number of times, and records read/write timings in
//! a CSV file as they arrive.

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod model;
pub mod report;
pub mod runner;
pub mod subject;
pub mod util;

pub use error::{BenchError, ErrorCategory, Result};
pub use model::{CellOutcome, Dataset, Subject, TimingRecord};
