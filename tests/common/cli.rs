use assert_cmd::Command;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

pub const XMLBENCH: &str = env!("CARGO_BIN_EXE_xmlbench");
pub const XMLGEN: &str = env!("CARGO_BIN_EXE_xmlgen");
pub const QUICKXML: &str = env!("CARGO_BIN_EXE_xmlbench-quickxml");

/// Variables the binaries read; cleared so the caller's shell cannot leak in.
const BENCH_ENV: &[&str] = &[
    "XMLBENCH_AMOUNT",
    "XMLBENCH_RESULTS",
    "XMLBENCH_TIMEOUT",
    "XMLBENCH_GENERATOR",
    "XMLBENCH_WORK_DIR",
    "XMLBENCH_KEEP_OUTPUTS",
    "XMLBENCH_SUMMARY",
];

#[derive(Debug)]
pub struct BenchRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl BenchRun {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

pub struct BenchWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl BenchWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            log_dir,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    /// Write an executable `/bin/sh` script usable as a subject or generator.
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.write(name, &format!("#!/bin/sh\n{body}\n"));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).expect("read workspace file")
    }
}

pub fn run_xmlbench<I, S>(workspace: &BenchWorkspace, args: I, label: &str) -> BenchRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_program(XMLBENCH, workspace, args, label)
}

pub fn run_xmlgen<I, S>(workspace: &BenchWorkspace, args: I, label: &str) -> BenchRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_program(XMLGEN, workspace, args, label)
}

pub fn run_program<I, S>(
    program: impl AsRef<Path>,
    workspace: &BenchWorkspace,
    args: I,
    label: &str,
) -> BenchRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    let mut cmd = Command::new(program.as_ref());
    cmd.current_dir(&workspace.root);
    cmd.args(&args);
    for key in BENCH_ENV {
        cmd.env_remove(key);
    }
    cmd.env("RUST_LOG", "xmlbench=debug");
    cmd.env("RUST_BACKTRACE", "1");

    let start = Instant::now();
    let output = cmd.output().expect("run program");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\n\
         stdout:\n{}\n\nstderr:\n{}\n",
        SystemTime::now(),
        duration,
        output.status,
        args,
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    BenchRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}
