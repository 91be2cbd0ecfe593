//! Reference subject: `xmlbench-quickxml <input_path> <output_path>`.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use xmlbench::subject::{format_report, run};

fn main() {
    if let Err(e) = try_main() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let [input, output] = args.as_slice() else {
        bail!("usage: xmlbench-quickxml <input_path> <output_path>");
    };

    let summary = run(input, output)?;
    println!("{}", format_report(&summary));
    summary
        .write_to_env_path()
        .context("failed to write timing summary")?;
    Ok(())
}
