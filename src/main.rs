use std::env;
use xmlbench::cli::{Cli, parse_or_exit};
use xmlbench::config::BenchmarkConfig;
use xmlbench::logging::init_logging;
use xmlbench::runner::Orchestrator;
use xmlbench::BenchError;

fn main() {
    let cli: Cli = parse_or_exit();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {e}");
    }

    // Non-UTF-8 variables cannot be XMLBENCH_* settings.
    let vars = env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
    let config = match BenchmarkConfig::resolve(&cli.overrides(), vars) {
        Ok(config) => config,
        Err(e) => handle_error(&e),
    };

    let mut orchestrator = Orchestrator::new(config).with_console(!cli.quiet);
    if let Err(e) = orchestrator.run() {
        handle_error(&e);
    }
}

fn handle_error(err: &BenchError) -> ! {
    eprintln!("{}", err.to_human());
    std::process::exit(err.exit_code());
}
