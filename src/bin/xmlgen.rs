use xmlbench::cli::{GenCli, parse_or_exit};
use xmlbench::generator::generate_file;
use xmlbench::logging::init_logging;

fn main() {
    let cli: GenCli = parse_or_exit();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let file = cli.output.display();
    if !cli.quiet {
        println!("Generating {file} ({} MB)", cli.size_mb);
    }

    match generate_file(&cli.output, cli.size_mb, cli.seed) {
        Ok(summary) => {
            if !cli.quiet {
                println!(
                    "Generated {file} ({} entries, {:.2} MB)",
                    summary.entries,
                    summary.megabytes()
                );
            }
        }
        Err(e) => {
            eprintln!("{}", e.to_human());
            std::process::exit(e.exit_code());
        }
    }
}
