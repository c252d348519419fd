use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use subrecon::cli::Cli;
use subrecon::output::{print_banner, ConsoleReporter, Reporter};
use subrecon::Pipeline;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "subrecon=debug",
        _ => "subrecon=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose);

    if !cli.quiet {
        print_banner(&cli.program);
    }

    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(cli.quiet));
    let pipeline = Pipeline::new(cli.to_config(), Arc::clone(&reporter));

    let result = pipeline
        .run()
        .await
        .with_context(|| format!("run for {} aborted", cli.program));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
