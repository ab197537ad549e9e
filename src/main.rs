//! vuex-engine CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vuex_engine::cli::{Cli, Commands};
use vuex_engine::commands::{
    run_config, run_context, run_find, run_index, run_resolve, CommandContext,
};
use vuex_engine::EngineConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return e.exit_code();
        }
    };

    init_logging(&config.logging.level, cli.verbose);

    match run(&cli, config) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the configured level
fn init_logging(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    let directive = format!("vuex_engine={}", level);

    let mut filter = EnvFilter::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log level {}: {}", level, e),
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli, config: EngineConfig) -> vuex_engine::Result<String> {
    let ctx = CommandContext::new(cli.format, cli.verbose, config);

    match &cli.command {
        Commands::Index(args) => run_index(args, &ctx),
        Commands::Context(args) => run_context(args, &ctx),
        Commands::Find(args) => run_find(args, &ctx),
        Commands::Resolve(args) => run_resolve(args, &ctx),
        Commands::Config => run_config(&ctx),
    }
}
