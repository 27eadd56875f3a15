mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::{Cli, Command};

/// Deeply nested bundles recurse once per syntax level.
const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // Show jsdeob info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("jsdeob", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .stack_size(WORKER_STACK_SIZE)
        .build()?;

    // the main thread keeps the default stack; run the command on a pool worker
    pool.install(|| run(&cli))
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Detect { path, recursive } => commands::detect::run(path, *recursive, &cli.global),
        Command::Deobfuscate {
            path,
            output,
            suffix,
            recursive,
            emit,
            no_strings,
            no_dictionaries,
            no_unflatten,
            loops,
            no_normalize,
            rounds,
            stats,
            report,
            layout,
        } => commands::deobfuscate::run(
            path,
            &commands::deobfuscate::DeobfuscateOptions {
                output: output.as_deref(),
                suffix,
                recursive: *recursive,
                emit: *emit,
                no_strings: *no_strings,
                no_dictionaries: *no_dictionaries,
                no_unflatten: *no_unflatten,
                loops: *loops,
                no_normalize: *no_normalize,
                rounds: *rounds,
                show_stats: *stats,
                report: report.as_deref(),
                layout: commands::generate::layout(layout),
                global: &cli.global,
            },
        ),
        Command::Generate {
            path,
            output,
            layout,
        } => commands::generate::run(path, output.as_deref(), &commands::generate::layout(layout)),
    }
}
