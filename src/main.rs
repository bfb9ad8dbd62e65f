use clap::Parser;
use std::time;
use svmerge::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::merge,
    utils::util::{handle_error_and_exit, Result},
};

fn parse_cli() -> Cli {
    // Help and version keep clap's exit code 0; every argument error
    // exits 1 like any other failure of the run.
    Cli::try_parse().unwrap_or_else(|e| match e.kind() {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => e.exit(),
        _ => {
            let _ = e.print();
            std::process::exit(1);
        }
    })
}

fn runner(cli: Cli) -> Result<()> {
    init_verbose(&cli);
    log::trace!("CLI options set: {:?}", cli);

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        &**FULL_VERSION,
        cli.command.name()
    );

    let start_timer = time::Instant::now();
    match cli.command {
        Command::Merge(args) => {
            log::trace!("Merge arguments: {:#?}", args);
            merge(args)?
        }
    }
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());

    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner(parse_cli()) {
        handle_error_and_exit(e);
    }
}
