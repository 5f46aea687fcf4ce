use clap::Parser;
use gfp::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{compare, fingerprint, search, serialize},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Fingerprint(_) => "fingerprint",
        Command::Compare(_) => "compare",
        Command::Serialize(_) => "serialize",
        Command::Search(_) => "search",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Fingerprint(args) => fingerprint::fingerprint(args)?,
        Command::Compare(args) => compare::compare(args)?,
        Command::Serialize(args) => serialize::serialize(args)?,
        Command::Search(args) => search::search(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
