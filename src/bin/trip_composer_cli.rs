use std::{env, process};

use trip_composer::{
    cli::{self, CliError, Launch},
    init,
    utils::build_info,
};

fn main() {
    init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let args: Vec<String> = env::args().skip(1).collect();
    if matches!(args.first().map(String::as_str), Some("--version" | "-V")) {
        println!("{}", build_info::current().summary());
        return Ok(());
    }
    if matches!(args.first().map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let launch = Launch::from_args(args).ok_or_else(|| {
        print_usage();
        CliError::Usage("invalid arguments".into())
    })?;
    cli::run_cli(launch)
}

fn print_usage() {
    eprintln!(
        "Usage: trip_composer_cli [command]\n\
         Commands:\n  \
         create                      start a new trip (default)\n  \
         edit <trip.json>            edit an existing trip\n  \
         reactivate <trip.json>      reactivate a past trip\n\
         Set {}=1 to read shell commands from stdin.",
        cli::SCRIPT_ENV
    );
}
