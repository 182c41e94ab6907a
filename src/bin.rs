use anyhow::Result;
use clap::{App, Arg, ArgMatches};
use std::{path::Path, str::FromStr};
use tracing::{subscriber::set_global_default, Level};

mod commands;
mod config;

/// Global arguments may be given before or after the subcommand.
fn global_value<'a>(matches: &'a ArgMatches, scoped: &'a ArgMatches, name: &str) -> &'a str {
    scoped
        .value_of(name)
        .or_else(|| matches.value_of(name))
        .unwrap_or_else(|| panic!("Missing value for '{}' argument", name))
}

fn install_tracing(verbosity: &str) -> Result<()> {
    let tracing_level = Level::from_str(verbosity)?;

    let collector = tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .finish();

    set_global_default(collector)?;

    Ok(())
}

fn main() -> Result<()> {
    let matches = App::new("kanon-prep")
        .version("0.1.0")
        .about("Loads data definitions and experiment manifests for k-anonymization runs")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .global(true)
                .default_value("./kanon.toml")
                .help("Path to the config file to use"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .takes_value(true)
                .global(true)
                .default_value("INFO")
                .help("Sets the level of verbosity"),
        )
        .subcommand(
            App::new("target")
                .about("Prints the target column of a data definition")
                .arg(
                    Arg::new("definition")
                        .required(true)
                        .help("Path to the data definition document"),
                ),
        )
        .subcommand(App::new("init").about("Writes a starter config file"))
        .get_matches();

    let scoped = matches
        .subcommand()
        .map(|(_, sub_matches)| sub_matches)
        .unwrap_or(&matches);

    install_tracing(global_value(&matches, scoped, "verbosity"))?;

    let config_file_path = Path::new(global_value(&matches, scoped, "config"));

    match matches.subcommand() {
        Some(("target", sub_matches)) => commands::target::execute(sub_matches),
        Some(("init", _)) => commands::init::execute(config_file_path),
        _ => commands::prepare::execute(config_file_path),
    }
}
