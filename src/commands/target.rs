use anyhow::Result;
use clap::ArgMatches;
use kanon_prep::load_target;
use std::path::Path;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let definition_path = Path::new(
        matches
            .value_of("definition")
            .expect("Missing value for 'definition' argument"),
    );

    println!("{}", load_target(definition_path)?);

    Ok(())
}
