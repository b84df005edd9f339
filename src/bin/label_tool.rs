use clap::Parser;
use ramap::{
    country::lookup::CountryLookup,
    service::{label_service::write_labels, var_service::Settings},
    util::{env_service::load_env_file, log_service::setup_logging},
};
use std::{path::PathBuf, process::ExitCode};

/// Writes `{alpha3} ({lon}, {lat}) {code}` label lines for a list of countries.
#[derive(Debug, Parser)]
#[command(name = "label_tool", version)]
struct Cli {
    /// Comma-separated ISO 3166-1 alpha-2 codes, e.g. `SE,NO,GB`.
    codes: String,

    /// File to write the label lines to.
    output: PathBuf,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    load_env_file()?;
    let settings = Settings::from_env()?;
    let lookup = CountryLookup::load(&settings.name_table, &settings.centroid_table, true)?;
    write_labels(&cli.codes, &cli.output, &lookup)?;

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(false) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
