use anyhow::anyhow;
use clap::Parser;
use ramap::{
    country::lookup::CountryLookup,
    region::regions::{get_region, REGIONS},
    service::{map_service::render_region_map, var_service::Settings},
    util::{env_service::load_env_file, log_service::setup_logging},
};
use std::{path::PathBuf, process::ExitCode};

/// Draws a WMO Regional Association map of country boundaries and labels.
#[derive(Debug, Parser)]
#[command(name = "ramap", version)]
struct Cli {
    /// Region preset: RAIVc (RA IV Caribbean) or RAVI (RA VI).
    region: String,

    /// Report countries dropped while merging the reference tables.
    #[arg(short, long)]
    verbose: bool,

    /// Keep the white border around the figure.
    #[arg(long)]
    no_trim: bool,

    /// Output PNG path; defaults to `{RAMAP_OUTPUT_DIR}/{region}.png`.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    load_env_file()?;
    let mut settings = Settings::from_env()?;
    if cli.no_trim {
        settings.trim = false;
    }

    let region = get_region(&cli.region).ok_or_else(|| {
        let keys: Vec<&str> = REGIONS.iter().map(|r| r.key).collect();
        anyhow!("Unknown region {}; expected one of {}", cli.region, keys.join(", "))
    })?;

    let lookup = CountryLookup::load(&settings.name_table, &settings.centroid_table, cli.verbose)?;
    let report = render_region_map(region, &lookup, &settings, cli.output)?;
    tracing::info!(
        "{}: drew {} countries, {} without information",
        region.name,
        report.drawn.len(),
        report.missing.len()
    );

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(cli.verbose) {
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
