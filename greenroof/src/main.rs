//! Point d'entrée CLI pour greenroof

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;
use greenroof::config::Overrides;

/// Repérer les toitures candidates à la végétalisation
#[derive(Parser)]
#[command(name = "greenroof")]
#[command(author, version)]
#[command(about = "Screen building footprints for green-roof retrofit suitability")]
#[command(long_about = "Combine roof area with impervious surface, land cover and tree canopy rasters to score, flag and rank buildings.\n\nResults are written as GeoJSON in a geographic CRS (EPSG:4326 by default).")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Screen {
            buildings,
            output,
            config,
            impervious,
            land_cover,
            canopy,
            working_epsg,
            output_epsg,
            variant,
            report,
        } => {
            info!(config = %config, "Green-roof screening");
            let overrides = Overrides {
                buildings,
                output,
                impervious,
                land_cover,
                canopy,
                working_epsg,
                output_epsg,
                variant,
            };
            cli::cmd_screen(&config, overrides, report.as_deref(), cli.quiet)?;
        }
        Commands::Inspect {
            path,
            epsg,
            working_epsg,
        } => {
            cli::cmd_inspect(&path, epsg, working_epsg)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
