//! Point d'entrée CLI pour kmz2dxf

use anyhow::{Context, Result};
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

use cli::{Commands, ToDxfArgs};

/// Convertir un relevé KMZ de réseau fibre en plan DXF
#[derive(Parser)]
#[command(name = "kmz2dxf")]
#[command(author, version)]
#[command(about = "Convertir un relevé KMZ de réseau fibre en plan DXF (défaut) ou GeoJSON")]
#[command(long_about = "Convertit les placemarks d'un KMZ en calques DXF : symboles, câbles et étiquettes homepass alignées sur le câble le plus proche.\n\nPar défaut, produit un DXF. Utilisez 'to-geojson' pour un export de contrôle.")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sous-commande (défaut: conversion DXF)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments de conversion DXF (commande par défaut)
    #[command(flatten)]
    dxf: Option<ToDxfArgs>,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::ToDxf(args)) => run_dxf(&args, cli.quiet)?,
        Some(Commands::ToGeojson {
            path,
            output,
            traversal,
        }) => {
            info!(path = %path.display(), output = %output.display(), "Export vers GeoJSON");
            cli::cmd_geojson(&path, &output, traversal)?;
        }
        None => {
            let args = cli
                .dxf
                .context("Arguments requis : --path et --output")?;
            run_dxf(&args, cli.quiet)?;
        }
    }

    Ok(())
}

fn run_dxf(args: &ToDxfArgs, quiet: bool) -> Result<()> {
    info!(path = %args.path.display(), output = %args.output.display(), "Export vers DXF");
    cli::cmd_convert(args, quiet)
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
