//! Définition et implémentation des commandes CLI
//!
//! - `to-dxf` (défaut) : KMZ → DXF, rapport optionnel
//! - `to-geojson` : KMZ → GeoJSON de contrôle (EPSG:4326)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use tracing::info;

use kmz::TraversalMode;
use kmz2dxf::export::export_to_geojson;
use kmz2dxf::pipeline::{convert, read_classified, ConvertOptions};
use kmz2dxf::Config;

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a KMZ survey into a DXF drawing
    ToDxf(ToDxfArgs),

    /// Export classified placemarks to GeoJSON (debug)
    ToGeojson {
        /// Path to the KMZ (or KML) survey
        #[arg(short, long)]
        path: PathBuf,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Placemark traversal entry point
        #[arg(long, value_enum, default_value_t = Traversal::Document)]
        traversal: Traversal,
    },
}

/// Arguments de conversion DXF (commande par défaut)
#[derive(Args, Debug)]
pub struct ToDxfArgs {
    /// Path to the KMZ (or KML) survey
    #[arg(short, long)]
    pub path: PathBuf,

    /// Output DXF file
    #[arg(short, long)]
    pub output: PathBuf,

    /// DXF template providing predefined symbol blocks
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Config preset name (default/compact) or path to a JSON config
    #[arg(long, default_value = "default")]
    pub config: String,

    /// Target UTM EPSG code (overrides config and KMZ2DXF_EPSG)
    #[arg(long)]
    pub epsg: Option<u32>,

    /// Maximum along-cable gap inside one label cluster
    #[arg(long)]
    pub max_gap: Option<f64>,

    /// Minimum cable segment length used for label orientation
    #[arg(long)]
    pub min_segment: Option<f64>,

    /// Write the conversion report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Placemark traversal entry point
    #[arg(long, value_enum, default_value_t = Traversal::Document)]
    pub traversal: Traversal,
}

/// Point d'entrée du parcours KML
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Traversal {
    /// Single pass from the Document node
    Document,
    /// One pass per folder (legacy behaviour)
    TopLevelFolders,
}

impl From<Traversal> for TraversalMode {
    fn from(t: Traversal) -> Self {
        match t {
            Traversal::Document => TraversalMode::Document,
            Traversal::TopLevelFolders => TraversalMode::TopLevelFolders,
        }
    }
}

/// Configuration effective : preset/fichier, puis environnement, puis options
pub fn load_config(args: &ToDxfArgs) -> Result<Config> {
    let mut config = Config::resolve(&args.config)
        .with_context(|| format!("Failed to load config '{}'", args.config))?;
    config.apply_env()?;

    if let Some(epsg) = args.epsg {
        config.epsg = epsg;
    }
    if let Some(max_gap) = args.max_gap {
        config.max_gap = max_gap;
    }
    if let Some(min_segment) = args.min_segment {
        config.min_segment_length = min_segment;
    }

    config.validate()?;
    Ok(config)
}

/// Exécute la conversion DXF
pub fn cmd_convert(args: &ToDxfArgs, quiet: bool) -> Result<()> {
    let config = load_config(args)?;

    let options = ConvertOptions {
        input: args.path.clone(),
        output: args.output.clone(),
        template: args.template.clone(),
        traversal: args.traversal.into(),
        config,
    };

    let report = convert(&options)
        .with_context(|| format!("Conversion failed: {}", args.path.display()))?;

    if let Some(ref report_path) = args.report {
        report
            .save_to_file(report_path)
            .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
        info!(report = %report_path.display(), "Report saved");
    }

    if quiet {
        println!("{}", report.summary());
    } else {
        report.display();
    }
    Ok(())
}

/// Exécute l'export GeoJSON
pub fn cmd_geojson(path: &Path, output: &Path, traversal: Traversal) -> Result<()> {
    let (items, categories) = read_classified(path, traversal.into())
        .with_context(|| format!("Failed to read survey: {}", path.display()))?;

    export_to_geojson(&items, &categories, output)?;

    println!("Exported {} placemarks to {}", items.len(), output.display());
    Ok(())
}
