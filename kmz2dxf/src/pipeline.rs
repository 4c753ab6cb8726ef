//! Enchaînement complet d'une conversion KMZ → DXF

use std::path::{Path, PathBuf};
use std::time::Instant;

use kmz::{Placemark, TraversalMode};
use tracing::{debug, info};

use crate::classify::{classify, Category};
use crate::config::Config;
use crate::dxf::{write_document, DrawingDocument, Template};
use crate::label::place_labels;
use crate::project::Projector;
use crate::report::ConversionReport;
use crate::symbols::TemplateSymbolLibrary;
use crate::synth::synthesize;
use crate::ConvertError;

/// Paramètres d'une conversion
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub template: Option<PathBuf>,
    pub traversal: TraversalMode,
    pub config: Config,
}

impl ConvertOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            template: None,
            traversal: TraversalMode::default(),
            config: Config::default(),
        }
    }
}

/// Document DXF sérialisé et rapport associé
#[derive(Debug)]
pub struct Conversion {
    pub dxf: String,
    pub report: ConversionReport,
}

/// Convertit un fichier KMZ (ou KML) et écrit le DXF
pub fn convert(options: &ConvertOptions) -> Result<ConversionReport, ConvertError> {
    let start = Instant::now();
    info!(input = %options.input.display(), "Converting survey");

    let parsed = kmz::parse_with(&options.input, options.traversal)?;
    debug!(
        entry = %parsed.markup_entry,
        placemarks = parsed.placemarks.len(),
        "Survey parsed"
    );

    let template = options
        .template
        .as_deref()
        .map(Template::load)
        .transpose()?;

    let source = options
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut conversion = convert_placemarks(parsed.placemarks, &source, template, &options.config)?;
    std::fs::write(&options.output, conversion.dxf.as_bytes())?;

    conversion.report.set_duration(start.elapsed());
    info!(
        output = %options.output.display(),
        items = conversion.report.items,
        clusters = conversion.report.clusters,
        warnings = conversion.report.warnings.len(),
        "DXF written"
    );
    Ok(conversion.report)
}

/// Projette, classe, oriente et dessine des placemarks déjà extraits
pub fn convert_placemarks(
    mut items: Vec<Placemark>,
    source: &str,
    template: Option<Template>,
    config: &Config,
) -> Result<Conversion, ConvertError> {
    let projector = Projector::new(config.epsg)?;
    projector.project_all(&mut items)?;

    let categories = classify_all(&items);
    let mut report = ConversionReport::new(source, projector.epsg());
    for category in &categories {
        report.record_item(*category);
    }

    let placement = place_labels(&items, &categories, config.label_params());
    report.record_clusters(&placement.clusters);

    let symbols = TemplateSymbolLibrary::new(template.as_ref());
    let mut doc = match template {
        Some(template) => DrawingDocument::from_template(template),
        None => DrawingDocument::new(),
    };
    synthesize(
        &items,
        &categories,
        &placement,
        &mut doc,
        &symbols,
        config,
        &mut report,
    );

    let dxf = write_document(&doc);
    report.set_checksum(dxf.as_bytes());
    report.finalize();

    Ok(Conversion { dxf, report })
}

/// Catégorie de chaque placemark, dans l'ordre d'extraction
pub fn classify_all(items: &[Placemark]) -> Vec<Category> {
    items.iter().map(|item| classify(&item.folder_path)).collect()
}

/// Lit un KMZ et classe ses placemarks, sans projection (export de contrôle)
pub fn read_classified(
    path: &Path,
    traversal: TraversalMode,
) -> Result<(Vec<Placemark>, Vec<Category>), ConvertError> {
    let parsed = kmz::parse_with(path, traversal)?;
    if parsed.placemarks.is_empty() {
        return Err(ConvertError::EmptyDataset);
    }
    let categories = classify_all(&parsed.placemarks);
    Ok((parsed.placemarks, categories))
}
