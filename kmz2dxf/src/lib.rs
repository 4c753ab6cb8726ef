//! # kmz2dxf
//!
//! Conversion de relevés de réseau fibre (KMZ) en plans DXF.
//!
//! ## Étapes
//!
//! - lecture du KMZ (crate `kmz`) ;
//! - projection UTM WGS84 puis recentrage sur le centroïde ;
//! - classification par nom de dossier ;
//! - orientation des étiquettes homepass le long des câbles ;
//! - synthèse des entités (calques, blocs, textes) et écriture DXF.
//!
//! ## Usage CLI
//!
//! ```bash
//! # KMZ → DXF
//! kmz2dxf --path ./survey.kmz --output ./survey.dxf
//! kmz2dxf to-dxf --path ./survey.kmz --output ./survey.dxf --template ./symbols.dxf --report report.json
//!
//! # Export de contrôle
//! kmz2dxf to-geojson --path ./survey.kmz --output ./survey.geojson
//! ```

pub mod classify;
pub mod config;
pub mod dxf;
pub mod error;
pub mod export;
pub mod label;
pub mod pipeline;
pub mod project;
pub mod report;
pub mod symbols;
pub mod synth;

pub use classify::{classify, Category};
pub use config::Config;
pub use error::ConvertError;
pub use label::{place_labels, LabelCluster, LabelParams, LabelPlacement};
pub use pipeline::{convert, convert_placemarks, Conversion, ConvertOptions};
pub use project::{Projector, DEFAULT_EPSG};
pub use report::{ConversionReport, ConversionStatus, SymbolInsertionWarning};
pub use symbols::{SymbolHandle, SymbolLibrary, TemplateSymbolLibrary};
