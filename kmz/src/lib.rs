//! # kmz
//!
//! Lecture des exports de relevés réseau fibre au format KMZ/KML.
//!
//! ## Features
//!
//! - Ouverture du conteneur zip et sélection du document `.kml`
//! - Parsing de l'arbre avec `roxmltree`
//! - Extraction des Point / LineString / Polygon avec leur chemin de dossiers
//! - Coordonnées lues avec `fast-float`, tuples illisibles ignorés
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kmz::parse;
//! use std::path::Path;
//!
//! let result = parse(Path::new("cluster.kmz"))?;
//! for placemark in &result.placemarks {
//!     println!("{} -> {}", placemark.folder_label(), placemark.name);
//! }
//! ```

pub mod archive;
pub mod error;
pub mod extract;
pub mod parser;
pub mod types;

pub use error::KmzError;
pub use extract::TraversalMode;
pub use types::{GeometryKind, ParseResult, Placemark};

use std::path::Path;

use archive::MarkupEntry;

/// Lit un fichier KMZ (ou KML) et extrait ses placemarks
///
/// # Errors
///
/// Retourne `KmzError` si le conteneur est illisible, s'il ne contient aucun
/// document KML, ou si le KML est mal formé.
pub fn parse(path: &Path) -> Result<ParseResult, KmzError> {
    parse_with(path, TraversalMode::default())
}

/// Comme [`parse`], avec un mode de parcours explicite
pub fn parse_with(path: &Path, mode: TraversalMode) -> Result<ParseResult, KmzError> {
    let entry = archive::read_path(path)?;
    parse_entry(entry, mode)
}

/// Extrait les placemarks d'un KMZ déjà chargé en mémoire
pub fn parse_bytes(data: &[u8], mode: TraversalMode) -> Result<ParseResult, KmzError> {
    let entry = archive::extract_kml(data)?;
    parse_entry(entry, mode)
}

fn parse_entry(entry: MarkupEntry, mode: TraversalMode) -> Result<ParseResult, KmzError> {
    let text = parser::tree::decode(&entry.bytes)?;
    let doc = parser::tree::parse_document(text)?;
    let placemarks = extract::extract(&doc, mode);

    Ok(ParseResult {
        placemarks,
        markup_entry: entry.name,
    })
}
