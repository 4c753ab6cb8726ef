//! Extraction des placemarks avec leur chemin de dossiers

use std::collections::HashSet;

use roxmltree::{Document, Node, NodeId};
use tracing::{debug, trace};

use crate::parser::coords::parse_coordinates;
use crate::parser::tree::{child, child_text, first_descendant, is_kml};
use crate::types::{GeometryKind, Placemark};

/// Nom utilisé pour un dossier sans `<name>`
pub const UNKNOWN_FOLDER: &str = "UNKNOWN";

/// Nom utilisé pour un placemark sans `<name>`
pub const UNNAMED_PLACEMARK: &str = "Unnamed";

/// Point d'entrée du parcours de l'arbre
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraversalMode {
    /// Un seul parcours depuis le noeud `Document` (placemarks racine inclus)
    #[default]
    Document,

    /// Un parcours par dossier, dans l'ordre du document. Les dossiers déjà
    /// visités via un parent sont ignorés, les placemarks hors dossier aussi.
    TopLevelFolders,
}

/// Extrait tous les placemarks exploitables de l'arbre
pub fn extract(doc: &Document<'_>, mode: TraversalMode) -> Vec<Placemark> {
    let root = doc.root_element();
    let container = if is_kml(root, "Document") {
        root
    } else {
        child(root, "Document").unwrap_or(root)
    };

    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut placemarks = Vec::new();

    match mode {
        TraversalMode::Document => {
            walk(container, &[], &mut visited, &mut placemarks);
        }
        TraversalMode::TopLevelFolders => {
            for folder in container.descendants().filter(|n| is_kml(*n, "Folder")) {
                let parent_path = ancestor_path(folder);
                walk_folder(folder, &parent_path, &mut visited, &mut placemarks);
            }
        }
    }

    debug!(count = placemarks.len(), ?mode, "Placemarks extracted");
    placemarks
}

/// Traite les placemarks locaux puis descend dans les sous-dossiers
fn walk(
    node: Node<'_, '_>,
    path: &[String],
    visited: &mut HashSet<NodeId>,
    out: &mut Vec<Placemark>,
) {
    for placemark in node.children().filter(|n| is_kml(*n, "Placemark")) {
        if let Some(item) = read_placemark(placemark, path) {
            out.push(item);
        }
    }

    for folder in node.children().filter(|n| is_kml(*n, "Folder")) {
        walk_folder(folder, path, visited, out);
    }
}

fn walk_folder(
    folder: Node<'_, '_>,
    parent_path: &[String],
    visited: &mut HashSet<NodeId>,
    out: &mut Vec<Placemark>,
) {
    if !visited.insert(folder.id()) {
        return;
    }

    let mut path = parent_path.to_vec();
    path.push(folder_name(folder));
    walk(folder, &path, visited, out);
}

fn folder_name(folder: Node<'_, '_>) -> String {
    match child_text(folder, "name") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => UNKNOWN_FOLDER.to_string(),
    }
}

/// Noms des dossiers englobant `node`, de la racine vers le parent
fn ancestor_path(node: Node<'_, '_>) -> Vec<String> {
    let mut path: Vec<String> = node
        .ancestors()
        .skip(1)
        .filter(|n| is_kml(*n, "Folder"))
        .map(folder_name)
        .collect();
    path.reverse();
    path
}

/// Lit un placemark ; `None` si aucune géométrie exploitable
fn read_placemark(node: Node<'_, '_>, path: &[String]) -> Option<Placemark> {
    let name = child_text(node, "name")
        .unwrap_or(UNNAMED_PLACEMARK)
        .to_string();
    let description = child_text(node, "description")
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    // Priorité: Point, puis LineString, puis Polygon
    let (kind, geometry) = if let Some(g) = first_descendant(node, "Point") {
        (GeometryKind::Point, g)
    } else if let Some(g) = first_descendant(node, "LineString") {
        (GeometryKind::Path, g)
    } else if let Some(g) = first_descendant(node, "Polygon") {
        (GeometryKind::Path, g)
    } else {
        trace!(name = %name, "Placemark without supported geometry");
        return None;
    };

    let text = first_descendant(geometry, "coordinates")
        .and_then(|c| c.text())
        .unwrap_or("");
    let mut geo_coords = parse_coordinates(text);

    if geo_coords.is_empty() {
        debug!(name = %name, folder = %path.join("/"), "Placemark dropped: no usable coordinates");
        return None;
    }
    if kind == GeometryKind::Point {
        geo_coords.truncate(1);
    }

    Some(Placemark {
        kind,
        name,
        description,
        folder_path: path.to_vec(),
        geo_coords,
        plane_coords: Vec::new(),
    })
}
