//! Types de données pour le crate kmz

use geo::{Coord, Geometry, LineString, Point};

/// Nature de la géométrie d'un placemark
///
/// `Path` couvre à la fois les LineString et les Polygon : en aval, les deux
/// sont traités comme une polyligne.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Path,
}

/// Un placemark extrait avec son chemin de dossiers
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    /// Point ou chemin
    pub kind: GeometryKind,

    /// Nom affiché ("Unnamed" si l'élément est absent)
    pub name: String,

    /// Description libre (code équipement, remarques terrain)
    pub description: Option<String>,

    /// Dossiers de la racine jusqu'au dossier parent immédiat
    pub folder_path: Vec<String>,

    /// Coordonnées géographiques (x = longitude, y = latitude)
    pub geo_coords: Vec<Coord<f64>>,

    /// Coordonnées planes, remplies par la projection
    pub plane_coords: Vec<Coord<f64>>,
}

impl Placemark {
    /// Chemin de dossiers joint par '/'
    pub fn folder_label(&self) -> String {
        self.folder_path.join("/")
    }

    pub fn is_point(&self) -> bool {
        self.kind == GeometryKind::Point
    }

    /// Géométrie `geo` en coordonnées géographiques
    pub fn to_geometry(&self) -> Geometry {
        match self.kind {
            GeometryKind::Point => {
                let c = self.geo_coords.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
                Geometry::Point(Point::from(c))
            }
            GeometryKind::Path => Geometry::LineString(LineString::new(self.geo_coords.clone())),
        }
    }
}

/// Résultat de la lecture d'un KMZ
#[derive(Debug)]
pub struct ParseResult {
    /// Placemarks dans l'ordre du document
    pub placemarks: Vec<Placemark>,

    /// Nom de l'entrée KML lue dans l'archive
    pub markup_entry: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_geometry_path() {
        let pm = Placemark {
            kind: GeometryKind::Path,
            name: "LINE A".to_string(),
            description: None,
            folder_path: vec!["DISTRIBUTION CABLE".to_string()],
            geo_coords: vec![Coord { x: 106.8, y: -6.2 }, Coord { x: 106.81, y: -6.2 }],
            plane_coords: Vec::new(),
        };
        match pm.to_geometry() {
            Geometry::LineString(ls) => assert_eq!(ls.0.len(), 2),
            other => panic!("Expected LineString, got {:?}", other),
        }
        assert_eq!(pm.folder_label(), "DISTRIBUTION CABLE");
    }
}
