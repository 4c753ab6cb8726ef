//! Projection des coordonnées géographiques vers le repère plan du dessin
//!
//! Projection UTM WGS84 en Rust pur (EPSG:32601-32660, 32701-32760), puis
//! recentrage de tout le jeu de points sur son centroïde pour garder des
//! coordonnées DXF proches de l'origine.

mod ellipsoid;
mod utm;

pub use utm::{geographic_to_utm, UtmZone};

use geo::{Centroid, Coord, MultiPoint, Point};
use kmz::Placemark;
use tracing::debug;

use crate::ConvertError;

/// Zone par défaut : UTM 48S (Java occidental)
pub const DEFAULT_EPSG: u32 = 32748;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    #[cfg(test)]
    pub(crate) fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Projection géographique → UTM + recentrage
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    epsg: u32,
    zone: UtmZone,
}

impl Projector {
    /// Crée un projecteur pour un code EPSG UTM WGS84
    pub fn new(epsg: u32) -> Result<Self, ConvertError> {
        let zone = UtmZone::from_epsg(epsg).ok_or(ConvertError::UnsupportedProjection(epsg))?;
        Ok(Self { epsg, zone })
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Projette un couple (longitude, latitude) en degrés
    pub fn project(&self, c: Coord<f64>) -> Coord<f64> {
        let (x, y) = geographic_to_utm(Geographic::from_degrees(c.x, c.y), self.zone);
        Coord { x, y }
    }

    /// Projette tous les placemarks puis les recentre sur le centroïde global
    ///
    /// Le décalage est calculé une seule fois sur l'union des points et des
    /// sommets de chemins, toutes catégories confondues. Renvoie ce décalage.
    ///
    /// # Errors
    ///
    /// `ConvertError::EmptyDataset` si aucun point n'est disponible.
    pub fn project_all(&self, items: &mut [Placemark]) -> Result<Coord<f64>, ConvertError> {
        for item in items.iter_mut() {
            item.plane_coords = item.geo_coords.iter().map(|c| self.project(*c)).collect();
        }

        let all: MultiPoint<f64> = items
            .iter()
            .flat_map(|item| item.plane_coords.iter().map(|c| Point::from(*c)))
            .collect::<Vec<_>>()
            .into();

        let offset = all
            .centroid()
            .map(|p| p.0)
            .ok_or(ConvertError::EmptyDataset)?;

        for item in items.iter_mut() {
            for c in item.plane_coords.iter_mut() {
                *c = *c - offset;
            }
        }

        debug!(
            epsg = self.epsg,
            points = all.0.len(),
            offset_x = offset.x,
            offset_y = offset.y,
            "Coordinates projected and centred"
        );
        Ok(offset)
    }
}
