//! Export de contrôle (GeoJSON)

pub mod geojson;

pub use geojson::export_to_geojson;
