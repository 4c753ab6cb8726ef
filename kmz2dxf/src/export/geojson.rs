//! Export GeoJSON des placemarks classés (EPSG:4326), pour contrôle visuel

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use kmz::Placemark;

use crate::classify::Category;

/// Écrit une FeatureCollection (propriétés `name`, `category`, `folder`)
pub fn export_to_geojson(
    items: &[Placemark],
    categories: &[Category],
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write!(writer, r#"{{"type":"FeatureCollection","features":["#)?;
    for (i, (item, category)) in items.iter().zip(categories).enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(&mut writer, item, *category)?;
    }
    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(())
}

fn write_feature<W: Write>(writer: &mut W, item: &Placemark, category: Category) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    item.to_geometry().process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(
        writer,
        r#","properties":{{"name":{},"category":{},"folder":{}}}}}"#,
        serde_json::to_string(&item.name)?,
        serde_json::to_string(category.key())?,
        serde_json::to_string(&item.folder_label())?
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use kmz::GeometryKind;

    fn placemark(kind: GeometryKind, name: &str, coords: Vec<Coord<f64>>) -> Placemark {
        Placemark {
            kind,
            name: name.to_string(),
            description: None,
            folder_path: vec!["FAT".to_string(), "ROW \"A\"".to_string()],
            geo_coords: coords,
            plane_coords: Vec::new(),
        }
    }

    #[test]
    fn test_export_to_geojson() {
        let items = vec![
            placemark(GeometryKind::Point, "FAT-01", vec![Coord { x: 106.8, y: -6.2 }]),
            placemark(
                GeometryKind::Path,
                "LINE A",
                vec![Coord { x: 106.8, y: -6.2 }, Coord { x: 106.9, y: -6.3 }],
            ),
        ];
        let categories = vec![Category::Fat, Category::DistributionCable];

        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("survey.geojson");
        export_to_geojson(&items, &categories, &output_path).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["geometry"]["type"], "Point");
        assert_eq!(features[0]["properties"]["category"], "FAT");
        assert_eq!(features[0]["properties"]["folder"], "FAT/ROW \"A\"");
        assert_eq!(features[1]["geometry"]["type"], "LineString");
        assert_eq!(features[1]["properties"]["name"], "LINE A");
    }
}
