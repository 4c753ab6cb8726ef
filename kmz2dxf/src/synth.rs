//! Synthèse du dessin : chemins, symboles et étiquettes

use geo::Coord;
use kmz::{GeometryKind, Placemark};
use tracing::{debug, warn};

use crate::classify::Category;
use crate::config::Config;
use crate::dxf::DrawingDocument;
use crate::label::{nearest_segment_angle, polylines_for, LabelPlacement, Polyline};
use crate::report::ConversionReport;
use crate::symbols::SymbolLibrary;

/// Ajoute au document les entités de chaque placemark, dans l'ordre d'extraction
pub fn synthesize(
    items: &[Placemark],
    categories: &[Category],
    placement: &LabelPlacement,
    doc: &mut DrawingDocument,
    symbols: &dyn SymbolLibrary,
    config: &Config,
    report: &mut ConversionReport,
) {
    let roads = polylines_for(items, categories, Category::Road);
    let mut paths = 0usize;
    let mut points = 0usize;

    for (index, (item, &category)) in items.iter().zip(categories).enumerate() {
        match item.kind {
            GeometryKind::Path => {
                draw_path(doc, item, category, config);
                paths += 1;
            }
            GeometryKind::Point => {
                let Some(&position) = item.plane_coords.first() else {
                    continue;
                };
                draw_symbol(doc, item, category, position, symbols, config, report);

                let rotation = label_rotation(index, category, position, placement, &roads);
                draw_label(doc, item, category, position, rotation, config);
                points += 1;
            }
        }
    }

    debug!(paths, points, entities = doc.entities().len(), "Drawing synthesized");
}

fn draw_path(doc: &mut DrawingDocument, item: &Placemark, category: Category, config: &Config) {
    let layer = config.layer_for(category);
    let color = config.color(category);

    match item.plane_coords.as_slice() {
        [] => {}
        [single] => doc.add_circle(layer, color, *single, config.degenerate_marker_radius),
        coords => {
            // Anneau fermé (polygone) : dernier sommet retiré, polyligne fermée
            let ring = coords.len() > 3 && coords.first() == coords.last();
            let vertices = if ring {
                coords[..coords.len() - 1].to_vec()
            } else {
                coords.to_vec()
            };
            doc.add_polyline(layer, color, vertices, ring);
        }
    }
}

fn draw_symbol(
    doc: &mut DrawingDocument,
    item: &Placemark,
    category: Category,
    position: Coord<f64>,
    symbols: &dyn SymbolLibrary,
    config: &Config,
    report: &mut ConversionReport,
) {
    let layer = config.layer_for(category);
    let color = config.color(category);

    let Some(symbol) = symbols.find(category) else {
        doc.add_circle(layer, color, position, config.point_marker_radius);
        return;
    };

    let scale = config.symbol_scale(category);
    if let Err(fallback) = doc.insert_block(&symbol, layer, color, position, scale, 0.0) {
        warn!(
            item = %item.name,
            category = category.key(),
            block = symbol.block_name(),
            "Symbol insertion failed, drawing a marker: {}",
            fallback
        );
        report.record_warning(&item.name, category, fallback.to_string());
        doc.add_circle(layer, color, position, config.point_marker_radius);
    }
}

fn label_rotation(
    index: usize,
    category: Category,
    position: Coord<f64>,
    placement: &LabelPlacement,
    roads: &[Polyline],
) -> f64 {
    match category {
        c if c.is_homepass() => placement.rotation(index).unwrap_or(0.0),
        Category::JointClosure | Category::Slack => {
            nearest_segment_angle(position, roads).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

fn draw_label(
    doc: &mut DrawingDocument,
    item: &Placemark,
    category: Category,
    position: Coord<f64>,
    rotation: f64,
    config: &Config,
) {
    let layer = config.layer_for(category);
    let color = config.color(category);

    let (height, anchor) = if category.is_homepass() {
        let height = config.homepass_text_height;
        let width = estimated_width(&item.name, height, config.glyph_width_factor);
        (height, offset_perpendicular(position, rotation, width / 2.0))
    } else {
        (config.text_height, position)
    };

    doc.add_text(layer, color, anchor, height, rotation, &item.name);
}

/// Largeur approximative d'un texte : caractères × hauteur × facteur de glyphe
pub fn estimated_width(text: &str, height: f64, glyph_width_factor: f64) -> f64 {
    text.chars().count() as f64 * height * glyph_width_factor
}

/// Décale `p` de `distance` à +90° de la direction `rotation` (degrés)
pub fn offset_perpendicular(p: Coord<f64>, rotation: f64, distance: f64) -> Coord<f64> {
    let normal = (rotation + 90.0).to_radians();
    Coord {
        x: p.x + distance * normal.cos(),
        y: p.y + distance * normal.sin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dxf::{BuiltinBlock, Entity};
    use crate::symbols::{SymbolHandle, TemplateSymbolLibrary};

    fn item(kind: GeometryKind, name: &str, coords: &[(f64, f64)]) -> Placemark {
        let coords: Vec<Coord<f64>> = coords.iter().map(|&(x, y)| Coord { x, y }).collect();
        Placemark {
            kind,
            name: name.to_string(),
            description: None,
            folder_path: Vec::new(),
            geo_coords: coords.clone(),
            plane_coords: coords,
        }
    }

    /// Renvoie toujours un bloc de gabarit absent du document
    struct MissingBlocks;

    impl SymbolLibrary for MissingBlocks {
        fn find(&self, _category: Category) -> Option<SymbolHandle> {
            Some(SymbolHandle::Template("GHOST".into()))
        }
    }

    fn run(
        items: &[Placemark],
        categories: &[Category],
        placement: &LabelPlacement,
        symbols: &dyn SymbolLibrary,
    ) -> (DrawingDocument, ConversionReport) {
        let mut doc = DrawingDocument::new();
        let mut report = ConversionReport::new("test.kmz", 32748);
        synthesize(
            items,
            categories,
            placement,
            &mut doc,
            symbols,
            &Config::default(),
            &mut report,
        );
        (doc, report)
    }

    #[test]
    fn test_estimated_width_and_offset() {
        assert!((estimated_width("HP-01", 1.5, 0.6) - 4.5).abs() < 1e-12);

        let p = offset_perpendicular(Coord { x: 0.0, y: 0.0 }, 0.0, 2.0);
        assert!(p.x.abs() < 1e-12 && (p.y - 2.0).abs() < 1e-12);
        let p = offset_perpendicular(Coord { x: 0.0, y: 0.0 }, 90.0, 2.0);
        assert!((p.x + 2.0).abs() < 1e-12 && p.y.abs() < 1e-12);
    }

    #[test]
    fn test_paths() {
        let items = vec![
            item(GeometryKind::Path, "L", &[(0.0, 0.0), (10.0, 0.0)]),
            item(GeometryKind::Path, "S", &[(5.0, 5.0)]),
            item(
                GeometryKind::Path,
                "B",
                &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)],
            ),
        ];
        let cats = vec![Category::DistributionCable, Category::SlingWire, Category::Boundary];
        let lib = TemplateSymbolLibrary::new(None);
        let (doc, report) = run(&items, &cats, &LabelPlacement::default(), &lib);

        let entities = doc.entities();
        assert_eq!(entities.len(), 3);
        assert!(matches!(&entities[0], Entity::Polyline { layer, closed: false, .. } if layer == "DISTRIBUTION_CABLE"));
        assert!(matches!(&entities[1], Entity::Circle { radius, .. } if *radius == 0.5));
        assert!(matches!(&entities[2], Entity::Polyline { vertices, closed: true, .. } if vertices.len() == 3));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_point_symbol_and_label() {
        let items = vec![item(GeometryKind::Point, "FAT-01", &[(3.0, 4.0)])];
        let cats = vec![Category::Fat];
        let lib = TemplateSymbolLibrary::new(None);
        let (doc, _) = run(&items, &cats, &LabelPlacement::default(), &lib);

        assert_eq!(doc.builtin_blocks().collect::<Vec<_>>(), vec![BuiltinBlock::Fat]);
        match &doc.entities()[1] {
            Entity::Text {
                text,
                position,
                rotation,
                height,
                ..
            } => {
                assert_eq!(text, "FAT-01");
                assert_eq!(*position, Coord { x: 3.0, y: 4.0 });
                assert_eq!(*rotation, 0.0);
                assert_eq!(*height, 2.0);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_warning() {
        let items = vec![item(GeometryKind::Point, "FDT-01", &[(0.0, 0.0)])];
        let cats = vec![Category::Fdt];
        let (doc, report) = run(&items, &cats, &LabelPlacement::default(), &MissingBlocks);

        assert!(matches!(&doc.entities()[0], Entity::Circle { radius, .. } if *radius == 1.0));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].item, "FDT-01");
        assert!(report.warnings[0].message.contains("GHOST"));
    }

    #[test]
    fn test_slack_follows_road() {
        let items = vec![
            item(GeometryKind::Path, "JALAN", &[(0.0, 0.0), (0.0, 50.0)]),
            item(GeometryKind::Point, "SLACK-1", &[(2.0, 10.0)]),
        ];
        let cats = vec![Category::Road, Category::Slack];
        let lib = TemplateSymbolLibrary::new(None);
        let (doc, _) = run(&items, &cats, &LabelPlacement::default(), &lib);

        let rotation = doc.entities().iter().find_map(|e| match e {
            Entity::Text { rotation, .. } => Some(*rotation),
            _ => None,
        });
        assert_eq!(rotation, Some(90.0));
    }

    #[test]
    fn test_homepass_label_offset() {
        let items = vec![item(GeometryKind::Point, "HP1", &[(0.0, 0.0)])];
        let cats = vec![Category::HomepassCovered];
        let mut placement = LabelPlacement::default();
        placement.rotations.insert(0, 0.0);
        let lib = TemplateSymbolLibrary::new(None);
        let (doc, _) = run(&items, &cats, &placement, &lib);

        // 3 caractères × 1.5 × 0.6 = 2.7 → décalage de 1.35 vers +Y
        match doc.entities().last() {
            Some(Entity::Text { position, height, .. }) => {
                assert_eq!(*height, 1.5);
                assert!(position.x.abs() < 1e-9);
                assert!((position.y - 1.35).abs() < 1e-9);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }
}
