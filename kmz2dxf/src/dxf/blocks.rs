//! Blocs intégrés, utilisés quand le gabarit ne fournit pas de symbole

use geo::Coord;

/// Primitive d'un bloc (unités du bloc, centré sur l'origine)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Line(Coord<f64>, Coord<f64>),
    Circle(Coord<f64>, f64),
}

/// Symboles intégrés
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuiltinBlock {
    /// Triangle
    Fdt,
    /// Carré
    Fat,
    /// Cercle barré d'une croix
    Pole,
    /// Petit carré
    Homepass,
    /// Losange
    JointClosure,
}

impl BuiltinBlock {
    /// Nom du bloc dans le DXF
    pub fn name(self) -> &'static str {
        match self {
            BuiltinBlock::Fdt => "KMZ2DXF_FDT",
            BuiltinBlock::Fat => "KMZ2DXF_FAT",
            BuiltinBlock::Pole => "KMZ2DXF_POLE",
            BuiltinBlock::Homepass => "KMZ2DXF_HP",
            BuiltinBlock::JointClosure => "KMZ2DXF_JC",
        }
    }

    pub fn shapes(self) -> Vec<Shape> {
        match self {
            BuiltinBlock::Fdt => {
                // Équilatéral inscrit dans le cercle unité
                let half = 3f64.sqrt() / 2.0;
                closed(&[(-half, -0.5), (half, -0.5), (0.0, 1.0)])
            }
            BuiltinBlock::Fat => closed(&[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]),
            BuiltinBlock::Pole => vec![
                Shape::Circle(Coord { x: 0.0, y: 0.0 }, 1.0),
                Shape::Line(Coord { x: -1.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }),
                Shape::Line(Coord { x: 0.0, y: -1.0 }, Coord { x: 0.0, y: 1.0 }),
            ],
            BuiltinBlock::Homepass => {
                closed(&[(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)])
            }
            BuiltinBlock::JointClosure => {
                closed(&[(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)])
            }
        }
    }
}

fn closed(points: &[(f64, f64)]) -> Vec<Shape> {
    let coords: Vec<Coord<f64>> = points.iter().map(|&(x, y)| Coord { x, y }).collect();
    (0..coords.len())
        .map(|i| Shape::Line(coords[i], coords[(i + 1) % coords.len()]))
        .collect()
}
