//! Orientation des étiquettes homepass le long des câbles de distribution
//!
//! 1. une polyligne par câble (au moins deux sommets projetés) ;
//! 2. chaque homepass est rattaché au câble le plus proche, avec son abscisse ;
//! 3. par câble, les abscisses triées sont découpées en séries (`max_gap`) ;
//! 4. la médiane basse de chaque série donne un point de référence ;
//! 5. l'angle vient du segment le plus proche de ce point parmi ceux d'au
//!    moins `min_segment_length`, sinon du segment le plus proche ;
//! 6. toute la série reçoit cet angle.

pub mod cluster;
pub mod polyline;

use std::collections::BTreeMap;

use geo::Coord;
use kmz::{GeometryKind, Placemark};
use serde::Serialize;
use tracing::debug;

use crate::classify::Category;
use cluster::{lower_median_index, partition_runs};
pub use polyline::{normalize_angle, Polyline};

/// Seuils de regroupement et d'orientation
#[derive(Debug, Clone, Copy)]
pub struct LabelParams {
    /// Écart maximal d'abscisse entre deux homepass d'une même série
    pub max_gap: f64,
    /// Longueur minimale d'un segment pour donner l'orientation
    pub min_segment_length: f64,
}

impl Default for LabelParams {
    fn default() -> Self {
        Self {
            max_gap: 20.0,
            min_segment_length: 15.0,
        }
    }
}

/// Rattachement d'un homepass à un câble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CableAssignment {
    pub item: usize,
    pub cable: usize,
    pub along: f64,
    pub distance: f64,
}

/// Série d'homepass orientés de la même façon
#[derive(Debug, Clone, Serialize)]
pub struct LabelCluster {
    pub cable: usize,
    /// Index des placemarks membres, triés par abscisse
    pub members: Vec<usize>,
    /// Abscisse de référence (médiane basse)
    pub along: f64,
    /// `None` quand aucun câble n'existe
    pub angle: Option<f64>,
}

/// Résultat du placement
#[derive(Debug, Clone, Default)]
pub struct LabelPlacement {
    /// Rotation (degrés) par index de placemark homepass
    pub rotations: BTreeMap<usize, f64>,
    pub clusters: Vec<LabelCluster>,
}

impl LabelPlacement {
    pub fn rotation(&self, item: usize) -> Option<f64> {
        self.rotations.get(&item).copied()
    }
}

/// Polylignes projetées des chemins d'une catégorie
pub fn polylines_for(items: &[Placemark], categories: &[Category], wanted: Category) -> Vec<Polyline> {
    items
        .iter()
        .zip(categories)
        .filter(|(item, cat)| **cat == wanted && item.kind == GeometryKind::Path)
        .filter_map(|(item, _)| Polyline::new(item.plane_coords.clone()))
        .collect()
}

/// Rattache chaque point au câble le plus proche
///
/// Sans aucun câble, le point est rattaché au câble 0 à l'abscisse 0.
pub fn assign_to_cables(points: &[(usize, Coord<f64>)], cables: &[Polyline]) -> Vec<CableAssignment> {
    points
        .iter()
        .map(|&(item, p)| {
            let mut best = CableAssignment {
                item,
                cable: 0,
                along: 0.0,
                distance: f64::INFINITY,
            };
            for (index, cable) in cables.iter().enumerate() {
                let hit = cable.closest(p);
                if hit.distance < best.distance {
                    best = CableAssignment {
                        item,
                        cable: index,
                        along: hit.along,
                        distance: hit.distance,
                    };
                }
            }
            best
        })
        .collect()
}

/// Angle du segment le plus proche de `p`, toutes polylignes confondues
pub fn nearest_segment_angle(p: Coord<f64>, lines: &[Polyline]) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for line in lines {
        if let Some((segment, d)) = line.nearest_segment(p, 0.0) {
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, line.segment_angle(segment)));
            }
        }
    }
    best.map(|(_, angle)| angle)
}

/// Angle de référence d'un câble au point `p`
fn reference_angle(cable: &Polyline, p: Coord<f64>, min_segment_length: f64) -> f64 {
    let segment = cable
        .nearest_segment(p, min_segment_length)
        .or_else(|| cable.nearest_segment(p, 0.0))
        .map_or(0, |(i, _)| i);
    cable.segment_angle(segment)
}

/// Calcule la rotation de chaque étiquette homepass
pub fn place_labels(items: &[Placemark], categories: &[Category], params: LabelParams) -> LabelPlacement {
    let cables = polylines_for(items, categories, Category::DistributionCable);

    let homepass: Vec<(usize, Coord<f64>)> = items
        .iter()
        .zip(categories)
        .enumerate()
        .filter(|(_, (item, cat))| cat.is_homepass() && item.kind == GeometryKind::Point)
        .filter_map(|(index, (item, _))| item.plane_coords.first().map(|c| (index, *c)))
        .collect();

    let assignments = assign_to_cables(&homepass, &cables);

    let mut by_cable: BTreeMap<usize, Vec<CableAssignment>> = BTreeMap::new();
    for a in &assignments {
        by_cable.entry(a.cable).or_default().push(*a);
    }

    let mut placement = LabelPlacement::default();

    for (cable_index, mut members) in by_cable {
        members.sort_by(|a, b| a.along.total_cmp(&b.along).then(a.item.cmp(&b.item)));
        let alongs: Vec<f64> = members.iter().map(|a| a.along).collect();

        for run in partition_runs(&alongs, params.max_gap) {
            let run_members = &members[run];
            let along = run_members[lower_median_index(run_members.len())].along;

            let angle = cables.get(cable_index).map(|cable| {
                reference_angle(cable, cable.point_at(along), params.min_segment_length)
            });

            if let Some(angle) = angle {
                for m in run_members {
                    placement.rotations.insert(m.item, angle);
                }
            }

            placement.clusters.push(LabelCluster {
                cable: cable_index,
                members: run_members.iter().map(|m| m.item).collect(),
                along,
                angle,
            });
        }
    }

    // Points restés sans rotation : segment le plus proche, indépendamment
    for &(item, p) in &homepass {
        if !placement.rotations.contains_key(&item) {
            let angle = nearest_segment_angle(p, &cables).unwrap_or(0.0);
            placement.rotations.insert(item, angle);
        }
    }

    debug!(
        cables = cables.len(),
        homepass = homepass.len(),
        clusters = placement.clusters.len(),
        "Label rotations computed"
    );
    placement
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn point(x: f64, y: f64) -> Placemark {
        Placemark {
            kind: GeometryKind::Point,
            name: "HP".to_string(),
            description: None,
            folder_path: Vec::new(),
            geo_coords: vec![c(x, y)],
            plane_coords: vec![c(x, y)],
        }
    }

    fn path(coords: &[(f64, f64)]) -> Placemark {
        let coords: Vec<Coord<f64>> = coords.iter().map(|&(x, y)| c(x, y)).collect();
        Placemark {
            kind: GeometryKind::Path,
            name: "LINE".to_string(),
            description: None,
            folder_path: Vec::new(),
            geo_coords: coords.clone(),
            plane_coords: coords,
        }
    }

    #[test]
    fn test_two_points_share_one_cluster() {
        // Câble en L, deux homepass de part et d'autre du coude
        let items = vec![
            path(&[(0.0, 0.0), (30.0, 0.0), (30.0, 30.0)]),
            point(25.0, 2.0),
            point(33.0, 6.0),
        ];
        let cats = vec![
            Category::DistributionCable,
            Category::HomepassCovered,
            Category::HomepassCovered,
        ];
        let placement = place_labels(&items, &cats, LabelParams::default());

        assert_eq!(placement.clusters.len(), 1);
        let cluster = &placement.clusters[0];
        assert_eq!(cluster.members, vec![1, 2]);
        // Médiane basse : abscisse 25 → premier segment (horizontal)
        assert_eq!(cluster.along, 25.0);
        assert_eq!(cluster.angle, Some(0.0));
        assert_eq!(placement.rotation(1), Some(0.0));
        assert_eq!(placement.rotation(2), Some(0.0));
    }

    #[test]
    fn test_far_points_split_clusters() {
        let items = vec![
            path(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]),
            point(5.0, 1.0),
            point(10.0, 1.0),
            point(101.0, 60.0),
        ];
        let cats = vec![
            Category::DistributionCable,
            Category::HomepassCovered,
            Category::HomepassUncovered,
            Category::HomepassCovered,
        ];
        let placement = place_labels(&items, &cats, LabelParams::default());

        assert_eq!(placement.clusters.len(), 2);
        assert_eq!(placement.rotation(1), Some(0.0));
        assert_eq!(placement.rotation(2), Some(0.0));
        assert_eq!(placement.rotation(3), Some(90.0));
    }

    #[test]
    fn test_short_segments_are_skipped_for_angle() {
        // Petit décroché de 2 m au milieu d'un câble horizontal
        let items = vec![
            path(&[(0.0, 0.0), (20.0, 0.0), (21.0, 2.0), (41.0, 2.0)]),
            point(20.5, 1.0),
        ];
        let cats = vec![Category::DistributionCable, Category::HomepassCovered];
        let placement = place_labels(&items, &cats, LabelParams::default());
        assert_eq!(placement.rotation(1), Some(0.0));

        let loose = LabelParams {
            min_segment_length: 0.0,
            ..LabelParams::default()
        };
        let placement = place_labels(&items, &cats, loose);
        let expected = 2.0_f64.atan2(1.0).to_degrees();
        assert!((placement.rotation(1).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_cable_wins() {
        let items = vec![
            path(&[(0.0, 0.0), (50.0, 0.0)]),
            path(&[(0.0, 10.0), (0.0, 60.0)]),
            point(2.0, 40.0),
        ];
        let cats = vec![
            Category::DistributionCable,
            Category::DistributionCable,
            Category::HomepassCovered,
        ];
        let placement = place_labels(&items, &cats, LabelParams::default());
        assert_eq!(placement.clusters[0].cable, 1);
        assert_eq!(placement.rotation(2), Some(90.0));
    }

    #[test]
    fn test_without_cable_rotation_defaults_to_zero() {
        let items = vec![point(0.0, 0.0), point(100.0, 0.0)];
        let cats = vec![Category::HomepassCovered, Category::HomepassCovered];
        let placement = place_labels(&items, &cats, LabelParams::default());

        assert_eq!(placement.clusters.len(), 1);
        assert_eq!(placement.clusters[0].cable, 0);
        assert_eq!(placement.clusters[0].angle, None);
        assert_eq!(placement.rotation(0), Some(0.0));
        assert_eq!(placement.rotation(1), Some(0.0));
    }

    #[test]
    fn test_single_vertex_cable_is_ignored() {
        let items = vec![path(&[(0.0, 0.0)]), point(1.0, 1.0)];
        let cats = vec![Category::DistributionCable, Category::HomepassCovered];
        assert!(polylines_for(&items, &cats, Category::DistributionCable).is_empty());
    }

    #[test]
    fn test_nearest_segment_angle_over_roads() {
        let roads = vec![
            Polyline::new(vec![c(0.0, 0.0), c(0.0, 10.0)]).unwrap(),
            Polyline::new(vec![c(20.0, 0.0), c(30.0, 0.0)]).unwrap(),
        ];
        assert_eq!(nearest_segment_angle(c(22.0, 3.0), &roads), Some(0.0));
        assert_eq!(nearest_segment_angle(c(1.0, 5.0), &roads), Some(90.0));
        assert_eq!(nearest_segment_angle(c(1.0, 5.0), &[]), None);
    }
}
