//! Polylignes planes paramétrées par abscisse curviligne
//!
//! Les métriques sont déléguées aux traits de `geo` ;
//! seules les longueurs cumulées par sommet sont tenues ici.

use geo::{
    Coord, EuclideanDistance, EuclideanLength, Line, LineInterpolatePoint, LineLocatePoint,
    LineString, Point,
};

/// Projection orthogonale d'un point sur une polyligne
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Closest {
    /// Distance euclidienne du point à la polyligne
    pub distance: f64,
    /// Abscisse curviligne du point le plus proche
    pub along: f64,
    /// Index du segment porteur
    pub segment: usize,
}

/// Polyligne avec longueurs cumulées par sommet
#[derive(Debug, Clone)]
pub struct Polyline {
    line: LineString<f64>,
    cumulative: Vec<f64>,
}

impl Polyline {
    /// `None` si moins de deux sommets
    pub fn new(vertices: Vec<Coord<f64>>) -> Option<Self> {
        if vertices.len() < 2 {
            return None;
        }

        let line = LineString::new(vertices);
        let mut cumulative = Vec::with_capacity(line.0.len());
        let mut total = 0.0;
        cumulative.push(total);
        for segment in line.lines() {
            total += segment.euclidean_length();
            cumulative.push(total);
        }

        Some(Self { line, cumulative })
    }

    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn segment_count(&self) -> usize {
        self.line.0.len() - 1
    }

    pub fn segment(&self, index: usize) -> Line<f64> {
        Line::new(self.line.0[index], self.line.0[index + 1])
    }

    pub fn segment_length(&self, index: usize) -> f64 {
        self.cumulative[index + 1] - self.cumulative[index]
    }

    /// Point de la polyligne le plus proche de `p` (premier segment en cas d'égalité)
    pub fn closest(&self, p: Coord<f64>) -> Closest {
        let point = Point::from(p);
        let mut best = Closest {
            distance: f64::INFINITY,
            along: 0.0,
            segment: 0,
        };

        for (i, segment) in self.line.lines().enumerate() {
            let d = point.euclidean_distance(&segment);
            if d < best.distance {
                let t = segment.line_locate_point(&point).unwrap_or(0.0);
                best = Closest {
                    distance: d,
                    along: self.cumulative[i] + t * self.segment_length(i),
                    segment: i,
                };
            }
        }

        best
    }

    /// Point situé à l'abscisse `along` (bornée à la longueur)
    pub fn point_at(&self, along: f64) -> Coord<f64> {
        let along = along.clamp(0.0, self.length());
        let last = self.line.0[self.line.0.len() - 1];
        // Dernier sommet d'abscisse <= along : saute les segments de longueur nulle
        let i = match self.cumulative.iter().rposition(|&c| c <= along) {
            Some(i) if i < self.segment_count() => i,
            _ => return last,
        };

        let len = self.segment_length(i);
        let segment = self.segment(i);
        if len <= 0.0 {
            return segment.start;
        }
        segment
            .line_interpolate_point((along - self.cumulative[i]) / len)
            .map_or(segment.start, |p| p.0)
    }

    /// Segment le plus proche de `p` parmi ceux de longueur >= `min_length`
    pub fn nearest_segment(&self, p: Coord<f64>, min_length: f64) -> Option<(usize, f64)> {
        let point = Point::from(p);
        let mut best: Option<(usize, f64)> = None;
        for (i, segment) in self.line.lines().enumerate() {
            if self.segment_length(i) < min_length {
                continue;
            }
            let d = point.euclidean_distance(&segment);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best
    }

    /// Orientation du segment `index` en degrés, dans (-180, 180]
    pub fn segment_angle(&self, index: usize) -> f64 {
        line_angle(self.segment(index))
    }
}

/// atan2(dy, dx) en degrés, normalisé dans (-180, 180]
pub fn line_angle(line: Line<f64>) -> f64 {
    normalize_angle(line.dy().atan2(line.dx()).to_degrees())
}

/// Ramène un angle en degrés dans (-180, 180]
pub fn normalize_angle(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r > 180.0 {
        r - 360.0
    } else {
        r
    }
}
