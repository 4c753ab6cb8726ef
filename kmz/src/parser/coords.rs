//! Parser des blocs `<coordinates>` ("lon,lat[,alt]" séparés par des blancs)

use geo::Coord;
use tracing::trace;

/// Parse un bloc de coordonnées
///
/// Les tuples illisibles sont ignorés sans erreur ; l'altitude est abandonnée.
pub fn parse_coordinates(text: &str) -> Vec<Coord<f64>> {
    text.split_whitespace()
        .filter_map(|token| {
            let coord = parse_token(token);
            if coord.is_none() {
                trace!(token, "coordinate token skipped");
            }
            coord
        })
        .collect()
}

/// Parse un tuple "lon,lat[,alt]"
#[inline]
fn parse_token(token: &str) -> Option<Coord<f64>> {
    let mut parts = token.split(',');
    let x = fast_parse_f64(parts.next()?)?;
    let y = fast_parse_f64(parts.next()?)?;
    Some(Coord { x, y })
}

#[inline]
fn fast_parse_f64(s: &str) -> Option<f64> {
    let value: f64 = fast_float::parse(s.trim()).ok()?;
    value.is_finite().then_some(value)
}
