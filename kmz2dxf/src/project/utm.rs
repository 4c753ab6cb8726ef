//! Projection UTM (Universal Transverse Mercator) sur WGS84
//!
//! Séries de Snyder, précision millimétrique dans la zone.

use super::ellipsoid::WGS84;
use super::Geographic;

/// Facteur d'échelle sur le méridien central
const K0: f64 = 0.9996;

/// False easting
const X0: f64 = 500000.0;

/// False northing pour l'hémisphère sud
const Y0_SOUTH: f64 = 10000000.0;

/// Zone UTM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u32,
    pub south: bool,
}

impl UtmZone {
    /// Zone depuis un code EPSG WGS84 / UTM (326xx nord, 327xx sud)
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            32601..=32660 => Some(Self {
                number: epsg - 32600,
                south: false,
            }),
            32701..=32760 => Some(Self {
                number: epsg - 32700,
                south: true,
            }),
            _ => None,
        }
    }

    /// Longitude du méridien central (radians)
    fn central_meridian(self) -> f64 {
        ((self.number as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }

    fn false_northing(self) -> f64 {
        if self.south {
            Y0_SOUTH
        } else {
            0.0
        }
    }
}

/// Convertit des coordonnées géographiques WGS84 vers UTM
pub fn geographic_to_utm(geo: Geographic, zone: UtmZone) -> (f64, f64) {
    let a = WGS84::A;
    let e2 = WGS84::E2;
    let ep2 = WGS84::EP2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    let phi = geo.lat;
    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = a / (1.0 - e2 * sin_phi.powi(2)).sqrt();
    let t = tan_phi.powi(2);
    let c = ep2 * cos_phi.powi(2);
    let big_a = cos_phi * (geo.lon - zone.central_meridian());

    // Longueur de l'arc de méridien
    let m = a
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

    let x = K0
        * n
        * (big_a
            + (1.0 - t + c) * big_a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0)
        + X0;

    let y = K0
        * (m + n
            * tan_phi
            * (big_a.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * big_a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * big_a.powi(6)
                    / 720.0))
        + zone.false_northing();

    (x, y)
}

/// Convertit UTM vers coordonnées géographiques WGS84 (contrôle de l'aller-retour)
#[cfg(test)]
pub(crate) fn utm_to_geographic(x: f64, y: f64, zone: UtmZone) -> Geographic {
    let a = WGS84::A;
    let e2 = WGS84::E2;
    let ep2 = WGS84::EP2;

    let x = x - X0;
    let y = y - zone.false_northing();

    // Latitude d'empreinte
    let m = y / K0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                    - 252.0 * ep2
                    - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = zone.central_meridian()
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Geographic::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE_48S: UtmZone = UtmZone {
        number: 48,
        south: true,
    };

    #[test]
    fn test_zone_from_epsg() {
        assert_eq!(UtmZone::from_epsg(32748), Some(ZONE_48S));
        assert_eq!(
            UtmZone::from_epsg(32631),
            Some(UtmZone {
                number: 31,
                south: false
            })
        );
        assert_eq!(UtmZone::from_epsg(4326), None);
        assert_eq!(UtmZone::from_epsg(32700), None);
    }

    #[test]
    fn test_central_meridian_maps_to_false_easting() {
        // 105°E est le méridien central de la zone 48
        let (x, _) = geographic_to_utm(Geographic::from_degrees(105.0, -6.0), ZONE_48S);
        assert!((x - 500000.0).abs() < 1e-6, "x={}", x);
    }

    #[test]
    fn test_jakarta() {
        // Monas, Jakarta: 106.8272°E, 6.1754°S
        let (x, y) = geographic_to_utm(Geographic::from_degrees(106.8272, -6.1754), ZONE_48S);
        assert!((690000.0..715000.0).contains(&x), "x={}", x);
        assert!((9305000.0..9330000.0).contains(&y), "y={}", y);
    }

    #[test]
    fn test_roundtrip() {
        let geo = Geographic::from_degrees(106.8272, -6.1754);
        let (x, y) = geographic_to_utm(geo, ZONE_48S);
        let (lon, lat) = utm_to_geographic(x, y, ZONE_48S).to_degrees();

        assert!((lon - 106.8272).abs() < 1e-6, "lon={}", lon);
        assert!((lat - (-6.1754)).abs() < 1e-6, "lat={}", lat);
    }

    #[test]
    fn test_northern_hemisphere() {
        // Paris dans la zone 31N
        let zone = UtmZone::from_epsg(32631).unwrap();
        let (x, y) = geographic_to_utm(Geographic::from_degrees(2.35, 48.85), zone);
        assert!((x - 452000.0).abs() < 2000.0, "x={}", x);
        assert!((y - 5411000.0).abs() < 2000.0, "y={}", y);
    }
}
