//! UTM zone selection and the geographic ↔ UTM projection service
//!
//! The projector only talks to [`ProjectionService`] and
//! [`GeodeticTransform`]; [`Wgs84Utm`] is the built-in service, a
//! transverse Mercator on the WGS84 ellipsoid using the Krüger series
//! to 6th order. Inside a zone the forward/inverse round trip is
//! accurate to better than 1e-9 degrees. Longitudes are compared with
//! the central meridian modulo 360, so data crossing the antimeridian
//! projects continuously; positions 90 degrees or more away are
//! rejected.

use crate::domain::FeatureCollection;
use crate::error::{Error, Result};
use geo::{Centroid, Coord};
use std::fmt;

/// WGS84 semi-major axis in meters
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// UTM scale factor on the central meridian
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
/// Transverse Mercator has no finite image this far from the central meridian
const MAX_MERIDIAN_DISTANCE: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Equator counts as north
    pub fn from_latitude(lat: f64) -> Self {
        if lat >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }
}

/// A UTM zone: number 1..=60 plus hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtmZone {
    number: u8,
    hemisphere: Hemisphere,
}

impl UtmZone {
    pub fn new(number: u8, hemisphere: Hemisphere) -> Result<Self> {
        if !(1..=60).contains(&number) {
            return Err(Error::InvalidParameter(format!(
                "UTM zone {number} outside 1..=60"
            )));
        }
        Ok(Self { number, hemisphere })
    }

    /// Zone containing a point: `floor((lon + 180) / 6) + 1`
    ///
    /// lon = 180 would land in zone 61 and is folded into zone 60.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Result<Self> {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::InvalidParameter(format!(
                "longitude {lon} outside [-180, 180]"
            )));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::InvalidParameter(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }

        let number = (((lon + 180.0) / 6.0).floor() as u8 + 1).min(60);
        Self::new(number, Hemisphere::from_latitude(lat))
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    /// Central meridian in degrees
    pub fn central_meridian(&self) -> f64 {
        f64::from(self.number) * 6.0 - 183.0
    }

    /// EPSG code of the WGS84 / UTM CRS for this zone
    pub fn epsg(&self) -> u32 {
        let base = match self.hemisphere {
            Hemisphere::North => 32600,
            Hemisphere::South => 32700,
        };
        base + u32::from(self.number)
    }

    /// PROJ definition of the zone's CRS
    pub fn proj_string(&self) -> String {
        let south = match self.hemisphere {
            Hemisphere::North => "",
            Hemisphere::South => " +south",
        };
        format!(
            "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
            self.number, south
        )
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.hemisphere {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
        };
        write!(f, "{}{}", self.number, letter)
    }
}

/// Average of the per-feature centroids, in geographic coordinates
///
/// Features whose geometry is null or has no positions are skipped.
pub fn representative_point(collection: &FeatureCollection) -> Result<Coord<f64>> {
    let centroids: Vec<Coord<f64>> = collection
        .features
        .iter()
        .filter_map(|feature| feature.geometry.as_ref())
        .filter_map(|geometry| geometry.to_geo().centroid())
        .map(|point| point.0)
        .collect();

    if centroids.is_empty() {
        return Err(Error::EmptyGeometry);
    }

    let n = centroids.len() as f64;
    let (sum_x, sum_y) = centroids
        .iter()
        .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
    Ok(geo::coord! { x: sum_x / n, y: sum_y / n })
}

/// One zone for the whole document, picked at its representative point
pub fn select_zone(collection: &FeatureCollection) -> Result<UtmZone> {
    let point = representative_point(collection)?;
    let zone = UtmZone::from_lon_lat(point.x, point.y)?;
    log::debug!(
        "selected UTM zone {} (EPSG:{}) from representative point ({:.6}, {:.6})",
        zone,
        zone.epsg(),
        point.x,
        point.y
    );
    Ok(zone)
}

/// Forward and inverse mapping between geographic (lon, lat) degrees
/// and a projected metric frame
pub trait GeodeticTransform {
    fn forward(&self, lonlat: Coord<f64>) -> Result<Coord<f64>>;
    fn inverse(&self, xy: Coord<f64>) -> Result<Coord<f64>>;
}

/// Source of UTM transforms, one per zone
pub trait ProjectionService {
    type Transform: GeodeticTransform;

    fn utm(&self, zone: UtmZone) -> Result<Self::Transform>;
}

/// Built-in projection service: WGS84 transverse Mercator
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84Utm;

impl ProjectionService for Wgs84Utm {
    type Transform = TransverseMercator;

    fn utm(&self, zone: UtmZone) -> Result<TransverseMercator> {
        Ok(TransverseMercator::utm_zone(zone))
    }
}

/// Transverse Mercator on the WGS84 ellipsoid (Krüger n-series)
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Central meridian in degrees
    lon0: f64,
    false_northing: f64,
    /// Rectifying radius
    a_hat: f64,
    /// First eccentricity
    e: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
}

impl TransverseMercator {
    pub fn utm_zone(zone: UtmZone) -> Self {
        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let a_hat = WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0);
        let e = (WGS84_F * (2.0 - WGS84_F)).sqrt();

        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4 - 127.0 / 288.0 * n5
                + 7891.0 / 37800.0 * n6,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5
                - 1983433.0 / 1935360.0 * n6,
            61.0 / 240.0 * n3 - 103.0 / 140.0 * n4 + 15061.0 / 26880.0 * n5
                + 167603.0 / 181440.0 * n6,
            49561.0 / 161280.0 * n4 - 179.0 / 168.0 * n5 + 6601661.0 / 7257600.0 * n6,
            34729.0 / 80640.0 * n5 - 3418889.0 / 1995840.0 * n6,
            212378941.0 / 319334400.0 * n6,
        ];
        let beta = [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5
                + 96199.0 / 604800.0 * n6,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
                - 1118711.0 / 3870720.0 * n6,
            17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5 + 5569.0 / 90720.0 * n6,
            4397.0 / 161280.0 * n4 - 11.0 / 504.0 * n5 - 830251.0 / 7257600.0 * n6,
            4583.0 / 161280.0 * n5 - 108847.0 / 3991680.0 * n6,
            20648693.0 / 638668800.0 * n6,
        ];

        let false_northing = match zone.hemisphere() {
            Hemisphere::North => 0.0,
            Hemisphere::South => UTM_FALSE_NORTHING_SOUTH,
        };

        Self {
            lon0: zone.central_meridian(),
            false_northing,
            a_hat,
            e,
            alpha,
            beta,
        }
    }

    /// Geodetic tangent τ to conformal tangent τ'
    fn conformal_tangent(&self, tau: f64) -> f64 {
        let e = self.e;
        let tau1 = tau.hypot(1.0);
        let sigma = (e * (e * tau / tau1).atanh()).sinh();
        tau * sigma.hypot(1.0) - sigma * tau1
    }

    /// Conformal tangent back to geodetic tangent (Newton iteration)
    fn geodetic_tangent(&self, tau_prime: f64) -> f64 {
        let e2 = self.e * self.e;
        let mut tau = tau_prime;
        for _ in 0..15 {
            let tau1 = tau.hypot(1.0);
            let estimate = self.conformal_tangent(tau);
            let dtau = (tau_prime - estimate) * (1.0 + (1.0 - e2) * tau * tau)
                / ((1.0 - e2) * tau1 * estimate.hypot(1.0));
            tau += dtau;
            if dtau.abs() < 1e-14 * (1.0 + tau.abs()) {
                break;
            }
        }
        tau
    }
}

impl GeodeticTransform for TransverseMercator {
    fn forward(&self, lonlat: Coord<f64>) -> Result<Coord<f64>> {
        let (lon, lat) = (lonlat.x, lonlat.y);
        if !lon.is_finite() || !lat.is_finite() {
            return Err(Error::Projection(format!(
                "cannot project non-finite coordinate ({lon}, {lat})"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::Projection(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }

        let dlam = wrap_longitude(lon - self.lon0);
        if dlam.abs() >= MAX_MERIDIAN_DISTANCE {
            return Err(Error::Projection(format!(
                "longitude {lon} is {:.1} degrees from the central meridian {}",
                dlam.abs(),
                self.lon0
            )));
        }
        let dlam = dlam.to_radians();
        let tau_prime = self.conformal_tangent(lat.to_radians().tan());

        let xi_prime = tau_prime.atan2(dlam.cos());
        let eta_prime = (dlam.sin() / tau_prime.hypot(dlam.cos())).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, &a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += a * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += a * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        Ok(geo::coord! {
            x: UTM_K0 * self.a_hat * eta + UTM_FALSE_EASTING,
            y: UTM_K0 * self.a_hat * xi + self.false_northing,
        })
    }

    fn inverse(&self, xy: Coord<f64>) -> Result<Coord<f64>> {
        if !xy.x.is_finite() || !xy.y.is_finite() {
            return Err(Error::Projection(format!(
                "cannot unproject non-finite coordinate ({}, {})",
                xy.x, xy.y
            )));
        }

        let eta = (xy.x - UTM_FALSE_EASTING) / (UTM_K0 * self.a_hat);
        let xi = (xy.y - self.false_northing) / (UTM_K0 * self.a_hat);

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, &b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_prime -= b * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let cos_xi = xi_prime.cos();
        let tau_prime = xi_prime.sin() / sinh_eta.hypot(cos_xi);
        let tau = self.geodetic_tangent(tau_prime);

        let lat = tau.atan().to_degrees();
        let lon = wrap_longitude(self.lon0 + sinh_eta.atan2(cos_xi).to_degrees());

        Ok(geo::coord! { x: lon, y: lat })
    }
}

/// Fold a longitude difference or result back into [-180, 180]
fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}
