use crate::domain::FeatureCollection;
use crate::error::{Error, Result};
use geo::{AffineTransform, Coord};

/// Bounding box in projected coordinates (meters)
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from a set of points
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Coord<f64>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;

        let mut bounds = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        bounds.expand(points);
        Some(bounds)
    }

    /// Expand bounds to include another set of points
    pub fn expand<'a>(&mut self, points: impl IntoIterator<Item = &'a Coord<f64>>) {
        for c in points {
            self.min_x = self.min_x.min(c.x);
            self.max_x = self.max_x.max(c.x);
            self.min_y = self.min_y.min(c.y);
            self.max_y = self.max_y.max(c.y);
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Mean of every exterior-ring vertex across all polygons, closing
/// vertices included
pub fn exterior_mean(collection: &FeatureCollection) -> Option<Coord<f64>> {
    let (count, sum_x, sum_y) = collection
        .polygons()
        .filter_map(|polygon| polygon.exterior())
        .flatten()
        .fold((0usize, 0.0, 0.0), |(n, sx, sy), c| (n + 1, sx + c.x, sy + c.y));

    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some(geo::coord! { x: sum_x / n, y: sum_y / n })
}

/// Local metric frame: move `center` to the origin, rotate
/// counter-clockwise by `rotate_deg`, then scale uniformly, both about
/// the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    center: Coord<f64>,
    rotate_deg: f64,
    scale_factor: f64,
}

impl LocalFrame {
    pub fn new(center: Coord<f64>, rotate_deg: f64, scale_factor: f64) -> Result<Self> {
        if !center.x.is_finite() || !center.y.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "frame center ({}, {}) is not finite",
                center.x, center.y
            )));
        }
        validate_rotation(rotate_deg)?;
        validate_scale(scale_factor)?;

        Ok(Self {
            center,
            rotate_deg,
            scale_factor,
        })
    }

    pub fn identity() -> Self {
        Self {
            center: geo::coord! { x: 0.0, y: 0.0 },
            rotate_deg: 0.0,
            scale_factor: 1.0,
        }
    }

    pub fn center(&self) -> Coord<f64> {
        self.center
    }

    pub fn rotate_deg(&self) -> f64 {
        self.rotate_deg
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Metric (UTM) coordinate to local frame
    pub fn apply(&self, coord: Coord<f64>) -> Coord<f64> {
        let origin = geo::coord! { x: 0.0, y: 0.0 };
        let centered = AffineTransform::translate(-self.center.x, -self.center.y).apply(coord);
        let rotated = AffineTransform::rotate(self.rotate_deg, origin).apply(centered);
        AffineTransform::scale(self.scale_factor, self.scale_factor, origin).apply(rotated)
    }

    /// Local frame coordinate back to metric (UTM)
    pub fn invert(&self, coord: Coord<f64>) -> Coord<f64> {
        let origin = geo::coord! { x: 0.0, y: 0.0 };
        let inv_scale = 1.0 / self.scale_factor;
        let unscaled = AffineTransform::scale(inv_scale, inv_scale, origin).apply(coord);
        let unrotated = AffineTransform::rotate(-self.rotate_deg, origin).apply(unscaled);
        AffineTransform::translate(self.center.x, self.center.y).apply(unrotated)
    }
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::identity()
    }
}

pub(crate) fn validate_rotation(rotate_deg: f64) -> Result<()> {
    if !rotate_deg.is_finite() {
        return Err(Error::InvalidParameter(format!(
            "rotate_deg must be finite, got {rotate_deg}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_scale(scale_factor: f64) -> Result<()> {
    if !scale_factor.is_finite() || scale_factor == 0.0 {
        return Err(Error::InvalidParameter(format!(
            "scale_factor must be finite and non-zero, got {scale_factor}"
        )));
    }
    Ok(())
}
