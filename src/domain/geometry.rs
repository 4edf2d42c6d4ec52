use crate::error::{Error, Result};
use geo::Coord;
use serde_json::Value;
use std::convert::Infallible;

/// Closed sequence of positions; the first position repeats as the last
pub type Ring = Vec<Coord<f64>>;

/// Polygon as GeoJSON nests it: exterior ring first, holes after
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn exterior(&self) -> Option<&Ring> {
        self.rings.first()
    }

    pub fn holes(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or(&[])
    }

    /// Positions in ring order, exterior first
    pub fn coords(&self) -> impl Iterator<Item = &Coord<f64>> {
        self.rings.iter().flatten()
    }

    /// Build a polygon with the same ring layout and every position mapped
    pub fn try_map_coords<E, F>(&self, mut f: F) -> std::result::Result<Polygon, E>
    where
        F: FnMut(Coord<f64>) -> std::result::Result<Coord<f64>, E>,
    {
        let mut rings = Vec::with_capacity(self.rings.len());
        for ring in &self.rings {
            let mut mapped = Vec::with_capacity(ring.len());
            for &coord in ring {
                mapped.push(f(coord)?);
            }
            rings.push(mapped);
        }
        Ok(Polygon { rings })
    }

    pub fn map_coords<F>(&self, mut f: F) -> Polygon
    where
        F: FnMut(Coord<f64>) -> Coord<f64>,
    {
        infallible(self.try_map_coords(|c| Ok(f(c))))
    }

    pub fn to_geo(&self) -> geo::Polygon<f64> {
        let exterior = self
            .exterior()
            .map(|ring| geo::LineString::new(ring.clone()))
            .unwrap_or_else(|| geo::LineString::new(Vec::new()));
        let interiors = self
            .holes()
            .iter()
            .map(|ring| geo::LineString::new(ring.clone()))
            .collect();
        geo::Polygon::new(exterior, interiors)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let rings = expect_array(value, "Polygon coordinates must be an array of rings")?
            .iter()
            .map(|ring| {
                expect_array(ring, "ring must be an array of positions")?
                    .iter()
                    .map(parse_position)
                    .collect::<Result<Ring>>()
            })
            .collect::<Result<Vec<Ring>>>()?;
        Ok(Self { rings })
    }

    fn to_value(&self) -> Value {
        Value::Array(
            self.rings
                .iter()
                .map(|ring| Value::Array(ring.iter().map(|c| serde_json::json!([c.x, c.y])).collect()))
                .collect(),
        )
    }
}

/// Geometry kinds the transforms accept
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Geometry::Polygon(polygon) => std::slice::from_ref(polygon),
            Geometry::MultiPolygon(polygons) => polygons,
        }
    }

    /// Pre-order traversal: polygon, then ring, then position
    pub fn coords(&self) -> impl Iterator<Item = &Coord<f64>> {
        self.polygons().iter().flat_map(Polygon::coords)
    }

    pub fn try_map_coords<E, F>(&self, mut f: F) -> std::result::Result<Geometry, E>
    where
        F: FnMut(Coord<f64>) -> std::result::Result<Coord<f64>, E>,
    {
        Ok(match self {
            Geometry::Polygon(polygon) => Geometry::Polygon(polygon.try_map_coords(&mut f)?),
            Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(
                polygons
                    .iter()
                    .map(|polygon| polygon.try_map_coords(&mut f))
                    .collect::<std::result::Result<_, E>>()?,
            ),
        })
    }

    pub fn map_coords<F>(&self, mut f: F) -> Geometry
    where
        F: FnMut(Coord<f64>) -> Coord<f64>,
    {
        infallible(self.try_map_coords(|c| Ok(f(c))))
    }

    pub fn to_geo(&self) -> geo::Geometry<f64> {
        match self {
            Geometry::Polygon(polygon) => geo::Geometry::Polygon(polygon.to_geo()),
            Geometry::MultiPolygon(polygons) => geo::Geometry::MultiPolygon(geo::MultiPolygon::new(
                polygons.iter().map(Polygon::to_geo).collect(),
            )),
        }
    }

    /// Parse the `type`/`coordinates` pair of a GeoJSON geometry object
    pub(crate) fn from_parts(kind: &str, coordinates: &Value) -> Result<Self> {
        match kind {
            "Polygon" => Ok(Geometry::Polygon(Polygon::from_value(coordinates)?)),
            "MultiPolygon" => {
                let polygons = expect_array(
                    coordinates,
                    "MultiPolygon coordinates must be an array of polygons",
                )?
                .iter()
                .map(Polygon::from_value)
                .collect::<Result<Vec<_>>>()?;
                Ok(Geometry::MultiPolygon(polygons))
            }
            other => Err(Error::UnsupportedGeometry(format!(
                "geometry type {other} is not supported (expected Polygon or MultiPolygon)"
            ))),
        }
    }

    pub(crate) fn coordinates_value(&self) -> Value {
        match self {
            Geometry::Polygon(polygon) => polygon.to_value(),
            Geometry::MultiPolygon(polygons) => {
                Value::Array(polygons.iter().map(Polygon::to_value).collect())
            }
        }
    }
}

fn expect_array<'a>(value: &'a Value, message: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::UnsupportedGeometry(message.to_string()))
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let items = expect_array(value, "position must be an array of numbers")?;
    if items.len() != 2 {
        return Err(Error::UnsupportedGeometry(format!(
            "position must have exactly 2 elements, found {}",
            items.len()
        )));
    }

    let component = |v: &Value| {
        v.as_f64().filter(|n| n.is_finite()).ok_or_else(|| {
            Error::UnsupportedGeometry(format!("position component {v} is not a finite number"))
        })
    };

    Ok(geo::coord! { x: component(&items[0])?, y: component(&items[1])? })
}

pub(crate) fn infallible<T>(result: std::result::Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
