//! geoveil - Anonymize and re-project GeoJSON polygons
//!
//! [`CoordinateLocalizer`] shifts a document so that its coordinates no
//! longer reveal where it lies, and shifts it back given the offset.
//! [`Projector`] moves (lon, lat) polygons into a local metric frame via
//! the document's UTM zone, with optional rotation and scaling.

pub mod config;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod io;
pub mod localizer;
pub mod projector;

pub use domain::{Feature, FeatureCollection, Geometry, Polygon, Ring};
pub use error::{Error, Result};
pub use geometry::{UtmZone, Wgs84Utm};
pub use localizer::{CoordinateLocalizer, Offset, OffsetSource};
pub use projector::{Canvas, ProjectedLayer, ProjectionOptions, Projector, SvgCanvas};
