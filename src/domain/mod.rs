pub mod document;
pub mod geometry;

pub use document::{Feature, FeatureCollection};
pub use geometry::{Geometry, Polygon, Ring};
