pub mod projection;
pub mod scaling;

pub use projection::{
    GeodeticTransform, Hemisphere, ProjectionService, TransverseMercator, UtmZone, Wgs84Utm,
    representative_point, select_zone,
};
pub use scaling::{Bounds, LocalFrame, exterior_mean};
