//! Error types for geoveil

use thiserror::Error;

/// Result type for geoveil operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the localizer, the projector and GeoJSON parsing
#[derive(Debug, Error)]
pub enum Error {
    /// An operation needs geodata but none has been set
    #[error("no geodata set")]
    NoData,

    /// The document holds no coordinate pairs at all
    #[error("geometry contains no coordinate pairs")]
    EmptyGeometry,

    /// Geometry type outside Polygon/MultiPolygon, or malformed coordinates
    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    /// Rotation, scale or offset outside the accepted range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Restore attempted before any offset was computed or supplied
    #[error("no offset known; localize a document or set an offset before restoring")]
    OffsetNotSet,

    /// Projected output requested before `project` ran
    #[error("no projected polygons available; call project() first")]
    NotProjected,

    /// Top-level structure is not a FeatureCollection of Features
    #[error("invalid GeoJSON document: {0}")]
    InvalidDocument(String),

    /// The projection service rejected a coordinate
    #[error("projection error: {0}")]
    Projection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedGeometry("LineString".to_string());
        assert_eq!(err.to_string(), "unsupported geometry: LineString");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("pretty = ").unwrap_err();
        let err: Error = toml_err.into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().starts_with("config error"));
    }
}
