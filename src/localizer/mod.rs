//! Reversible translation of GeoJSON coordinates into a local frame
//!
//! Localizing subtracts a single offset (by default the first position
//! of the document) from every position. Without that offset the
//! original location cannot be recovered; with it, [`restore`] adds it
//! back.

use crate::domain::FeatureCollection;
use crate::error::{Error, Result};
use geo::Coord;

/// Local origin, in the same (lon, lat) degrees as the source document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub lon: f64,
    pub lat: f64,
}

impl Offset {
    /// Caller-supplied offset; must be a valid geographic position
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::InvalidParameter(format!(
                "offset latitude {lat} outside [-90, 90]"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::InvalidParameter(format!(
                "offset longitude {lon} outside [-180, 180]"
            )));
        }
        Ok(Self { lon, lat })
    }
}

impl From<Coord<f64>> for Offset {
    fn from(coord: Coord<f64>) -> Self {
        Self {
            lon: coord.x,
            lat: coord.y,
        }
    }
}

/// Where the active offset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetSource {
    /// Taken from the current geodata
    Computed,
    /// Set explicitly through [`CoordinateLocalizer::set_offset`]
    Supplied,
}

/// First position of the document in pre-order (feature, polygon,
/// ring, position)
pub fn find_offset(collection: &FeatureCollection) -> Result<Offset> {
    collection
        .first_coord()
        .map(Offset::from)
        .ok_or(Error::EmptyGeometry)
}

/// Translate every position by `-offset`
pub fn localize(collection: &FeatureCollection, offset: Offset) -> FeatureCollection {
    collection.map_coords(|c| geo::coord! { x: c.x - offset.lon, y: c.y - offset.lat })
}

/// Translate every position by `+offset`; inverse of [`localize`]
pub fn restore(collection: &FeatureCollection, offset: Offset) -> FeatureCollection {
    collection.map_coords(|c| geo::coord! { x: c.x + offset.lon, y: c.y + offset.lat })
}

/// Session holding one document and the offset used to localize it
#[derive(Debug, Clone, Default)]
pub struct CoordinateLocalizer {
    geodata: Option<FeatureCollection>,
    offset: Option<(Offset, OffsetSource)>,
}

impl CoordinateLocalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geodata(geodata: FeatureCollection) -> Self {
        let mut localizer = Self::new();
        localizer.set_geodata(geodata);
        localizer
    }

    /// Store a document without computing an offset.
    ///
    /// A computed offset belonged to the previous document and is
    /// dropped; a supplied one is kept.
    pub fn set_geodata(&mut self, geodata: FeatureCollection) {
        self.geodata = Some(geodata);
        if let Some((_, OffsetSource::Computed)) = self.offset {
            self.offset = None;
        }
    }

    pub fn geodata(&self) -> Option<&FeatureCollection> {
        self.geodata.as_ref()
    }

    /// Override the offset, e.g. to reuse one from an earlier session
    pub fn set_offset(&mut self, lat: f64, lon: f64) -> Result<()> {
        let offset = Offset::new(lat, lon)?;
        self.offset = Some((offset, OffsetSource::Supplied));
        Ok(())
    }

    pub fn offset(&self) -> Option<Offset> {
        self.offset.map(|(offset, _)| offset)
    }

    pub fn offset_source(&self) -> Option<OffsetSource> {
        self.offset.map(|(_, source)| source)
    }

    /// Compute the offset from the stored document and keep it
    pub fn compute_offset(&mut self) -> Result<Offset> {
        let geodata = self.geodata.as_ref().ok_or(Error::NoData)?;
        let offset = find_offset(geodata)?;
        log::debug!(
            "computed offset ({:.6}, {:.6}) from first coordinate",
            offset.lon,
            offset.lat
        );
        self.offset = Some((offset, OffsetSource::Computed));
        Ok(offset)
    }

    /// Localize the stored document, computing the offset first if none
    /// is known
    pub fn localize(&mut self) -> Result<FeatureCollection> {
        if self.geodata.is_none() {
            return Err(Error::NoData);
        }
        let offset = match self.offset {
            Some((offset, _)) => offset,
            None => self.compute_offset()?,
        };
        let geodata = self.geodata.as_ref().ok_or(Error::NoData)?;

        let localized = localize(geodata, offset);
        log::debug!(
            "localized {} features ({} coordinates)",
            localized.len(),
            localized.coord_count()
        );
        Ok(localized)
    }

    /// Undo [`CoordinateLocalizer::localize`] on a localized document
    pub fn restore(&self, localized: &FeatureCollection) -> Result<FeatureCollection> {
        let offset = self.offset().ok_or(Error::OffsetNotSet)?;
        Ok(restore(localized, offset))
    }
}
