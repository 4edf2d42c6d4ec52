//! Euclidean projection of GeoJSON polygons into a local metric frame
//!
//! Every position goes through the UTM zone selected for the whole
//! document, then through a [`LocalFrame`]: recentred on the mean of
//! the exterior vertices, rotated, and scaled. The result measures in
//! meters without latitude-dependent distortion, and no longer carries
//! its absolute position.

pub mod plot;

pub use plot::{Canvas, PLOT_TITLE, SvgCanvas};

use crate::domain::FeatureCollection;
use crate::error::{Error, Result};
use crate::geometry::scaling::{validate_rotation, validate_scale};
use crate::geometry::{
    Bounds, GeodeticTransform, LocalFrame, ProjectionService, UtmZone, Wgs84Utm, exterior_mean,
    select_zone,
};
use serde::Deserialize;

fn default_scale_factor() -> f64 {
    1.0
}
fn default_recenter() -> bool {
    true
}

/// Rotation and scale applied after projection; identity by default
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ProjectionOptions {
    /// Counter-clockwise rotation in degrees
    #[serde(default)]
    pub rotate_deg: f64,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// Move the exterior-vertex mean to the origin before rotating
    #[serde(default = "default_recenter")]
    pub recenter: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            rotate_deg: 0.0,
            scale_factor: default_scale_factor(),
            recenter: default_recenter(),
        }
    }
}

impl ProjectionOptions {
    pub fn with_rotation(mut self, rotate_deg: f64) -> Self {
        self.rotate_deg = rotate_deg;
        self
    }

    pub fn with_scale(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_recenter(mut self, recenter: bool) -> Self {
        self.recenter = recenter;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_rotation(self.rotate_deg)?;
        validate_scale(self.scale_factor)
    }
}

/// Output of [`Projector::project`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLayer {
    pub zone: UtmZone,
    pub frame: LocalFrame,
    /// Same features as the input, positions in the local metric frame
    pub collection: FeatureCollection,
}

impl ProjectedLayer {
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.collection.coords())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectorState {
    Uninitialized,
    Loaded,
    ZoneSelected,
    Projected,
}

/// Holds one document, its UTM zone and its cached projection
#[derive(Debug, Clone)]
pub struct Projector<S = Wgs84Utm> {
    service: S,
    options: ProjectionOptions,
    geodata: Option<FeatureCollection>,
    zone: Option<UtmZone>,
    layer: Option<ProjectedLayer>,
}

impl Projector<Wgs84Utm> {
    pub fn new(options: ProjectionOptions) -> Result<Self> {
        Self::with_service(Wgs84Utm, options)
    }

    pub fn with_geodata(geodata: FeatureCollection, options: ProjectionOptions) -> Result<Self> {
        let mut projector = Self::new(options)?;
        projector.set_new_geodata(geodata);
        Ok(projector)
    }
}

impl<S: ProjectionService> Projector<S> {
    /// Projector backed by another projection service
    pub fn with_service(service: S, options: ProjectionOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            service,
            options,
            geodata: None,
            zone: None,
            layer: None,
        })
    }

    /// Replace the document; zone and projection are recomputed on next use
    pub fn set_new_geodata(&mut self, geodata: FeatureCollection) {
        self.geodata = Some(geodata);
        self.zone = None;
        self.layer = None;
    }

    /// Change rotation/scale; the zone depends only on the data and is kept
    pub fn set_options(&mut self, options: ProjectionOptions) -> Result<()> {
        options.validate()?;
        self.options = options;
        self.layer = None;
        Ok(())
    }

    pub fn options(&self) -> ProjectionOptions {
        self.options
    }

    pub fn geodata(&self) -> Option<&FeatureCollection> {
        self.geodata.as_ref()
    }

    pub fn state(&self) -> ProjectorState {
        match (&self.geodata, &self.zone, &self.layer) {
            (None, _, _) => ProjectorState::Uninitialized,
            (Some(_), _, Some(_)) => ProjectorState::Projected,
            (Some(_), Some(_), None) => ProjectorState::ZoneSelected,
            (Some(_), None, None) => ProjectorState::Loaded,
        }
    }

    /// UTM zone of the current document, selected on first use
    pub fn zone(&mut self) -> Result<UtmZone> {
        if let Some(zone) = self.zone {
            return Ok(zone);
        }
        let geodata = self.geodata.as_ref().ok_or(Error::NoData)?;
        let zone = select_zone(geodata)?;
        self.zone = Some(zone);
        Ok(zone)
    }

    /// Project every position; cached until geodata or options change
    pub fn project(&mut self) -> Result<&ProjectedLayer> {
        if self.layer.is_none() {
            let layer = self.build_layer()?;
            self.layer = Some(layer);
        }
        self.layer.as_ref().ok_or(Error::NotProjected)
    }

    pub fn projected(&self) -> Option<&ProjectedLayer> {
        self.layer.as_ref()
    }

    fn build_layer(&mut self) -> Result<ProjectedLayer> {
        let zone = self.zone()?;
        let geodata = self.geodata.as_ref().ok_or(Error::NoData)?;
        let transform = self.service.utm(zone)?;

        let metric = geodata.try_map_coords(|c| transform.forward(c))?;

        let origin = geo::coord! { x: 0.0, y: 0.0 };
        let center = if self.options.recenter {
            exterior_mean(&metric).unwrap_or(origin)
        } else {
            origin
        };
        let frame = LocalFrame::new(center, self.options.rotate_deg, self.options.scale_factor)?;
        let collection = metric.map_coords(|c| frame.apply(c));

        log::debug!(
            "projected {} features ({} coordinates) into zone {}, center ({:.3}, {:.3}), rotate {} deg, scale {}",
            collection.len(),
            collection.coord_count(),
            zone,
            center.x,
            center.y,
            frame.rotate_deg(),
            frame.scale_factor()
        );

        Ok(ProjectedLayer {
            zone,
            frame,
            collection,
        })
    }

    /// Map a document in the projected frame back to (lon, lat)
    ///
    /// Uses the zone and frame of the last [`Projector::project`] call.
    pub fn unproject(&self, projected: &FeatureCollection) -> Result<FeatureCollection> {
        let layer = self.layer.as_ref().ok_or(Error::NotProjected)?;
        let transform = self.service.utm(layer.zone)?;
        projected.try_map_coords(|c| transform.inverse(layer.frame.invert(c)))
    }

    /// Projected polygons as a GeoJSON FeatureCollection.
    ///
    /// Positions are meters in the local frame, not EPSG:4326 (lon, lat);
    /// consumers must not read them as geographic coordinates.
    pub fn cast_to_geojson(&self) -> Result<FeatureCollection> {
        self.layer
            .as_ref()
            .map(|layer| layer.collection.clone())
            .ok_or(Error::NotProjected)
    }

    /// Hand every projected polygon to a canvas
    pub fn plot<C: Canvas>(&self, canvas: &mut C) -> Result<()> {
        let layer = self.layer.as_ref().ok_or(Error::NotProjected)?;
        canvas.set_title(PLOT_TITLE);
        for polygon in layer.collection.polygons() {
            canvas.draw_polygon(&polygon.rings);
        }
        Ok(())
    }
}
