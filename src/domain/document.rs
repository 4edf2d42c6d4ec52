use super::geometry::{Geometry, Polygon, infallible};
use crate::error::{Error, Result};
use geo::Coord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Members rebuilt from coordinates; stale once coordinates move
const DERIVED_MEMBERS: &[&str] = &["bbox"];

/// A GeoJSON Feature holding a Polygon or MultiPolygon
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub id: Option<Value>,
    pub geometry: Option<Geometry>,
    pub properties: Option<Map<String, Value>>,
    pub foreign_members: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn try_map_coords<E, F>(&self, f: F) -> std::result::Result<Feature, E>
    where
        F: FnMut(Coord<f64>) -> std::result::Result<Coord<f64>, E>,
    {
        let geometry = match &self.geometry {
            Some(geometry) => Some(geometry.try_map_coords(f)?),
            None => None,
        };
        Ok(Feature {
            id: self.id.clone(),
            geometry,
            properties: self.properties.clone(),
            foreign_members: without_derived(&self.foreign_members),
        })
    }

    fn from_wire(index: usize, wire: WireFeature) -> Result<Self> {
        if wire.kind != "Feature" {
            return Err(Error::InvalidDocument(format!(
                "feature {index}: expected type Feature, found {}",
                wire.kind
            )));
        }

        let geometry = wire
            .geometry
            .map(|g| Geometry::from_parts(&g.kind, &g.coordinates))
            .transpose()
            .map_err(|e| match e {
                Error::UnsupportedGeometry(msg) => {
                    Error::UnsupportedGeometry(format!("feature {index}: {msg}"))
                }
                other => other,
            })?;

        Ok(Self {
            id: wire.id,
            geometry,
            properties: wire.properties,
            foreign_members: wire.foreign_members,
        })
    }
}

/// Root of every document the localizer and projector work on
///
/// Unknown members of the collection and of each feature are kept in
/// `foreign_members`. Members of a geometry object other than `type` and
/// `coordinates` (a geometry `bbox`, a legacy `crs`) are not kept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "WireCollection", into = "WireCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub foreign_members: Map<String, Value>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            foreign_members: Map::new(),
        }
    }

    /// Parse GeoJSON text, keeping the precise error variant
    pub fn from_json_str(text: &str) -> Result<Self> {
        let wire: WireCollection = serde_json::from_str(text)?;
        Self::try_from(wire)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let wire: WireCollection = serde_json::from_value(value)?;
        Self::try_from(wire)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every position in pre-order: feature, polygon, ring, position
    pub fn coords(&self) -> impl Iterator<Item = &Coord<f64>> {
        self.features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref())
            .flat_map(Geometry::coords)
    }

    pub fn first_coord(&self) -> Option<Coord<f64>> {
        self.coords().next().copied()
    }

    pub fn coord_count(&self) -> usize {
        self.coords().count()
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        self.features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref())
            .flat_map(Geometry::polygons)
    }

    /// Build a new collection with the same features, nesting and
    /// properties, and every position replaced by `f(position)`.
    ///
    /// Coordinate-derived members such as `bbox` are dropped from the
    /// result since they no longer describe the new coordinates.
    pub fn try_map_coords<E, F>(&self, mut f: F) -> std::result::Result<FeatureCollection, E>
    where
        F: FnMut(Coord<f64>) -> std::result::Result<Coord<f64>, E>,
    {
        let features = self
            .features
            .iter()
            .map(|feature| feature.try_map_coords(&mut f))
            .collect::<std::result::Result<Vec<_>, E>>()?;
        Ok(FeatureCollection {
            features,
            foreign_members: without_derived(&self.foreign_members),
        })
    }

    pub fn map_coords<F>(&self, mut f: F) -> FeatureCollection
    where
        F: FnMut(Coord<f64>) -> Coord<f64>,
    {
        infallible(self.try_map_coords(|c| Ok(f(c))))
    }
}

fn without_derived(members: &Map<String, Value>) -> Map<String, Value> {
    members
        .iter()
        .filter(|(key, _)| !DERIVED_MEMBERS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<WireFeature>,
    #[serde(flatten)]
    foreign_members: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFeature {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<WireGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(flatten)]
    foreign_members: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl TryFrom<WireCollection> for FeatureCollection {
    type Error = Error;

    fn try_from(wire: WireCollection) -> Result<Self> {
        if wire.kind != "FeatureCollection" {
            return Err(Error::InvalidDocument(format!(
                "expected a FeatureCollection, found {}",
                wire.kind
            )));
        }

        let features = wire
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| Feature::from_wire(index, feature))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            features,
            foreign_members: wire.foreign_members,
        })
    }
}

impl From<FeatureCollection> for WireCollection {
    fn from(collection: FeatureCollection) -> Self {
        let features = collection
            .features
            .into_iter()
            .map(|feature| WireFeature {
                kind: "Feature".to_string(),
                id: feature.id,
                geometry: feature.geometry.map(|geometry| WireGeometry {
                    kind: geometry.type_name().to_string(),
                    coordinates: geometry.coordinates_value(),
                }),
                properties: feature.properties,
                foreign_members: feature.foreign_members,
            })
            .collect();

        Self {
            kind: "FeatureCollection".to_string(),
            features,
            foreign_members: collection.foreign_members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "name": "plots",
        "features": [
            {
                "type": "Feature",
                "id": 7,
                "properties": {"zeta": 1, "alpha": "first", "mid": null},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[20.0, 50.0], [20.1, 50.0], [20.1, 50.1], [20.0, 50.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[21.0, 51.0], [21.1, 51.0], [21.1, 51.1], [21.0, 51.0]]],
                        [[[22.0, 52.0], [22.1, 52.0], [22.1, 52.1], [22.0, 52.0]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let collection = FeatureCollection::from_json_str(SAMPLE).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.coord_count(), 12);
        assert_eq!(collection.first_coord(), Some(geo::coord! { x: 20.0, y: 50.0 }));
        assert_eq!(collection.polygons().count(), 3);
        assert_eq!(collection.foreign_members.get("name"), Some(&json!("plots")));
        assert_eq!(collection.features[0].id, Some(json!(7)));
    }

    #[test]
    fn test_property_order_preserved() {
        let collection = FeatureCollection::from_json_str(SAMPLE).unwrap();
        let keys: Vec<&String> = collection.features[0]
            .properties
            .as_ref()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);

        let text = serde_json::to_string(&collection).unwrap();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }

    #[test]
    fn test_serialize_parse_identity() {
        let collection = FeatureCollection::from_json_str(SAMPLE).unwrap();
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][1]["geometry"]["type"], "MultiPolygon");
        assert_eq!(value["features"][1]["properties"], Value::Null);

        let reparsed = FeatureCollection::from_value(value).unwrap();
        assert_eq!(reparsed, collection);
    }

    #[test]
    fn test_null_geometry_is_kept() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": null, "properties": {"note": "empty"}}
        ]}"#;
        let collection = FeatureCollection::from_json_str(text).unwrap();
        assert_eq!(collection.len(), 1);
        assert!(collection.features[0].geometry.is_none());
        assert_eq!(collection.first_coord(), None);
    }

    #[test]
    fn test_wrong_root_type() {
        let text = r#"{"type": "Feature", "features": []}"#;
        let err = FeatureCollection::from_json_str(text).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_unsupported_geometry_names_feature() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}
        ]}"#;
        let err = FeatureCollection::from_json_str(text).unwrap_err();
        assert!(matches!(err, Error::UnsupportedGeometry(_)));
        assert!(err.to_string().contains("feature 0"));
    }

    #[test]
    fn test_deserialize_impl_validates() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [[1.0, 2.0]]}}
        ]}"#;
        assert!(serde_json::from_str::<FeatureCollection>(text).is_err());
    }

    #[test]
    fn test_map_drops_stale_bbox() {
        let text = r#"{"type": "FeatureCollection", "bbox": [20.0, 50.0, 20.1, 50.1], "features": [
            {"type": "Feature", "bbox": [20.0, 50.0, 20.1, 50.1], "properties": {"bbox": "kept"},
             "geometry": {"type": "Polygon", "coordinates": [[[20.0, 50.0], [20.1, 50.0], [20.1, 50.1], [20.0, 50.0]]]}}
        ]}"#;
        let collection = FeatureCollection::from_json_str(text).unwrap();
        assert!(collection.foreign_members.contains_key("bbox"));

        let moved = collection.map_coords(|c| c);
        assert!(!moved.foreign_members.contains_key("bbox"));
        assert!(!moved.features[0].foreign_members.contains_key("bbox"));
        assert_eq!(
            moved.features[0].properties.as_ref().unwrap().get("bbox"),
            Some(&json!("kept"))
        );
    }

    #[test]
    fn test_geometry_members_are_not_kept() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "style": "dashed",
             "geometry": {"type": "Polygon", "bbox": [20.0, 50.0, 20.1, 50.1],
                          "crs": {"type": "name", "properties": {"name": "EPSG:4326"}},
                          "coordinates": [[[20.0, 50.0], [20.1, 50.0], [20.1, 50.1], [20.0, 50.0]]]}}
        ]}"#;
        let collection = FeatureCollection::from_json_str(text).unwrap();
        let value = serde_json::to_value(&collection).unwrap();

        let geometry = value["features"][0]["geometry"].as_object().unwrap();
        let keys: Vec<&String> = geometry.keys().collect();
        assert_eq!(keys, ["type", "coordinates"]);
        assert_eq!(value["features"][0]["style"], "dashed");
    }
}
