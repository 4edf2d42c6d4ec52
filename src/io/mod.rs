//! Reading and writing GeoJSON documents on disk

use crate::domain::FeatureCollection;
use crate::error::Result;
use std::path::Path;

pub fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let contents = std::fs::read_to_string(path)?;
    let collection = FeatureCollection::from_json_str(&contents)?;
    log::debug!(
        "read {} features from {}",
        collection.len(),
        path.display()
    );
    Ok(collection)
}

pub fn to_json_string(collection: &FeatureCollection, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(collection)?
    } else {
        serde_json::to_string(collection)?
    };
    Ok(text)
}

pub fn write_collection(path: &Path, collection: &FeatureCollection, pretty: bool) -> Result<()> {
    let mut text = to_json_string(collection, pretty)?;
    text.push('\n');
    std::fs::write(path, text)?;
    log::debug!(
        "wrote {} features to {}",
        collection.len(),
        path.display()
    );
    Ok(())
}
