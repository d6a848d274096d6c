use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::options::{StoreCapabilities, WriteOptions};
use crate::vector::{Collection, Feature, MemoryStore, Schema};

/// Returns the fully qualified path to `filename` in `${CARGO_MANIFEST_DIR}/fixtures`.
pub fn fixture(filename: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(filename)
}

/// Reads a GeoJSON feature collection carrying a `"schema"` member of the form
/// `{"geometry": "Polygon", "properties": {"name": "str"}}`.
pub fn read_fixture(filename: &str) -> (Schema, Vec<Feature>) {
    let text = std::fs::read_to_string(fixture(filename)).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    let schema = &value["schema"];
    let properties: Vec<(&str, &str)> = schema["properties"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str().unwrap()))
        .collect();
    let schema = Schema::parse(schema["geometry"].as_str().unwrap(), &properties).unwrap();
    let features = value["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| Feature::from_json(f).unwrap())
        .collect();
    (schema, features)
}

/// Loads a fixture into a fresh [`MemoryStore`] with the given capabilities.
pub fn fixture_collection(
    filename: &str,
    capabilities: StoreCapabilities,
) -> Collection<MemoryStore> {
    let (schema, features) = read_fixture(filename);
    let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
    collection
        .write_records(&features, WriteOptions::default())
        .unwrap();
    let store = collection.into_inner().with_capabilities(capabilities);
    Collection::new(store).unwrap()
}

/// A store with `n` point records whose `index` property counts from 0.
pub fn numbered_collection(n: usize, capabilities: StoreCapabilities) -> Collection<MemoryStore> {
    let schema = Schema::parse("Point", &[("index", "int32")]).unwrap();
    let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
    let features: Vec<Feature> = (0..n)
        .map(|i| {
            let mut properties = indexmap::IndexMap::new();
            properties.insert(
                "index".to_string(),
                Some(crate::vector::FieldValue::IntegerValue(i as i32)),
            );
            Feature::new(
                "",
                properties,
                Some(crate::vector::Geometry::Point((i as f64, 0.0).into())),
            )
        })
        .collect();
    collection
        .write_records(&features, WriteOptions::default())
        .unwrap();
    Collection::new(collection.into_inner().with_capabilities(capabilities)).unwrap()
}
