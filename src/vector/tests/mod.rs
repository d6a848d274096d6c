use indexmap::IndexMap;

use crate::assert_almost_eq;
use crate::errors::VectorError;
use crate::options::{StoreCapabilities, WriteOptions};
use crate::test_utils::{fixture_collection, numbered_collection, read_fixture};

use super::{
    Collection, Coord, Feature, FeatureCursor, FieldValue, Geometry, MemoryStore, NativeFeature,
    NativeStore, Schema,
};

mod convert_geo;
mod cursor;

fn with_collection<F>(name: &str, f: F)
where
    F: Fn(Collection<MemoryStore>),
{
    f(fixture_collection(name, StoreCapabilities::all()));
}

fn with_features<F>(name: &str, f: F)
where
    F: Fn(FeatureCursor<MemoryStore>),
{
    with_collection(name, |collection| f(collection.iter().unwrap()));
}

fn with_feature<F>(name: &str, fid: u64, f: F)
where
    F: Fn(Feature),
{
    with_collection(name, |collection| f(collection.get(fid).unwrap().unwrap()));
}

fn indices<S: NativeStore>(cursor: FeatureCursor<S>) -> Vec<i32> {
    cursor
        .map(|f| match f.unwrap().property("index") {
            Some(FieldValue::IntegerValue(i)) => *i,
            other => panic!("unexpected index {other:?}"),
        })
        .collect()
}

#[test]
fn test_schema() {
    with_collection("polygons.geojson", |collection| {
        assert_eq!(collection.geometry_type(), "Polygon");
        let properties: Vec<(String, String)> = collection
            .schema()
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        assert_eq!(
            properties,
            [
                ("name".to_string(), "str".to_string()),
                ("area".to_string(), "float:10.2".to_string())
            ]
        );
    });
}

#[test]
fn test_feature_count() {
    with_collection("polygons.geojson", |collection| {
        assert_eq!(collection.len(), Some(3));
        assert!(!collection.is_empty());
    });
}

#[test]
fn test_polygon_scenario() {
    with_collection("polygons.geojson", |collection| {
        let features: Vec<Feature> = collection
            .features(crate::options::CursorOptions::slice(Some(0), Some(3), None))
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(features.len(), 3);
        for feature in &features {
            let keys: Vec<&str> = feature.properties.keys().map(String::as_str).collect();
            assert_eq!(keys, ["name", "area"]);
        }
        assert_eq!(
            features[1].property("name"),
            Some(&FieldValue::StringValue("pond".to_string()))
        );
        assert_almost_eq(
            features[1].property("area").unwrap().clone().into_real().unwrap(),
            3.75,
        );
    });
}

#[test]
fn test_null_field_reads_absent() {
    with_feature("polygons.geojson", 2, |feature| {
        assert_eq!(feature.id, "2");
        assert!(feature.properties.contains_key("area"));
        assert_eq!(feature.properties["area"], None);
        assert!(matches!(feature.geometry, Some(Geometry::MultiPolygon(ref p)) if p.len() == 2));
    });
}

#[test]
fn test_unset_field_reads_absent() {
    let schema = Schema::parse("Point", &[("name", "str"), ("rank", "int64")]).unwrap();
    let mut store = MemoryStore::new(&schema);
    let mut handle = store.create_feature_handle().unwrap();
    handle.set_field_string_bytes(0, b"x").unwrap();
    handle.set_field_integer64(1, 7).unwrap();
    handle.unset_field(1).unwrap();
    assert!(!handle.is_field_null(1));
    store.write_feature(&mut handle).unwrap();

    let collection = Collection::new(store).unwrap();
    let feature = collection.iter().unwrap().next().unwrap().unwrap();
    assert_eq!(feature.properties["rank"], None);
    assert_eq!(feature.geometry, None);
}

#[test]
fn test_write_none_sets_null() {
    let schema = Schema::parse("Point", &[("rank", "int32"), ("when", "date")]).unwrap();
    let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
    let mut properties = IndexMap::new();
    properties.insert("rank".to_string(), None);
    properties.insert("when".to_string(), None);
    collection
        .write(&Feature::new("", properties, None))
        .unwrap();

    let mut store = collection.into_inner();
    store.reset_reading();
    let record = store.next_record().unwrap().unwrap();
    assert!(record.is_field_null(0));
    assert!(record.is_field_null(1));
    assert!(!record.field_is_set_and_not_null(0));
}

#[test]
fn test_attribute_types() {
    with_features("attributes.geojson", |mut features| {
        let first = features.next().unwrap().unwrap();
        assert_eq!(
            first.property("name"),
            Some(&FieldValue::StringValue("Zürich".to_string()))
        );
        assert_eq!(first.property("visited"), Some(&FieldValue::BooleanValue(true)));
        assert_eq!(first.property("count"), Some(&FieldValue::IntegerValue(12)));
        assert_eq!(
            first.property("population"),
            Some(&FieldValue::Integer64Value(421878))
        );
        assert_eq!(
            first.property("observed"),
            Some(&FieldValue::DateValue("2021-03-04".to_string()))
        );
        assert_eq!(
            first.property("opens"),
            Some(&FieldValue::TimeValue("08:30:00".to_string()))
        );
        assert_eq!(
            first.property("updated"),
            Some(&FieldValue::DateTimeValue(
                "2021-03-04T10:15:30+01:00".to_string()
            ))
        );
        assert_eq!(
            first.property("tags"),
            Some(&FieldValue::StringListValue(vec![
                "lake".to_string(),
                "city".to_string()
            ]))
        );
        assert_eq!(
            first.property("extra"),
            Some(&FieldValue::JsonValue(
                serde_json::json!({"canton": "ZH", "rank": 1})
            ))
        );
        assert_eq!(
            first.geometry,
            Some(Geometry::Point(Coord::new_3d(8.54, 47.37, 408.0)))
        );

        let second = features.next().unwrap().unwrap();
        assert_eq!(second.property("visited"), Some(&FieldValue::BooleanValue(false)));
        assert_eq!(second.property("count"), None);
        assert_eq!(second.property("observed"), None);
        assert_eq!(
            second.property("opens"),
            Some(&FieldValue::TimeValue("09:00:00.250000".to_string()))
        );
        assert_eq!(
            second.property("tags"),
            Some(&FieldValue::StringListValue(Vec::new()))
        );

        assert!(features.next().is_none());
    });
}

#[test]
fn test_datetime_without_timezone_support() {
    let (schema, features) = read_fixture("attributes.geojson");
    let store = MemoryStore::new(&schema)
        .with_capabilities(StoreCapabilities::all() - StoreCapabilities::TIMEZONES);
    let collection = Collection::new(store).unwrap();
    collection
        .write_records(&features, WriteOptions::default())
        .unwrap();
    let first = collection.iter().unwrap().next().unwrap().unwrap();
    assert_eq!(
        first.property("updated"),
        Some(&FieldValue::DateTimeValue("2021-03-04T09:15:30".to_string()))
    );
}

#[test]
fn test_datetime_keeps_last_microsecond() {
    let schema = Schema::parse("None", &[("when", "datetime")]).unwrap();
    let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
    let mut properties = IndexMap::new();
    properties.insert(
        "when".to_string(),
        Some(FieldValue::DateTimeValue("2020-01-01T10:00:59.999999".to_string())),
    );
    collection
        .write(&Feature::new("", properties, None))
        .unwrap();

    let feature = collection.iter().unwrap().next().unwrap().unwrap();
    assert_eq!(
        feature.property("when"),
        Some(&FieldValue::DateTimeValue("2020-01-01T10:00:59.999999".to_string()))
    );
}

#[test]
fn test_text_encoding() {
    let schema = Schema::parse("None", &[("name", "str")]).unwrap();
    let store = MemoryStore::new(&schema).with_encoding(encoding_rs::WINDOWS_1252);
    let collection = Collection::new(store).unwrap();
    let mut properties = IndexMap::new();
    properties.insert(
        "name".to_string(),
        Some(FieldValue::StringValue("Genève".to_string())),
    );
    collection
        .write(&Feature::new("", properties, None))
        .unwrap();
    let feature = collection.iter().unwrap().next().unwrap().unwrap();
    assert_eq!(
        feature.property("name"),
        Some(&FieldValue::StringValue("Genève".to_string()))
    );

    let mut store = collection.into_inner();
    store.reset_reading();
    let record = store.next_record().unwrap().unwrap();
    assert_eq!(record.field_as_string_bytes(0), b"Gen\xe8ve");
}

#[test]
fn test_json_strings() {
    let schema = Schema::parse("None", &[("doc", "str")]).unwrap();
    let write = |capabilities: StoreCapabilities| {
        let store = MemoryStore::new(&schema).with_capabilities(capabilities);
        let collection = Collection::new(store).unwrap();
        for text in [r#"{"a": [1, 2]}"#, "{not json"] {
            let mut properties = IndexMap::new();
            properties.insert("doc".to_string(), Some(FieldValue::StringValue(text.into())));
            collection.write(&Feature::new("", properties, None)).unwrap();
        }
        collection
            .iter()
            .unwrap()
            .map(|f| f.unwrap().properties["doc"].clone().unwrap())
            .collect::<Vec<_>>()
    };

    let parsed = write(StoreCapabilities::all());
    assert_eq!(parsed[0], FieldValue::JsonValue(serde_json::json!({"a": [1, 2]})));
    assert_eq!(parsed[1], FieldValue::StringValue("{not json".to_string()));

    let raw = write(StoreCapabilities::all() - StoreCapabilities::JSON_STRINGS);
    assert_eq!(raw[0], FieldValue::StringValue(r#"{"a": [1, 2]}"#.to_string()));
}

#[test]
fn test_skips_bad_fields() {
    use super::{GeometryTypeCode, NativeFieldDefn};

    let defn = |name: &str, type_code: u32| NativeFieldDefn {
        name: name.to_string(),
        type_code,
        subtype_code: 0,
        width: 0,
        precision: 0,
    };
    let mut store = MemoryStore::from_field_defns(
        GeometryTypeCode::from_native(1),
        vec![
            defn("a", 0),
            defn("", 0),
            defn("a", 2),
            defn("wide", 1),
            defn("b", 2),
        ],
    );
    let mut handle = store.create_feature_handle().unwrap();
    handle.set_field_integer(0, 7).unwrap();
    handle.set_field_double(4, 0.5).unwrap();
    store.write_feature(&mut handle).unwrap();

    let collection = Collection::new(store).unwrap();
    let keys: Vec<&String> = collection.schema().properties.keys().collect();
    assert_eq!(keys, ["a", "b"]);
    let feature = collection.iter().unwrap().next().unwrap().unwrap();
    assert_eq!(feature.property("a"), Some(&FieldValue::IntegerValue(7)));
    assert_eq!(feature.property("b"), Some(&FieldValue::RealValue(0.5)));
}

#[test]
fn test_write_rejects_mismatched_keys() {
    with_collection("polygons.geojson", |collection| {
        let mut properties = IndexMap::new();
        properties.insert("name".to_string(), None);
        let result = collection.write(&Feature::new("", properties, None));
        assert!(matches!(result, Err(VectorError::SchemaError(_))));
        assert_eq!(collection.len(), Some(3));
    });
}

#[test]
fn test_write_rejects_mismatched_geometry() {
    with_collection("polygons.geojson", |collection| {
        let mut properties = IndexMap::new();
        properties.insert("name".to_string(), None);
        properties.insert("area".to_string(), None);
        let point = Geometry::Point(Coord::new_2d(0.0, 0.0));
        let result = collection.write(&Feature::new("", properties, Some(point)));
        assert!(matches!(result, Err(VectorError::SchemaError(_))));
    });
}

#[test]
fn test_write_rejects_mismatched_value_type() {
    with_collection("polygons.geojson", |collection| {
        let mut properties = IndexMap::new();
        properties.insert("name".to_string(), None);
        properties.insert(
            "area".to_string(),
            Some(FieldValue::StringValue("large".to_string())),
        );
        let result = collection.write(&Feature::new("", properties, None));
        assert!(matches!(result, Err(VectorError::SchemaError(_))));
    });
}

#[test]
fn test_write_checks_int16_range() {
    let schema = Schema::parse("None", &[("small", "int16")]).unwrap();
    let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
    let small = |value: FieldValue| {
        let mut properties = IndexMap::new();
        properties.insert("small".to_string(), Some(value));
        Feature::new("", properties, None)
    };

    for value in [FieldValue::IntegerValue(40000), FieldValue::Integer64Value(-40000)] {
        assert!(matches!(
            collection.write(&small(value)),
            Err(VectorError::SchemaError(_))
        ));
    }
    collection.write(&small(FieldValue::IntegerValue(123))).unwrap();

    let values: Vec<_> = collection
        .iter()
        .unwrap()
        .map(|f| f.unwrap().property("small").cloned())
        .collect();
    assert_eq!(values, [Some(FieldValue::IntegerValue(123))]);
}

#[test]
fn test_write_records_in_batches() {
    let (schema, features) = read_fixture("polygons.geojson");
    let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
    let options = WriteOptions {
        transaction_size: 2,
    };
    collection.write_records(&features, options).unwrap();
    assert_eq!(collection.len(), Some(3));
    assert_eq!(collection.into_inner().commit_count(), 2);
}

#[test]
fn test_write_records_rolls_back_failed_batch() {
    let (schema, mut features) = read_fixture("polygons.geojson");
    features[2].properties.shift_remove("area");
    let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
    let options = WriteOptions {
        transaction_size: 2,
    };
    let result = collection.write_records(&features, options);
    assert!(matches!(result, Err(VectorError::SchemaError(_))));
    // The first batch stays committed.
    assert_eq!(collection.len(), Some(2));
}

#[test]
fn test_write_without_transactions() {
    let (schema, features) = read_fixture("polygons.geojson");
    let store = MemoryStore::new(&schema)
        .with_capabilities(StoreCapabilities::all() - StoreCapabilities::TRANSACTIONS);
    let collection = Collection::new(store).unwrap();
    collection
        .write_records(&features, WriteOptions::default())
        .unwrap();
    assert_eq!(collection.len(), Some(3));
    assert_eq!(collection.into_inner().commit_count(), 0);
}

#[test]
fn test_read_only_store() {
    let (schema, features) = read_fixture("polygons.geojson");
    let store = MemoryStore::new(&schema).with_capabilities(StoreCapabilities::FAST_SEEK);
    let collection = Collection::new(store).unwrap();
    assert!(matches!(
        collection.write(&features[0]),
        Err(VectorError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        collection.get(0),
        Err(VectorError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_features_outlive_collection() {
    let features: Vec<Feature> = {
        let collection = numbered_collection(3, StoreCapabilities::all());
        let features = collection.iter().unwrap().map(Result::unwrap).collect();
        drop(collection);
        features
    };
    assert_eq!(features.len(), 3);
    assert_eq!(features[2].id, "2");
}
