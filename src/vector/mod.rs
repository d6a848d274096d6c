//! Vector records
//!
//! ## Reading
//!
//! ```
//! use geofeatures::options::CursorOptions;
//! use geofeatures::vector::{Collection, Coord, Feature, FieldValue, Geometry, MemoryStore, Schema};
//! use indexmap::IndexMap;
//!
//! let schema = Schema::parse("Point", &[("highway", "str")]).unwrap();
//! let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
//! let mut properties = IndexMap::new();
//! properties.insert(
//!     "highway".to_string(),
//!     Some(FieldValue::StringValue("motorway".to_string())),
//! );
//! let feature = Feature::new("0", properties, Some(Geometry::Point(Coord::new_2d(1.0, 2.0))));
//! collection.write(&feature).unwrap();
//!
//! for feature in collection.features(CursorOptions::slice(Some(0), None, None)).unwrap() {
//!     let feature = feature.unwrap();
//!     let highway_field = feature.property("highway").unwrap();
//!     println!("{} {:?}", highway_field.clone().into_string().unwrap(), feature.geometry);
//! }
//! ```

pub use crate::vector::collection::Collection;
pub use crate::vector::cursor::FeatureCursor;
pub use crate::vector::feature::{Feature, FeatureBuilder, FieldValue};
pub use crate::vector::from_geo::ToGeometry;
pub use crate::vector::geometry::{Bbox, Coord, Geometry};
pub use crate::vector::geometry_type::{GeometryTypeCode, Shape};
pub use crate::vector::memory::{MemoryFeature, MemoryGeometry, MemoryStore};
pub use crate::vector::native::{
    NativeDateTime, NativeFeature, NativeFieldDefn, NativeGeometry, NativeStore,
};
#[cfg(feature = "ogr")]
pub use crate::vector::ogr::{OgrFeature, OgrGeometry, OgrStore};
pub use crate::vector::schema::{FieldDescriptor, FieldSubType, FieldType, Schema};

mod collection;
mod cursor;
mod feature;
mod from_geo;
mod geometry;
mod geometry_type;
mod memory;
mod native;
#[cfg(feature = "ogr")]
mod ogr;
mod schema;
mod to_geo;
mod transaction;

#[cfg(test)]
mod tests;
