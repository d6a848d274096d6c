#![crate_name = "geofeatures"]
#![crate_type = "lib"]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Format agnostic vector records for Rust.
//!
//! This crate pulls geometries and typed attributes out of a native vector engine into plain
//! Rust values, and pushes them back in. An engine is anything implementing
//! [`vector::NativeStore`]: the bundled [`vector::MemoryStore`], or an OGR layer with the
//! `ogr` feature.
//!
//! ## Data model
//!
//! - [`vector::Geometry`]: one of seven shapes (plus linear rings) as nested coordinates, in
//!   two or three dimensions. Curves, surfaces and triangles are converted on read.
//! - [`vector::Feature`]: an identifier, ordered properties and an optional geometry. It
//!   holds no reference to the store it came from.
//! - [`vector::Schema`]: the geometry type name and one [`vector::FieldDescriptor`] per
//!   property, written compactly as `"float:15.2"`, `"int"` or `"str:80"`.
//!
//! ## Usage
//!
//! ```
//! use geofeatures::options::CursorOptions;
//! use geofeatures::vector::{Collection, MemoryStore, Schema};
//!
//! let schema = Schema::parse("Polygon", &[("name", "str"), ("area", "float:10.2")]).unwrap();
//! let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
//!
//! // Every other record, starting from the second one.
//! let options = CursorOptions::slice(Some(1), None, Some(2));
//! for feature in collection.features(options).unwrap() {
//!     let feature = feature.unwrap();
//!     println!("{} {:?}", feature.id, feature.property("name"));
//! }
//! ```
//!
//! A [`vector::Collection`] shares one read position between all its cursors. A cursor whose
//! position was moved by another one notices on its next pull and seeks back, so results are
//! unaffected, but interleaving cursors on stores without fast seek is slow.

pub mod errors;
pub mod options;
#[cfg(feature = "ogr")]
mod utils;
pub mod vector;

#[cfg(test)]
pub(crate) mod test_utils;

#[cfg(test)]
fn assert_almost_eq(a: f64, b: f64) {
    let diff: f64 = (b - a).abs();
    assert!(diff <= 1e-5 * b.abs().max(1.0), "{a} != {b}");
}
