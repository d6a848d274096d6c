//! The capability set a native vector engine exposes to this crate.
//!
//! Three handle kinds cross the boundary: stores (a layer with a single read position),
//! features (one record with indexed fields) and geometries. Handles returned by value are
//! owned and release their native resources on drop; handles passed to the `with_*`
//! callbacks are borrowed from their parent and must not outlive the callback.

use encoding_rs::Encoding;

use crate::errors::Result;
use crate::options::StoreCapabilities;
use crate::vector::geometry::Bbox;
use crate::vector::geometry_type::GeometryTypeCode;

/// Field definition as reported by a store, before it is mapped onto a
/// [`FieldDescriptor`](crate::vector::FieldDescriptor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeFieldDefn {
    pub name: String,
    pub type_code: u32,
    pub subtype_code: u32,
    /// Zero means no specified width.
    pub width: i32,
    /// Zero means no specified precision.
    pub precision: i32,
}

/// Broken-down date and time as stored natively.
///
/// `tz_flag` follows the native convention: 0 is unknown, 1 is local time, 100 is UTC and
/// every unit away from 100 is a 15 minute offset.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NativeDateTime {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: f32,
    pub tz_flag: i32,
}

pub trait NativeGeometry: Sized {
    /// Allocates an empty geometry of the given type.
    fn create(code: GeometryTypeCode) -> Result<Self>;

    fn geometry_type(&self) -> GeometryTypeCode;

    /// 2 or 3.
    fn coordinate_dimension(&self) -> usize;

    fn point_count(&self) -> usize;

    /// Returns `(x, y, z)`; `z` is 0 for 2D geometries.
    fn get_point(&self, index: usize) -> (f64, f64, f64);

    fn geometry_count(&self) -> usize;

    /// Calls `f` with a borrowed reference to the child at `index`.
    fn with_geometry<R>(&self, index: usize, f: impl FnOnce(&Self) -> Result<R>) -> Result<R>;

    /// Returns a new linear approximation of a curve geometry. `self` is left untouched.
    fn linear_geometry(&self) -> Result<Self>;

    /// Returns a new multipolygon built from a surface geometry. `self` is left untouched.
    fn force_to_multipolygon(&self) -> Result<Self>;

    /// Returns a new polygon built from a triangle. `self` is left untouched.
    fn force_to_polygon(&self) -> Result<Self>;

    fn add_point(&mut self, x: f64, y: f64, z: Option<f64>);

    /// Moves `child` into this geometry.
    fn add_geometry_directly(&mut self, child: Self) -> Result<()>;

    fn close_rings(&mut self);
}

pub trait NativeFeature: Sized {
    type Geometry: NativeGeometry;

    /// The record's opaque identifier, if it has one.
    fn fid(&self) -> Option<u64>;

    /// False when the field is unset or explicitly null.
    fn field_is_set_and_not_null(&self, index: usize) -> bool;

    fn field_as_integer(&self, index: usize) -> i32;

    fn field_as_integer64(&self, index: usize) -> i64;

    fn field_as_double(&self, index: usize) -> f64;

    /// Raw string bytes in the store's text encoding.
    fn field_as_string_bytes(&self, index: usize) -> Vec<u8>;

    fn field_as_binary(&self, index: usize) -> Vec<u8>;

    /// `None` when the value cannot be read as a date or time.
    fn field_as_datetime(&self, index: usize) -> Option<NativeDateTime>;

    /// Raw string bytes of every list entry, up to the native end marker.
    fn field_as_string_list(&self, index: usize) -> Vec<Vec<u8>>;

    fn set_field_null(&mut self, index: usize) -> Result<()>;

    fn set_field_integer(&mut self, index: usize, value: i32) -> Result<()>;

    fn set_field_integer64(&mut self, index: usize, value: i64) -> Result<()>;

    fn set_field_double(&mut self, index: usize, value: f64) -> Result<()>;

    fn set_field_string_bytes(&mut self, index: usize, value: &[u8]) -> Result<()>;

    fn set_field_binary(&mut self, index: usize, value: &[u8]) -> Result<()>;

    fn set_field_datetime(&mut self, index: usize, value: NativeDateTime) -> Result<()>;

    fn set_field_string_list(&mut self, index: usize, value: &[Vec<u8>]) -> Result<()>;

    /// Calls `f` with the feature's borrowed geometry, or `None` when it has none.
    fn with_geometry<R>(&self, f: impl FnOnce(Option<&Self::Geometry>) -> Result<R>) -> Result<R>;

    /// Moves `geometry` into the feature.
    fn set_geometry_directly(&mut self, geometry: Self::Geometry) -> Result<()>;
}

/// A native layer: a sequence of records behind one shared read position.
pub trait NativeStore {
    type Geometry: NativeGeometry;
    type Feature: NativeFeature<Geometry = Self::Geometry>;

    fn capabilities(&self) -> StoreCapabilities;

    /// Encoding of string field bytes.
    fn text_encoding(&self) -> &'static Encoding {
        encoding_rs::UTF_8
    }

    /// Declared geometry type of the layer.
    fn geometry_type(&self) -> GeometryTypeCode;

    fn field_defns(&self) -> Vec<NativeFieldDefn>;

    /// Number of records passing the installed filters, `None` when it cannot be determined
    /// without `force`.
    fn feature_count(&mut self, force: bool) -> Option<u64>;

    fn reset_reading(&mut self);

    /// Positions the read cursor so that the next record returned is the `index`-th one.
    ///
    /// Returns `false` when the store has no native indexed seek.
    fn seek_to_index(&mut self, index: u64) -> Result<bool>;

    /// Returns the record at the read position and advances it, or `None` at the end of
    /// the sequence.
    fn next_record(&mut self) -> Result<Option<Self::Feature>>;

    /// Random read by identifier. Moves the read position.
    fn feature_by_id(&mut self, fid: u64) -> Result<Option<Self::Feature>>;

    fn set_spatial_filter_rect(&mut self, bbox: Option<Bbox>);

    fn set_spatial_filter(&mut self, geometry: Option<&Self::Geometry>);

    fn set_attribute_filter(&mut self, predicate: Option<&str>) -> Result<()>;

    /// Allocates an empty record matching the layer's field definitions.
    fn create_feature_handle(&self) -> Result<Self::Feature>;

    fn write_feature(&mut self, feature: &mut Self::Feature) -> Result<()>;

    fn start_transaction(&mut self) -> Result<()>;

    fn commit_transaction(&mut self) -> Result<()>;

    fn rollback_transaction(&mut self) -> Result<()>;
}
