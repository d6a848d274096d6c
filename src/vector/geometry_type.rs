//! Geometry type codes.
//!
//! Native engines describe geometries with a flat integer code space: the seven OGC simple
//! feature shapes, their ISO `Z` (+1000), `M` (+2000) and `ZM` (+3000) variants, a legacy
//! 2.5D bit, and a handful of curve and surface types. This module is the only place that
//! interprets those integers. Everything else works with [`GeometryTypeCode`] values and the
//! [`Shape`] a code reduces to.

use crate::errors::{Result, VectorError};

const FLAG_3D: u32 = 0x8000_0000;
const Z_OFFSET: u32 = 1000;
const M_OFFSET: u32 = 2000;
const ZM_OFFSET: u32 = 3000;

const UNKNOWN: u32 = 0;
const POINT: u32 = 1;
const LINE_STRING: u32 = 2;
const POLYGON: u32 = 3;
const MULTI_POINT: u32 = 4;
const MULTI_LINE_STRING: u32 = 5;
const MULTI_POLYGON: u32 = 6;
const GEOMETRY_COLLECTION: u32 = 7;
const CIRCULAR_STRING: u32 = 8;
const COMPOUND_CURVE: u32 = 9;
const CURVE_POLYGON: u32 = 10;
const MULTI_CURVE: u32 = 11;
const MULTI_SURFACE: u32 = 12;
const CURVE: u32 = 13;
const SURFACE: u32 = 14;
const POLYHEDRAL_SURFACE: u32 = 15;
const TIN: u32 = 16;
const TRIANGLE: u32 = 17;
const NONE: u32 = 100;
const LINEAR_RING: u32 = 101;

/// Canonical names, keyed by normalized code.
const CANONICAL: &[(u32, &str)] = &[
    (UNKNOWN, "Unknown"),
    (POINT, "Point"),
    (LINE_STRING, "LineString"),
    (POLYGON, "Polygon"),
    (MULTI_POINT, "MultiPoint"),
    (MULTI_LINE_STRING, "MultiLineString"),
    (MULTI_POLYGON, "MultiPolygon"),
    (GEOMETRY_COLLECTION, "GeometryCollection"),
    (NONE, "None"),
    (LINEAR_RING, "LinearRing"),
    (POINT | FLAG_3D, "3D Point"),
    (LINE_STRING | FLAG_3D, "3D LineString"),
    (POLYGON | FLAG_3D, "3D Polygon"),
    (MULTI_POINT | FLAG_3D, "3D MultiPoint"),
    (MULTI_LINE_STRING | FLAG_3D, "3D MultiLineString"),
    (MULTI_POLYGON | FLAG_3D, "3D MultiPolygon"),
    (GEOMETRY_COLLECTION | FLAG_3D, "3D GeometryCollection"),
];

/// The structural shapes geometries are built from, regardless of dimensionality.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Point => "Point",
            Shape::LineString => "LineString",
            Shape::Polygon => "Polygon",
            Shape::MultiPoint => "MultiPoint",
            Shape::MultiLineString => "MultiLineString",
            Shape::MultiPolygon => "MultiPolygon",
            Shape::GeometryCollection => "GeometryCollection",
        }
    }
}

/// How a non-canonical native geometry has to be converted before it can be built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Conversion {
    /// Curves and curved surfaces are replaced by their linear approximation.
    Linearize,
    /// Polyhedral surfaces and TINs become multipolygons.
    ForceMultiPolygon,
    /// Triangles become polygons.
    ForcePolygon,
}

/// An opaque native geometry type code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeometryTypeCode(u32);

impl GeometryTypeCode {
    /// Wraps a code reported by a native engine.
    pub fn from_native(raw: u32) -> Self {
        GeometryTypeCode(raw)
    }

    /// Returns the raw code to hand back to a native engine.
    pub fn to_native(self) -> u32 {
        self.0
    }

    /// Encodes a geometry type name such as `"Polygon"`, `"3D Point"` or `"LineStringZM"`.
    ///
    /// A trailing `Z`, `M` or `ZM` selects the ISO offset for the stripped base name.
    pub fn from_name(name: &str) -> Result<Self> {
        let (stripped, offset) = if let Some(base) = name.strip_suffix("ZM") {
            (base, ZM_OFFSET)
        } else if let Some(base) = name.strip_suffix('M') {
            (base, M_OFFSET)
        } else if let Some(base) = name.strip_suffix('Z') {
            (base, Z_OFFSET)
        } else {
            (name, 0)
        };
        CANONICAL
            .iter()
            .find(|(_, canonical)| *canonical == stripped)
            .map(|(code, _)| GeometryTypeCode(offset + code))
            .ok_or_else(|| VectorError::UnsupportedGeometryType(name.to_string()))
    }

    /// Folds measured variants away and collapses `Z`/`ZM` into the 3D flag.
    ///
    /// Fails when the folded code has no canonical name.
    pub fn normalize(self) -> Result<Self> {
        let code = self.0;
        let folded = match code {
            Z_OFFSET | M_OFFSET | ZM_OFFSET => UNKNOWN,
            c if c > Z_OFFSET && c < M_OFFSET => (c % 1000) | FLAG_3D,
            c if c > M_OFFSET && c < ZM_OFFSET => c % 1000,
            c if c > ZM_OFFSET && c < 4000 => (c % 1000) | FLAG_3D,
            c => c,
        };
        let normalized = GeometryTypeCode(folded);
        normalized.name().map(|_| normalized)
    }

    /// Reduces a code to its structural shape, ignoring the 3D flag and any `Z`/`M`/`ZM`
    /// offset. Linear rings reduce to [`Shape::LineString`].
    pub fn base(self) -> Result<Shape> {
        match base_code(self.0) {
            POINT => Ok(Shape::Point),
            LINE_STRING | LINEAR_RING => Ok(Shape::LineString),
            POLYGON => Ok(Shape::Polygon),
            MULTI_POINT => Ok(Shape::MultiPoint),
            MULTI_LINE_STRING => Ok(Shape::MultiLineString),
            MULTI_POLYGON => Ok(Shape::MultiPolygon),
            GEOMETRY_COLLECTION => Ok(Shape::GeometryCollection),
            _ => Err(self.unsupported()),
        }
    }

    /// The canonical name of a normalized code.
    pub fn name(self) -> Result<&'static str> {
        CANONICAL
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
            .ok_or_else(|| self.unsupported())
    }

    /// Whether the code carries a third dimension, either through the 2.5D flag or an
    /// ISO `Z`/`ZM` offset.
    pub fn is_3d(self) -> bool {
        let stripped = self.0 & !FLAG_3D;
        self.0 & FLAG_3D != 0
            || (stripped > Z_OFFSET && stripped < M_OFFSET)
            || (stripped > ZM_OFFSET && stripped < 4000)
    }

    pub fn is_linear_ring(self) -> bool {
        base_code(self.0) == LINEAR_RING
    }

    /// Returns the same shape with the 3D flag set.
    pub(crate) fn to_3d(self) -> Self {
        match self.normalize() {
            Ok(normalized) if !matches!(normalized.0, UNKNOWN | NONE | LINEAR_RING) => {
                GeometryTypeCode(normalized.0 | FLAG_3D)
            }
            _ => self,
        }
    }

    pub(crate) fn conversion(self) -> Option<Conversion> {
        match base_code(self.0) {
            CIRCULAR_STRING | COMPOUND_CURVE | CURVE_POLYGON | MULTI_CURVE | MULTI_SURFACE
            | CURVE | SURFACE => Some(Conversion::Linearize),
            POLYHEDRAL_SURFACE | TIN => Some(Conversion::ForceMultiPolygon),
            TRIANGLE => Some(Conversion::ForcePolygon),
            _ => None,
        }
    }

    /// The linear or polygonal code a curve, surface or triangle code converts to, keeping
    /// the dimension. Other codes are returned as is.
    pub(crate) fn linear_counterpart(self) -> Self {
        let linear = match base_code(self.0) {
            CIRCULAR_STRING | COMPOUND_CURVE | CURVE => LINE_STRING,
            CURVE_POLYGON | SURFACE | TRIANGLE => POLYGON,
            MULTI_CURVE => MULTI_LINE_STRING,
            MULTI_SURFACE | POLYHEDRAL_SURFACE | TIN => MULTI_POLYGON,
            _ => return self,
        };
        if self.is_3d() {
            GeometryTypeCode(linear | FLAG_3D)
        } else {
            GeometryTypeCode(linear)
        }
    }

    fn unsupported(self) -> VectorError {
        VectorError::UnsupportedGeometryType(format!("code {}", self.0))
    }
}

fn base_code(code: u32) -> u32 {
    (code & !FLAG_3D) % 1000
}
