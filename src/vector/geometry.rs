use serde_json::{json, Value};

use crate::errors::{Result, VectorError};
use crate::vector::geometry_type::{Conversion, GeometryTypeCode, Shape};
use crate::vector::native::NativeGeometry;

/// A 2D or 3D position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coord {
    pub fn new_2d(x: f64, y: f64) -> Self {
        Coord { x, y, z: None }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Coord { x, y, z: Some(z) }
    }

    fn to_json(self) -> Value {
        match self.z {
            Some(z) => json!([self.x, self.y, z]),
            None => json!([self.x, self.y]),
        }
    }

    fn from_json(value: &Value) -> Result<Self> {
        let parts = value
            .as_array()
            .ok_or_else(|| bad_json("a position array", value))?
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| bad_json("a number", v)))
            .collect::<Result<Vec<f64>>>()?;
        match parts.as_slice() {
            [x, y] => Ok(Coord::new_2d(*x, *y)),
            [x, y, z, ..] => Ok(Coord::new_3d(*x, *y, *z)),
            _ => Err(bad_json("a position with 2 or 3 components", value)),
        }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Coord::new_2d(x, y)
    }
}

impl From<(f64, f64, f64)> for Coord {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Coord::new_3d(x, y, z)
    }
}

/// An axis aligned rectangle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bbox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bbox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Bbox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn intersects(&self, other: &Bbox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    fn expand(bbox: Option<Bbox>, coord: &Coord) -> Bbox {
        match bbox {
            None => Bbox::new(coord.x, coord.y, coord.x, coord.y),
            Some(b) => Bbox::new(
                b.min_x.min(coord.x),
                b.min_y.min(coord.y),
                b.max_x.max(coord.x),
                b.max_y.max(coord.y),
            ),
        }
    }
}

/// A geometry as nested coordinates.
///
/// Polygons are lists of rings, the first one being the exterior. Every coordinate of one
/// geometry has the same dimension.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    LinearRing(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    pub fn geometry_type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::LinearRing(_) => "LinearRing",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::GeometryCollection(_) => "GeometryCollection",
        }
    }

    /// Bounding rectangle of all coordinates, `None` for empty geometries.
    pub fn envelope(&self) -> Option<Bbox> {
        let mut bbox = None;
        self.visit_coords(&mut |c| bbox = Some(Bbox::expand(bbox, c)));
        bbox
    }

    /// Whether any coordinate carries a `z` value.
    pub fn is_3d(&self) -> bool {
        let mut has_z = false;
        self.visit_coords(&mut |c| has_z |= c.z.is_some());
        has_z
    }

    fn visit_coords(&self, f: &mut impl FnMut(&Coord)) {
        match self {
            Geometry::Point(c) => f(c),
            Geometry::LineString(cs) | Geometry::LinearRing(cs) | Geometry::MultiPoint(cs) => {
                cs.iter().for_each(f)
            }
            Geometry::Polygon(rings) | Geometry::MultiLineString(rings) => {
                rings.iter().flatten().for_each(f)
            }
            Geometry::MultiPolygon(polygons) => polygons.iter().flatten().flatten().for_each(f),
            Geometry::GeometryCollection(geometries) => {
                geometries.iter().for_each(|g| g.visit_coords(f))
            }
        }
    }

    /// Copies a native geometry into nested coordinates.
    ///
    /// Curves are linearized, polyhedral surfaces and TINs are forced to multipolygons and
    /// triangles to polygons first. Handles allocated for that are released before this
    /// returns; `handle` itself is only borrowed.
    pub fn from_native<G: NativeGeometry>(handle: &G) -> Result<Geometry> {
        match handle.geometry_type().conversion() {
            Some(Conversion::Linearize) => build_canonical(&handle.linear_geometry()?),
            Some(Conversion::ForceMultiPolygon) => {
                build_canonical(&handle.force_to_multipolygon()?)
            }
            Some(Conversion::ForcePolygon) => build_canonical(&handle.force_to_polygon()?),
            None => build_canonical(handle),
        }
    }

    /// Allocates a native geometry holding these coordinates.
    ///
    /// Every child handle is moved into its parent as soon as it is complete, so an error
    /// part way through drops the partial tree as a whole.
    pub fn to_native<G: NativeGeometry>(&self) -> Result<G> {
        match self {
            Geometry::Point(c) => points_to_native("Point", std::slice::from_ref(c)),
            Geometry::LineString(cs) => points_to_native("LineString", cs),
            Geometry::LinearRing(cs) => points_to_native("LinearRing", cs),
            Geometry::Polygon(rings) => polygon_to_native(rings),
            Geometry::MultiPoint(cs) => {
                let mut geom = create::<G>("MultiPoint")?;
                for c in cs {
                    geom.add_geometry_directly(points_to_native("Point", std::slice::from_ref(c))?)?;
                }
                Ok(geom)
            }
            Geometry::MultiLineString(lines) => {
                let mut geom = create::<G>("MultiLineString")?;
                for line in lines {
                    geom.add_geometry_directly(points_to_native("LineString", line)?)?;
                }
                Ok(geom)
            }
            Geometry::MultiPolygon(polygons) => {
                let mut geom = create::<G>("MultiPolygon")?;
                for rings in polygons {
                    geom.add_geometry_directly(polygon_to_native(rings)?)?;
                }
                Ok(geom)
            }
            Geometry::GeometryCollection(geometries) => {
                let mut geom = create::<G>("GeometryCollection")?;
                for member in geometries {
                    geom.add_geometry_directly(member.to_native()?)?;
                }
                Ok(geom)
            }
        }
    }

    /// GeoJSON-like representation: `{"type": ..., "coordinates": ...}`, or
    /// `{"type": "GeometryCollection", "geometries": [...]}`.
    pub fn to_json(&self) -> Value {
        let coordinates = match self {
            Geometry::Point(c) => c.to_json(),
            Geometry::LineString(cs) | Geometry::LinearRing(cs) | Geometry::MultiPoint(cs) => {
                coords_to_json(cs)
            }
            Geometry::Polygon(rs) | Geometry::MultiLineString(rs) => rings_to_json(rs),
            Geometry::MultiPolygon(ps) => {
                Value::Array(ps.iter().map(|p| rings_to_json(p)).collect())
            }
            Geometry::GeometryCollection(gs) => {
                return json!({
                    "type": "GeometryCollection",
                    "geometries": gs.iter().map(Geometry::to_json).collect::<Vec<_>>(),
                });
            }
        };
        json!({ "type": self.geometry_type_name(), "coordinates": coordinates })
    }

    pub fn from_json(value: &Value) -> Result<Geometry> {
        let geometry_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| bad_json("a geometry object with a type", value))?;
        if geometry_type == "GeometryCollection" {
            let members = value
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| bad_json("a geometries array", value))?;
            return members
                .iter()
                .map(Geometry::from_json)
                .collect::<Result<Vec<_>>>()
                .map(Geometry::GeometryCollection);
        }
        let coordinates = value
            .get("coordinates")
            .ok_or_else(|| bad_json("a coordinates member", value))?;
        match geometry_type {
            "Point" => Coord::from_json(coordinates).map(Geometry::Point),
            "LineString" => coords_from_json(coordinates).map(Geometry::LineString),
            "LinearRing" => coords_from_json(coordinates).map(Geometry::LinearRing),
            "MultiPoint" => coords_from_json(coordinates).map(Geometry::MultiPoint),
            "Polygon" => rings_from_json(coordinates).map(Geometry::Polygon),
            "MultiLineString" => rings_from_json(coordinates).map(Geometry::MultiLineString),
            "MultiPolygon" => json_array(coordinates)?
                .iter()
                .map(rings_from_json)
                .collect::<Result<Vec<_>>>()
                .map(Geometry::MultiPolygon),
            other => Err(VectorError::UnsupportedGeometryType(other.to_string())),
        }
    }
}

fn build_canonical<G: NativeGeometry>(handle: &G) -> Result<Geometry> {
    let code = handle.geometry_type().normalize()?;
    match code.base()? {
        Shape::Point => first_coord(handle).map(Geometry::Point),
        Shape::LineString if code.is_linear_ring() => Ok(Geometry::LinearRing(coords(handle))),
        Shape::LineString => Ok(Geometry::LineString(coords(handle))),
        Shape::Polygon => rings(handle).map(Geometry::Polygon),
        Shape::MultiPoint => children(handle, first_coord::<G>).map(Geometry::MultiPoint),
        Shape::MultiLineString => children(handle, |line| Ok(coords(line)))
            .map(Geometry::MultiLineString),
        Shape::MultiPolygon => children(handle, rings::<G>).map(Geometry::MultiPolygon),
        Shape::GeometryCollection => {
            children(handle, Geometry::from_native::<G>).map(Geometry::GeometryCollection)
        }
    }
}

fn coords<G: NativeGeometry>(handle: &G) -> Vec<Coord> {
    let is_3d = handle.coordinate_dimension() == 3;
    (0..handle.point_count())
        .map(|i| {
            let (x, y, z) = handle.get_point(i);
            Coord {
                x,
                y,
                z: is_3d.then_some(z),
            }
        })
        .collect()
}

fn first_coord<G: NativeGeometry>(handle: &G) -> Result<Coord> {
    coords(handle)
        .into_iter()
        .next()
        .ok_or(VectorError::EmptyGeometry("Point"))
}

fn rings<G: NativeGeometry>(handle: &G) -> Result<Vec<Vec<Coord>>> {
    children(handle, |ring| Ok(coords(ring)))
}

fn children<G, T>(handle: &G, mut build: impl FnMut(&G) -> Result<T>) -> Result<Vec<T>>
where
    G: NativeGeometry,
{
    (0..handle.geometry_count())
        .map(|i| handle.with_geometry(i, &mut build))
        .collect()
}

fn create<G: NativeGeometry>(name: &str) -> Result<G> {
    G::create(GeometryTypeCode::from_name(name)?)
}

fn points_to_native<G: NativeGeometry>(name: &str, cs: &[Coord]) -> Result<G> {
    let mut geom = create::<G>(name)?;
    for c in cs {
        geom.add_point(c.x, c.y, c.z);
    }
    Ok(geom)
}

fn polygon_to_native<G: NativeGeometry>(rings: &[Vec<Coord>]) -> Result<G> {
    let mut geom = create::<G>("Polygon")?;
    for ring in rings {
        let mut native_ring = points_to_native::<G>("LinearRing", ring)?;
        native_ring.close_rings();
        geom.add_geometry_directly(native_ring)?;
    }
    Ok(geom)
}

fn coords_to_json(cs: &[Coord]) -> Value {
    Value::Array(cs.iter().map(|c| c.to_json()).collect())
}

fn rings_to_json(rings: &[Vec<Coord>]) -> Value {
    Value::Array(rings.iter().map(|r| coords_to_json(r)).collect())
}

fn json_array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| bad_json("an array", value))
}

fn coords_from_json(value: &Value) -> Result<Vec<Coord>> {
    json_array(value)?.iter().map(Coord::from_json).collect()
}

fn rings_from_json(value: &Value) -> Result<Vec<Vec<Coord>>> {
    json_array(value)?.iter().map(coords_from_json).collect()
}

fn bad_json(expected: &str, found: &Value) -> VectorError {
    VectorError::JsonError(format!("expected {expected}, found {found}"))
}
