use crate::vector::geometry::{Coord, Geometry};

fn coord(c: &Coord) -> geo_types::Coord<f64> {
    geo_types::Coord { x: c.x, y: c.y }
}

fn line_string(cs: &[Coord]) -> geo_types::LineString<f64> {
    geo_types::LineString(cs.iter().map(coord).collect())
}

fn polygon(rings: &[Vec<Coord>]) -> geo_types::Polygon<f64> {
    let mut rings = rings.iter().map(|r| line_string(r));
    let outer = rings.next().unwrap_or_else(|| geo_types::LineString(Vec::new()));
    geo_types::Polygon::new(outer, rings.collect())
}

/// Z values are dropped; linear rings become line strings.
impl From<&Geometry> for geo_types::Geometry<f64> {
    fn from(geo: &Geometry) -> geo_types::Geometry<f64> {
        match geo {
            Geometry::Point(c) => geo_types::Geometry::Point(geo_types::Point(coord(c))),
            Geometry::LineString(cs) | Geometry::LinearRing(cs) => {
                geo_types::Geometry::LineString(line_string(cs))
            }
            Geometry::Polygon(rings) => geo_types::Geometry::Polygon(polygon(rings)),
            Geometry::MultiPoint(cs) => geo_types::Geometry::MultiPoint(geo_types::MultiPoint(
                cs.iter().map(|c| geo_types::Point(coord(c))).collect(),
            )),
            Geometry::MultiLineString(lines) => geo_types::Geometry::MultiLineString(
                geo_types::MultiLineString(lines.iter().map(|l| line_string(l)).collect()),
            ),
            Geometry::MultiPolygon(polygons) => geo_types::Geometry::MultiPolygon(
                geo_types::MultiPolygon(polygons.iter().map(|p| polygon(p)).collect()),
            ),
            Geometry::GeometryCollection(items) => geo_types::Geometry::GeometryCollection(
                geo_types::GeometryCollection(items.iter().map(Into::into).collect()),
            ),
        }
    }
}

impl From<Geometry> for geo_types::Geometry<f64> {
    fn from(geo: Geometry) -> geo_types::Geometry<f64> {
        (&geo).into()
    }
}
