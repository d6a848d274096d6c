use crate::vector::geometry::{Coord, Geometry};

/// Convert object to a [`Geometry`].
pub trait ToGeometry {
    fn to_geometry(&self) -> Geometry;
}

fn coords(line: &geo_types::LineString<f64>) -> Vec<Coord> {
    line.0.iter().map(|c| Coord::new_2d(c.x, c.y)).collect()
}

fn rings(polygon: &geo_types::Polygon<f64>) -> Vec<Vec<Coord>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(coords)
        .collect()
}

impl ToGeometry for geo_types::Point<f64> {
    fn to_geometry(&self) -> Geometry {
        Geometry::Point(Coord::new_2d(self.x(), self.y()))
    }
}

impl ToGeometry for geo_types::MultiPoint<f64> {
    fn to_geometry(&self) -> Geometry {
        Geometry::MultiPoint(self.0.iter().map(|p| Coord::new_2d(p.x(), p.y())).collect())
    }
}

impl ToGeometry for geo_types::Line<f64> {
    fn to_geometry(&self) -> Geometry {
        Geometry::LineString(vec![
            Coord::new_2d(self.start.x, self.start.y),
            Coord::new_2d(self.end.x, self.end.y),
        ])
    }
}

impl ToGeometry for geo_types::LineString<f64> {
    fn to_geometry(&self) -> Geometry {
        Geometry::LineString(coords(self))
    }
}

impl ToGeometry for geo_types::MultiLineString<f64> {
    fn to_geometry(&self) -> Geometry {
        Geometry::MultiLineString(self.0.iter().map(coords).collect())
    }
}

impl ToGeometry for geo_types::Polygon<f64> {
    fn to_geometry(&self) -> Geometry {
        Geometry::Polygon(rings(self))
    }
}

impl ToGeometry for geo_types::MultiPolygon<f64> {
    fn to_geometry(&self) -> Geometry {
        Geometry::MultiPolygon(self.0.iter().map(rings).collect())
    }
}

impl ToGeometry for geo_types::Rect<f64> {
    fn to_geometry(&self) -> Geometry {
        self.to_polygon().to_geometry()
    }
}

impl ToGeometry for geo_types::Triangle<f64> {
    fn to_geometry(&self) -> Geometry {
        self.to_polygon().to_geometry()
    }
}

impl ToGeometry for geo_types::GeometryCollection<f64> {
    fn to_geometry(&self) -> Geometry {
        Geometry::GeometryCollection(self.0.iter().map(ToGeometry::to_geometry).collect())
    }
}

impl ToGeometry for geo_types::Geometry<f64> {
    fn to_geometry(&self) -> Geometry {
        match self {
            geo_types::Geometry::Point(c) => c.to_geometry(),
            geo_types::Geometry::Line(c) => c.to_geometry(),
            geo_types::Geometry::LineString(c) => c.to_geometry(),
            geo_types::Geometry::Polygon(c) => c.to_geometry(),
            geo_types::Geometry::MultiPoint(c) => c.to_geometry(),
            geo_types::Geometry::MultiLineString(c) => c.to_geometry(),
            geo_types::Geometry::MultiPolygon(c) => c.to_geometry(),
            geo_types::Geometry::GeometryCollection(c) => c.to_geometry(),
            geo_types::Geometry::Rect(c) => c.to_geometry(),
            geo_types::Geometry::Triangle(c) => c.to_geometry(),
        }
    }
}
