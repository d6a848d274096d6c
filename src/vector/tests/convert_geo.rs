use geo_types::{coord, line_string, point, polygon};

use crate::vector::{Coord, Geometry, ToGeometry};

fn c(x: f64, y: f64) -> Coord {
    Coord::new_2d(x, y)
}

#[test]
fn test_import_export_point() {
    let geometry = Geometry::Point(c(1., 2.));
    let geo = geo_types::Geometry::Point(point!(x: 1., y: 2.));

    assert_eq!(geo_types::Geometry::from(&geometry), geo);
    assert_eq!(geo.to_geometry(), geometry);
}

#[test]
fn test_import_export_multipoint() {
    let geometry = Geometry::MultiPoint(vec![c(0., 0.), c(0., 1.), c(1., 2.)]);
    let geo = geo_types::Geometry::MultiPoint(geo_types::MultiPoint(vec![
        point!(x: 0., y: 0.),
        point!(x: 0., y: 1.),
        point!(x: 1., y: 2.),
    ]));

    assert_eq!(geo_types::Geometry::from(&geometry), geo);
    assert_eq!(geo.to_geometry(), geometry);
}

#[test]
fn test_import_export_linestring() {
    let geometry = Geometry::LineString(vec![c(0., 0.), c(0., 1.), c(1., 2.)]);
    let geo = geo_types::Geometry::LineString(line_string![
        (x: 0., y: 0.),
        (x: 0., y: 1.),
        (x: 1., y: 2.)
    ]);

    assert_eq!(geo_types::Geometry::from(&geometry), geo);
    assert_eq!(geo.to_geometry(), geometry);
}

#[test]
fn test_import_export_multilinestring() {
    let geometry = Geometry::MultiLineString(vec![
        vec![c(0., 0.), c(0., 1.), c(1., 2.)],
        vec![c(3., 3.), c(3., 4.), c(4., 5.)],
    ]);
    let geo = geo_types::Geometry::MultiLineString(geo_types::MultiLineString(vec![
        line_string![(x: 0., y: 0.), (x: 0., y: 1.), (x: 1., y: 2.)],
        line_string![(x: 3., y: 3.), (x: 3., y: 4.), (x: 4., y: 5.)],
    ]));

    assert_eq!(geo_types::Geometry::from(&geometry), geo);
    assert_eq!(geo.to_geometry(), geometry);
}

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Coord> {
    vec![c(x0, y0), c(x0, y1), c(x1, y1), c(x1, y0), c(x0, y0)]
}

#[test]
fn test_import_export_polygon() {
    let geometry = Geometry::Polygon(vec![square(0., 0., 8., 8.), square(1., 1., 2., 2.)]);
    let geo = geo_types::Geometry::Polygon(polygon!(
        exterior: [
            (x: 0., y: 0.),
            (x: 0., y: 8.),
            (x: 8., y: 8.),
            (x: 8., y: 0.),
            (x: 0., y: 0.),
        ],
        interiors: [
            [
                (x: 1., y: 1.),
                (x: 1., y: 2.),
                (x: 2., y: 2.),
                (x: 2., y: 1.),
                (x: 1., y: 1.),
            ],
        ],
    ));

    assert_eq!(geo_types::Geometry::from(&geometry), geo);
    assert_eq!(geo.to_geometry(), geometry);
}

#[test]
fn test_import_export_multipolygon() {
    let geometry = Geometry::MultiPolygon(vec![
        vec![square(0., 0., 1., 1.)],
        vec![square(5., 5., 6., 6.), square(5.2, 5.2, 5.4, 5.4)],
    ]);
    let converted = geo_types::Geometry::from(&geometry);
    let geo_types::Geometry::MultiPolygon(multi) = &converted else {
        panic!("expected a multipolygon, got {converted:?}");
    };
    assert_eq!(multi.0.len(), 2);
    assert_eq!(multi.0[1].interiors().len(), 1);
    assert_eq!(converted.to_geometry(), geometry);
}

#[test]
fn test_import_export_geometrycollection() {
    let geometry = Geometry::GeometryCollection(vec![
        Geometry::Point(c(1., 2.)),
        Geometry::LineString(vec![c(0., 0.), c(3., 4.)]),
    ]);
    let geo = geo_types::Geometry::GeometryCollection(geo_types::GeometryCollection(vec![
        geo_types::Geometry::Point(point!(x: 1., y: 2.)),
        geo_types::Geometry::LineString(line_string![(x: 0., y: 0.), (x: 3., y: 4.)]),
    ]));

    assert_eq!(geo_types::Geometry::from(&geometry), geo);
    assert_eq!(geo.to_geometry(), geometry);
}

#[test]
fn test_export_drops_z() {
    let geometry = Geometry::Point(Coord::new_3d(1., 2., 3.));
    assert_eq!(
        geo_types::Geometry::from(geometry),
        geo_types::Geometry::Point(point!(x: 1., y: 2.))
    );
}

#[test]
fn test_export_linear_ring_as_linestring() {
    let geometry = Geometry::LinearRing(square(0., 0., 1., 1.));
    let geo_types::Geometry::LineString(line) = geo_types::Geometry::from(&geometry) else {
        panic!("expected a line string");
    };
    assert!(line.is_closed());
    assert_eq!(line.0.len(), 5);
}

#[test]
fn test_import_line_rect_triangle() {
    let line = geo_types::Line::new(coord! { x: 0., y: 0. }, coord! { x: 1., y: 1. });
    assert_eq!(
        line.to_geometry(),
        Geometry::LineString(vec![c(0., 0.), c(1., 1.)])
    );

    let rect = geo_types::Rect::new(coord! { x: 0., y: 0. }, coord! { x: 2., y: 1. });
    let Geometry::Polygon(rings) = rect.to_geometry() else {
        panic!("expected a polygon");
    };
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].len(), 5);
    assert_eq!(rings[0].first(), rings[0].last());

    let triangle = geo_types::Triangle::new(
        coord! { x: 0., y: 0. },
        coord! { x: 1., y: 0. },
        coord! { x: 0., y: 1. },
    );
    let Geometry::Polygon(rings) = triangle.to_geometry() else {
        panic!("expected a polygon");
    };
    assert_eq!(rings[0].len(), 4);
}
