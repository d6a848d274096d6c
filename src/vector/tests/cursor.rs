use crate::errors::VectorError;
use crate::options::{CursorOptions, StoreCapabilities};
use crate::test_utils::numbered_collection;
use crate::vector::{Bbox, Coord, Geometry};

use super::indices;

fn fast() -> StoreCapabilities {
    StoreCapabilities::all()
}

/// No indexed seek and no cheap count.
fn slow() -> StoreCapabilities {
    StoreCapabilities::all() - StoreCapabilities::FAST_SEEK - StoreCapabilities::FAST_FEATURE_COUNT
}

fn slice(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> CursorOptions {
    CursorOptions::slice(start, stop, step)
}

#[test]
fn test_full_scan() {
    for caps in [fast(), slow()] {
        let collection = numbered_collection(10, caps);
        assert_eq!(
            indices(collection.iter().unwrap()),
            (0..10).collect::<Vec<_>>()
        );
    }
}

#[test]
fn test_bounded_slice() {
    for caps in [fast(), slow()] {
        let collection = numbered_collection(10, caps);
        let cursor = collection.features(slice(Some(2), Some(5), Some(1))).unwrap();
        assert_eq!(indices(cursor), [2, 3, 4]);
    }
}

#[test]
fn test_stride() {
    for caps in [fast(), slow()] {
        let collection = numbered_collection(10, caps);
        let cursor = collection.features(slice(Some(1), None, Some(3))).unwrap();
        assert_eq!(indices(cursor), [1, 4, 7]);
        let cursor = collection.features(slice(None, Some(7), Some(2))).unwrap();
        assert_eq!(indices(cursor), [0, 2, 4, 6]);
    }
}

#[test]
fn test_negative_bounds() {
    for caps in [fast(), slow()] {
        let collection = numbered_collection(10, caps);
        let cursor = collection.features(slice(Some(-3), None, None)).unwrap();
        assert_eq!(indices(cursor), [7, 8, 9]);
        let cursor = collection.features(slice(Some(1), Some(-7), None)).unwrap();
        assert_eq!(indices(cursor), [1, 2]);
        let cursor = collection.features(slice(Some(-20), Some(2), None)).unwrap();
        assert_eq!(indices(cursor), [0, 1]);
    }
}

#[test]
fn test_reverse_from_last() {
    let collection = numbered_collection(10, fast());
    let mut cursor = collection.features(slice(Some(-1), None, Some(-1))).unwrap();
    let first = cursor.next().unwrap().unwrap();
    assert_eq!(first.id, "9");
    let rest: Vec<String> = cursor.map(|f| f.unwrap().id).collect();
    assert_eq!(rest.first().map(String::as_str), Some("8"));
    assert_eq!(rest.last().map(String::as_str), Some("0"));
}

#[test]
fn test_reverse_with_stop() {
    let collection = numbered_collection(10, fast());
    let cursor = collection.features(slice(Some(8), Some(3), Some(-2))).unwrap();
    assert_eq!(indices(cursor), [8, 6, 4]);
    let cursor = collection.features(slice(Some(50), Some(6), Some(-1))).unwrap();
    assert_eq!(indices(cursor), [9, 8, 7]);
}

#[test]
fn test_negative_step_needs_fast_seek() {
    let collection = numbered_collection(10, slow());
    assert!(matches!(
        collection.features(slice(None, None, Some(-1))),
        Err(VectorError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_zero_step_rejected() {
    let collection = numbered_collection(10, fast());
    assert!(matches!(
        collection.features(slice(None, None, Some(0))),
        Err(VectorError::BadArgument(_))
    ));
}

#[test]
fn test_stop_before_start_is_empty() {
    for caps in [fast(), slow()] {
        let collection = numbered_collection(10, caps);
        let cursor = collection.features(slice(Some(5), Some(2), None)).unwrap();
        assert_eq!(indices(cursor), Vec::<i32>::new());
    }
}

#[test]
fn test_start_past_end_is_empty() {
    for caps in [fast(), slow()] {
        let collection = numbered_collection(10, caps);
        let cursor = collection.features(slice(Some(10), None, None)).unwrap();
        assert_eq!(indices(cursor), Vec::<i32>::new());
        let cursor = collection.features(slice(Some(25), None, Some(2))).unwrap();
        assert_eq!(indices(cursor), Vec::<i32>::new());
    }
}

#[test]
fn test_exhausted_cursor_stays_exhausted() {
    let collection = numbered_collection(2, fast());
    let mut cursor = collection.iter().unwrap();
    assert!(cursor.next().is_some());
    assert!(cursor.next().is_some());
    assert!(cursor.next().is_none());
    assert!(cursor.next().is_none());
}

#[test]
fn test_require_fast_seek() {
    let collection = numbered_collection(10, slow());
    let options = CursorOptions {
        step: Some(2),
        require_fast_seek: true,
        ..Default::default()
    };
    assert!(matches!(
        collection.features(options),
        Err(VectorError::UnsupportedOperation(_))
    ));

    let fast_collection = numbered_collection(10, fast());
    let options = CursorOptions {
        step: Some(5),
        require_fast_seek: true,
        ..Default::default()
    };
    assert_eq!(indices(fast_collection.features(options).unwrap()), [0, 5]);
}

#[test]
fn test_interrupted_cursor_resumes() {
    for caps in [fast(), slow()] {
        let collection = numbered_collection(10, caps);
        let mut a = collection.iter().unwrap();
        let drained: Vec<String> = a.by_ref().take(4).map(|f| f.unwrap().id).collect();
        assert_eq!(drained, ["0", "1", "2", "3"]);

        let b = collection.features(slice(Some(6), None, None)).unwrap();
        assert_eq!(indices(b), [6, 7, 8, 9]);

        assert_eq!(a.next().unwrap().unwrap().id, "4");
        assert_eq!(indices(a), [5, 6, 7, 8, 9]);
    }
}

#[test]
fn test_interrupted_by_random_read() {
    let collection = numbered_collection(10, slow());
    let mut cursor = collection.features(slice(None, None, Some(2))).unwrap();
    assert_eq!(cursor.next().unwrap().unwrap().id, "0");
    assert_eq!(collection.get(7).unwrap().unwrap().id, "7");
    assert_eq!(indices(cursor), [2, 4, 6, 8]);
}

#[test]
fn test_interrupted_cursor_keeps_its_filters() {
    let collection = numbered_collection(10, fast());
    let mut filtered = collection
        .features(CursorOptions {
            where_clause: Some("index >= 5".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(filtered.next().unwrap().unwrap().id, "5");

    assert_eq!(indices(collection.iter().unwrap()).len(), 10);
    assert_eq!(indices(filtered), [6, 7, 8, 9]);
}

#[test]
fn test_failed_cursor_does_not_disturb_others() {
    for caps in [fast(), slow()] {
        let collection = numbered_collection(10, caps);
        let mut a = collection.iter().unwrap();
        assert_eq!(a.by_ref().take(4).count(), 4);

        let bad_where = CursorOptions {
            where_clause: Some("index LIKE 'x'".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            collection.features(bad_where),
            Err(VectorError::AttributeFilterError { .. })
        ));

        assert_eq!(a.next().unwrap().unwrap().id, "4");
        assert_eq!(indices(a), [5, 6, 7, 8, 9]);
    }
}

#[test]
fn test_failed_cursor_does_not_leak_its_filters() {
    let collection = numbered_collection(10, slow());
    let mut filtered = collection
        .features(CursorOptions {
            where_clause: Some("index >= 5".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(filtered.next().unwrap().unwrap().id, "5");

    // The bbox reaches the store before the where clause is rejected.
    let half_installed = CursorOptions {
        bbox: Some(Bbox::new(0.0, -1.0, 1.5, 1.0)),
        where_clause: Some("index LIKE 'x'".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        collection.features(half_installed),
        Err(VectorError::AttributeFilterError { .. })
    ));

    assert_eq!(indices(filtered), [6, 7, 8, 9]);
}

#[test]
fn test_huge_step_stops_after_one_record() {
    let caps = StoreCapabilities::all() - StoreCapabilities::FAST_FEATURE_COUNT;
    let collection = numbered_collection(10, caps);
    let cursor = collection
        .features(slice(Some(3), None, Some(i64::MAX)))
        .unwrap();
    assert_eq!(indices(cursor), [3]);
}

#[test]
fn test_filters_count_only_matching_records() {
    let collection = numbered_collection(10, fast());
    let options = CursorOptions {
        start: Some(1),
        stop: Some(3),
        bbox: Some(Bbox::new(3.5, -1.0, 20.0, 1.0)),
        ..Default::default()
    };
    assert_eq!(indices(collection.features(options).unwrap()), [5, 6]);

    let options = CursorOptions {
        start: Some(-2),
        where_clause: Some("index < 5".to_string()),
        ..Default::default()
    };
    assert_eq!(indices(collection.features(options).unwrap()), [3, 4]);
}

#[test]
fn test_mask_filter() {
    let collection = numbered_collection(10, fast());
    let mask = Geometry::LineString(vec![Coord::new_2d(1.5, -1.0), Coord::new_2d(3.5, 1.0)]);
    let options = CursorOptions {
        mask: Some(mask.clone()),
        ..Default::default()
    };
    assert_eq!(indices(collection.features(options).unwrap()), [2, 3]);

    let options = CursorOptions {
        mask: Some(mask),
        bbox: Some(Bbox::new(0.0, 0.0, 1.0, 1.0)),
        ..Default::default()
    };
    assert!(matches!(
        collection.features(options),
        Err(VectorError::BadArgument(_))
    ));
}

#[test]
fn test_bad_attribute_filter() {
    let collection = numbered_collection(10, fast());
    let options = CursorOptions {
        where_clause: Some("index LIKE 'x'".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        collection.features(options),
        Err(VectorError::AttributeFilterError { .. })
    ));
}
