use bitflags::bitflags;

use crate::vector::{Bbox, Geometry};

/// Number of records written per transaction by
/// [`Collection::write_records`](crate::vector::Collection::write_records).
pub const DEFAULT_TRANSACTION_SIZE: usize = 20_000;

bitflags! {
    /// Capabilities a [`NativeStore`](crate::vector::NativeStore) reports.
    ///
    /// Stores are probed once per cursor; nothing is assumed from a missing flag except that
    /// the slower path has to be taken.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct StoreCapabilities: u32 {
        /// Jump to the nth record without a sequential scan.
        const FAST_SEEK = 0x01;
        /// Report the record count without a scan.
        const FAST_FEATURE_COUNT = 0x02;
        /// Fetch a record by its identifier.
        const RANDOM_READ = 0x04;
        /// Group writes into transactions.
        const TRANSACTIONS = 0x08;
        /// Date and time fields keep their timezone.
        const TIMEZONES = 0x10;
        /// String fields may embed JSON documents.
        const JSON_STRINGS = 0x20;
        /// Records can be appended.
        const SEQUENTIAL_WRITE = 0x40;
    }
}

impl Default for StoreCapabilities {
    fn default() -> StoreCapabilities {
        StoreCapabilities::empty()
    }
}

/// Bounds, step and filters of a [`FeatureCursor`](crate::vector::FeatureCursor).
///
/// `start`, `stop` and `step` follow slice semantics: negative bounds count from the end,
/// `stop` is exclusive and a missing `step` means 1.
#[derive(Clone, Debug, Default)]
pub struct CursorOptions {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
    /// Only yield records whose geometry intersects this rectangle.
    pub bbox: Option<Bbox>,
    /// Only yield records whose geometry intersects this geometry. Exclusive with `bbox`.
    pub mask: Option<Geometry>,
    /// Attribute predicate handed to the store.
    pub where_clause: Option<String>,
    /// Fail instead of scanning sequentially when a stride needs an indexed seek the store
    /// cannot do natively.
    pub require_fast_seek: bool,
}

impl CursorOptions {
    pub fn slice(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        CursorOptions {
            start,
            stop,
            step,
            ..Default::default()
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct WriteOptions {
    /// Records per transaction when the store supports transactions.
    pub transaction_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            transaction_size: DEFAULT_TRANSACTION_SIZE,
        }
    }
}
