use tracing::{debug, warn};

use crate::errors::{Result, VectorError};
use crate::options::{CursorOptions, StoreCapabilities};
use crate::vector::collection::Collection;
use crate::vector::feature::Feature;
use crate::vector::geometry::{Bbox, Geometry};
use crate::vector::native::NativeStore;

/// Filters a cursor installs on the store, kept so they can be reinstalled after an
/// interruption.
struct Filters<G> {
    bbox: Option<Bbox>,
    mask: Option<G>,
    where_clause: Option<String>,
}

impl<G> Filters<G> {
    fn install<S: NativeStore<Geometry = G>>(&self, store: &mut S) -> Result<()> {
        match (&self.bbox, &self.mask) {
            (_, Some(mask)) => store.set_spatial_filter(Some(mask)),
            (Some(bbox), None) => store.set_spatial_filter_rect(Some(*bbox)),
            (None, None) => store.set_spatial_filter_rect(None),
        }
        store.set_attribute_filter(self.where_clause.as_deref())
    }
}

/// Iterates over the records of a [`Collection`] with slice semantics.
///
/// Indices count records passing the cursor's filters. Each pull copies the record out of
/// the store, so yielded features stay valid after the cursor and the collection are gone.
/// Once the cursor returns `None` it stays exhausted.
pub struct FeatureCursor<'a, S: NativeStore> {
    collection: &'a Collection<S>,
    token: u64,
    start: i64,
    stop: Option<i64>,
    step: i64,
    next_index: i64,
    feature_count: Option<i64>,
    fast_seek: bool,
    filters: Filters<S::Geometry>,
    warned_interrupted: bool,
    exhausted: bool,
}

impl<'a, S: NativeStore> FeatureCursor<'a, S> {
    pub(crate) fn new(collection: &'a Collection<S>, options: CursorOptions) -> Result<Self> {
        let CursorOptions {
            start,
            stop,
            step,
            bbox,
            mask,
            where_clause,
            require_fast_seek,
        } = options;

        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(VectorError::BadArgument(
                "slice step cannot be zero".to_string(),
            ));
        }
        if bbox.is_some() && mask.is_some() {
            return Err(VectorError::BadArgument(
                "bbox and mask are mutually exclusive".to_string(),
            ));
        }

        let fast_seek = collection
            .capabilities()
            .contains(StoreCapabilities::FAST_SEEK);
        if step < 0 && !fast_seek {
            return Err(VectorError::UnsupportedOperation(
                "a negative step needs a store with fast indexed seek".to_string(),
            ));
        }
        if step > 1 && !fast_seek {
            if require_fast_seek {
                return Err(VectorError::UnsupportedOperation(format!(
                    "a step of {step} needs a store with fast indexed seek"
                )));
            }
            warn!(
                "Store has no fast indexed seek, every advance reads and discards {} records",
                step - 1
            );
        }

        let filters = Filters {
            bbox,
            mask: mask.as_ref().map(Geometry::to_native).transpose()?,
            where_clause,
        };

        let mut store = collection.store_mut()?;
        collection.release_position();
        filters.install(&mut *store)?;

        let negative_bound = start.is_some_and(|i| i < 0) || stop.is_some_and(|i| i < 0);
        let feature_count = store
            .feature_count(negative_bound)
            .and_then(|c| i64::try_from(c).ok());
        let resolve = |index: i64| -> Result<i64> {
            match (index < 0, feature_count) {
                (false, _) => Ok(index),
                (true, Some(count)) => Ok(index + count),
                (true, None) => Err(VectorError::UnsupportedOperation(
                    "store cannot count its records, negative slice indexes are unavailable"
                        .to_string(),
                )),
            }
        };
        let stop = stop.map(resolve).transpose()?.map(|s| s.max(-1));
        let mut start = resolve(start.unwrap_or(0))?;
        let mut exhausted = false;
        if start < 0 {
            if step > 0 {
                start = 0;
            } else {
                exhausted = true;
            }
        }
        match feature_count {
            Some(count) if start >= count && step > 0 => exhausted = true,
            Some(count) if start >= count => start = count - 1,
            Some(_) => {}
            None if start != 0 => {
                warn!("Store cannot count its records, slice start {start} is not range checked")
            }
            None => {}
        }
        if start < 0 {
            exhausted = true;
        }

        let token = collection.claim_position();
        if !exhausted {
            seek(&mut *store, start)?;
        }
        debug!(
            "Cursor {token}: start {start}, stop {stop:?}, step {step}, count {feature_count:?}, fast seek {fast_seek}"
        );
        drop(store);

        Ok(FeatureCursor {
            collection,
            token,
            start,
            stop,
            step,
            next_index: start,
            feature_count,
            fast_seek,
            filters,
            warned_interrupted: false,
            exhausted,
        })
    }

    fn finished(&self) -> bool {
        if self.next_index < 0 {
            return true;
        }
        if let Some(count) = self.feature_count {
            if self.next_index >= count {
                return true;
            }
        }
        match self.stop {
            Some(stop) if self.step > 0 => self.next_index >= stop,
            Some(stop) => self.next_index <= stop,
            None => false,
        }
    }

    /// Moves the read position onto `next_index` and reads that record.
    fn advance(&mut self) -> Result<Option<S::Feature>> {
        if self.finished() {
            return Ok(None);
        }
        let mut store = self.collection.store_mut()?;

        if !self.collection.owns_position(self.token) {
            if !self.fast_seek && self.next_index != 0 && !self.warned_interrupted {
                warn!(
                    "Sequential read was interrupted by another reader, rewinding to record {}; this can be slow",
                    self.next_index
                );
                self.warned_interrupted = true;
            }
            debug!("Cursor {}: reseeking to {}", self.token, self.next_index);
            self.filters.install(&mut *store)?;
            seek(&mut *store, self.next_index)?;
            self.collection.reclaim_position(self.token);
        } else if self.next_index != self.start {
            if self.step < 0 || (self.step > 1 && self.fast_seek) {
                seek(&mut *store, self.next_index)?;
            } else if self.step > 1 {
                for _ in 1..self.step {
                    if store.next_record()?.is_none() {
                        return Ok(None);
                    }
                }
            }
        }

        match self.next_index.checked_add(self.step) {
            Some(index) => self.next_index = index,
            None => self.exhausted = true,
        }
        store.next_record()
    }
}

/// Positions `store` on the `index`-th record, falling back to a rewind and a sequential
/// skip when the store has no indexed seek at all.
fn seek<S: NativeStore>(store: &mut S, index: i64) -> Result<()> {
    let index = u64::try_from(index)
        .map_err(|_| VectorError::BadArgument(format!("cannot seek to record {index}")))?;
    if store.seek_to_index(index)? {
        return Ok(());
    }
    store.reset_reading();
    for _ in 0..index {
        if store.next_record()?.is_none() {
            break;
        }
    }
    Ok(())
}

impl<S: NativeStore> Iterator for FeatureCursor<'_, S> {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => Some(self.collection.builder().build(&record)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}
