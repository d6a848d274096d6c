use std::cell::{Cell, RefCell, RefMut};

use encoding_rs::Encoding;
use indexmap::IndexMap;
use tracing::debug;

use crate::errors::{Result, VectorError};
use crate::options::{CursorOptions, StoreCapabilities, WriteOptions};
use crate::vector::cursor::FeatureCursor;
use crate::vector::feature::{Feature, FeatureBuilder};
use crate::vector::native::NativeStore;
use crate::vector::schema::Schema;
use crate::vector::transaction::Transaction;

/// A native store together with the schema read from it.
///
/// Every [`FeatureCursor`] opened on a collection shares the store's single read position.
/// Opening a second cursor, or calling [`get`](Collection::get), interrupts the cursor that
/// positioned the store last; that cursor reseeks on its next pull.
///
/// ```
/// use geofeatures::vector::{Collection, MemoryStore, Schema};
///
/// let schema = Schema::parse("Point", &[("name", "str")]).unwrap();
/// let collection = Collection::new(MemoryStore::new(&schema)).unwrap();
/// assert_eq!(collection.len(), Some(0));
/// assert_eq!(collection.iter().unwrap().count(), 0);
/// ```
#[derive(Debug)]
pub struct Collection<S: NativeStore> {
    store: RefCell<S>,
    schema: Schema,
    field_index: IndexMap<String, usize>,
    capabilities: StoreCapabilities,
    encoding: &'static Encoding,
    /// Token of the cursor that last moved the read position, 0 for none.
    position_owner: Cell<u64>,
    last_token: Cell<u64>,
}

impl<S: NativeStore> Collection<S> {
    /// Wraps `store`, reading its schema and probing its capabilities once.
    pub fn new(store: S) -> Result<Self> {
        let (schema, field_index) = Schema::from_native(store.geometry_type(), &store.field_defns());
        let capabilities = store.capabilities();
        let encoding = store.text_encoding();
        debug!(
            "Opened collection of {} with {} fields, capabilities {capabilities:?}",
            schema.geometry_type,
            schema.properties.len()
        );
        Ok(Collection {
            store: RefCell::new(store),
            schema,
            field_index,
            capabilities,
            encoding,
            position_owner: Cell::new(0),
            last_token: Cell::new(0),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn geometry_type(&self) -> &str {
        &self.schema.geometry_type
    }

    pub fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    /// Number of records, `None` when the store cannot count them cheaply.
    pub fn len(&self) -> Option<u64> {
        let mut store = self.store_mut().ok()?;
        self.release_position();
        store.set_spatial_filter_rect(None);
        store.set_attribute_filter(None).ok()?;
        store.feature_count(false)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Opens a cursor over the records selected by `options`.
    ///
    /// Installs the cursor's filters and performs its initial seek, which interrupts any
    /// cursor already in flight on this collection.
    pub fn features(&self, options: CursorOptions) -> Result<FeatureCursor<'_, S>> {
        FeatureCursor::new(self, options)
    }

    /// Opens a cursor over every record.
    pub fn iter(&self) -> Result<FeatureCursor<'_, S>> {
        self.features(CursorOptions::default())
    }

    /// Reads one record by identifier. Returns `None` for unknown identifiers.
    pub fn get(&self, fid: u64) -> Result<Option<Feature>> {
        if !self.capabilities.contains(StoreCapabilities::RANDOM_READ) {
            return Err(VectorError::UnsupportedOperation(
                "store does not support random reads".to_string(),
            ));
        }
        let mut store = self.store_mut()?;
        self.release_position();
        let record = store.feature_by_id(fid)?;
        record.map(|r| self.builder().build(&r)).transpose()
    }

    /// Appends one record, committing it on its own.
    pub fn write(&self, feature: &Feature) -> Result<()> {
        self.write_records(std::iter::once(feature), WriteOptions::default())
    }

    /// Appends records, in transactions of `options.transaction_size` records when the
    /// store supports them and one at a time otherwise.
    ///
    /// Every record is validated against the schema before it is written. On error the
    /// open transaction is rolled back; earlier batches stay committed.
    pub fn write_records<'f>(
        &self,
        features: impl IntoIterator<Item = &'f Feature>,
        options: WriteOptions,
    ) -> Result<()> {
        if !self.capabilities.contains(StoreCapabilities::SEQUENTIAL_WRITE) {
            return Err(VectorError::UnsupportedOperation(
                "store does not support writing".to_string(),
            ));
        }
        if options.transaction_size == 0 {
            return Err(VectorError::BadArgument(
                "transaction size must be positive".to_string(),
            ));
        }
        let mut store = self.store_mut()?;
        self.release_position();
        let mut features = features.into_iter().peekable();

        if !self.capabilities.contains(StoreCapabilities::TRANSACTIONS) {
            for feature in features {
                self.write_one(&mut store, feature)?;
            }
            return Ok(());
        }

        while features.peek().is_some() {
            let mut transaction = Transaction::start(&mut *store)?;
            let mut written = 0;
            for feature in features.by_ref().take(options.transaction_size) {
                if let Err(e) = self.write_one(&mut transaction, feature) {
                    transaction.rollback()?;
                    return Err(e);
                }
                written += 1;
            }
            transaction.commit()?;
            debug!("Committed a batch of {written} records");
        }
        Ok(())
    }

    fn write_one(&self, store: &mut S, feature: &Feature) -> Result<()> {
        self.validate(feature)?;
        let mut handle = store.create_feature_handle()?;
        self.builder().deconstruct(feature, &mut handle)?;
        store.write_feature(&mut handle)
    }

    fn validate(&self, feature: &Feature) -> Result<()> {
        let same_keys = feature.properties.len() == self.schema.properties.len()
            && feature
                .properties
                .keys()
                .all(|k| self.schema.properties.contains_key(k));
        if !same_keys {
            return Err(VectorError::SchemaError(format!(
                "Record's property keys {:?} do not match the collection schema {:?}",
                feature.properties.keys().collect::<Vec<_>>(),
                self.schema.properties.keys().collect::<Vec<_>>()
            )));
        }
        if let Some(geometry) = &feature.geometry {
            let expected = self
                .schema
                .geometry_type
                .strip_prefix("3D ")
                .unwrap_or(&self.schema.geometry_type);
            let actual = geometry.geometry_type_name();
            let accepted = expected == "Unknown"
                || actual == expected
                || actual.strip_prefix("Multi") == Some(expected);
            if !accepted {
                return Err(VectorError::SchemaError(format!(
                    "Record's geometry type '{actual}' does not match the collection geometry type '{}'",
                    self.schema.geometry_type
                )));
            }
        }
        Ok(())
    }

    /// Gives back the store.
    pub fn into_inner(self) -> S {
        self.store.into_inner()
    }

    pub(crate) fn builder(&self) -> FeatureBuilder<'_> {
        FeatureBuilder::new(&self.schema, &self.field_index)
            .encoding(self.encoding)
            .json_strings(self.capabilities.contains(StoreCapabilities::JSON_STRINGS))
            .timezones(self.capabilities.contains(StoreCapabilities::TIMEZONES))
    }

    /// Borrows the store. Errors when it is already borrowed, which only happens when a
    /// collection is used from inside one of its own callbacks.
    pub(crate) fn store_mut(&self) -> Result<RefMut<'_, S>> {
        self.store
            .try_borrow_mut()
            .map_err(|_| VectorError::UnsupportedOperation("store is already in use".to_string()))
    }

    /// Hands out a fresh cursor token and gives it the read position.
    pub(crate) fn claim_position(&self) -> u64 {
        let token = self.last_token.get() + 1;
        self.last_token.set(token);
        self.position_owner.set(token);
        token
    }

    pub(crate) fn owns_position(&self, token: u64) -> bool {
        self.position_owner.get() == token
    }

    pub(crate) fn reclaim_position(&self, token: u64) {
        self.position_owner.set(token);
    }

    /// Marks the read position as moved by something other than a cursor.
    pub(crate) fn release_position(&self) {
        self.position_owner.set(0);
    }
}
