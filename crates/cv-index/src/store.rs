//! Snapshot publication.
//!
//! Every table is built off to the side and swapped in whole. Readers take
//! an `Arc` to the current snapshot and keep it for as long as they like; a
//! concurrent rebuild never changes what they see.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config_keys::KeyTable;
use crate::routes::RouteTable;
use crate::schema::SchemaTable;
use crate::translations::{Catalog, TranslationIndex, UsageTable};
use crate::validation::ValidationIndex;

/// The published tables.
///
/// # Examples
///
/// ```
/// use cv_index::{IndexStore, RouteTable};
///
/// let store = IndexStore::new();
/// let before = store.routes();
/// store.publish_routes(RouteTable::default());
/// assert!(before.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct IndexStore {
    routes: RwLock<Arc<RouteTable>>,
    schema: RwLock<Arc<SchemaTable>>,
    translations: RwLock<Arc<TranslationIndex>>,
    validation: RwLock<Arc<ValidationIndex>>,
    keys: RwLock<Arc<KeyTable>>,
}

impl IndexStore {
    /// Creates a store with empty tables and seeded keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current route table.
    #[must_use]
    pub fn routes(&self) -> Arc<RouteTable> {
        Arc::clone(&self.routes.read())
    }

    /// Current schema.
    #[must_use]
    pub fn schema(&self) -> Arc<SchemaTable> {
        Arc::clone(&self.schema.read())
    }

    /// Current reconciled translations.
    #[must_use]
    pub fn translations(&self) -> Arc<TranslationIndex> {
        Arc::clone(&self.translations.read())
    }

    /// Current validation reports.
    #[must_use]
    pub fn validation(&self) -> Arc<ValidationIndex> {
        Arc::clone(&self.validation.read())
    }

    /// Current config and env keys.
    #[must_use]
    pub fn keys(&self) -> Arc<KeyTable> {
        Arc::clone(&self.keys.read())
    }

    /// Swaps in a new route table.
    pub fn publish_routes(&self, table: RouteTable) {
        *self.routes.write() = Arc::new(table);
    }

    /// Swaps in a new schema.
    pub fn publish_schema(&self, table: SchemaTable) {
        *self.schema.write() = Arc::new(table);
    }

    /// Swaps in a new validation index.
    pub fn publish_validation(&self, index: ValidationIndex) {
        *self.validation.write() = Arc::new(index);
    }

    /// Swaps in a new key table.
    pub fn publish_keys(&self, table: KeyTable) {
        *self.keys.write() = Arc::new(table);
    }

    /// Swaps in a new catalog, reconciled with the current usages.
    pub fn publish_catalog(&self, catalog: Catalog) {
        let mut slot = self.translations.write();
        let reconciled = TranslationIndex::reconcile(Arc::new(catalog), slot.usage_table());
        *slot = Arc::new(reconciled);
    }

    /// Swaps in new usages, reconciled with the current catalog.
    pub fn publish_usages(&self, usages: UsageTable) {
        let mut slot = self.translations.write();
        let reconciled = TranslationIndex::reconcile(slot.catalog(), Arc::new(usages));
        *slot = Arc::new(reconciled);
    }
}
