//! Store doubles for exercising failure paths.

use async_trait::async_trait;
use serde_json::Value;

use crate::store::{Collection, Filter, FindOptions, MemoryStore, Store, StoreResult};

/// Wraps a [`MemoryStore`] and fails selected operations.
#[derive(Debug, Clone)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: bool,
    fail_inserts_into: Option<Collection>,
}

impl FlakyStore {
    pub fn failing_reads(inner: MemoryStore) -> Self {
        Self { inner, fail_reads: true, fail_inserts_into: None }
    }

    pub fn failing_inserts_into(inner: MemoryStore, collection: Collection) -> Self {
        Self { inner, fail_reads: false, fail_inserts_into: Some(collection) }
    }

    fn check_read(&self, collection: Collection) -> StoreResult<()> {
        if self.fail_reads {
            return Err(anyhow::anyhow!("read from {} refused", collection.name()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<Value>> {
        self.check_read(collection)?;
        self.inner.find(collection, filter, options).await
    }

    async fn find_one(&self, collection: Collection, filter: Filter) -> StoreResult<Option<Value>> {
        self.check_read(collection)?;
        self.inner.find_one(collection, filter).await
    }

    async fn insert_one(&self, collection: Collection, doc: Value) -> StoreResult<String> {
        if self.fail_inserts_into == Some(collection) {
            return Err(anyhow::anyhow!("insert into {} refused", collection.name()).into());
        }
        self.inner.insert_one(collection, doc).await
    }
}
