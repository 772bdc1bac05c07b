//! Document store the handlers persist through.
//!
//! Documents are plain JSON objects grouped into named collections. The
//! store assigns an `_id` on insert when the document has none.

mod memory;
mod sqlite;

use std::fmt;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque storage failure. The cause is kept for logging only.
#[derive(Debug)]
pub struct StoreError(pub anyhow::Error);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage failure: {:#}", self.0)
    }
}

impl<E> From<E> for StoreError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Messages,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Messages => "messages",
        }
    }
}

/// Conjunction of `field == value` conditions. Empty matches everything.
#[derive(Debug, Clone, Default)]
pub struct Filter(Vec<(&'static str, Value)>);

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    pub fn and(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.0.push((field, value.into()));
        self
    }

    pub fn conditions(&self) -> &[(&'static str, Value)] {
        &self.0
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.0
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub order: Order,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub limit: Option<u64>,
    pub sort: Option<Sort>,
}

impl FindOptions {
    /// The `limit` most recent documents by `field`, newest first.
    pub fn latest(field: &'static str, limit: u64) -> Self {
        Self {
            limit: Some(limit),
            sort: Some(Sort { field, order: Order::Descending }),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Matching documents. Without a sort they come back in insertion order;
    /// with one, ties keep insertion order in the sort's direction.
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<Value>>;

    async fn find_one(&self, collection: Collection, filter: Filter) -> StoreResult<Option<Value>>;

    /// Stores `doc` and returns its `_id`.
    async fn insert_one(&self, collection: Collection, doc: Value) -> StoreResult<String>;
}

/// Typed wrappers over [`Store`] for anything serde can round-trip.
#[async_trait]
pub trait StoreExt: Store {
    async fn find_as<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<T>> {
        self.find(collection, filter, options)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    async fn insert_as<T: Serialize + Sync>(&self, collection: Collection, doc: &T) -> StoreResult<String> {
        self.insert_one(collection, serde_json::to_value(doc)?).await
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Gives `doc` an `_id` unless it already has one, returning the id.
pub(crate) fn assign_id(doc: &mut Value) -> StoreResult<String> {
    let Value::Object(fields) = doc else {
        return Err(anyhow::anyhow!("expected a JSON object, got {doc}").into());
    };

    Ok(ensure_id(fields))
}

fn ensure_id(fields: &mut Map<String, Value>) -> String {
    match fields.get("_id").and_then(Value::as_str) {
        Some(id) => id.to_owned(),
        None => {
            let id = uuid::Uuid::now_v7().to_string();
            fields.insert("_id".to_owned(), Value::String(id.clone()));
            id
        }
    }
}
