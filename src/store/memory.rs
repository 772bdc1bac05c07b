use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use serde_json::Value;

use super::{Collection, Filter, FindOptions, Order, Store, StoreError, StoreResult, assign_id};

/// Process-local store. Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> StoreError {
    anyhow::anyhow!("memory store lock poisoned: {err}").into()
}

/// Strings compare lexically, numbers numerically; anything else is a tie.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().map_err(poisoned)?;
        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<(usize, &Value)> = docs
            .iter()
            .enumerate()
            .filter(|(_, doc)| filter.matches(doc))
            .collect();

        if let Some(sort) = options.sort {
            matched.sort_by(|(ia, a), (ib, b)| {
                let ordering = compare_fields(a.get(sort.field), b.get(sort.field)).then(ia.cmp(ib));
                match sort.order {
                    Order::Ascending => ordering,
                    Order::Descending => ordering.reverse(),
                }
            });
        }

        let limit = options
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn find_one(&self, collection: Collection, filter: Filter) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().map_err(poisoned)?;

        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)))
            .cloned())
    }

    async fn insert_one(&self, collection: Collection, mut doc: Value) -> StoreResult<String> {
        let id = assign_id(&mut doc)?;
        self.collections
            .write()
            .map_err(poisoned)?
            .entry(collection)
            .or_default()
            .push(doc);

        Ok(id)
    }
}
