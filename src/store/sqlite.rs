use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

use super::{Collection, Filter, FindOptions, Order, Store, StoreError, StoreResult, assign_id};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    collection TEXT NOT NULL,
    body TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS documents_collection ON documents (collection);";

/// Documents kept as JSON text in one SQLite table, keyed by collection.
/// Insertion order is `rowid` order.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let db_pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::with_pool(db_pool).await
    }

    /// A private database that lives as long as the store does.
    pub async fn in_memory() -> StoreResult<Self> {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(db_pool).await
    }

    pub async fn with_pool(db_pool: SqlitePool) -> StoreResult<Self> {
        sqlx::raw_sql(SCHEMA).execute(&db_pool).await?;
        Ok(Self { db_pool })
    }
}

fn direction(order: Order) -> &'static str {
    match order {
        Order::Ascending => "ASC",
        Order::Descending => "DESC",
    }
}

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

/// Builds the SELECT for `find`; parameters are bound in the order
/// collection, filter pairs, sort path, limit.
fn select_sql(filter: &Filter, options: &FindOptions) -> String {
    let mut sql = String::from("SELECT body FROM documents WHERE collection=?");
    for _ in filter.conditions() {
        sql += " AND json_extract(body, ?)=json_extract(?, '$')";
    }

    match options.sort {
        Some(sort) => {
            let dir = direction(sort.order);
            sql += &format!(" ORDER BY json_extract(body, ?) {dir}, rowid {dir}");
        }
        None => sql += " ORDER BY rowid",
    }

    if options.limit.is_some() {
        sql += " LIMIT ?";
    }

    sql
}

#[async_trait]
impl Store for SqliteStore {
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> StoreResult<Vec<Value>> {
        let sql = select_sql(&filter, &options);
        debug!(collection = collection.name(), %sql, "find");

        let mut query = sqlx::query_as::<_, (String,)>(&sql).bind(collection.name());
        for (field, value) in filter.conditions() {
            query = query.bind(json_path(field)).bind(serde_json::to_string(value)?);
        }
        if let Some(sort) = options.sort {
            query = query.bind(json_path(sort.field));
        }
        if let Some(limit) = options.limit {
            query = query.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = query.fetch_all(&self.db_pool).await?;
        rows.into_iter()
            .map(|(body,)| serde_json::from_str::<Value>(&body).map_err(StoreError::from))
            .collect()
    }

    async fn find_one(&self, collection: Collection, filter: Filter) -> StoreResult<Option<Value>> {
        let options = FindOptions { limit: Some(1), sort: None };
        Ok(self.find(collection, filter, options).await?.into_iter().next())
    }

    async fn insert_one(&self, collection: Collection, mut doc: Value) -> StoreResult<String> {
        let id = assign_id(&mut doc)?;
        sqlx::query("INSERT INTO documents (id,collection,body) values (?,?,?)")
            .bind(&id)
            .bind(collection.name())
            .bind(doc.to_string())
            .execute(&self.db_pool)
            .await?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    async fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().await.unwrap();
        for (text, time) in [("a", "10:00:02"), ("b", "10:00:01"), ("c", "10:00:02"), ("d", "10:00:03")] {
            store
                .insert_one(Collection::Messages, json!({ "text": text, "time": time, "n": text.len() }))
                .await
                .unwrap();
        }
        store
    }

    fn texts(docs: &[Value]) -> Vec<&str> {
        docs.iter().filter_map(|doc| doc["text"].as_str()).collect()
    }

    #[test]
    fn select_sql_binds_in_declared_order() {
        let filter = Filter::eq("name", "alice");
        let sql = select_sql(&filter, &FindOptions::latest("time", 5));

        assert_eq!(
            sql,
            "SELECT body FROM documents WHERE collection=? \
             AND json_extract(body, ?)=json_extract(?, '$') \
             ORDER BY json_extract(body, ?) DESC, rowid DESC LIMIT ?"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn find_without_options_keeps_insertion_order(#[future] store: SqliteStore) {
        let docs = store
            .await
            .find(Collection::Messages, Filter::all(), FindOptions::default())
            .await
            .unwrap();

        assert_eq!(texts(&docs), ["a", "b", "c", "d"]);
    }

    #[rstest]
    #[tokio::test]
    async fn latest_sorts_descending_with_newest_insert_first_on_ties(#[future] store: SqliteStore) {
        let docs = store
            .await
            .find(Collection::Messages, Filter::all(), FindOptions::latest("time", 3))
            .await
            .unwrap();

        assert_eq!(texts(&docs), ["d", "c", "a"]);
    }

    #[rstest]
    #[tokio::test]
    async fn filters_match_strings_and_numbers(#[future] store: SqliteStore) {
        let store = store.await;
        let by_time = store
            .find(Collection::Messages, Filter::eq("time", "10:00:02"), FindOptions::default())
            .await
            .unwrap();
        let by_both = store
            .find_one(Collection::Messages, Filter::eq("text", "b").and("n", 1))
            .await
            .unwrap();

        assert_eq!(texts(&by_time), ["a", "c"]);
        assert_eq!(by_both.unwrap()["time"], "10:00:01");
    }

    #[rstest]
    #[tokio::test]
    async fn inserted_documents_carry_their_id(#[future] store: SqliteStore) {
        let store = store.await;
        let id = store
            .insert_one(Collection::Users, json!({ "name": "alice", "lastStatus": 1 }))
            .await
            .unwrap();
        let doc = store
            .find_one(Collection::Users, Filter::eq("name", "alice"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(doc["_id"], json!(id));
        assert!(store.find_one(Collection::Messages, Filter::eq("name", "alice")).await.unwrap().is_none());
    }
}
