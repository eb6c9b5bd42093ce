use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};

/// Collection holding board tasks.
pub const TASKS: &str = "tasks";
/// Collection holding contacts.
pub const CONTACTS: &str = "contacts";
/// Collection holding registered users.
pub const USERS: &str = "users";

/// JSON document store with one path per collection.
///
/// Every call is independent: there are no retries and no transactions
/// spanning more than one entity.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Every entry of a collection. Missing or malformed data yields an empty list.
    async fn get_data(&self, path: &str) -> Result<Vec<Value>>;

    /// Creates an entry; the store assigns the id, which is written back into the entry.
    async fn add_data(&self, path: &str, item: Value) -> Result<Option<Value>>;

    async fn update_data(&self, path: &str, id: &str, patch: Value) -> Result<()>;

    async fn delete_data(&self, path: &str, id: &str) -> Result<()>;

    /// Overwrites a whole collection.
    async fn put_data(&self, path: &str, item: Value) -> Result<()>;
}

/// Firebase Realtime Database REST client.
pub struct RemoteStore {
    client: Client,
    base_url: String,
}

impl RemoteStore {
    pub fn new(base_url: &str) -> Self {
        RemoteStore {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn collection_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    pub fn entry_url(&self, path: &str, id: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, path.trim_matches('/'), id)
    }
}

async fn ensure_success(res: Response) -> Result<Response> {
    if res.status().is_success() {
        Ok(res)
    } else {
        let status = res.status().as_u16();
        let body = res.text().await?;
        Err(Error::Status { status, body })
    }
}

#[async_trait]
impl DataStore for RemoteStore {
    async fn get_data(&self, path: &str) -> Result<Vec<Value>> {
        let url = self.collection_url(path);
        let res = ensure_success(self.client.get(&url).send().await?).await?;
        let body = res.text().await?;

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(collect_entries(value)),
            Err(err) => {
                log::warn!("Ignoring malformed data at {}: {}", path, err);
                Ok(Vec::new())
            }
        }
    }

    async fn add_data(&self, path: &str, item: Value) -> Result<Option<Value>> {
        let url = self.collection_url(path);
        let res = ensure_success(self.client.post(&url).json(&item).send().await?).await?;
        let created = res.json::<Value>().await?;

        let Some(id) = created.get("name").and_then(Value::as_str) else {
            log::warn!("Store did not return an id for new entry in {}", path);
            return Ok(None);
        };

        self.update_data(path, id, json!({ "id": id })).await?;

        let mut item = item;
        if let Value::Object(map) = &mut item {
            map.insert("id".to_string(), Value::String(id.to_string()));
        }
        Ok(Some(item))
    }

    async fn update_data(&self, path: &str, id: &str, patch: Value) -> Result<()> {
        let url = self.entry_url(path, id);
        ensure_success(self.client.patch(&url).json(&patch).send().await?).await?;
        Ok(())
    }

    async fn delete_data(&self, path: &str, id: &str) -> Result<()> {
        let url = self.entry_url(path, id);
        ensure_success(self.client.delete(&url).send().await?).await?;
        Ok(())
    }

    async fn put_data(&self, path: &str, item: Value) -> Result<()> {
        let url = self.collection_url(path);
        ensure_success(self.client.put(&url).json(&item).send().await?).await?;
        Ok(())
    }
}

/// Flattens a collection document into its entries.
///
/// Objects are keyed by id, and the key is copied into entries that lack an
/// `id` field. Arrays (what the store returns for integer keys) drop their
/// `null` holes. Anything else is treated as an empty collection.
pub fn collect_entries(value: Value) -> Vec<Value> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, entry)| entry.is_object())
            .map(|(key, mut entry)| {
                if let Value::Object(fields) = &mut entry {
                    fields.entry("id").or_insert(Value::String(key));
                }
                entry
            })
            .collect(),
        Value::Array(items) => items.into_iter().filter(Value::is_object).collect(),
        _ => Vec::new(),
    }
}
