#![allow(dead_code)]

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use join_board::api::{DataStore, CONTACTS, TASKS};
use join_board::app::App;
use join_board::config::UiConfig;
use join_board::error::{Error, Result};
use join_board::session::SessionStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records every update and keeps collections in memory.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    pub updates: Mutex<Vec<(String, String, Value)>>,
    pub fail_updates: AtomicBool,
    next_id: AtomicUsize,
}

impl MemoryStore {
    pub fn with_demo_data() -> Arc<MemoryStore> {
        let store = MemoryStore::default();
        {
            let mut collections = store.collections.lock().unwrap();
            collections.insert(
                TASKS.to_string(),
                join_board::seed::demo_tasks()
                    .iter()
                    .map(|t| serde_json::to_value(t).unwrap())
                    .collect(),
            );
            collections.insert(
                CONTACTS.to_string(),
                join_board::seed::demo_contacts()
                    .iter()
                    .map(|c| serde_json::to_value(c).unwrap())
                    .collect(),
            );
        }
        Arc::new(store)
    }

    pub fn updates(&self) -> Vec<(String, String, Value)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn entries(&self, path: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn get_data(&self, path: &str) -> Result<Vec<Value>> {
        Ok(self.entries(path))
    }

    async fn add_data(&self, path: &str, mut item: Value) -> Result<Option<Value>> {
        let id = format!("-N{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        item["id"] = json!(id);
        self.collections
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push(item.clone());
        Ok(Some(item))
    }

    async fn update_data(&self, path: &str, id: &str, patch: Value) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((path.to_string(), id.to_string(), patch.clone()));
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let mut collections = self.collections.lock().unwrap();
        if let Some(entry) = collections
            .get_mut(path)
            .and_then(|entries| entries.iter_mut().find(|e| e["id"] == id))
        {
            if let (Some(entry), Some(patch)) = (entry.as_object_mut(), patch.as_object()) {
                for (key, value) in patch {
                    entry.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete_data(&self, path: &str, id: &str) -> Result<()> {
        if let Some(entries) = self.collections.lock().unwrap().get_mut(path) {
            entries.retain(|e| e["id"] != id);
        }
        Ok(())
    }

    async fn put_data(&self, path: &str, item: Value) -> Result<()> {
        let entries = match item {
            Value::Object(map) => map.into_iter().map(|(_, value)| value).collect(),
            _ => Vec::new(),
        };
        self.collections
            .lock()
            .unwrap()
            .insert(path.to_string(), entries);
        Ok(())
    }
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("join-test-{}", uuid::Uuid::new_v4()))
}

pub fn new_app(store: Arc<MemoryStore>, ui: UiConfig) -> App {
    let session = SessionStore::open(temp_dir()).unwrap();
    let mut app = App::new(store, session, ui);
    app.splash_until = None;
    app
}

pub fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

pub async fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_key(press(KeyCode::Char(c))).await;
    }
}
