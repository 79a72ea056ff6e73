//! Settings persistence and the sanitize pipeline
//!
//! The public route list is stored as a single value under a fixed settings
//! key. Whatever arrives from an admin form (a comma-joined string, a list,
//! or something malformed) is reduced to a list of raw route strings here,
//! then handed to the typed engine entry point.
//!
//! ```text
//! form value → SettingsValue::into_raw_routes → PublicRouteSet::from_raw
//!            → SettingsStore::save → AccessEngine::replace
//! ```

use crate::engine::AccessEngine;
use crate::error::{Result, RouteGateError};
use crate::routes::{split_form_field, PublicRouteSet};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings key the public route list is stored under
pub const PUBLIC_ROUTES_KEY: &str = "public_endpoints";

/// Raw settings input as submitted by an admin form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingsValue {
    /// Comma-joined route list
    Joined(String),
    /// Already split list; non-string items are ignored
    List(Vec<Value>),
    /// Anything else is treated as an empty list
    Other(Value),
}

impl SettingsValue {
    /// Reduce the input to raw route strings.
    ///
    /// Malformed input never fails; it just yields fewer routes, which means
    /// more of the API requires authentication.
    pub fn into_raw_routes(self) -> Vec<String> {
        match self {
            SettingsValue::Joined(field) => split_form_field(&field),
            SettingsValue::List(items) => {
                let total = items.len();
                let routes: Vec<String> = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(route) => Some(route),
                        _ => None,
                    })
                    .collect();
                if routes.len() != total {
                    warn!(
                        dropped = total - routes.len(),
                        "Ignoring non-string entries in public route list"
                    );
                }
                routes
            }
            SettingsValue::Other(value) => {
                if !value.is_null() {
                    warn!(?value, "Malformed public route settings, treating as empty");
                }
                Vec::new()
            }
        }
    }
}

impl From<&str> for SettingsValue {
    fn from(field: &str) -> Self {
        SettingsValue::Joined(field.to_string())
    }
}

impl From<Vec<String>> for SettingsValue {
    fn from(routes: Vec<String>) -> Self {
        SettingsValue::List(routes.into_iter().map(Value::String).collect())
    }
}

/// Persistence for settings values keyed by name
pub trait SettingsStore: Send + Sync {
    /// Load the stored value, `None` when the key has never been written
    fn load(&self, key: &str) -> Result<Option<SettingsValue>>;

    /// Store the canonical route list under `key`
    fn save(&self, key: &str, routes: &PublicRouteSet) -> Result<()>;
}

/// In-process settings store
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, Vec<String>>>,
}

impl MemorySettingsStore {
    /// Create an empty store
    pub fn new() -> Self {
        MemorySettingsStore::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, key: &str) -> Result<Option<SettingsValue>> {
        Ok(self.values.read().get(key).cloned().map(SettingsValue::from))
    }

    fn save(&self, key: &str, routes: &PublicRouteSet) -> Result<()> {
        self.values
            .write()
            .insert(key.to_string(), routes.entries().to_vec());
        Ok(())
    }
}

/// JSON file settings store
///
/// The file holds one object mapping settings keys to values. Keys other
/// than the one being written are preserved.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    /// Create a store backed by `path`; the file is created on first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSettingsStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(RouteGateError::SettingsError(format!(
                "Expected a JSON object in {:?}, found {}",
                self.path,
                json_kind(&other)
            ))),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self, key: &str) -> Result<Option<SettingsValue>> {
        let mut document = self.read_document()?;
        match document.remove(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, routes: &PublicRouteSet) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut document = self.read_document()?;
        document.insert(key.to_string(), serde_json::to_value(routes)?);

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&Value::Object(document))?)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = ?self.path, key, entries = routes.len(), "Settings written");
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Ties the settings store to the engine
///
/// Writes are persisted before they are published, so a failed save leaves
/// the current public set in force. Persist and publish run under one lock,
/// so the stored value and the published set never come from different
/// submissions.
pub struct SettingsService {
    engine: Arc<AccessEngine>,
    store: Arc<dyn SettingsStore>,
    key: String,
    publish_lock: Mutex<()>,
}

impl SettingsService {
    /// Create a service using the default settings key
    pub fn new(engine: Arc<AccessEngine>, store: Arc<dyn SettingsStore>) -> Self {
        Self::with_key(engine, store, PUBLIC_ROUTES_KEY)
    }

    /// Create a service storing routes under a custom key
    pub fn with_key(
        engine: Arc<AccessEngine>,
        store: Arc<dyn SettingsStore>,
        key: impl Into<String>,
    ) -> Self {
        SettingsService {
            engine,
            store,
            key: key.into(),
            publish_lock: Mutex::new(()),
        }
    }

    /// Settings key in use
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The engine this service publishes to
    pub fn engine(&self) -> &Arc<AccessEngine> {
        &self.engine
    }

    /// Read the stored value and publish it. A missing key means no
    /// public routes.
    pub fn load_into_engine(&self) -> Result<Arc<PublicRouteSet>> {
        let _guard = self.publish_lock.lock();
        let raw = self
            .store
            .load(&self.key)?
            .map(SettingsValue::into_raw_routes)
            .unwrap_or_default();

        let routes = self.engine.set_public_routes(raw);
        info!(key = %self.key, public_routes = routes.len(), "Loaded public routes from settings");
        Ok(routes)
    }

    /// Sanitize, persist and publish an admin submission
    pub fn save(&self, value: SettingsValue) -> Result<Arc<PublicRouteSet>> {
        let routes = PublicRouteSet::from_raw(self.engine.normalizer(), value.into_raw_routes());
        let _guard = self.publish_lock.lock();
        self.store.save(&self.key, &routes)?;
        Ok(self.engine.replace(routes))
    }

    /// Confirm the stored value can be read. Nothing is published.
    pub fn check_store(&self) -> Result<()> {
        self.store.load(&self.key).map(|_| ())
    }

    /// Current public routes
    pub fn current(&self) -> Arc<PublicRouteSet> {
        self.engine.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn service(store: Arc<dyn SettingsStore>) -> SettingsService {
        SettingsService::new(Arc::new(AccessEngine::default()), store)
    }

    #[test]
    fn test_joined_string_is_split() {
        let value: SettingsValue = serde_json::from_value(json!("a, ,b")).unwrap();
        assert_eq!(value.into_raw_routes(), vec!["a", " ", "b"]);
    }

    #[test]
    fn test_list_keeps_strings_only() {
        let value: SettingsValue = serde_json::from_value(json!(["a", 1, null, "b"])).unwrap();
        assert_eq!(value.into_raw_routes(), vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_input_is_empty() {
        for raw in [json!(42), json!(true), json!({"a": "b"}), json!(null)] {
            let value: SettingsValue = serde_json::from_value(raw).unwrap();
            assert!(value.into_raw_routes().is_empty());
        }
    }

    #[test]
    fn test_save_publishes_and_persists() {
        let store = Arc::new(MemorySettingsStore::new());
        let svc = service(store.clone());

        let routes = svc.save("posts, /wp-json/posts, pages".into()).unwrap();
        assert_eq!(routes.entries(), &["/wp-json/posts", "/wp-json/pages"]);
        assert_eq!(svc.current(), routes);

        let stored = store.load(PUBLIC_ROUTES_KEY).unwrap().unwrap();
        assert_eq!(stored.into_raw_routes(), vec!["/wp-json/posts", "/wp-json/pages"]);
    }

    #[test]
    fn test_load_missing_key_is_empty() {
        let svc = service(Arc::new(MemorySettingsStore::new()));
        assert!(svc.load_into_engine().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"site_name": "demo"}"#).unwrap();

        let store = Arc::new(FileSettingsStore::new(&path));
        let svc = service(store.clone());
        svc.save(SettingsValue::from(vec!["custom/v1/public".to_string()]))
            .unwrap();

        let document: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["site_name"], "demo");
        assert_eq!(document[PUBLIC_ROUTES_KEY], json!(["/wp-json/custom/v1/public"]));

        let reloaded = service(store);
        let routes = reloaded.load_into_engine().unwrap();
        assert_eq!(routes.entries(), &["/wp-json/custom/v1/public"]);
    }

    #[test]
    fn test_file_store_rejects_non_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2]").unwrap();

        let store = FileSettingsStore::new(&path);
        assert!(matches!(store.load(PUBLIC_ROUTES_KEY), Err(RouteGateError::SettingsError(_))));
    }

    #[test]
    fn test_failed_save_keeps_current_set() {
        struct FailingStore;
        impl SettingsStore for FailingStore {
            fn load(&self, _key: &str) -> Result<Option<SettingsValue>> {
                Ok(None)
            }
            fn save(&self, _key: &str, _routes: &PublicRouteSet) -> Result<()> {
                Err(RouteGateError::SettingsError("disk full".to_string()))
            }
        }

        let svc = service(Arc::new(FailingStore));
        svc.engine().set_public_routes(["kept"]);
        assert!(svc.save("replaced".into()).is_err());
        assert_eq!(svc.current().entries(), &["/wp-json/kept"]);
    }
}
