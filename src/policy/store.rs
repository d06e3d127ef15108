use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tempfile::NamedTempFile;

/// A single persisted preference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
}

impl PrefValue {
    fn kind(self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
        }
    }
}

/// One consistent read of the whole namespace.
///
/// Every key comes from the same read, so a value is never mixed with one
/// written after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefSnapshot {
    values: BTreeMap<String, PrefValue>,
    /// Keys holding a value the store cannot represent, with its type name.
    unsupported: BTreeMap<String, &'static str>,
}

impl PrefSnapshot {
    pub fn get(&self, key: &str) -> Result<Option<PrefValue>, StoreError> {
        if let Some(found) = self.unsupported.get(key) {
            return Err(StoreError::TypeMismatch {
                key: key.to_string(),
                found: *found,
            });
        }
        Ok(self.values.get(key).copied())
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>, StoreError> {
        match self.get(key)? {
            None => Ok(None),
            Some(PrefValue::Int(value)) => Ok(Some(value)),
            Some(other) => Err(StoreError::TypeMismatch {
                key: key.to_string(),
                found: other.kind(),
            }),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        match self.get(key)? {
            None => Ok(None),
            Some(PrefValue::Bool(value)) => Ok(Some(value)),
            Some(other) => Err(StoreError::TypeMismatch {
                key: key.to_string(),
                found: other.kind(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.unsupported.is_empty()
    }
}

/// Flat namespaced key/value store holding the policy configuration.
///
/// A missing key is `Ok(None)`; callers resolve it to a documented default.
/// Readers take a [`PrefSnapshot`] per evaluation and writers commit related
/// keys together with [`PreferenceStore::put_many`].
pub trait PreferenceStore: Send + Sync {
    fn snapshot(&self) -> Result<PrefSnapshot, StoreError>;

    /// Writes every entry in a single commit.
    fn put_many(&self, entries: &[(&str, PrefValue)]) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<Option<PrefValue>, StoreError> {
        self.snapshot()?.get(key)
    }

    fn put(&self, key: &str, value: PrefValue) -> Result<(), StoreError> {
        self.put_many(&[(key, value)])
    }

    fn get_int(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.snapshot()?.get_int(key)
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        self.snapshot()?.get_bool(key)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<BTreeMap<String, PrefValue>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn snapshot(&self) -> Result<PrefSnapshot, StoreError> {
        let values = self
            .values
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        Ok(PrefSnapshot {
            values,
            unsupported: BTreeMap::new(),
        })
    }

    fn put_many(&self, entries: &[(&str, PrefValue)]) -> Result<(), StoreError> {
        let mut values = self
            .values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for (key, value) in entries {
            values.insert((*key).to_string(), *value);
        }
        Ok(())
    }
}

/// File-backed store: one TOML table named after the namespace.
///
/// Every snapshot re-reads the file so edits made by another process are
/// seen on the next evaluation.
#[derive(Debug)]
pub struct TomlPreferenceStore {
    path: PathBuf,
    namespace: String,
    write_lock: Mutex<()>,
}

impl TomlPreferenceStore {
    pub fn new(path: impl AsRef<Path>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            namespace: namespace.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<toml::Table, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                toml::from_str(&contents).map_err(|e| StoreError::Parse(e.to_string()))
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(toml::Table::new()),
            Err(error) => Err(error.into()),
        }
    }
}

impl PreferenceStore for TomlPreferenceStore {
    fn snapshot(&self) -> Result<PrefSnapshot, StoreError> {
        let document = self.read_document()?;
        let mut snapshot = PrefSnapshot::default();
        let Some(table) = document.get(&self.namespace).and_then(toml::Value::as_table) else {
            return Ok(snapshot);
        };
        for (key, value) in table {
            match value {
                toml::Value::Boolean(b) => {
                    snapshot.values.insert(key.clone(), PrefValue::Bool(*b));
                }
                toml::Value::Integer(i) => {
                    snapshot.values.insert(key.clone(), PrefValue::Int(*i));
                }
                other => {
                    snapshot.unsupported.insert(key.clone(), other.type_str());
                }
            }
        }
        Ok(snapshot)
    }

    /// Rewrites the document into a sibling temp file and renames it over
    /// the target, so readers see either the old or the new file in full.
    fn put_many(&self, entries: &[(&str, PrefValue)]) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut document = self.read_document()?;
        let section = document
            .entry(self.namespace.clone())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if !section.is_table() {
            *section = toml::Value::Table(toml::Table::new());
        }
        if let toml::Value::Table(table) = section {
            for (key, value) in entries {
                let value = match value {
                    PrefValue::Bool(b) => toml::Value::Boolean(*b),
                    PrefValue::Int(i) => toml::Value::Integer(*i),
                };
                table.insert((*key).to_string(), value);
            }
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let rendered =
            toml::to_string_pretty(&document).map_err(|e| StoreError::Serialize(e.to_string()))?;

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(rendered.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}
