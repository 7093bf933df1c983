//! Small JSON key-value file used to persist view state between sessions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use shared_types::Filters;

use crate::error::CalendarResult;

/// Key under which the active filters are stored
pub const FILTERS_KEY: &str = "adminCalendarFilters";

const STORE_FILE: &str = "state.json";

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store file `state.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CalendarResult<Option<T>> {
        match self.read_all()?.remove(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> CalendarResult<()> {
        // A corrupt file is replaced rather than blocking every later write
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), serde_json::to_value(value)?);
        self.write_all(&entries)
    }

    pub fn remove(&self, key: &str) -> CalendarResult<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn read_all(&self) -> CalendarResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, entries: &Map<String, Value>) -> CalendarResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Persistence of the calendar filters under [`FILTERS_KEY`]
#[derive(Debug, Clone)]
pub struct FilterStore {
    store: JsonStore,
}

impl FilterStore {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// Saved filters, or the defaults when nothing usable is stored
    pub fn load(&self) -> Filters {
        match self.store.get::<Filters>(FILTERS_KEY) {
            Ok(Some(filters)) => filters,
            Ok(None) => Filters::default(),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable filters in {}: {}",
                    self.store.path().display(),
                    e
                );
                Filters::default()
            }
        }
    }

    pub fn save(&self, filters: &Filters) -> CalendarResult<()> {
        self.store.set(FILTERS_KEY, filters)?;
        tracing::debug!("Saved calendar filters to {}", self.store.path().display());
        Ok(())
    }
}
