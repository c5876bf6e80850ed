// store.rs
// Persistent collection store: one named slot per entity list, always
// loaded whole and saved whole.

use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Durable key-value backend holding one serialized collection per slot.
pub trait SlotStore: Send + Sync {
    fn read(&self, slot: &str) -> AppResult<Option<String>>;
    fn write(&self, slot: &str, contents: &str) -> AppResult<()>;
    fn remove(&self, slot: &str) -> AppResult<()>;
}

/// Directory-backed store: `<dir>/<slot>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| AppError::Io {
            slot: dir.display().to_string(),
            source,
        })?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

impl SlotStore for FileStore {
    fn read(&self, slot: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path_for(slot)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(AppError::Io {
                slot: slot.to_string(),
                source,
            }),
        }
    }

    /// Each write goes through its own uniquely named temp file in the same
    /// directory and is renamed over the target, so concurrent writers never
    /// share an inode and the last rename wins.
    fn write(&self, slot: &str, contents: &str) -> AppResult<()> {
        let io_err = |source| AppError::Io {
            slot: slot.to_string(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(contents.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(self.path_for(slot))
            .map_err(|err| io_err(err.error))?;
        Ok(())
    }

    fn remove(&self, slot: &str) -> AppResult<()> {
        match fs::remove_file(self.path_for(slot)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AppError::Io {
                slot: slot.to_string(),
                source,
            }),
        }
    }
}

/// In-process store; every instance is an independent copy of the data.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemoryStore {
    fn read(&self, slot: &str) -> AppResult<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        Ok(slots.get(slot).cloned())
    }

    fn write(&self, slot: &str, contents: &str) -> AppResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.insert(slot.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> AppResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.remove(slot);
        Ok(())
    }
}

/// Typed view over one slot holding a JSON array of records.
pub struct Collection<T> {
    slot: &'static str,
    backend: Arc<dyn SlotStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Collection {
            slot: self.slot,
            backend: Arc::clone(&self.backend),
            _marker: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(backend: Arc<dyn SlotStore>, slot: &'static str) -> Self {
        Collection {
            slot,
            backend,
            _marker: PhantomData,
        }
    }

    pub fn slot(&self) -> &'static str {
        self.slot
    }

    /// Whole collection; an absent slot is empty, an unparsable one is an error.
    pub fn load_all(&self) -> AppResult<Vec<T>> {
        let Some(contents) = self.backend.read(self.slot)? else {
            debug!(slot = self.slot, "slot empty");
            return Ok(Vec::new());
        };
        let items: Vec<T> =
            serde_json::from_str(&contents).map_err(|source| AppError::Storage {
                slot: self.slot.to_string(),
                source,
            })?;
        debug!(slot = self.slot, count = items.len(), "slot loaded");
        Ok(items)
    }

    /// Overwrite the stored collection with `items`.
    pub fn save_all(&self, items: &[T]) -> AppResult<()> {
        let contents = serde_json::to_string(items).map_err(|source| AppError::Storage {
            slot: self.slot.to_string(),
            source,
        })?;
        self.backend.write(self.slot, &contents)
    }

    pub fn find<P>(&self, mut predicate: P) -> AppResult<Option<T>>
    where
        P: FnMut(&T) -> bool,
    {
        Ok(self.load_all()?.into_iter().find(|item| predicate(item)))
    }

    pub fn filter<P>(&self, mut predicate: P) -> AppResult<Vec<T>>
    where
        P: FnMut(&T) -> bool,
    {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|item| predicate(item))
            .collect())
    }

    pub fn insert(&self, item: T) -> AppResult<()> {
        let mut items = self.load_all()?;
        items.push(item);
        self.save_all(&items)
    }

    /// Remove every record matching `predicate`; returns how many went away.
    pub fn remove_where<P>(&self, mut predicate: P) -> AppResult<usize>
    where
        P: FnMut(&T) -> bool,
    {
        let mut items = self.load_all()?;
        let before = items.len();
        items.retain(|item| !predicate(item));
        let removed = before - items.len();
        if removed > 0 {
            self.save_all(&items)?;
        }
        Ok(removed)
    }
}

/// Slot holding a single optional record rather than a list.
pub struct Slot<T> {
    slot: &'static str,
    backend: Arc<dyn SlotStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Slot {
            slot: self.slot,
            backend: Arc::clone(&self.backend),
            _marker: PhantomData,
        }
    }
}

impl<T> Slot<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(backend: Arc<dyn SlotStore>, slot: &'static str) -> Self {
        Slot {
            slot,
            backend,
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> AppResult<Option<T>> {
        match self.backend.read(self.slot)? {
            None => Ok(None),
            Some(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|source| AppError::Storage {
                    slot: self.slot.to_string(),
                    source,
                }),
        }
    }

    pub fn set(&self, value: &T) -> AppResult<()> {
        let contents = serde_json::to_string(value).map_err(|source| AppError::Storage {
            slot: self.slot.to_string(),
            source,
        })?;
        self.backend.write(self.slot, &contents)
    }

    pub fn clear(&self) -> AppResult<()> {
        self.backend.remove(self.slot)
    }
}
