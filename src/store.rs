use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::model::{Entity, EntityId};
use crate::utils::json_file_storage::{JsonFileStorage, StorageError};

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0} store lock poisoned")]
    Poisoned(&'static str),
    #[error("{0} ids exhausted")]
    IdsExhausted(&'static str),
}

/// Entities keyed by id. On disk it is a JSON array in ascending id order.
struct Collection<E>(BTreeMap<EntityId, E>);

impl<E: Entity> Serialize for Collection<E> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.values())
    }
}

struct CollectionVisitor<E>(PhantomData<E>);

impl<'de, E: Entity> Visitor<'de> for CollectionVisitor<E> {
    type Value = Collection<E>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "an array of {} objects", E::KIND)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut entities = BTreeMap::new();
        while let Some(entity) = seq.next_element::<E>()? {
            entities.insert(entity.id(), entity);
        }
        Ok(Collection(entities))
    }
}

impl<'de, E: Entity> Deserialize<'de> for Collection<E> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(CollectionVisitor(PhantomData))
    }
}

struct Cache<E> {
    entities: Collection<E>,
    next_id: EntityId,
}

impl<E: Entity> Cache<E> {
    fn new(entities: Collection<E>) -> Result<Self> {
        let next_id = match entities.0.keys().next_back() {
            Some(max) => max
                .checked_add(1)
                .ok_or(StoreError::IdsExhausted(E::KIND))?,
            None => 0,
        };
        Ok(Self { entities, next_id })
    }

    /// Hands out `next_id` only while its successor is still representable,
    /// so the counter always stays above every assigned id.
    fn next_id(&mut self) -> Result<EntityId> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted(E::KIND))?;
        Ok(id)
    }

    fn select(&self, filter: impl Fn(&E) -> bool) -> Vec<E> {
        self.entities.0.values().filter(|e| filter(*e)).cloned().collect()
    }
}

/// In-memory cache of one entity collection, backed by a JSON file.
///
/// Every public operation runs entirely under the store's lock. Mutations
/// rewrite the whole file before returning, so once a call succeeds the file
/// and the cache hold the same collection. If the write fails the in-memory
/// change is kept and the error is returned; the next successful flush
/// brings the file back in line.
pub struct FileStore<E> {
    storage: JsonFileStorage<Collection<E>>,
    cache: RwLock<Cache<E>>,
}

impl<E: Entity> FileStore<E> {
    /// Loads the whole collection from `path`.
    pub fn open(path: PathBuf) -> Result<Self> {
        let storage = JsonFileStorage::new(path);
        let entities = storage.load()?;
        let cache = Cache::new(entities)?;
        log::info!(
            "Loaded {} {} entities from {}, next id {}",
            cache.entities.0.len(),
            E::KIND,
            storage.path().display(),
            cache.next_id
        );
        Ok(Self {
            storage,
            cache: RwLock::new(cache),
        })
    }

    /// Writes an empty collection to `path` unless a file is already there.
    /// Returns whether a file was created.
    pub fn bootstrap(path: &Path) -> Result<bool> {
        let storage = JsonFileStorage::<Collection<E>>::new(path.to_path_buf());
        if storage.exists() {
            return Ok(false);
        }
        log::info!("Creating empty {} file {}", E::KIND, path.display());
        storage.store(&Collection(BTreeMap::new()))?;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    pub fn get(&self, id: EntityId) -> Result<Option<E>> {
        Ok(self.read()?.entities.0.get(&id).cloned())
    }

    pub fn list(&self) -> Result<Vec<E>> {
        Ok(self.read()?.select(|_| true))
    }

    /// Case-sensitive substring match on the name. An empty pattern matches everything.
    pub fn search(&self, pattern: &str) -> Result<Vec<E>> {
        Ok(self.read()?.select(|e| e.name().contains(pattern)))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.entities.0.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// First stored entity whose content equals `draft`, ids not compared.
    pub fn find_duplicate(&self, draft: &E) -> Result<Option<E>> {
        let cache = self.read()?;
        Ok(cache
            .entities
            .0
            .values()
            .find(|e| e.same_content(draft))
            .cloned())
    }

    /// Stores `draft` under a fresh id; whatever id `draft` carries is ignored.
    pub fn create(&self, draft: E) -> Result<E> {
        let mut cache = self.write()?;
        let id = cache.next_id()?;
        let entity = draft.with_id(id);
        cache.entities.0.insert(id, entity.clone());
        log::debug!("Created {} {}", E::KIND, id);
        self.flush(&cache)?;
        Ok(entity)
    }

    /// Replaces the stored entity with the same id. `None` if there is none.
    pub fn update(&self, entity: E) -> Result<Option<E>> {
        let mut cache = self.write()?;
        let id = entity.id();
        match cache.entities.0.get_mut(&id) {
            Some(stored) => *stored = entity.clone(),
            None => return Ok(None),
        }
        log::debug!("Updated {} {}", E::KIND, id);
        self.flush(&cache)?;
        Ok(Some(entity))
    }

    /// Returns `false` if there was nothing to delete.
    pub fn delete(&self, id: EntityId) -> Result<bool> {
        let mut cache = self.write()?;
        if cache.entities.0.remove(&id).is_none() {
            return Ok(false);
        }
        log::debug!("Deleted {} {}", E::KIND, id);
        self.flush(&cache)?;
        Ok(true)
    }

    fn flush(&self, cache: &Cache<E>) -> Result<()> {
        self.storage.store(&cache.entities).map_err(From::from)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Cache<E>>> {
        self.cache.read().map_err(|_| StoreError::Poisoned(E::KIND))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Cache<E>>> {
        self.cache.write().map_err(|_| StoreError::Poisoned(E::KIND))
    }
}
