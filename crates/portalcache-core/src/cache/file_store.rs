use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

use super::cached::{CachedData, ScopeDocument};
use super::rows::EntityKind;
use super::store::{LocalStore, Scope, StoreError, Tables};

/// Local store persisting one JSON document per scope.
///
/// Each document holds every table of its scope, so a multi-table replace is
/// a single temp-file write followed by an atomic rename. Writers to the same
/// scope are serialized; different scopes never contend. `clear` waits for
/// in-flight writers of every scope.
pub struct FileStore {
    cache_dir: PathBuf,
    locks: Mutex<HashMap<Scope, Arc<RwLock<()>>>>,
    // Held shared by writers, exclusively by `clear`
    clearing: RwLock<()>,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&cache_dir).map_err(io_error(&cache_dir))?;
        Ok(Self {
            cache_dir,
            locks: Mutex::new(HashMap::new()),
            clearing: RwLock::new(()),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn document_path(&self, scope: &Scope) -> PathBuf {
        self.cache_dir.join(format!("{}.json", scope.file_stem()))
    }

    fn lock_for(&self, scope: &Scope) -> Result<Arc<RwLock<()>>, StoreError> {
        let mut locks = self.locks.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(Arc::clone(locks.entry(scope.clone()).or_default()))
    }

    async fn load(&self, path: &Path) -> Result<Option<CachedData<ScopeDocument>>, StoreError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path)(e)),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        let cached = serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(cached))
    }

    /// Write to a sibling temp file, fsync, then rename over the document.
    /// An interrupted save leaves the previous document in place.
    async fn save(&self, path: &Path, document: &CachedData<ScopeDocument>) -> Result<(), StoreError> {
        let contents = serde_json::to_vec_pretty(document)?;
        let tmp_path = path.with_extension("json.tmp");

        let mut tmp_file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(io_error(&tmp_path))?;
        tmp_file
            .write_all(&contents)
            .await
            .map_err(io_error(&tmp_path))?;
        tmp_file.sync_all().await.map_err(io_error(&tmp_path))?;
        drop(tmp_file);

        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(io_error(path))?;
        Ok(())
    }

    /// Delete every cached document and any temp file left by an interrupted
    /// save. Returns the number of documents removed.
    pub async fn clear(&self) -> Result<usize, StoreError> {
        let _guard = self.clearing.write().await;
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.cache_dir)
            .await
            .map_err(io_error(&self.cache_dir))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(io_error(&self.cache_dir))?
        {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(".json") {
                tokio::fs::remove_file(&path).await.map_err(io_error(&path))?;
                removed += 1;
            } else if name.ends_with(".json.tmp") {
                tokio::fs::remove_file(&path).await.map_err(io_error(&path))?;
            }
        }
        debug!(removed = removed, "Cache cleared");
        Ok(removed)
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn replace_many(&self, scope: &Scope, tables: Tables) -> Result<(), StoreError> {
        tables.validate(scope)?;

        let _clearing = self.clearing.read().await;
        let lock = self.lock_for(scope)?;
        let _guard = lock.write().await;

        let path = self.document_path(scope);
        // A corrupt document is simply overwritten
        let mut document = match self.load(&path).await {
            Ok(Some(cached)) => cached.data,
            Ok(None) => ScopeDocument::default(),
            Err(e) => {
                debug!(scope = %scope, error = %e, "Discarding unreadable cache document");
                ScopeDocument::default()
            }
        };

        let mut counts = Vec::new();
        for (kind, rows) in tables {
            counts.push(format!("{}={}", kind, rows.len()));
            document.set(kind, rows);
        }

        self.save(&path, &CachedData::new(document)).await?;
        debug!(scope = %scope, tables = %counts.join(","), "Cache replaced");
        Ok(())
    }

    async fn read_many(&self, scope: &Scope, kinds: &[EntityKind]) -> Result<Tables, StoreError> {
        let lock = self.lock_for(scope)?;
        let _guard = lock.read().await;

        let document = self
            .load(&self.document_path(scope))
            .await?
            .map(|cached| cached.data)
            .unwrap_or_default();

        let mut tables = Tables::new();
        for &kind in kinds {
            tables.insert(kind, document.rows(kind));
        }
        Ok(tables)
    }

    async fn cached_at(&self, scope: &Scope) -> Result<Option<DateTime<Utc>>, StoreError> {
        let lock = self.lock_for(scope)?;
        let _guard = lock.read().await;
        Ok(self
            .load(&self.document_path(scope))
            .await?
            .map(|cached| cached.cached_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::rows::{EventRow, NamedRow, StoredRow};

    fn event(id: &str) -> StoredRow {
        StoredRow::Event(EventRow {
            id: id.to_string(),
            name_en: id.to_uppercase(),
            name_zh: id.to_uppercase(),
            logo_url: format!("https://example.org/{}.png", id),
            is_logo_tinted: false,
        })
    }

    fn named(kind: EntityKind, id: &str) -> StoredRow {
        let row = NamedRow {
            event_id: "sitcon2025".to_string(),
            id: id.to_string(),
            name_en: format!("{} en", id),
            name_zh: format!("{} zh", id),
        };
        match kind {
            EntityKind::Room => StoredRow::Room(row),
            EntityKind::Tag => StoredRow::Tag(row),
            _ => StoredRow::SessionType(row),
        }
    }

    #[tokio::test]
    async fn test_replace_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        assert!(store.read_all(&Scope::Global, EntityKind::Event).await.unwrap().is_empty());
        assert!(store.cached_at(&Scope::Global).await.unwrap().is_none());

        store
            .replace_all(&Scope::Global, EntityKind::Event, vec![event("a"), event("b")])
            .await
            .unwrap();

        let rows = store.read_all(&Scope::Global, EntityKind::Event).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(store.cached_at(&Scope::Global).await.unwrap().is_some());

        let b = store.read(&Scope::Global, EntityKind::Event, "b").await.unwrap();
        assert_eq!(b, Some(event("b")));
        assert!(store.read(&Scope::Global, EntityKind::Event, "zzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_drops_old_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        store
            .replace_all(&Scope::Global, EntityKind::Event, vec![event("a"), event("b")])
            .await
            .unwrap();
        store
            .replace_all(&Scope::Global, EntityKind::Event, vec![event("c")])
            .await
            .unwrap();

        let rows = store.read_all(&Scope::Global, EntityKind::Event).await.unwrap();
        assert_eq!(rows, vec![event("c")]);
    }

    #[tokio::test]
    async fn test_replace_many_keeps_unmentioned_tables() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let scope = Scope::event("sitcon2025");

        let tables = Tables::new()
            .with(EntityKind::Room, vec![named(EntityKind::Room, "r1")])
            .with(EntityKind::Tag, vec![named(EntityKind::Tag, "t1")]);
        store.replace_many(&scope, tables).await.unwrap();

        store
            .replace_all(&scope, EntityKind::Room, vec![named(EntityKind::Room, "r2")])
            .await
            .unwrap();

        let tables = store
            .read_many(&scope, &[EntityKind::Room, EntityKind::Tag])
            .await
            .unwrap();
        assert_eq!(tables.get(EntityKind::Room)[0].id(), "r2");
        assert_eq!(tables.get(EntityKind::Tag)[0].id(), "t1");
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path().to_path_buf()).unwrap();
            store
                .replace_all(&Scope::Global, EntityKind::Event, vec![event("a")])
                .await
                .unwrap();
        }
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let rows = store.read_all(&Scope::Global, EntityKind::Event).await.unwrap();
        assert_eq!(rows, vec![event("a")]);
        // No temp file left behind
        assert!(!dir.path().join("events.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejected_write_leaves_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        store
            .replace_all(&Scope::Global, EntityKind::Event, vec![event("a")])
            .await
            .unwrap();

        let bad = Tables::new().with(
            EntityKind::Event,
            vec![event("b"), named(EntityKind::Room, "r1")],
        );
        assert!(store.replace_many(&Scope::Global, bad).await.is_err());

        let rows = store.read_all(&Scope::Global, EntityKind::Event).await.unwrap();
        assert_eq!(rows, vec![event("a")]);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("events.json"), "{not json").unwrap();

        let result = store.read_all(&Scope::Global, EntityKind::Event).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));

        // ...and a replace recovers it
        store
            .replace_all(&Scope::Global, EntityKind::Event, vec![event("a")])
            .await
            .unwrap();
        assert_eq!(store.read_all(&Scope::Global, EntityKind::Event).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        store
            .replace_all(&Scope::Global, EntityKind::Event, vec![event("a")])
            .await
            .unwrap();
        store
            .replace_all(
                &Scope::event("sitcon2025"),
                EntityKind::Room,
                vec![named(EntityKind::Room, "r1")],
            )
            .await
            .unwrap();

        std::fs::write(dir.path().join("event-coscup.json.tmp"), b"{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.read_all(&Scope::Global, EntityKind::Event).await.unwrap().is_empty());
        assert!(!dir.path().join("event-coscup.json.tmp").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_clear_waits_for_writers() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path().to_path_buf()).unwrap());

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let scope = Scope::event(format!("e{}", i));
                    store
                        .replace_all(&scope, EntityKind::Room, vec![named(EntityKind::Room, "r1")])
                        .await
                })
            })
            .collect();
        store.clear().await.unwrap();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        // Every write either finished before the clear or ran after it
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            assert!(!name.ends_with(".tmp"), "leftover {}", name);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_replace() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path().to_path_buf()).unwrap());
        let scope = Scope::event("sitcon2025");

        let snapshot = |tag: &str| {
            Tables::new()
                .with(
                    EntityKind::Room,
                    (0..20).map(|i| named(EntityKind::Room, &format!("{}-r{}", tag, i))).collect(),
                )
                .with(
                    EntityKind::Tag,
                    (0..20).map(|i| named(EntityKind::Tag, &format!("{}-t{}", tag, i))).collect(),
                )
        };
        store.replace_many(&scope, snapshot("old")).await.unwrap();

        let writer = {
            let store = Arc::clone(&store);
            let scope = scope.clone();
            let new = snapshot("new");
            tokio::spawn(async move {
                for _ in 0..10 {
                    store.replace_many(&scope, new.clone()).await.unwrap();
                }
            })
        };

        for _ in 0..50 {
            let tables = store
                .read_many(&scope, &[EntityKind::Room, EntityKind::Tag])
                .await
                .unwrap();
            let prefixes: std::collections::HashSet<&str> = tables
                .iter()
                .flat_map(|(_, rows)| rows.iter())
                .map(|row| row.id().split('-').next().unwrap_or_default())
                .collect();
            assert_eq!(prefixes.len(), 1, "mixed snapshot: {:?}", prefixes);
            assert_eq!(tables.get(EntityKind::Room).len(), 20);
        }

        writer.await.unwrap();
    }
}
