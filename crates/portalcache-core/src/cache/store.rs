use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::rows::{EntityKind, StoredRow};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode cache document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("A {found} row cannot be stored in the {expected} table")]
    KindMismatch { expected: EntityKind, found: EntityKind },

    #[error("The {kind} table does not belong to scope {scope}")]
    WrongScope { kind: EntityKind, scope: Scope },

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Partition of the store a row lives in: the global event list, or one event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Global,
    Event(String),
}

impl Scope {
    pub fn event(event_id: impl Into<String>) -> Self {
        Scope::Event(event_id.into())
    }

    pub fn admits(&self, kind: EntityKind) -> bool {
        matches!(self, Scope::Global) == kind.is_global()
    }

    /// File-system safe name; bytes outside `[A-Za-z0-9_.-]` are hex escaped
    pub fn file_stem(&self) -> String {
        match self {
            Scope::Global => "events".to_string(),
            Scope::Event(id) => {
                let mut stem = String::from("event-");
                for byte in id.bytes() {
                    match byte {
                        b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'.' | b'-' => {
                            stem.push(byte as char)
                        }
                        _ => stem.push_str(&format!("~{:02x}", byte)),
                    }
                }
                stem
            }
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Event(id) => write!(f, "event {}", id),
        }
    }
}

/// Rows grouped by table, the unit of a transactional replace or a consistent read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables(BTreeMap<EntityKind, Vec<StoredRow>>);

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: EntityKind, rows: Vec<StoredRow>) -> Self {
        self.insert(kind, rows);
        self
    }

    pub fn insert(&mut self, kind: EntityKind, rows: Vec<StoredRow>) {
        self.0.insert(kind, rows);
    }

    pub fn get(&self, kind: EntityKind) -> &[StoredRow] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn take(&mut self, kind: EntityKind) -> Vec<StoredRow> {
        self.0.remove(&kind).unwrap_or_default()
    }

    /// True when no table holds a row
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &[StoredRow])> {
        self.0.iter().map(|(kind, rows)| (*kind, rows.as_slice()))
    }

    /// Every table must belong to `scope` and hold only rows of its own kind
    pub fn validate(&self, scope: &Scope) -> Result<(), StoreError> {
        for (kind, rows) in self.iter() {
            if !scope.admits(kind) {
                return Err(StoreError::WrongScope {
                    kind,
                    scope: scope.clone(),
                });
            }
            if let Some(row) = rows.iter().find(|row| row.kind() != kind) {
                return Err(StoreError::KindMismatch {
                    expected: kind,
                    found: row.kind(),
                });
            }
        }
        Ok(())
    }
}

impl IntoIterator for Tables {
    type Item = (EntityKind, Vec<StoredRow>);
    type IntoIter = std::collections::btree_map::IntoIter<EntityKind, Vec<StoredRow>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Persisted normalized rows, one snapshot per (scope, kind).
///
/// Writes are whole-table replacements; a reader sees either the complete old
/// or the complete new contents of every table it asks for, never a mix.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Replace every table in `tables` in one transaction. Tables of the
    /// scope that are not mentioned keep their rows.
    async fn replace_many(&self, scope: &Scope, tables: Tables) -> Result<(), StoreError>;

    /// Read several tables of one scope from the same snapshot
    async fn read_many(&self, scope: &Scope, kinds: &[EntityKind]) -> Result<Tables, StoreError>;

    /// When the scope was last written, `None` if never
    async fn cached_at(&self, scope: &Scope) -> Result<Option<DateTime<Utc>>, StoreError>;

    async fn replace_all(
        &self,
        scope: &Scope,
        kind: EntityKind,
        rows: Vec<StoredRow>,
    ) -> Result<(), StoreError> {
        self.replace_many(scope, Tables::new().with(kind, rows)).await
    }

    async fn read_all(&self, scope: &Scope, kind: EntityKind) -> Result<Vec<StoredRow>, StoreError> {
        Ok(self.read_many(scope, &[kind]).await?.take(kind))
    }

    async fn read(
        &self,
        scope: &Scope,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<StoredRow>, StoreError> {
        Ok(self
            .read_all(scope, kind)
            .await?
            .into_iter()
            .find(|row| row.id() == id))
    }
}
