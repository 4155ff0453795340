use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::cached::{CachedData, ScopeDocument};
use super::rows::EntityKind;
use super::store::{LocalStore, Scope, StoreError, Tables};

/// Local store kept in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    scopes: RwLock<HashMap<Scope, CachedData<ScopeDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn replace_many(&self, scope: &Scope, tables: Tables) -> Result<(), StoreError> {
        tables.validate(scope)?;

        let mut scopes = self.scopes.write().map_err(|_| StoreError::Poisoned)?;
        let mut document = scopes
            .get(scope)
            .map(|cached| cached.data.clone())
            .unwrap_or_default();
        for (kind, rows) in tables {
            document.set(kind, rows);
        }
        scopes.insert(scope.clone(), CachedData::new(document));
        Ok(())
    }

    async fn read_many(&self, scope: &Scope, kinds: &[EntityKind]) -> Result<Tables, StoreError> {
        let scopes = self.scopes.read().map_err(|_| StoreError::Poisoned)?;
        let mut tables = Tables::new();
        for &kind in kinds {
            let rows = scopes
                .get(scope)
                .map(|cached| cached.data.rows(kind))
                .unwrap_or_default();
            tables.insert(kind, rows);
        }
        Ok(tables)
    }

    async fn cached_at(&self, scope: &Scope) -> Result<Option<DateTime<Utc>>, StoreError> {
        let scopes = self.scopes.read().map_err(|_| StoreError::Poisoned)?;
        Ok(scopes.get(scope).map(|cached| cached.cached_at))
    }
}
