//! Append-only entity stores backing the metadata cache.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::trace;

use crate::api::types::{Component, CustomField, IssueType, Priority, Project, Resolution, Status, Version};

/// Compare display names case-insensitively, including non-ASCII letters.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Reference data that can live in an [`EntityStore`].
///
/// Entries are addressed by an exact ID and by a display name.
pub trait NamedEntity: Clone + Send + Sync {
    /// Server-side identifier.
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;
}

macro_rules! named_entity {
    ($($ty:ty => $id:ident),* $(,)?) => {
        $(
            impl NamedEntity for $ty {
                fn id(&self) -> &str {
                    &self.$id
                }

                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

named_entity! {
    CustomField => id,
    IssueType => id,
    Priority => id,
    Resolution => id,
    Status => id,
    Component => id,
    Version => id,
}

// Projects are looked up by key, which is what callers and JQL use.
impl NamedEntity for Project {
    fn id(&self) -> &str {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An append-only collection of one kind of reference data.
///
/// Entries keep insertion (server) order and are never replaced once
/// stored. A store is *complete* once a full collection fetch populated
/// it; single-entity lookups add entries without completing it.
pub struct EntityStore<T> {
    entries: RwLock<Vec<T>>,
    complete: AtomicBool,
    populate: Mutex<()>,
}

impl<T: NamedEntity> EntityStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            complete: AtomicBool::new(false),
            populate: Mutex::new(()),
        }
    }

    /// Snapshot of all entries.
    pub fn values(&self) -> Vec<T> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a full collection fetch has populated the store.
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// Add an entry unless one with the same ID exists.
    ///
    /// Returns `true` when the entry was inserted.
    pub fn try_add(&self, entity: T) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|e| e.id() == entity.id()) {
            return false;
        }
        entries.push(entity);
        true
    }

    /// Add every entry whose ID is not yet present.
    pub fn try_add_all(&self, entities: impl IntoIterator<Item = T>) -> usize {
        entities
            .into_iter()
            .map(|entity| self.try_add(entity))
            .filter(|added| *added)
            .count()
    }

    /// Add a full collection and mark the store complete.
    pub fn seed(&self, entities: impl IntoIterator<Item = T>) {
        let added = self.try_add_all(entities);
        self.complete.store(true, Ordering::Release);
        trace!(added, "Entity store populated");
    }

    /// Exact lookup by ID.
    pub fn get_by_id(&self, id: &str) -> Option<T> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    /// Case-insensitive lookup by display name. Several entries may share a name.
    pub fn find_by_name(&self, name: &str) -> Vec<T> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| same_name(e.name(), name))
            .cloned()
            .collect()
    }

    /// Exact ID match first, then the first case-insensitive name match.
    pub fn get_by_id_or_name(&self, id_or_name: &str) -> Option<T> {
        self.get_by_id(id_or_name)
            .or_else(|| self.find_by_name(id_or_name).into_iter().next())
    }

    /// Return the full collection, fetching it once if the store is not complete.
    ///
    /// Concurrent callers wait on a single fetch; the loser of the race
    /// sees the completed store and does not fetch again.
    pub async fn get_or_populate<F, Fut, E>(&self, fetch: F) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if self.is_complete() {
            return Ok(self.values());
        }

        let _guard = self.populate.lock().await;
        if self.is_complete() {
            return Ok(self.values());
        }

        let fetched = fetch().await?;
        self.seed(fetched);
        Ok(self.values())
    }
}

impl<T: NamedEntity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NamedEntity + std::fmt::Debug> std::fmt::Debug for EntityStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("len", &self.len())
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// Entity stores keyed by a scope such as a project key.
pub struct ScopedStore<K, T> {
    scopes: RwLock<HashMap<K, Arc<EntityStore<T>>>>,
}

impl<K: Eq + Hash + Clone, T: NamedEntity> ScopedStore<K, T> {
    /// Create an empty scoped store.
    pub fn new() -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
        }
    }

    /// The store for one scope, created empty on first use.
    pub fn scope(&self, key: &K) -> Arc<EntityStore<T>> {
        if let Some(store) = self
            .scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Arc::clone(store);
        }

        let mut scopes = self.scopes.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(scopes.entry(key.clone()).or_default())
    }

    /// Check whether a scope has been fully populated.
    pub fn is_complete(&self, key: &K) -> bool {
        self.scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|store| store.is_complete())
    }

    /// Number of scopes created so far.
    pub fn scope_count(&self) -> usize {
        self.scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<K: Eq + Hash + Clone, T: NamedEntity> Default for ScopedStore<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> std::fmt::Debug for ScopedStore<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn priority(id: &str, name: &str) -> Priority {
        Priority {
            id: id.to_string(),
            name: name.to_string(),
            icon_url: None,
        }
    }

    #[test]
    fn test_try_add_keeps_first_entry() {
        let store = EntityStore::new();
        assert!(store.try_add(priority("1", "Blocker")));
        assert!(!store.try_add(priority("1", "Renamed")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_id("1").unwrap().name, "Blocker");
    }

    #[test]
    fn test_lookup_by_name_is_case_insensitive_and_id_exact() {
        let store = EntityStore::new();
        store.seed(vec![priority("1", "Blocker"), priority("2", "Major")]);

        assert_eq!(store.find_by_name("MAJOR").len(), 1);
        assert_eq!(store.get_by_id_or_name("major").unwrap().id, "2");
        assert!(store.get_by_id("01").is_none());
        assert_eq!(store.get_by_id_or_name("1").unwrap().name, "Blocker");
    }

    #[test]
    fn test_lookup_by_name_folds_non_ascii_case() {
        let store = EntityStore::new();
        store.seed(vec![priority("1", "Très haute"), priority("2", "Äußerst")]);

        assert_eq!(store.get_by_id_or_name("TRÈS HAUTE").unwrap().id, "1");
        assert_eq!(store.find_by_name("äußerst").len(), 1);
        assert!(store.find_by_name("Tres haute").is_empty());
    }

    #[test]
    fn test_seed_marks_complete_but_try_add_does_not() {
        let store = EntityStore::new();
        store.try_add(priority("1", "Blocker"));
        assert!(!store.is_complete());
        store.seed(vec![priority("2", "Major")]);
        assert!(store.is_complete());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_get_or_populate_skips_fetch_when_complete() {
        let store = EntityStore::new();
        store.seed((1..=5).map(|i| priority(&i.to_string(), &format!("P{}", i))));

        let calls = AtomicUsize::new(0);
        let values = store
            .get_or_populate(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(vec![])
            })
            .await
            .unwrap();

        assert_eq!(values.len(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_get_or_populate_error_leaves_store_incomplete() {
        let store: EntityStore<Priority> = EntityStore::new();
        let err = tokio_test::assert_err!(tokio_test::block_on(
            store.get_or_populate(|| async { Err::<Vec<Priority>, _>("boom") })
        ));
        assert_eq!(err, "boom");
        assert!(!store.is_complete());

        let values = tokio_test::assert_ok!(tokio_test::block_on(
            store.get_or_populate(|| async { Ok::<_, &str>(vec![priority("1", "Major")]) })
        ));
        assert_eq!(values.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_populate_fetches_once() {
        let store = Arc::new(EntityStore::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                store
                    .get_or_populate(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, ()>(vec![priority("1", "Blocker"), priority("2", "Major")])
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().len(), 2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_store_separates_scopes() {
        let store: ScopedStore<String, Version> = ScopedStore::new();
        let tst = store.scope(&"TST".to_string());
        tst.seed(vec![Version {
            id: "1".to_string(),
            name: "1.0".to_string(),
            archived: false,
            released: false,
            release_date: None,
        }]);

        assert!(store.is_complete(&"TST".to_string()));
        assert!(!store.is_complete(&"OTHER".to_string()));
        assert_eq!(store.scope(&"TST".to_string()).len(), 1);
        assert!(store.scope(&"OTHER".to_string()).is_empty());
        assert_eq!(store.scope_count(), 2);
    }
}
