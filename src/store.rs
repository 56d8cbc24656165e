use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use jiff::Timestamp;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::{
    entities::entry,
    error::{WatchlistError, WatchlistResult},
    models::{Category, Entry, EntryKey, NewEntry, RatingPolicy},
};

/// Persisted watchlists, one row per entry.
///
/// Every mutation looks its row up and writes it inside one transaction while holding the
/// owner's lock, and the whole unit is bounded by `timeout`.
#[derive(Clone)]
pub struct WatchlistStore {
    db: DatabaseConnection,
    timeout: Duration,
    rating_policy: RatingPolicy,
    locks: OwnerLocks,
}

impl WatchlistStore {
    pub fn new(db: DatabaseConnection, timeout: Duration, rating_policy: RatingPolicy) -> Self {
        Self { db, timeout, rating_policy, locks: OwnerLocks::default() }
    }

    pub async fn exists(&self, owner: &str) -> WatchlistResult<bool> {
        self.bounded(async {
            let count = entry::Entity::find()
                .filter(entry::Column::Owner.eq(owner))
                .count(&self.db)
                .await?;
            Ok(count > 0)
        })
        .await
    }

    pub async fn fetch(&self, owner: &str, include_done: bool) -> WatchlistResult<Vec<Entry>> {
        self.bounded(async {
            let mut query = entry::Entity::find().filter(entry::Column::Owner.eq(owner));
            if !include_done {
                query = query.filter(entry::Column::Done.eq(false));
            }
            let rows = query.order_by_asc(entry::Column::Id).all(&self.db).await?;

            let mut entries = Vec::with_capacity(rows.len());
            for row in rows {
                let id = row.id;
                match Entry::try_from(row) {
                    Ok(entry) => entries.push(entry),
                    Err(err) => warn!(id, error = %err, "skipping unreadable entry row"),
                }
            }

            debug!(owner = %owner, include_done, count = entries.len(), "fetched watchlist");
            Ok(entries)
        })
        .await
    }

    pub async fn add(&self, new: NewEntry) -> WatchlistResult<Entry> {
        let entry = new.into_entry(Timestamp::now())?;

        self.bounded(async {
            let _guard = self.locks.lock(&entry.owner).await;
            let txn = self.db.begin().await?;

            let existing = entry::Entity::find()
                .filter(entry::Column::Owner.eq(entry.owner.as_str()))
                .filter(entry::Column::Title.eq(entry.title.as_str()))
                .filter(entry::Column::Category.eq(entry.category.as_str()))
                .one(&txn)
                .await?;
            if existing.is_some() {
                return Err(duplicate(&entry));
            }

            let model = entry::ActiveModel {
                id: Default::default(),
                owner: Set(entry.owner.clone()),
                title: Set(entry.title.clone()),
                category: Set(entry.category.as_str().to_string()),
                created_at: Set(entry.created_at.as_millisecond()),
                done: Set(entry.done),
                rating: Set(entry.rating),
                link: Set(entry.link.clone()),
            };

            if let Err(err) = entry::Entity::insert(model).exec(&txn).await {
                return match err.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => Err(duplicate(&entry)),
                    _ => Err(err.into()),
                };
            }
            txn.commit().await?;

            debug!(owner = %entry.owner, title = %entry.title, category = %entry.category, "entry added");
            Ok(entry)
        })
        .await
    }

    pub async fn delete(&self, key: &EntryKey) -> WatchlistResult<Entry> {
        self.bounded(async {
            let _guard = self.locks.lock(&key.owner).await;
            let txn = self.db.begin().await?;

            let row = find_one(&txn, key).await?;
            let id = row.id;
            let removed = Entry::try_from(row)?;
            entry::Entity::delete_by_id(id).exec(&txn).await?;
            txn.commit().await?;

            debug!(owner = %key.owner, title = %key.title, "entry deleted");
            Ok(removed)
        })
        .await
    }

    pub async fn update_link(
        &self,
        key: &EntryKey,
        link: Option<String>,
    ) -> WatchlistResult<Entry> {
        self.modify(key, |row| row.link = Set(link)).await
    }

    /// Idempotent: marking an already watched entry succeeds without changes.
    pub async fn mark_done(&self, key: &EntryKey) -> WatchlistResult<Entry> {
        self.modify(key, |row| row.done = Set(true)).await
    }

    pub async fn rate(&self, key: &EntryKey, rating: i32) -> WatchlistResult<Entry> {
        let rating = self.rating_policy.check(rating)?;
        self.modify(key, |row| row.rating = Set(rating)).await
    }

    async fn modify<F>(&self, key: &EntryKey, apply: F) -> WatchlistResult<Entry>
    where
        F: FnOnce(&mut entry::ActiveModel),
    {
        self.bounded(async {
            let _guard = self.locks.lock(&key.owner).await;
            let txn = self.db.begin().await?;

            let row = find_one(&txn, key).await?;
            let mut active: entry::ActiveModel = row.into();
            apply(&mut active);
            let updated = Entry::try_from(active.update(&txn).await?)?;
            txn.commit().await?;

            debug!(owner = %key.owner, title = %key.title, category = %updated.category, "entry updated");
            Ok(updated)
        })
        .await
    }

    async fn bounded<T>(
        &self,
        work: impl Future<Output = WatchlistResult<T>>,
    ) -> WatchlistResult<T> {
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(WatchlistError::Timeout(self.timeout)),
        }
    }
}

/// Point lookup by key; an omitted category must match exactly one row.
async fn find_one<C: ConnectionTrait>(conn: &C, key: &EntryKey) -> WatchlistResult<entry::Model> {
    let mut query = entry::Entity::find()
        .filter(entry::Column::Owner.eq(key.owner.as_str()))
        .filter(entry::Column::Title.eq(key.title.as_str()));
    if let Some(category) = key.category {
        query = query.filter(entry::Column::Category.eq(category.as_str()));
    }

    let mut rows = query.order_by_asc(entry::Column::Id).all(conn).await?;
    match rows.len() {
        0 => Err(WatchlistError::NotFound { title: key.title.clone(), category: key.category }),
        1 => Ok(rows.remove(0)),
        _ => {
            let categories =
                rows.iter().filter_map(|r| r.category.parse::<Category>().ok()).collect();
            Err(WatchlistError::AmbiguousMatch { title: key.title.clone(), categories })
        },
    }
}

fn duplicate(entry: &Entry) -> WatchlistError {
    WatchlistError::DuplicateKey { title: entry.title.clone(), category: entry.category }
}

/// One async mutex per owner, created on first use and dropped once nobody holds or awaits it.
#[derive(Clone, Default)]
struct OwnerLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl OwnerLocks {
    async fn lock(&self, owner: &str) -> OwnerGuard {
        let slot = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let mutex = map.entry(owner.to_string()).or_default().clone();
            OwnerSlot { locks: self.clone(), owner: owner.to_string(), mutex }
        };
        let guard = Arc::clone(&slot.mutex).lock_owned().await;
        OwnerGuard { _guard: guard, _slot: slot }
    }
}

/// Field order matters: the mutex guard is released before the slot prunes the map.
struct OwnerGuard {
    _guard: OwnedMutexGuard<()>,
    _slot: OwnerSlot,
}

/// A registered interest in an owner's mutex, held while waiting for it and while holding it.
struct OwnerSlot {
    locks: OwnerLocks,
    owner: String,
    mutex: Arc<AsyncMutex<()>>,
}

impl Drop for OwnerSlot {
    fn drop(&mut self) {
        let mut map = self.locks.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // The map's handle plus ours: no other task holds or awaits this owner.
        if Arc::strong_count(&self.mutex) == 2 {
            map.remove(&self.owner);
        }
    }
}
