//! In-memory record store and change feed.
//!
//! DESIGN
//! ======
//! Rows live in one `Vec` per collection behind a tokio `RwLock`, in insert
//! order. Every successful write publishes a [`RawChange`] to each live
//! subscriber of the row's board, including the writer's own subscription,
//! the same way a hosted backend echoes writes.
//!
//! Deleting a note cascades to the connectors that reference it, publishing
//! a delete for each.
//!
//! ERROR HANDLING
//! ==============
//! A subscriber whose bounded channel is full is disconnected instead of
//! silently losing an event. Its session sees the feed close, resubscribes,
//! and re-seeds from a fresh fetch.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::error::StoreError;
use crate::store::{
    Board, BoardAccess, ChangeFeed, Collaborator, Collection, Operation, Patch, RawChange, Record, RecordStore, Role,
    Subscription,
};

struct Subscriber {
    id: Uuid,
    tx: mpsc::Sender<RawChange>,
}

#[derive(Default)]
struct Inner {
    boards: HashMap<Uuid, BoardAccess>,
    rows: HashMap<Collection, Vec<Record>>,
    subscribers: HashMap<Uuid, Vec<Subscriber>>,
}

impl Inner {
    fn table(&mut self, collection: Collection) -> &mut Vec<Record> {
        self.rows.entry(collection).or_default()
    }

    fn position(&self, collection: Collection, board_id: Uuid, key: Uuid) -> Option<usize> {
        self.rows
            .get(&collection)?
            .iter()
            .position(|r| r.board_id() == board_id && r.key() == key)
    }

    /// Fan a change out to the board's subscribers, dropping closed or lagging ones.
    fn publish(&mut self, board_id: Uuid, change: &RawChange) {
        let Some(subscribers) = self.subscribers.get_mut(&board_id) else {
            return;
        };
        subscribers.retain(|sub| match sub.tx.try_send(change.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%board_id, subscription_id = %sub.id, "change feed subscriber lagging; disconnecting");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    fn remove_row(&mut self, collection: Collection, board_id: Uuid, key: Uuid) -> Result<bool, StoreError> {
        let Some(index) = self.position(collection, board_id, key) else {
            return Ok(false);
        };
        let removed = self.table(collection).remove(index);
        let change = RawChange::new(Operation::Delete, &removed)?;
        self.publish(board_id, &change);

        if collection == Collection::Notes {
            let dangling: Vec<Uuid> = self
                .rows
                .get(&Collection::Connectors)
                .into_iter()
                .flatten()
                .filter_map(|r| match r {
                    Record::Connector(c) if c.board_id == board_id && c.touches(&key) => Some(c.id),
                    _ => None,
                })
                .collect();
            for id in dangling {
                self.remove_row(Collection::Connectors, board_id, id)?;
            }
        }
        Ok(true)
    }
}

/// Reference backend implementing both [`RecordStore`] and [`ChangeFeed`].
pub struct MemoryStore {
    inner: RwLock<Inner>,
    capacity: usize,
    fail_writes: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(SyncConfig::default().feed_channel_capacity)
    }

    /// Store whose subscriptions buffer at most `capacity` unread changes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: RwLock::new(Inner::default()), capacity: capacity.max(1), fail_writes: AtomicBool::new(false) }
    }

    /// Register a board. Replaces any existing board with the same id.
    pub async fn create_board(&self, board: Board) {
        let access = BoardAccess { board, collaborators: Vec::new() };
        self.inner.write().await.boards.insert(access.board.id, access);
    }

    /// Invite `user_id` to a board. Returns `false` if the board is unknown.
    pub async fn add_collaborator(&self, board_id: Uuid, user_id: Uuid, role: Role) -> bool {
        let mut inner = self.inner.write().await;
        let Some(access) = inner.boards.get_mut(&board_id) else {
            return false;
        };
        access.collaborators.retain(|c| c.user_id != user_id);
        access.collaborators.push(Collaborator { user_id, role });
        true
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Close every subscription on a board, as a dropped connection would.
    pub async fn drop_subscribers(&self, board_id: Uuid) {
        self.inner.write().await.subscribers.remove(&board_id);
    }

    pub async fn subscriber_count(&self, board_id: Uuid) -> usize {
        self.inner.read().await.subscribers.get(&board_id).map_or(0, Vec::len)
    }

    /// Current row, if any.
    pub async fn get(&self, collection: Collection, board_id: Uuid, key: Uuid) -> Option<Record> {
        let inner = self.inner.read().await;
        let index = inner.position(collection, board_id, key)?;
        inner.rows.get(&collection)?.get(index).cloned()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn load_board(&self, board_id: Uuid) -> Result<BoardAccess, StoreError> {
        self.inner
            .read()
            .await
            .boards
            .get(&board_id)
            .cloned()
            .ok_or(StoreError::NotFound { table: "boards", id: board_id })
    }

    async fn select(&self, collection: Collection, board_id: Uuid) -> Result<Vec<Record>, StoreError> {
        let inner = self.inner.read().await;
        let rows = inner.rows.get(&collection).into_iter().flatten();
        Ok(rows.filter(|r| r.board_id() == board_id).cloned().collect())
    }

    async fn insert(&self, record: Record) -> Result<Record, StoreError> {
        self.check_writable()?;
        let collection = record.collection();
        let board_id = record.board_id();
        let mut inner = self.inner.write().await;

        let operation = match inner.position(collection, board_id, record.key()) {
            Some(index) if collection == Collection::Cursors => {
                inner.table(collection)[index] = record.clone();
                Operation::Update
            }
            Some(_) => {
                return Err(StoreError::Rejected(format!("duplicate key {} in {}", record.key(), collection.table())));
            }
            None => {
                inner.table(collection).push(record.clone());
                Operation::Insert
            }
        };

        let change = RawChange::new(operation, &record)?;
        inner.publish(board_id, &change);
        debug!(table = collection.table(), key = %record.key(), "row inserted");
        Ok(record)
    }

    async fn update(&self, board_id: Uuid, id: Uuid, patch: Patch) -> Result<Record, StoreError> {
        self.check_writable()?;
        let collection = patch.collection();
        let mut inner = self.inner.write().await;
        let Some(index) = inner.position(collection, board_id, id) else {
            return Err(StoreError::NotFound { table: collection.table(), id });
        };

        let row = &mut inner.table(collection)[index];
        row.apply(&patch);
        let updated = row.clone();

        let change = RawChange::new(Operation::Update, &updated)?;
        inner.publish(board_id, &change);
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, board_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut inner = self.inner.write().await;
        inner.remove_row(collection, board_id, id)?;
        Ok(())
    }

    async fn delete_many(&self, collection: Collection, board_id: Uuid, ids: &[Uuid]) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut inner = self.inner.write().await;
        for id in ids {
            inner.remove_row(collection, board_id, *id)?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChangeFeed for MemoryStore {
    async fn subscribe(&self, board_id: Uuid) -> Result<Subscription, StoreError> {
        let (tx, events) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();
        self.inner
            .write()
            .await
            .subscribers
            .entry(board_id)
            .or_default()
            .push(Subscriber { id, tx });
        Ok(Subscription { id, board_id, events })
    }

    async fn unsubscribe(&self, board_id: Uuid, subscription_id: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(subscribers) = inner.subscribers.get_mut(&board_id) {
            subscribers.retain(|s| s.id != subscription_id);
        }
    }
}
