//! Record store and change feed contracts.
//!
//! DESIGN
//! ======
//! The remote backend is opaque: a keyed-record store with per-collection
//! select/insert/update/delete scoped by board, plus a per-board change
//! feed. Both are `async_trait` seams so the session can run against the
//! in-memory reference store in tests and a hosted backend in production.
//!
//! Records travel as the canvas crate's entity types wrapped in [`Record`];
//! partial updates travel as [`Patch`]. Cursor rows are keyed by user and
//! inserting one that already exists replaces it.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::str::FromStr;
use std::sync::Arc;

use canvas::doc::{
    Connector, ConnectorPatch, Cursor, CursorPatch, EntityKind, Note, NotePatch, Snapshot, Stroke, StrokePatch,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{FeedError, StoreError};

// =============================================================================
// COLLECTIONS
// =============================================================================

/// A remote table holding one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Notes,
    Connectors,
    Strokes,
    Cursors,
}

impl Collection {
    pub const ALL: [Self; 4] = [Self::Notes, Self::Connectors, Self::Strokes, Self::Cursors];

    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Notes => "board_objects",
            Self::Connectors => "board_connections",
            Self::Strokes => "board_strokes",
            Self::Cursors => "board_cursors",
        }
    }

    /// Name of the key column. Cursors are keyed by user, everything else by id.
    #[must_use]
    pub fn key_field(self) -> &'static str {
        match self {
            Self::Cursors => "user_id",
            Self::Notes | Self::Connectors | Self::Strokes => "id",
        }
    }

    #[must_use]
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Note => Self::Notes,
            EntityKind::Connector => Self::Connectors,
            EntityKind::Stroke => Self::Strokes,
        }
    }
}

impl FromStr for Collection {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.table() == s)
            .ok_or_else(|| FeedError::UnknownCollection(s.to_owned()))
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A full row in one of the board collections.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Note(Note),
    Connector(Connector),
    Stroke(Stroke),
    Cursor(Cursor),
}

impl Record {
    #[must_use]
    pub fn collection(&self) -> Collection {
        match self {
            Self::Note(_) => Collection::Notes,
            Self::Connector(_) => Collection::Connectors,
            Self::Stroke(_) => Collection::Strokes,
            Self::Cursor(_) => Collection::Cursors,
        }
    }

    #[must_use]
    pub fn board_id(&self) -> Uuid {
        match self {
            Self::Note(n) => n.board_id,
            Self::Connector(c) => c.board_id,
            Self::Stroke(s) => s.board_id,
            Self::Cursor(c) => c.board_id,
        }
    }

    /// Row key within its collection.
    #[must_use]
    pub fn key(&self) -> Uuid {
        match self {
            Self::Note(n) => n.id,
            Self::Connector(c) => c.id,
            Self::Stroke(s) => s.id,
            Self::Cursor(c) => c.user_id,
        }
    }

    /// Serialize the inner row for a change payload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the row cannot be represented as JSON.
    pub fn to_value(&self) -> Result<serde_json::Value, StoreError> {
        let value = match self {
            Self::Note(n) => serde_json::to_value(n)?,
            Self::Connector(c) => serde_json::to_value(c)?,
            Self::Stroke(s) => serde_json::to_value(s)?,
            Self::Cursor(c) => serde_json::to_value(c)?,
        };
        Ok(value)
    }

    /// Apply a sparse patch. Returns `false` when the patch targets another collection.
    pub fn apply(&mut self, patch: &Patch) -> bool {
        match (self, patch) {
            (Self::Note(n), Patch::Note(p)) => n.apply(p),
            (Self::Connector(c), Patch::Connector(p)) => c.apply(p),
            (Self::Stroke(s), Patch::Stroke(p)) => s.apply(p),
            (Self::Cursor(c), Patch::Cursor(p)) => c.apply(p),
            _ => return false,
        }
        true
    }
}

/// Sort fetched rows into a board snapshot. Inactive cursors are left out.
#[must_use]
pub fn into_snapshot(records: impl IntoIterator<Item = Record>) -> Snapshot {
    let mut snapshot = Snapshot::default();
    for record in records {
        match record {
            Record::Note(n) => snapshot.notes.push(n),
            Record::Connector(c) => snapshot.connectors.push(c),
            Record::Stroke(s) => snapshot.strokes.push(s),
            Record::Cursor(c) if c.active => snapshot.cursors.push(c),
            Record::Cursor(_) => {}
        }
    }
    snapshot
}

/// A sparse update to one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Note(NotePatch),
    Connector(ConnectorPatch),
    Stroke(StrokePatch),
    Cursor(CursorPatch),
}

impl Patch {
    #[must_use]
    pub fn collection(&self) -> Collection {
        match self {
            Self::Note(_) => Collection::Notes,
            Self::Connector(_) => Collection::Connectors,
            Self::Stroke(_) => Collection::Strokes,
            Self::Cursor(_) => Collection::Cursors,
        }
    }
}

// =============================================================================
// BOARDS AND USERS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub user_id: Uuid,
    pub role: Role,
}

/// A board together with everyone invited to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardAccess {
    pub board: Board,
    pub collaborators: Vec<Collaborator>,
}

impl BoardAccess {
    /// Owners and collaborators of either role may open the board.
    #[must_use]
    pub fn permits(&self, user_id: Uuid) -> bool {
        self.board.owner_id == user_id || self.collaborators.iter().any(|c| c.user_id == user_id)
    }
}

/// The signed-in user a session acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub display_name: String,
}

// =============================================================================
// CHANGE FEED PAYLOADS
// =============================================================================

/// Row-level operation reported by the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for Operation {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(FeedError::UnknownOperation(s.to_owned())),
        }
    }
}

/// Untyped change notification as delivered by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChange {
    /// Table name, e.g. `board_objects`.
    pub collection: String,
    /// `INSERT`, `UPDATE` or `DELETE`.
    pub operation: String,
    /// New row for inserts and updates, old row (or at least its key) for deletes.
    pub record: serde_json::Value,
}

impl RawChange {
    /// Build a payload for `record`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the row cannot be serialized.
    pub fn new(operation: Operation, record: &Record) -> Result<Self, StoreError> {
        Ok(Self {
            collection: record.collection().table().to_owned(),
            operation: operation.as_str().to_owned(),
            record: record.to_value()?,
        })
    }
}

/// A live change-feed subscription for one board.
///
/// The feed closes the channel when the subscription is dropped server-side;
/// the receiver then yields `None`.
#[derive(Debug)]
pub struct Subscription {
    pub id: Uuid,
    pub board_id: Uuid,
    pub events: mpsc::Receiver<RawChange>,
}

// =============================================================================
// TRAITS
// =============================================================================

/// Keyed-record store scoped by board.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a board and its collaborator list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the board does not exist.
    async fn load_board(&self, board_id: Uuid) -> Result<BoardAccess, StoreError>;

    /// All rows of `collection` belonging to `board_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    async fn select(&self, collection: Collection, board_id: Uuid) -> Result<Vec<Record>, StoreError>;

    /// Insert a row. Cursor rows are upserted by user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Rejected`] for a duplicate key, or another
    /// [`StoreError`] if the write fails.
    async fn insert(&self, record: Record) -> Result<Record, StoreError>;

    /// Apply a sparse patch to the row keyed by `id` and return the new row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such row exists.
    async fn update(&self, board_id: Uuid, id: Uuid, patch: Patch) -> Result<Record, StoreError>;

    /// Delete one row. Deleting a missing row succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    async fn delete(&self, collection: Collection, board_id: Uuid, id: Uuid) -> Result<(), StoreError>;

    /// Delete every row whose key is in `ids`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    async fn delete_many(&self, collection: Collection, board_id: Uuid, ids: &[Uuid]) -> Result<(), StoreError>;
}

/// Per-board change notifications.
#[async_trait::async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Open a subscription for every collection of `board_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the feed is unreachable.
    async fn subscribe(&self, board_id: Uuid) -> Result<Subscription, StoreError>;

    /// Close a subscription. Unknown ids are ignored.
    async fn unsubscribe(&self, board_id: Uuid, subscription_id: Uuid);
}

/// The two remote collaborators a session talks to.
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn RecordStore>,
    pub feed: Arc<dyn ChangeFeed>,
}

impl Backend {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self { store, feed }
    }

    /// Use one service for both the store and the feed.
    #[must_use]
    pub fn shared<T>(service: Arc<T>) -> Self
    where
        T: RecordStore + ChangeFeed + 'static,
    {
        Self { store: service.clone(), feed: service }
    }
}
