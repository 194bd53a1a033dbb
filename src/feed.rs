//! Typed change events decoded from the raw change feed.
//!
//! DESIGN
//! ======
//! The feed delivers loosely typed `{collection, operation, record}`
//! payloads. [`ChangeEvent::from_raw`] turns each into one variant per
//! (collection, operation) pair so routing is an exhaustive match instead of
//! runtime field sniffing. Deletes only need the row key.
//!
//! Applying an event goes through the engine's idempotent mutators: a
//! duplicate or echoed event leaves the state unchanged.

#[cfg(test)]
#[path = "feed_test.rs"]
mod feed_test;

use canvas::doc::{Connector, Cursor, EntityId, Note, Stroke};
use canvas::engine::EngineCore;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::FeedError;
use crate::store::{Collection, Operation, RawChange};

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    NoteInserted(Note),
    NoteUpdated(Note),
    NoteDeleted(EntityId),
    ConnectorInserted(Connector),
    ConnectorUpdated(Connector),
    ConnectorDeleted(EntityId),
    StrokeInserted(Stroke),
    StrokeUpdated(Stroke),
    StrokeDeleted(EntityId),
    CursorInserted(Cursor),
    CursorUpdated(Cursor),
    /// Keyed by user id.
    CursorDeleted(Uuid),
}

impl ChangeEvent {
    /// Decode a raw feed payload.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`] for unknown tables or operations, delete
    /// payloads without a key, or rows that do not match the collection.
    pub fn from_raw(raw: RawChange) -> Result<Self, FeedError> {
        let collection: Collection = raw.collection.parse()?;
        let operation: Operation = raw.operation.parse()?;
        let record = raw.record;

        let event = match (collection, operation) {
            (Collection::Notes, Operation::Insert) => Self::NoteInserted(decode(record)?),
            (Collection::Notes, Operation::Update) => Self::NoteUpdated(decode(record)?),
            (Collection::Notes, Operation::Delete) => Self::NoteDeleted(key_of(&record, collection)?),
            (Collection::Connectors, Operation::Insert) => Self::ConnectorInserted(decode(record)?),
            (Collection::Connectors, Operation::Update) => Self::ConnectorUpdated(decode(record)?),
            (Collection::Connectors, Operation::Delete) => Self::ConnectorDeleted(key_of(&record, collection)?),
            (Collection::Strokes, Operation::Insert) => Self::StrokeInserted(decode(record)?),
            (Collection::Strokes, Operation::Update) => Self::StrokeUpdated(decode(record)?),
            (Collection::Strokes, Operation::Delete) => Self::StrokeDeleted(key_of(&record, collection)?),
            (Collection::Cursors, Operation::Insert) => Self::CursorInserted(decode(record)?),
            (Collection::Cursors, Operation::Update) => Self::CursorUpdated(decode(record)?),
            (Collection::Cursors, Operation::Delete) => Self::CursorDeleted(key_of(&record, collection)?),
        };
        Ok(event)
    }

    #[must_use]
    pub fn collection(&self) -> Collection {
        match self {
            Self::NoteInserted(_) | Self::NoteUpdated(_) | Self::NoteDeleted(_) => Collection::Notes,
            Self::ConnectorInserted(_) | Self::ConnectorUpdated(_) | Self::ConnectorDeleted(_) => {
                Collection::Connectors
            }
            Self::StrokeInserted(_) | Self::StrokeUpdated(_) | Self::StrokeDeleted(_) => Collection::Strokes,
            Self::CursorInserted(_) | Self::CursorUpdated(_) | Self::CursorDeleted(_) => Collection::Cursors,
        }
    }

    /// Route the event to the matching engine mutator. Returns whether local state changed.
    ///
    /// An inactive cursor record removes that user's cursor from the overlay.
    pub fn apply(self, core: &mut EngineCore) -> bool {
        match self {
            Self::NoteInserted(note) => core.apply_note_insert(note),
            Self::NoteUpdated(note) => core.apply_note_update(note),
            Self::NoteDeleted(id) => core.apply_note_delete(&id),
            Self::ConnectorInserted(connector) => core.apply_connector_insert(connector),
            Self::ConnectorUpdated(connector) => core.apply_connector_update(connector),
            Self::ConnectorDeleted(id) => core.apply_connector_delete(&id),
            Self::StrokeInserted(stroke) => core.apply_stroke_insert(stroke),
            Self::StrokeUpdated(stroke) => core.apply_stroke_update(stroke),
            Self::StrokeDeleted(id) => core.apply_stroke_delete(&id),
            Self::CursorInserted(cursor) | Self::CursorUpdated(cursor) => {
                if cursor.active {
                    core.apply_cursor(cursor)
                } else {
                    core.apply_cursor_delete(&cursor.user_id)
                }
            }
            Self::CursorDeleted(user_id) => core.apply_cursor_delete(&user_id),
        }
    }
}

fn decode<T: DeserializeOwned>(record: serde_json::Value) -> Result<T, FeedError> {
    Ok(serde_json::from_value(record)?)
}

fn key_of(record: &serde_json::Value, collection: Collection) -> Result<Uuid, FeedError> {
    let missing = || FeedError::MissingId { collection: collection.table() };
    let raw = record
        .get(collection.key_field())
        .and_then(serde_json::Value::as_str)
        .ok_or_else(missing)?;
    Uuid::parse_str(raw).map_err(|_| missing())
}
