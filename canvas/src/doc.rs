//! Document model: board entities, sparse patches, and the in-memory store.
//!
//! This module defines the records that live on a board (`Note`, `Connector`,
//! `Stroke`, `Cursor`), a sparse-update type per record for incremental edits,
//! and the runtime store that owns all live entities (`DocStore`).
//!
//! Data flows into this layer from the change feed (remote records) and from
//! the input engine (optimistic local mutations). Every mutator is idempotent:
//! inserting a record whose id is already present replaces it in place, and
//! updating or removing a missing id is a no-op. The store never rejects a
//! record for referential reasons; a connector whose endpoint notes are
//! missing is stored as-is and skipped at render time.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{Point, Rect};

/// Unique identifier for a board entity.
pub type EntityId = Uuid;

// =============================================================
// Records
// =============================================================

/// What a note renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Colored sticky note with editable text.
    #[default]
    Note,
    /// Free text on a transparent background.
    Text,
    /// Image; `content` holds the image reference.
    Image,
}

/// A positioned board object (sticky note, free text, or image).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: EntityId,
    pub board_id: Uuid,
    #[serde(rename = "type", default)]
    pub kind: NoteKind,
    /// Text content, or the image reference for `NoteKind::Image`.
    #[serde(default)]
    pub content: String,
    /// Left edge in canvas space.
    pub x: f64,
    /// Top edge in canvas space.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

impl Note {
    /// Bounding box in canvas space.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Apply the present fields of `patch`.
    pub fn apply(&mut self, patch: &NotePatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(w) = patch.width {
            self.width = w;
        }
        if let Some(h) = patch.height {
            self.height = h;
        }
        if let Some(ref content) = patch.content {
            self.content.clone_from(content);
        }
        if let Some(ref color) = patch.color {
            self.color.clone_from(color);
        }
    }
}

/// Sparse update for a note. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NotePatch {
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    #[must_use]
    pub fn size(width: f64, height: f64) -> Self {
        Self { width: Some(width), height: Some(height), ..Default::default() }
    }

    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Default::default() }
    }
}

/// A directed arrow from one note to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: EntityId,
    pub board_id: Uuid,
    /// Anchor note.
    #[serde(alias = "from_object_id")]
    pub from_note_id: EntityId,
    /// Target note; the arrowhead points here.
    #[serde(alias = "to_object_id")]
    pub to_note_id: EntityId,
    pub color: String,
    pub stroke_width: f64,
}

impl Connector {
    /// True when either endpoint is `note_id`.
    #[must_use]
    pub fn touches(&self, note_id: &EntityId) -> bool {
        self.from_note_id == *note_id || self.to_note_id == *note_id
    }

    pub fn apply(&mut self, patch: &ConnectorPatch) {
        if let Some(from) = patch.from_note_id {
            self.from_note_id = from;
        }
        if let Some(to) = patch.to_note_id {
            self.to_note_id = to;
        }
        if let Some(ref color) = patch.color {
            self.color.clone_from(color);
        }
        if let Some(w) = patch.stroke_width {
            self.stroke_width = w;
        }
    }
}

/// Sparse update for a connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_note_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_note_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

/// A freehand ink stroke. Points are raw pointer samples in canvas space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: EntityId,
    pub board_id: Uuid,
    /// User who drew the stroke.
    #[serde(alias = "created_by")]
    pub author: Uuid,
    pub color: String,
    #[serde(alias = "stroke_width")]
    pub width: f64,
    pub points: Vec<Point>,
    /// Unix milliseconds; stamped when the stroke is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Stroke {
    pub fn apply(&mut self, patch: &StrokePatch) {
        if let Some(ref points) = patch.points {
            self.points.clone_from(points);
        }
        if let Some(ref color) = patch.color {
            self.color.clone_from(color);
        }
        if let Some(w) = patch.width {
            self.width = w;
        }
    }
}

/// Sparse update for a stroke.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// Ephemeral presence record for one user on one board, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    /// Pointer position in canvas space.
    #[serde(alias = "cursor_x")]
    pub x: f64,
    #[serde(alias = "cursor_y")]
    pub y: f64,
    pub color: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Cursor {
    pub fn apply(&mut self, patch: &CursorPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }
}

/// Sparse update for a cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CursorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Which collection an entity id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Note,
    Connector,
    Stroke,
}

/// A typed reference to a persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

/// Everything fetched for a board at open time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub notes: Vec<Note>,
    pub connectors: Vec<Connector>,
    pub strokes: Vec<Stroke>,
    pub cursors: Vec<Cursor>,
}

// =============================================================
// Keyed collection
// =============================================================

/// Records addressable by a stable id.
pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for Note {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Connector {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Stroke {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Cursor {
    fn key(&self) -> Uuid {
        self.user_id
    }
}

/// Insertion-ordered map of records, unique by key.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: HashMap<Uuid, T>,
    order: Vec<Uuid>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: HashMap::new(), order: Vec::new() }
    }
}

impl<T: Keyed + Clone + PartialEq> Collection<T> {
    /// Replace the contents. Later duplicates overwrite earlier ones but keep the first position.
    fn set(&mut self, records: Vec<T>) {
        self.items.clear();
        self.order.clear();
        for record in records {
            self.upsert(record);
        }
    }

    /// Insert or replace by key. Returns true if anything changed.
    fn upsert(&mut self, record: T) -> bool {
        let key = record.key();
        match self.items.get_mut(&key) {
            Some(existing) if *existing == record => false,
            Some(existing) => {
                *existing = record;
                true
            }
            None => {
                self.order.push(key);
                self.items.insert(key, record);
                true
            }
        }
    }

    /// Replace an existing record. Missing keys are a no-op.
    fn replace(&mut self, record: T) -> bool {
        if !self.items.contains_key(&record.key()) {
            return false;
        }
        self.upsert(record)
    }

    /// Mutate an existing record in place. Returns true if it changed.
    fn update_with(&mut self, key: &Uuid, f: impl FnOnce(&mut T)) -> bool {
        let Some(existing) = self.items.get_mut(key) else {
            return false;
        };
        let before = existing.clone();
        f(existing);
        *existing != before
    }

    fn remove(&mut self, key: &Uuid) -> Option<T> {
        let removed = self.items.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, key: &Uuid) -> Option<&T> {
        self.items.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &Uuid) -> bool {
        self.items.contains_key(key)
    }

    /// Records in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|k| self.items.get(k))
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Uuid> {
        self.order.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================
// Store
// =============================================================

/// In-memory store of board entities and remote cursors.
///
/// `revision` increases on every mutation that changes state, so hosts can
/// cheaply decide whether to re-derive the render scene.
#[derive(Debug, Clone, Default)]
pub struct DocStore {
    notes: Collection<Note>,
    connectors: Collection<Connector>,
    strokes: Collection<Stroke>,
    cursors: Collection<Cursor>,
    revision: u64,
}

impl DocStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self, changed: bool) -> bool {
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Replace every collection with a fetched snapshot.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) {
        self.notes.set(snapshot.notes);
        self.connectors.set(snapshot.connectors);
        self.strokes.set(snapshot.strokes);
        self.cursors.set(snapshot.cursors);
        self.revision += 1;
    }

    /// Counter bumped by every effective mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- notes ---

    /// Insert a note, replacing any note with the same id.
    pub fn add_note(&mut self, note: Note) -> bool {
        let changed = self.notes.upsert(note);
        self.touch(changed)
    }

    /// Replace an existing note wholesale. Missing ids are ignored.
    pub fn replace_note(&mut self, note: Note) -> bool {
        let changed = self.notes.replace(note);
        self.touch(changed)
    }

    /// Apply a sparse patch to an existing note. Missing ids are ignored.
    pub fn update_note(&mut self, id: &EntityId, patch: &NotePatch) -> bool {
        let changed = self.notes.update_with(id, |n| n.apply(patch));
        self.touch(changed)
    }

    pub fn remove_note(&mut self, id: &EntityId) -> Option<Note> {
        let removed = self.notes.remove(id);
        self.touch(removed.is_some());
        removed
    }

    #[must_use]
    pub fn note(&self, id: &EntityId) -> Option<&Note> {
        self.notes.get(id)
    }

    #[must_use]
    pub fn notes(&self) -> &Collection<Note> {
        &self.notes
    }

    // --- connectors ---

    pub fn add_connector(&mut self, connector: Connector) -> bool {
        let changed = self.connectors.upsert(connector);
        self.touch(changed)
    }

    pub fn replace_connector(&mut self, connector: Connector) -> bool {
        let changed = self.connectors.replace(connector);
        self.touch(changed)
    }

    pub fn update_connector(&mut self, id: &EntityId, patch: &ConnectorPatch) -> bool {
        let changed = self.connectors.update_with(id, |c| c.apply(patch));
        self.touch(changed)
    }

    pub fn remove_connector(&mut self, id: &EntityId) -> Option<Connector> {
        let removed = self.connectors.remove(id);
        self.touch(removed.is_some());
        removed
    }

    #[must_use]
    pub fn connector(&self, id: &EntityId) -> Option<&Connector> {
        self.connectors.get(id)
    }

    #[must_use]
    pub fn connectors(&self) -> &Collection<Connector> {
        &self.connectors
    }

    // --- strokes ---

    pub fn add_stroke(&mut self, stroke: Stroke) -> bool {
        let changed = self.strokes.upsert(stroke);
        self.touch(changed)
    }

    pub fn replace_stroke(&mut self, stroke: Stroke) -> bool {
        let changed = self.strokes.replace(stroke);
        self.touch(changed)
    }

    pub fn update_stroke(&mut self, id: &EntityId, patch: &StrokePatch) -> bool {
        let changed = self.strokes.update_with(id, |s| s.apply(patch));
        self.touch(changed)
    }

    pub fn remove_stroke(&mut self, id: &EntityId) -> Option<Stroke> {
        let removed = self.strokes.remove(id);
        self.touch(removed.is_some());
        removed
    }

    #[must_use]
    pub fn stroke(&self, id: &EntityId) -> Option<&Stroke> {
        self.strokes.get(id)
    }

    #[must_use]
    pub fn strokes(&self) -> &Collection<Stroke> {
        &self.strokes
    }

    // --- cursors ---

    /// Insert or replace a cursor keyed by user id.
    pub fn upsert_cursor(&mut self, cursor: Cursor) -> bool {
        let changed = self.cursors.upsert(cursor);
        self.touch(changed)
    }

    pub fn update_cursor(&mut self, user_id: &Uuid, patch: &CursorPatch) -> bool {
        let changed = self.cursors.update_with(user_id, |c| c.apply(patch));
        self.touch(changed)
    }

    pub fn remove_cursor(&mut self, user_id: &Uuid) -> Option<Cursor> {
        let removed = self.cursors.remove(user_id);
        self.touch(removed.is_some());
        removed
    }

    #[must_use]
    pub fn cursors(&self) -> &Collection<Cursor> {
        &self.cursors
    }

    /// Active cursors of everyone except `self_user`.
    pub fn remote_cursors(&self, self_user: Uuid) -> impl Iterator<Item = &Cursor> {
        self.cursors
            .iter()
            .filter(move |c| c.active && c.user_id != self_user)
    }

    // --- cross-collection ---

    /// Which collection holds `id`, if any.
    #[must_use]
    pub fn kind_of(&self, id: &EntityId) -> Option<EntityKind> {
        if self.notes.contains(id) {
            Some(EntityKind::Note)
        } else if self.connectors.contains(id) {
            Some(EntityKind::Connector)
        } else if self.strokes.contains(id) {
            Some(EntityKind::Stroke)
        } else {
            None
        }
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.kind_of(id).is_some()
    }

    /// Remove an entity from whichever collection holds it.
    pub fn remove_entity(&mut self, id: &EntityId) -> Option<EntityRef> {
        let kind = self.kind_of(id)?;
        match kind {
            EntityKind::Note => self.remove_note(id).map(|_| ()),
            EntityKind::Connector => self.remove_connector(id).map(|_| ()),
            EntityKind::Stroke => self.remove_stroke(id).map(|_| ()),
        }?;
        Some(EntityRef { kind, id: *id })
    }

    /// Ids of every note, connector, and stroke, in that order.
    #[must_use]
    pub fn all_entity_ids(&self) -> Vec<EntityId> {
        self.notes
            .keys()
            .chain(self.connectors.keys())
            .chain(self.strokes.keys())
            .copied()
            .collect()
    }

    /// Number of persisted entities (cursors excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len() + self.connectors.len() + self.strokes.len()
    }

    /// Returns `true` if the store holds no notes, connectors, or strokes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
