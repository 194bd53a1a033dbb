#![allow(clippy::float_cmp)]

use canvas::camera::Point;
use canvas::doc::NoteKind;
use serde_json::json;

use super::*;
use crate::store::Record;

fn raw(collection: &str, operation: &str, record: serde_json::Value) -> RawChange {
    RawChange { collection: collection.into(), operation: operation.into(), record }
}

fn note_json(id: Uuid, board_id: Uuid, x: f64) -> serde_json::Value {
    json!({
        "id": id,
        "board_id": board_id,
        "type": "note",
        "content": "hi",
        "x": x,
        "y": 0.0,
        "width": 200.0,
        "height": 150.0,
        "color": "#fef3c7",
    })
}

fn stroke(board_id: Uuid) -> Stroke {
    Stroke {
        id: Uuid::new_v4(),
        board_id,
        author: Uuid::new_v4(),
        color: "#3b82f6".into(),
        width: 2.0,
        points: vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
        created_at: Some(1_700_000_000_000),
    }
}

// =============================================================================
// from_raw
// =============================================================================

#[test]
fn decodes_note_insert() {
    let id = Uuid::new_v4();
    let event = ChangeEvent::from_raw(raw("board_objects", "INSERT", note_json(id, Uuid::nil(), 10.0))).unwrap();
    let ChangeEvent::NoteInserted(note) = event else { panic!("expected note insert") };
    assert_eq!(note.id, id);
    assert_eq!(note.kind, NoteKind::Note);
    assert_eq!(note.x, 10.0);
}

#[test]
fn decodes_legacy_connector_field_names() {
    let from = Uuid::new_v4();
    let to = Uuid::new_v4();
    let record = json!({
        "id": Uuid::new_v4(),
        "board_id": Uuid::nil(),
        "from_object_id": from,
        "to_object_id": to,
        "color": "#000000",
        "stroke_width": 2.0,
    });
    let event = ChangeEvent::from_raw(raw("board_connections", "update", record)).unwrap();
    let ChangeEvent::ConnectorUpdated(c) = event else { panic!("expected connector update") };
    assert_eq!((c.from_note_id, c.to_note_id), (from, to));
}

#[test]
fn delete_needs_only_the_key() {
    let id = Uuid::new_v4();
    let event = ChangeEvent::from_raw(raw("board_strokes", "DELETE", json!({ "id": id }))).unwrap();
    assert_eq!(event, ChangeEvent::StrokeDeleted(id));
}

#[test]
fn cursor_delete_is_keyed_by_user() {
    let user = Uuid::new_v4();
    let event = ChangeEvent::from_raw(raw("board_cursors", "DELETE", json!({ "user_id": user }))).unwrap();
    assert_eq!(event, ChangeEvent::CursorDeleted(user));
    assert_eq!(event.collection(), Collection::Cursors);
}

#[test]
fn delete_without_key_fails() {
    let err = ChangeEvent::from_raw(raw("board_objects", "DELETE", json!({}))).unwrap_err();
    assert!(matches!(err, FeedError::MissingId { collection: "board_objects" }));
}

#[test]
fn delete_with_malformed_key_fails() {
    let err = ChangeEvent::from_raw(raw("board_objects", "DELETE", json!({ "id": "not-a-uuid" }))).unwrap_err();
    assert!(matches!(err, FeedError::MissingId { .. }));
}

#[test]
fn unknown_collection_fails() {
    let err = ChangeEvent::from_raw(raw("board_invites", "INSERT", json!({}))).unwrap_err();
    assert!(matches!(err, FeedError::UnknownCollection(_)));
}

#[test]
fn unknown_operation_fails() {
    let err = ChangeEvent::from_raw(raw("board_objects", "TRUNCATE", json!({}))).unwrap_err();
    assert!(matches!(err, FeedError::UnknownOperation(_)));
}

#[test]
fn mismatched_row_fails_to_decode() {
    let err = ChangeEvent::from_raw(raw("board_strokes", "INSERT", json!({ "id": Uuid::new_v4() }))).unwrap_err();
    assert!(matches!(err, FeedError::Decode(_)));
}

#[test]
fn decodes_what_the_store_publishes() {
    let s = stroke(Uuid::new_v4());
    let change = RawChange::new(Operation::Insert, &Record::Stroke(s.clone())).unwrap();
    assert_eq!(ChangeEvent::from_raw(change).unwrap(), ChangeEvent::StrokeInserted(s));
}

// =============================================================================
// apply
// =============================================================================

#[test]
fn applying_twice_equals_applying_once() {
    let board_id = Uuid::new_v4();
    let id = Uuid::new_v4();
    let mut core = EngineCore::new(board_id, Uuid::new_v4());

    let insert = ChangeEvent::from_raw(raw("board_objects", "INSERT", note_json(id, board_id, 10.0))).unwrap();
    assert!(insert.clone().apply(&mut core));
    assert!(!insert.apply(&mut core));
    assert_eq!(core.doc.notes().len(), 1);

    let update = ChangeEvent::from_raw(raw("board_objects", "UPDATE", note_json(id, board_id, 99.0))).unwrap();
    assert!(update.clone().apply(&mut core));
    assert!(!update.apply(&mut core));
    assert_eq!(core.note(&id).unwrap().x, 99.0);

    let delete = ChangeEvent::NoteDeleted(id);
    assert!(delete.clone().apply(&mut core));
    assert!(!delete.apply(&mut core));
    assert!(core.doc.is_empty());
}

#[test]
fn update_for_unknown_note_is_ignored() {
    let mut core = EngineCore::default();
    let event = ChangeEvent::from_raw(raw("board_objects", "UPDATE", note_json(Uuid::new_v4(), Uuid::nil(), 1.0))).unwrap();
    assert!(!event.apply(&mut core));
    assert!(core.doc.is_empty());
}

#[test]
fn stroke_events_route_to_strokes() {
    let mut core = EngineCore::default();
    let s = stroke(Uuid::nil());
    assert!(ChangeEvent::StrokeInserted(s.clone()).apply(&mut core));
    assert!(core.doc.stroke(&s.id).is_some());
    assert!(ChangeEvent::StrokeDeleted(s.id).apply(&mut core));
    assert!(core.doc.stroke(&s.id).is_none());
}

#[test]
fn inactive_cursor_leaves_overlay() {
    let mut core = EngineCore::default();
    let mut cursor = Cursor {
        board_id: Uuid::nil(),
        user_id: Uuid::new_v4(),
        display_name: "Grace".into(),
        x: 3.0,
        y: 4.0,
        color: "#22c55e".into(),
        active: true,
    };
    assert!(ChangeEvent::CursorInserted(cursor.clone()).apply(&mut core));
    assert_eq!(core.doc.cursors().len(), 1);

    cursor.active = false;
    assert!(ChangeEvent::CursorUpdated(cursor).apply(&mut core));
    assert!(core.doc.cursors().is_empty());
}
