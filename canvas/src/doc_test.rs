#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use serde_json::json;
use uuid::Uuid;

use super::*;

fn make_note(x: f64, y: f64, w: f64, h: f64) -> Note {
    Note {
        id: Uuid::new_v4(),
        board_id: Uuid::nil(),
        kind: NoteKind::Note,
        content: "hello".into(),
        x,
        y,
        width: w,
        height: h,
        color: "#fef3c7".into(),
    }
}

fn make_connector(from: EntityId, to: EntityId) -> Connector {
    Connector {
        id: Uuid::new_v4(),
        board_id: Uuid::nil(),
        from_note_id: from,
        to_note_id: to,
        color: "#000000".into(),
        stroke_width: 2.0,
    }
}

fn make_stroke(points: &[(f64, f64)]) -> Stroke {
    Stroke {
        id: Uuid::new_v4(),
        board_id: Uuid::nil(),
        author: Uuid::nil(),
        color: "#3b82f6".into(),
        width: 2.0,
        points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        created_at: None,
    }
}

fn make_cursor(user_id: Uuid, x: f64, y: f64) -> Cursor {
    Cursor {
        board_id: Uuid::nil(),
        user_id,
        display_name: "alice".into(),
        x,
        y,
        color: "#ef4444".into(),
        active: true,
    }
}

/// Comparable view of the store contents.
fn contents(doc: &DocStore) -> (Vec<Note>, Vec<Connector>, Vec<Stroke>, Vec<Cursor>) {
    (
        doc.notes().iter().cloned().collect(),
        doc.connectors().iter().cloned().collect(),
        doc.strokes().iter().cloned().collect(),
        doc.cursors().iter().cloned().collect(),
    )
}

// =============================================================
// Serde
// =============================================================

#[test]
fn note_kind_serializes_lowercase_under_type() {
    let note = make_note(0.0, 0.0, 100.0, 50.0);
    let value = serde_json::to_value(&note).unwrap();
    assert_eq!(value["type"], json!("note"));

    let text: NoteKind = serde_json::from_value(json!("text")).unwrap();
    assert_eq!(text, NoteKind::Text);
}

#[test]
fn note_deserializes_without_type_or_content() {
    let id = Uuid::new_v4();
    let note: Note = serde_json::from_value(json!({
        "id": id,
        "board_id": Uuid::nil(),
        "x": 1.0, "y": 2.0, "width": 200.0, "height": 150.0,
        "color": "#fff",
    }))
    .unwrap();
    assert_eq!(note.id, id);
    assert_eq!(note.kind, NoteKind::Note);
    assert!(note.content.is_empty());
}

#[test]
fn connector_accepts_object_id_aliases() {
    let from = Uuid::new_v4();
    let to = Uuid::new_v4();
    let c: Connector = serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "board_id": Uuid::nil(),
        "from_object_id": from,
        "to_object_id": to,
        "color": "#000000",
        "stroke_width": 2.0,
    }))
    .unwrap();
    assert_eq!(c.from_note_id, from);
    assert_eq!(c.to_note_id, to);
}

#[test]
fn cursor_defaults_to_active() {
    let c: Cursor = serde_json::from_value(json!({
        "board_id": Uuid::nil(),
        "user_id": Uuid::new_v4(),
        "display_name": "bob",
        "cursor_x": 4.0,
        "cursor_y": 5.0,
        "color": "#000",
    }))
    .unwrap();
    assert!(c.active);
    assert_eq!((c.x, c.y), (4.0, 5.0));
}

#[test]
fn patch_skips_absent_fields() {
    let value = serde_json::to_value(NotePatch::position(3.0, 4.0)).unwrap();
    assert_eq!(value, json!({"x": 3.0, "y": 4.0}));
}

// =============================================================
// Note helpers
// =============================================================

#[test]
fn note_bounds_and_center() {
    let n = make_note(10.0, 20.0, 200.0, 100.0);
    assert_eq!(n.bounds(), Rect::new(10.0, 20.0, 200.0, 100.0));
    assert_eq!(n.center(), Point::new(110.0, 70.0));
}

#[test]
fn note_apply_only_touches_present_fields() {
    let mut n = make_note(10.0, 20.0, 200.0, 100.0);
    n.apply(&NotePatch { width: Some(300.0), content: Some("x".into()), ..Default::default() });
    assert_eq!(n.x, 10.0);
    assert_eq!(n.width, 300.0);
    assert_eq!(n.height, 100.0);
    assert_eq!(n.content, "x");
}

#[test]
fn connector_touches_either_end() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = make_connector(a, b);
    assert!(c.touches(&a));
    assert!(c.touches(&b));
    assert!(!c.touches(&Uuid::new_v4()));
}

// =============================================================
// Insert / dedupe
// =============================================================

#[test]
fn add_note_twice_keeps_one() {
    let mut doc = DocStore::new();
    let n = make_note(0.0, 0.0, 100.0, 50.0);
    assert!(doc.add_note(n.clone()));
    assert!(!doc.add_note(n.clone()));
    assert_eq!(doc.notes().len(), 1);
}

#[test]
fn add_note_with_existing_id_replaces_in_place() {
    let mut doc = DocStore::new();
    let first = make_note(0.0, 0.0, 100.0, 50.0);
    let second = make_note(5.0, 5.0, 100.0, 50.0);
    doc.add_note(first.clone());
    doc.add_note(second.clone());

    let mut moved = first.clone();
    moved.x = 99.0;
    doc.add_note(moved);

    let order: Vec<_> = doc.notes().keys().copied().collect();
    assert_eq!(order, vec![first.id, second.id]);
    assert_eq!(doc.note(&first.id).unwrap().x, 99.0);
}

#[test]
fn snapshot_dedupes_by_id() {
    let mut doc = DocStore::new();
    let n = make_note(0.0, 0.0, 100.0, 50.0);
    let mut dup = n.clone();
    dup.content = "later".into();
    doc.load_snapshot(Snapshot { notes: vec![n.clone(), dup], ..Default::default() });
    assert_eq!(doc.notes().len(), 1);
    assert_eq!(doc.note(&n.id).unwrap().content, "later");
}

#[test]
fn store_accepts_dangling_connector() {
    let mut doc = DocStore::new();
    let c = make_connector(Uuid::new_v4(), Uuid::new_v4());
    assert!(doc.add_connector(c.clone()));
    assert!(doc.connector(&c.id).is_some());
}

// =============================================================
// Update / remove on missing ids
// =============================================================

#[test]
fn update_missing_note_is_noop() {
    let mut doc = DocStore::new();
    let before = doc.revision();
    assert!(!doc.update_note(&Uuid::new_v4(), &NotePatch::position(1.0, 1.0)));
    assert!(doc.is_empty());
    assert_eq!(doc.revision(), before);
}

#[test]
fn replace_missing_note_does_not_insert() {
    let mut doc = DocStore::new();
    assert!(!doc.replace_note(make_note(0.0, 0.0, 100.0, 50.0)));
    assert!(doc.notes().is_empty());
}

#[test]
fn remove_missing_is_noop() {
    let mut doc = DocStore::new();
    assert!(doc.remove_note(&Uuid::new_v4()).is_none());
    assert!(doc.remove_connector(&Uuid::new_v4()).is_none());
    assert!(doc.remove_stroke(&Uuid::new_v4()).is_none());
    assert!(doc.remove_cursor(&Uuid::new_v4()).is_none());
    assert_eq!(doc.revision(), 0);
}

#[test]
fn update_stroke_replaces_points() {
    let mut doc = DocStore::new();
    let s = make_stroke(&[(0.0, 0.0), (1.0, 1.0)]);
    doc.add_stroke(s.clone());
    let patch = StrokePatch { points: Some(vec![Point::new(5.0, 5.0), Point::new(6.0, 6.0)]), ..Default::default() };
    assert!(doc.update_stroke(&s.id, &patch));
    assert_eq!(doc.stroke(&s.id).unwrap().points[0], Point::new(5.0, 5.0));
}

#[test]
fn update_connector_retargets() {
    let mut doc = DocStore::new();
    let c = make_connector(Uuid::new_v4(), Uuid::new_v4());
    doc.add_connector(c.clone());
    let target = Uuid::new_v4();
    doc.update_connector(&c.id, &ConnectorPatch { to_note_id: Some(target), ..Default::default() });
    assert_eq!(doc.connector(&c.id).unwrap().to_note_id, target);
}

// =============================================================
// Idempotent merge
// =============================================================

#[test]
fn insert_event_applied_twice_matches_once() {
    let n = make_note(1.0, 2.0, 100.0, 50.0);
    let c = make_connector(n.id, Uuid::new_v4());
    let s = make_stroke(&[(0.0, 0.0), (3.0, 3.0)]);
    let cur = make_cursor(Uuid::new_v4(), 1.0, 1.0);

    let mut once = DocStore::new();
    once.add_note(n.clone());
    once.add_connector(c.clone());
    once.add_stroke(s.clone());
    once.upsert_cursor(cur.clone());

    let mut twice = once.clone();
    twice.add_note(n);
    twice.add_connector(c);
    twice.add_stroke(s);
    twice.upsert_cursor(cur);

    assert_eq!(contents(&once), contents(&twice));
    assert_eq!(once.revision(), twice.revision());
}

#[test]
fn update_event_applied_twice_matches_once() {
    let n = make_note(1.0, 2.0, 100.0, 50.0);
    let s = make_stroke(&[(0.0, 0.0), (3.0, 3.0)]);
    let user = Uuid::new_v4();
    let mut doc = DocStore::new();
    doc.add_note(n.clone());
    doc.add_stroke(s.clone());
    doc.upsert_cursor(make_cursor(user, 0.0, 0.0));

    let note_patch = NotePatch::size(300.0, 250.0);
    let stroke_patch = StrokePatch { color: Some("#ef4444".into()), ..Default::default() };
    let cursor_patch = CursorPatch { active: Some(false), ..Default::default() };

    doc.update_note(&n.id, &note_patch);
    doc.update_stroke(&s.id, &stroke_patch);
    doc.update_cursor(&user, &cursor_patch);
    let once = contents(&doc);

    assert!(!doc.update_note(&n.id, &note_patch));
    assert!(!doc.update_stroke(&s.id, &stroke_patch));
    assert!(!doc.update_cursor(&user, &cursor_patch));
    assert_eq!(contents(&doc), once);
}

#[test]
fn delete_event_applied_twice_matches_once() {
    let n = make_note(1.0, 2.0, 100.0, 50.0);
    let c = make_connector(n.id, Uuid::new_v4());
    let mut doc = DocStore::new();
    doc.add_note(n.clone());
    doc.add_connector(c.clone());

    doc.remove_note(&n.id);
    doc.remove_connector(&c.id);
    let once = contents(&doc);
    let rev = doc.revision();

    doc.remove_note(&n.id);
    doc.remove_connector(&c.id);
    assert_eq!(contents(&doc), once);
    assert_eq!(doc.revision(), rev);
}

// =============================================================
// Cursors
// =============================================================

#[test]
fn cursors_are_keyed_by_user() {
    let mut doc = DocStore::new();
    let user = Uuid::new_v4();
    doc.upsert_cursor(make_cursor(user, 1.0, 1.0));
    doc.upsert_cursor(make_cursor(user, 9.0, 9.0));
    assert_eq!(doc.cursors().len(), 1);
    assert_eq!(doc.cursors().get(&user).unwrap().x, 9.0);
}

#[test]
fn remote_cursors_exclude_self_and_inactive() {
    let mut doc = DocStore::new();
    let me = Uuid::new_v4();
    let peer = Uuid::new_v4();
    let gone = Uuid::new_v4();
    doc.upsert_cursor(make_cursor(me, 0.0, 0.0));
    doc.upsert_cursor(make_cursor(peer, 0.0, 0.0));
    let mut idle = make_cursor(gone, 0.0, 0.0);
    idle.active = false;
    doc.upsert_cursor(idle);

    let ids: Vec<_> = doc.remote_cursors(me).map(|c| c.user_id).collect();
    assert_eq!(ids, vec![peer]);
}

// =============================================================
// Cross-collection
// =============================================================

#[test]
fn kind_of_finds_each_collection() {
    let mut doc = DocStore::new();
    let n = make_note(0.0, 0.0, 100.0, 50.0);
    let c = make_connector(n.id, n.id);
    let s = make_stroke(&[(0.0, 0.0)]);
    doc.add_note(n.clone());
    doc.add_connector(c.clone());
    doc.add_stroke(s.clone());

    assert_eq!(doc.kind_of(&n.id), Some(EntityKind::Note));
    assert_eq!(doc.kind_of(&c.id), Some(EntityKind::Connector));
    assert_eq!(doc.kind_of(&s.id), Some(EntityKind::Stroke));
    assert_eq!(doc.kind_of(&Uuid::new_v4()), None);
}

#[test]
fn remove_entity_reports_kind() {
    let mut doc = DocStore::new();
    let s = make_stroke(&[(0.0, 0.0)]);
    doc.add_stroke(s.clone());
    assert_eq!(doc.remove_entity(&s.id), Some(EntityRef { kind: EntityKind::Stroke, id: s.id }));
    assert!(doc.remove_entity(&s.id).is_none());
}

#[test]
fn all_entity_ids_excludes_cursors() {
    let mut doc = DocStore::new();
    let n = make_note(0.0, 0.0, 100.0, 50.0);
    let s = make_stroke(&[(0.0, 0.0)]);
    doc.add_note(n.clone());
    doc.add_stroke(s.clone());
    doc.upsert_cursor(make_cursor(Uuid::new_v4(), 0.0, 0.0));
    assert_eq!(doc.all_entity_ids(), vec![n.id, s.id]);
    assert_eq!(doc.len(), 2);
}

#[test]
fn load_snapshot_replaces_everything() {
    let mut doc = DocStore::new();
    doc.add_note(make_note(0.0, 0.0, 100.0, 50.0));

    let fresh = make_note(7.0, 7.0, 100.0, 50.0);
    doc.load_snapshot(Snapshot { notes: vec![fresh.clone()], ..Default::default() });
    assert_eq!(doc.notes().len(), 1);
    assert!(doc.note(&fresh.id).is_some());
}
