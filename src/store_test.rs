#![allow(clippy::float_cmp)]

use canvas::camera::Point;
use canvas::doc::NoteKind;

use super::*;

fn note(board_id: Uuid) -> Note {
    Note {
        id: Uuid::new_v4(),
        board_id,
        kind: NoteKind::Note,
        content: "hello".into(),
        x: 10.0,
        y: 20.0,
        width: 200.0,
        height: 150.0,
        color: "#fef3c7".into(),
    }
}

fn cursor(board_id: Uuid, active: bool) -> Cursor {
    Cursor {
        board_id,
        user_id: Uuid::new_v4(),
        display_name: "Ada".into(),
        x: 1.0,
        y: 2.0,
        color: "#ef4444".into(),
        active,
    }
}

// =============================================================================
// Collection
// =============================================================================

#[test]
fn collection_table_names_round_trip() {
    for collection in Collection::ALL {
        assert_eq!(collection.table().parse::<Collection>().unwrap(), collection);
    }
}

#[test]
fn unknown_table_is_rejected() {
    let err = "boards".parse::<Collection>().unwrap_err();
    assert!(matches!(err, FeedError::UnknownCollection(name) if name == "boards"));
}

#[test]
fn cursors_are_keyed_by_user() {
    assert_eq!(Collection::Cursors.key_field(), "user_id");
    assert_eq!(Collection::Notes.key_field(), "id");
}

#[test]
fn entity_kinds_map_to_tables() {
    assert_eq!(Collection::for_kind(EntityKind::Note), Collection::Notes);
    assert_eq!(Collection::for_kind(EntityKind::Connector), Collection::Connectors);
    assert_eq!(Collection::for_kind(EntityKind::Stroke), Collection::Strokes);
}

// =============================================================================
// Record / Patch
// =============================================================================

#[test]
fn record_key_and_board() {
    let board_id = Uuid::new_v4();
    let n = note(board_id);
    let record = Record::Note(n.clone());
    assert_eq!(record.key(), n.id);
    assert_eq!(record.board_id(), board_id);
    assert_eq!(record.collection(), Collection::Notes);

    let c = cursor(board_id, true);
    assert_eq!(Record::Cursor(c.clone()).key(), c.user_id);
}

#[test]
fn record_apply_matching_patch() {
    let mut record = Record::Note(note(Uuid::new_v4()));
    assert!(record.apply(&Patch::Note(NotePatch::position(5.0, 6.0))));
    let Record::Note(n) = record else { panic!("expected note") };
    assert_eq!((n.x, n.y), (5.0, 6.0));
}

#[test]
fn record_apply_rejects_foreign_patch() {
    let mut record = Record::Note(note(Uuid::new_v4()));
    let before = record.clone();
    assert!(!record.apply(&Patch::Stroke(StrokePatch::default())));
    assert_eq!(record, before);
}

#[test]
fn record_value_uses_wire_names() {
    let value = Record::Note(note(Uuid::new_v4())).to_value().unwrap();
    assert_eq!(value["type"], "note");
    assert_eq!(value["content"], "hello");
}

#[test]
fn snapshot_skips_inactive_cursors() {
    let board_id = Uuid::new_v4();
    let stroke = Stroke {
        id: Uuid::new_v4(),
        board_id,
        author: Uuid::new_v4(),
        color: "#000".into(),
        width: 2.0,
        points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
        created_at: Some(1),
    };
    let snapshot = into_snapshot(vec![
        Record::Note(note(board_id)),
        Record::Stroke(stroke),
        Record::Cursor(cursor(board_id, true)),
        Record::Cursor(cursor(board_id, false)),
    ]);
    assert_eq!(snapshot.notes.len(), 1);
    assert_eq!(snapshot.strokes.len(), 1);
    assert_eq!(snapshot.cursors.len(), 1);
    assert!(snapshot.connectors.is_empty());
}

#[test]
fn patch_collection() {
    assert_eq!(Patch::Cursor(CursorPatch::default()).collection(), Collection::Cursors);
    assert_eq!(Patch::Connector(ConnectorPatch::default()).collection(), Collection::Connectors);
}

// =============================================================================
// Access
// =============================================================================

fn access(owner: Uuid, collaborators: Vec<Collaborator>) -> BoardAccess {
    BoardAccess {
        board: Board { id: Uuid::new_v4(), title: "Roadmap".into(), owner_id: owner },
        collaborators,
    }
}

#[test]
fn owner_may_open() {
    let owner = Uuid::new_v4();
    assert!(access(owner, Vec::new()).permits(owner));
}

#[test]
fn collaborators_of_any_role_may_open() {
    let viewer = Uuid::new_v4();
    let editor = Uuid::new_v4();
    let board = access(
        Uuid::new_v4(),
        vec![
            Collaborator { user_id: viewer, role: Role::Viewer },
            Collaborator { user_id: editor, role: Role::Editor },
        ],
    );
    assert!(board.permits(viewer));
    assert!(board.permits(editor));
}

#[test]
fn strangers_may_not_open() {
    assert!(!access(Uuid::new_v4(), Vec::new()).permits(Uuid::new_v4()));
}

// =============================================================================
// RawChange
// =============================================================================

#[test]
fn operation_parse_is_case_insensitive() {
    assert_eq!("insert".parse::<Operation>().unwrap(), Operation::Insert);
    assert_eq!("UPDATE".parse::<Operation>().unwrap(), Operation::Update);
    assert!(matches!("upsert".parse::<Operation>(), Err(FeedError::UnknownOperation(_))));
}

#[test]
fn raw_change_names_table_and_operation() {
    let c = cursor(Uuid::new_v4(), true);
    let raw = RawChange::new(Operation::Update, &Record::Cursor(c.clone())).unwrap();
    assert_eq!(raw.collection, "board_cursors");
    assert_eq!(raw.operation, "UPDATE");
    assert_eq!(raw.record["user_id"], c.user_id.to_string());
}
