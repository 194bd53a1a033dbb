use uuid::Uuid;

use super::*;

const DEBOUNCE: Duration = Duration::from_millis(500);

// =============================================================================
// is_boundary_char
// =============================================================================

#[test]
fn boundary_chars() {
    for c in [' ', '\n', '\t', '.', ',', ';', ':', '!', '?'] {
        assert!(is_boundary_char(c), "{c:?}");
    }
    for c in ['a', 'Z', '0', '-', '\'', '(', ')'] {
        assert!(!is_boundary_char(c), "{c:?}");
    }
}

// =============================================================================
// DeferredCommit
// =============================================================================

#[test]
fn deferred_commit_fires_at_deadline() {
    let t0 = Instant::now();
    let mut timer = DeferredCommit::default();
    assert_eq!(timer.arm(1_u8, t0 + DEBOUNCE), None);
    assert_eq!(timer.take_due(t0), None);
    assert_eq!(timer.take_due(t0 + DEBOUNCE), Some(1));
    assert_eq!(timer.deadline(), None);
}

#[test]
fn rearming_same_key_pushes_deadline() {
    let t0 = Instant::now();
    let mut timer = DeferredCommit::default();
    timer.arm(1_u8, t0 + DEBOUNCE);
    assert_eq!(timer.arm(1, t0 + DEBOUNCE * 2), None);
    assert_eq!(timer.take_due(t0 + DEBOUNCE), None);
    assert_eq!(timer.deadline(), Some(t0 + DEBOUNCE * 2));
}

#[test]
fn arming_other_key_displaces() {
    let t0 = Instant::now();
    let mut timer = DeferredCommit::default();
    timer.arm(1_u8, t0);
    assert_eq!(timer.arm(2, t0), Some(1));
}

#[test]
fn cancel_key_only_matches_armed_key() {
    let mut timer = DeferredCommit::default();
    timer.arm(1_u8, Instant::now());
    assert!(!timer.cancel_key(2));
    assert!(timer.cancel_key(1));
    assert_eq!(timer.cancel(), None);
}

// =============================================================================
// TextSavePolicy
// =============================================================================

#[test]
fn plain_keystroke_defers() {
    let t0 = Instant::now();
    let id = Uuid::new_v4();
    let mut policy = TextSavePolicy::new(DEBOUNCE);

    assert!(policy.on_edit(id, "hel", t0).is_empty());
    assert_eq!(policy.next_deadline(), Some(t0 + DEBOUNCE));
    assert_eq!(policy.take_due(t0 + DEBOUNCE), Some(id));
}

#[test]
fn keystrokes_restart_debounce() {
    let t0 = Instant::now();
    let id = Uuid::new_v4();
    let mut policy = TextSavePolicy::new(DEBOUNCE);

    policy.on_edit(id, "h", t0);
    policy.on_edit(id, "he", t0 + Duration::from_millis(400));
    assert_eq!(policy.take_due(t0 + DEBOUNCE), None);
    assert_eq!(policy.take_due(t0 + Duration::from_millis(900)), Some(id));
}

#[test]
fn boundary_commits_immediately_and_disarms() {
    let t0 = Instant::now();
    let id = Uuid::new_v4();
    let mut policy = TextSavePolicy::new(DEBOUNCE);

    policy.on_edit(id, "hello", t0);
    assert_eq!(policy.on_edit(id, "hello ", t0), vec![id]);
    assert_eq!(policy.next_deadline(), None);
}

#[test]
fn editing_another_note_commits_previous() {
    let t0 = Instant::now();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut policy = TextSavePolicy::new(DEBOUNCE);

    policy.on_edit(a, "draft", t0);
    assert_eq!(policy.on_edit(b, "x", t0), vec![a]);
    assert_eq!(policy.on_edit(b, "x!", t0), vec![b]);
}

#[test]
fn boundary_on_other_note_commits_both() {
    let t0 = Instant::now();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut policy = TextSavePolicy::new(DEBOUNCE);

    policy.on_edit(a, "draft", t0);
    assert_eq!(policy.on_edit(b, "done.", t0), vec![a, b]);
}

#[test]
fn empty_content_defers() {
    let mut policy = TextSavePolicy::new(DEBOUNCE);
    assert!(policy.on_edit(Uuid::new_v4(), "", Instant::now()).is_empty());
}

#[test]
fn flush_and_discard() {
    let id = Uuid::new_v4();
    let mut policy = TextSavePolicy::new(DEBOUNCE);
    policy.on_edit(id, "abc", Instant::now());
    assert_eq!(policy.flush(), Some(id));
    assert_eq!(policy.flush(), None);

    policy.on_edit(id, "abc", Instant::now());
    assert!(policy.discard(id));
    assert_eq!(policy.next_deadline(), None);
}

#[test]
fn pending_tracks_only_the_armed_note() {
    let t0 = Instant::now();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut policy = TextSavePolicy::new(DEBOUNCE);

    policy.on_edit(a, "ab ", t0);
    assert!(!policy.is_pending(a));
    policy.on_edit(a, "ab c", t0);
    assert!(policy.is_pending(a));
    assert!(!policy.is_pending(b));

    assert_eq!(policy.take_due(t0 + DEBOUNCE), Some(a));
    assert!(!policy.is_pending(a));
}
