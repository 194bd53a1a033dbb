use super::*;

#[test]
fn second_init_reports_error() {
    // Other tests in this binary may have installed the subscriber already.
    drop(init());
    let err = init().unwrap_err();
    assert!(err.to_string().starts_with("logging init failed"));
}
