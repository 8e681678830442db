#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn replace_reports_the_change() {
    let mut doc = TextDocument::new("a+bb");
    let change = doc.replace(1, 0, "c").unwrap();
    assert_eq!(doc.text(), "ac+bb");
    assert_eq!(change, TextChange::insert(1, 1));

    let change = doc.replace(2, 1, "").unwrap();
    assert_eq!(doc.text(), "acbb");
    assert_eq!(change, TextChange::delete(2, 1));
}

#[test]
fn replace_rejects_bad_ranges() {
    let mut doc = TextDocument::new("aé");
    assert_eq!(doc.replace(2, 0, "x"), None);
    assert_eq!(doc.replace(1, 5, ""), None);
    assert_eq!(doc.text(), "aé");
}

#[test]
fn documents_are_always_locked() {
    let doc = TextDocument::new("");
    assert!(doc.is_read_locked() && doc.is_write_locked());
    assert!(doc.input_attributes().is_none());
}
