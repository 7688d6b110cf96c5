/// Merge engine behavior across save sequences.
///
/// Run with: cargo test --test merge_tests
use chrono::{Duration, Utc};
use dayledger::core::{DayKey, EntryDraft, MergeMode, OwnerId, SpendItem};
use dayledger::merge::merge;

fn day(raw: &str) -> DayKey {
    DayKey::parse(raw).unwrap()
}

fn draft(notes: &str, items: &[(&str, f64)]) -> EntryDraft {
    EntryDraft {
        notes: notes.to_string(),
        spent_items: items
            .iter()
            .map(|(d, a)| SpendItem::new(*d, *a).unwrap())
            .collect(),
    }
}

#[test]
fn overwrite_then_append_sequence() {
    let owner = OwnerId::new();
    let date = day("2025-09-10");
    let now = Utc::now();

    let first = merge(
        owner,
        date,
        None,
        draft("1. morning run", &[("coffee", 4.5)]),
        MergeMode::Overwrite,
        now,
    );
    assert_eq!(first.notes, "1. morning run");
    assert_eq!(first.spent_items.len(), 1);

    let second = merge(
        owner,
        date,
        Some(&first),
        draft("2. groceries", &[("food", 32.0)]),
        MergeMode::Append,
        now + Duration::seconds(1),
    );
    assert_eq!(second.notes, "1. morning run\n2. groceries");
    assert_eq!(second.spent_items.len(), 2);
    assert_eq!(second.spent_items[0].description, "coffee");
    assert_eq!(second.spent_items[1].description, "food");

    let third = merge(
        owner,
        date,
        Some(&second),
        draft("fresh start", &[]),
        MergeMode::Overwrite,
        now + Duration::seconds(2),
    );
    assert_eq!(third.notes, "fresh start");
    assert!(third.spent_items.is_empty());
}

#[test]
fn append_skips_the_separator_when_a_side_is_empty() {
    let owner = OwnerId::new();
    let date = day("2025-09-10");
    let now = Utc::now();

    let existing = merge(owner, date, None, draft("", &[]), MergeMode::Overwrite, now);
    let appended = merge(
        owner,
        date,
        Some(&existing),
        draft("only incoming", &[]),
        MergeMode::Append,
        now,
    );
    assert_eq!(appended.notes, "only incoming");

    let existing = merge(owner, date, None, draft("only existing", &[]), MergeMode::Overwrite, now);
    let appended = merge(
        owner,
        date,
        Some(&existing),
        draft("", &[("tea", 2.0)]),
        MergeMode::Append,
        now,
    );
    assert_eq!(appended.notes, "only existing");
    assert_eq!(appended.spent_items.len(), 1);
}

#[test]
fn repeated_append_is_not_idempotent() {
    let owner = OwnerId::new();
    let date = day("2025-09-10");
    let now = Utc::now();
    let payload = draft("note", &[("tea", 2.0)]);

    let once = merge(owner, date, None, payload.clone(), MergeMode::Append, now);
    let twice = merge(
        owner,
        date,
        Some(&once),
        payload.clone(),
        MergeMode::Append,
        now,
    );
    let thrice = merge(owner, date, Some(&twice), payload, MergeMode::Append, now);

    assert_eq!(twice.notes, "note\nnote");
    assert_eq!(thrice.spent_items.len(), 3);
}

#[test]
fn last_modified_never_decreases() {
    let owner = OwnerId::new();
    let date = day("2025-09-10");
    let later = Utc::now();
    let earlier = later - Duration::seconds(30);

    let first = merge(owner, date, None, draft("a", &[]), MergeMode::Overwrite, later);
    // A write stamped with an earlier clock must not move the timestamp back.
    let second = merge(
        owner,
        date,
        Some(&first),
        draft("b", &[]),
        MergeMode::Overwrite,
        earlier,
    );
    assert_eq!(second.last_modified, first.last_modified);
    assert_eq!(second.notes, "b");
}
