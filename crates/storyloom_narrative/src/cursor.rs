//! Eligibility and advancement rules for the feed cursor.

use std::cmp::Ordering;
use storyloom_core::{Cursor, EditEvent};

/// True when `edit` has not yet been folded into the story.
///
/// Edits sharing the cursor's timestamp stay eligible unless they are the very
/// edit the cursor points at. With no cursor, everything is eligible.
///
/// # Examples
///
/// ```
/// use storyloom_core::{Cursor, EditEvent};
/// use storyloom_narrative::is_eligible;
///
/// let ts = "2024-01-01T00:00:00Z".parse().unwrap();
/// let cursor = Cursor::new(ts, "42");
/// let same = EditEvent::new("42", ts, "T", "c", "Bob");
/// let sibling = EditEvent::new("43", ts, "T", "c", "Ann");
///
/// assert!(!is_eligible(&same, Some(&cursor)));
/// assert!(is_eligible(&sibling, Some(&cursor)));
/// assert!(is_eligible(&same, None));
/// ```
pub fn is_eligible(edit: &EditEvent, cursor: Option<&Cursor>) -> bool {
    match cursor {
        None => true,
        Some(cursor) => {
            edit.timestamp() > &cursor.last_timestamp
                || (edit.timestamp() == &cursor.last_timestamp && edit.id() != &cursor.last_id)
        }
    }
}

/// Compare feed ids numerically when both parse, lexically otherwise.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Order two cursors by `(timestamp, id)`.
pub fn compare_cursors(a: &Cursor, b: &Cursor) -> Ordering {
    a.last_timestamp
        .cmp(&b.last_timestamp)
        .then_with(|| compare_ids(&a.last_id, &b.last_id))
}

/// New high-water mark after a batch has been merged.
///
/// Takes the head of a newest-first batch. The result never moves backwards:
/// if the head is older than the current cursor, the current cursor is kept.
/// An empty batch leaves the cursor unchanged.
pub fn advance(cursor: Option<&Cursor>, newest_first: &[EditEvent]) -> Option<Cursor> {
    let Some(head) = newest_first.first() else {
        return cursor.cloned();
    };
    let candidate = Cursor::at(head);

    match cursor {
        Some(current) if compare_cursors(&candidate, current) == Ordering::Less => {
            tracing::debug!(%current, %candidate, "Feed head is behind cursor, keeping cursor");
            Some(current.clone())
        }
        _ => Some(candidate),
    }
}
