//! UUID v7 utilities for time-ordered annotation identifiers.
//!
//! Annotation ids are UUIDv7 rendered as hyphenated text, so ids assigned
//! later sort after earlier ones.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a fresh annotation id.
pub fn new_annotation_id() -> String {
    new_v7().to_string()
}
