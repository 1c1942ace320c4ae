//! Annotation records and caller-supplied annotation fields.
//!
//! [`Annotation`] is the stored record. Its identity fields (`id`, `created`,
//! `updated`, `user`, `consumer`) can only be set through the system-side
//! methods on the record itself. Caller input arrives as
//! [`AnnotationFields`], which cannot carry those fields: deserialization
//! silently drops them and the extension map refuses them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, BTreeSet};

use super::principal::Author;

/// Fields that are only ever assigned by the system.
pub const PROTECTED_FIELDS: [&str; 5] = ["created", "updated", "user", "consumer", "id"];

/// System-computed flags that caller input cannot set either.
pub const SYSTEM_FLAGS: [&str; 1] = ["nipsa"];

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_dropped_from_input(key: &str) -> bool {
    PROTECTED_FIELDS.contains(&key) || SYSTEM_FLAGS.contains(&key)
}

// =============================================================================
// PERMISSIONS
// =============================================================================

/// Action name to the set of principals allowed to perform it.
///
/// Principal order is irrelevant, so equality is set equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeMap<String, BTreeSet<String>>);

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `principal` the given action.
    pub fn grant(mut self, action: impl Into<String>, principal: impl Into<String>) -> Self {
        self.0
            .entry(action.into())
            .or_default()
            .insert(principal.into());
        self
    }

    /// Principals allowed to perform `action`.
    pub fn principals(&self, action: &str) -> Option<&BTreeSet<String>> {
        self.0.get(action)
    }

    pub fn allows(&self, action: &str, principal: &str) -> bool {
        self.0
            .get(action)
            .map(|set| set.contains(principal))
            .unwrap_or(false)
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Drop `principal` from every action, keeping the action keys.
    pub fn revoke_everywhere(&mut self, principal: &str) {
        for set in self.0.values_mut() {
            set.remove(principal);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// TARGET
// =============================================================================

/// A part of a document an annotation is anchored to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Selectors and index-time additions (e.g. `source_normalized`).
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Target {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            extra: Map::new(),
        }
    }
}

// =============================================================================
// ANNOTATION
// =============================================================================

/// A stored annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    consumer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Ancestor ids, root first; the last entry is the direct parent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nipsa: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<JsonValue>,

    /// Content fields this model does not name.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Annotation {
    /// Build a new, unsaved annotation from caller fields.
    pub fn from_fields(fields: AnnotationFields) -> Self {
        let mut annotation = Self::default();
        annotation.apply(fields);
        annotation
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn consumer(&self) -> Option<&str> {
        self.consumer.as_deref()
    }

    /// True when the annotation references a parent.
    pub fn is_reply(&self) -> bool {
        !self.references.is_empty()
    }

    /// Id of the direct parent, for replies.
    pub fn parent_id(&self) -> Option<&str> {
        self.references.last().map(String::as_str)
    }

    /// Current permissions, with absence read as the empty mapping.
    pub fn permissions_or_empty(&self) -> Permissions {
        self.permissions.clone().unwrap_or_default()
    }

    /// Assign the system-owned identity of a newly created annotation.
    pub fn assign_identity(&mut self, id: impl Into<String>, author: &Author, now: DateTime<Utc>) {
        self.id = Some(id.into());
        self.created = Some(now);
        self.updated = Some(now);
        self.user = Some(author.id.clone());
        self.consumer = Some(author.consumer_key.clone());
    }

    /// Record a modification time.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated = Some(now);
    }

    /// Remove and return the author id.
    pub fn take_user(&mut self) -> Option<String> {
        self.user.take()
    }

    /// Merge caller fields; present values overwrite, extension keys merge per key.
    pub fn apply(&mut self, fields: AnnotationFields) {
        let AnnotationFields {
            group,
            references,
            permissions,
            deleted,
            uri,
            text,
            quote,
            tags,
            target,
            document,
            extra,
        } = fields;

        if group.is_some() {
            self.group = group;
        }
        if let Some(references) = references {
            self.references = references;
        }
        if permissions.is_some() {
            self.permissions = permissions;
        }
        if let Some(deleted) = deleted {
            self.deleted = deleted;
        }
        if uri.is_some() {
            self.uri = uri;
        }
        if text.is_some() {
            self.text = text;
        }
        if quote.is_some() {
            self.quote = quote;
        }
        if tags.is_some() {
            self.tags = tags;
        }
        if let Some(target) = target {
            self.target = target;
        }
        if document.is_some() {
            self.document = document;
        }
        self.extra.extend(extra);
    }
}

// =============================================================================
// CALLER FIELDS
// =============================================================================

/// Annotation fields supplied by a caller on create or update.
///
/// Absent values (`None`, or JSON `null`) leave the target field untouched
/// on merge.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, JsonValue>")]
pub struct AnnotationFields {
    pub group: Option<String>,
    pub references: Option<Vec<String>>,
    pub permissions: Option<Permissions>,
    pub deleted: Option<bool>,
    pub uri: Option<String>,
    pub text: Option<String>,
    pub quote: Option<String>,
    pub tags: Option<Vec<String>>,
    pub target: Option<Vec<Target>>,
    pub document: Option<JsonValue>,
    extra: Map<String, JsonValue>,
}

#[derive(Deserialize)]
struct RawFields {
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    references: Option<Vec<String>>,
    #[serde(default)]
    permissions: Option<Permissions>,
    #[serde(default)]
    deleted: Option<bool>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    quote: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    target: Option<Vec<Target>>,
    #[serde(default)]
    document: Option<JsonValue>,
    #[serde(flatten)]
    extra: Map<String, JsonValue>,
}

impl TryFrom<Map<String, JsonValue>> for AnnotationFields {
    type Error = serde_json::Error;

    fn try_from(mut map: Map<String, JsonValue>) -> Result<Self, Self::Error> {
        map.retain(|key, _| !is_dropped_from_input(key));
        let raw: RawFields = serde_json::from_value(JsonValue::Object(map))?;
        Ok(Self {
            group: raw.group,
            references: raw.references,
            permissions: raw.permissions,
            deleted: raw.deleted,
            uri: raw.uri,
            text: raw.text,
            quote: raw.quote,
            tags: raw.tags,
            target: raw.target,
            document: raw.document,
            extra: raw.extra,
        })
    }
}

impl AnnotationFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON request body.
    pub fn from_json(value: JsonValue) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn replying_to(mut self, references: Vec<String>) -> Self {
        self.references = Some(references);
        self
    }

    pub fn mark_deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    /// Set an unnamed content field. System-owned keys are ignored.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: JsonValue) -> bool {
        let key = key.into();
        if is_dropped_from_input(&key) {
            return false;
        }
        self.extra.insert(key, value);
        true
    }

    pub fn extra(&self) -> &Map<String, JsonValue> {
        &self.extra
    }
}
