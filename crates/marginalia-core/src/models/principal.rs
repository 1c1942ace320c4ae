//! Caller identity: the authenticated author and the effective principals.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::defaults::GROUP_PRINCIPAL_PREFIX;

/// The authenticated user performing a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// User id (e.g. `acct:alice@example.com`).
    pub id: String,
    /// Key of the API consumer the request came through.
    pub consumer_key: String,
}

impl Author {
    pub fn new(id: impl Into<String>, consumer_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            consumer_key: consumer_key.into(),
        }
    }
}

/// Effective principals of the current caller.
///
/// Opaque tokens resolved by the identity provider. Group membership is the
/// token `group:<id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principals(HashSet<String>);

impl Principals {
    pub fn new() -> Self {
        Self::default()
    }

    /// The membership token for a group id.
    pub fn group_principal(group_id: &str) -> String {
        format!("{GROUP_PRINCIPAL_PREFIX}{group_id}")
    }

    pub fn with(mut self, principal: impl Into<String>) -> Self {
        self.0.insert(principal.into());
        self
    }

    /// Add the membership token for `group_id`.
    pub fn with_group(self, group_id: &str) -> Self {
        self.with(Self::group_principal(group_id))
    }

    pub fn insert(&mut self, principal: impl Into<String>) {
        self.0.insert(principal.into());
    }

    pub fn contains(&self, principal: &str) -> bool {
        self.0.contains(principal)
    }

    pub fn is_member_of(&self, group_id: &str) -> bool {
        self.0.contains(&Self::group_principal(group_id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Principals {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
