//! Annotation groups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::principal::Principals;

/// A named scope annotations can be written into.
///
/// The creator is always a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub creator: String,
    members: BTreeSet<String>,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>, creator: impl Into<String>) -> Self {
        let creator = creator.into();
        let mut members = BTreeSet::new();
        members.insert(creator.clone());
        Self {
            id: id.into(),
            name: name.into(),
            creator,
            members,
        }
    }

    pub fn add_member(&mut self, user_id: impl Into<String>) {
        self.members.insert(user_id.into());
    }

    /// Remove a member. The creator cannot be removed.
    pub fn remove_member(&mut self, user_id: &str) -> bool {
        if user_id == self.creator {
            return false;
        }
        self.members.remove(user_id)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    /// The principal granted to members of this group.
    pub fn principal(&self) -> String {
        Principals::group_principal(&self.id)
    }

    /// A version of the group name suitable for use in a URL.
    ///
    /// Runs of non-alphanumeric characters collapse to one `-`. Non-ASCII
    /// letters are lowercased and kept as they are, not transliterated.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        let mut pending_dash = false;
        for c in self.name.chars() {
            if c.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_dash = true;
            }
        }
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_is_member() {
        let group = Group::new("g1", "Reading Club", "acct:alice@example.com");
        assert!(group.is_member("acct:alice@example.com"));
        assert_eq!(group.members().count(), 1);
    }

    #[test]
    fn test_creator_cannot_be_removed() {
        let mut group = Group::new("g1", "Reading Club", "acct:alice@example.com");
        group.add_member("acct:bob@example.com");

        assert!(!group.remove_member("acct:alice@example.com"));
        assert!(group.remove_member("acct:bob@example.com"));
        assert!(!group.is_member("acct:bob@example.com"));
    }

    #[test]
    fn test_slug() {
        let group = Group::new("g1", "  Reading Club: Vol. 2!", "u");
        assert_eq!(group.slug(), "reading-club-vol-2");
    }

    #[test]
    fn test_slug_keeps_non_ascii_letters() {
        let group = Group::new("g1", "Café Über", "u");
        assert_eq!(group.slug(), "café-über");
    }

    #[test]
    fn test_principal() {
        let group = Group::new("g1", "x", "u");
        assert_eq!(group.principal(), "group:g1");
    }
}
