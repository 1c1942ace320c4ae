//! Group-scoped write authorization and reply group inheritance.
//!
//! Authorization is decided by group id alone: the caller may write to group
//! `G` when its effective principals contain `group:G`. Annotations outside
//! any group are writable by anyone otherwise authorized.

use tracing::debug;

use crate::models::{Annotation, Principals};

/// True if `principals` may write into `group_id`.
pub fn authorized_to_write(principals: &Principals, group_id: Option<&str>) -> bool {
    match group_id {
        None => true,
        Some(group_id) => principals.is_member_of(group_id),
    }
}

/// The group `annotation` should carry, given its parent.
///
/// A reply without an explicit group inherits its parent's group. A missing
/// parent, or a parent outside any group, yields no group. Non-replies and
/// replies with their own group keep it.
pub fn resolve_reply_group(annotation: &Annotation, parent: Option<&Annotation>) -> Option<String> {
    if !annotation.is_reply() || annotation.group.is_some() {
        return annotation.group.clone();
    }
    parent.and_then(|p| p.group.clone())
}

/// Apply [`resolve_reply_group`] in place.
pub fn set_group_if_reply(annotation: &mut Annotation, parent: Option<&Annotation>) {
    let group = resolve_reply_group(annotation, parent);
    if group != annotation.group {
        debug!(
            annotation_id = annotation.id().unwrap_or("<new>"),
            group_id = group.as_deref().unwrap_or("<none>"),
            "Reply inherits parent group"
        );
    }
    annotation.group = group;
}
