//! Removal of the author's identity from logically deleted annotations.

use tracing::debug;

use marginalia_core::Annotation;

/// Strip the author from a deleted annotation.
///
/// Takes `user` out of the annotation and revokes that identifier from every
/// permission action, keeping all other principals. Without a `user` this is
/// a no-op. Idempotent.
pub fn anonymize_deleted(annotation: &mut Annotation) {
    let Some(user) = annotation.take_user() else {
        return;
    };
    if let Some(permissions) = annotation.permissions.as_mut() {
        permissions.revoke_everywhere(&user);
    }
    debug!(
        annotation_id = annotation.id().unwrap_or_default(),
        "Anonymized deleted annotation"
    );
}
