//! The annotation write pipeline.
//!
//! Every mutation goes through [`AnnotationWriteService`], which enforces the
//! business rules the storage layer knows nothing about:
//!
//! - callers never set system-owned fields (guaranteed by [`AnnotationFields`]);
//! - writes require membership in the annotation's group, on both sides of a
//!   group move;
//! - permission changes require admin rights;
//! - replies inherit their parent's group;
//! - annotations by NIPSA'd users are flagged at creation;
//! - logically deleted annotations lose their author.
//!
//! Authorization failures are returned as [`Error::Authorization`] before
//! anything is written.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use marginalia_core::{
    authorized_to_write, new_annotation_id, set_group_if_reply, Annotation, AnnotationFields,
    AnnotationStore, AuthorizationError, Author, Error, IndexPreparer, NipsaRegistry,
    PrivacyFilter, Principals, Result,
};

use crate::anonymize::anonymize_deleted;

/// Create, update and delete annotations under the group and privacy rules.
pub struct AnnotationWriteService {
    store: Arc<dyn AnnotationStore>,
    privacy: PrivacyFilter,
    preparer: Arc<dyn IndexPreparer>,
}

impl AnnotationWriteService {
    pub fn new(
        store: Arc<dyn AnnotationStore>,
        nipsa: Arc<dyn NipsaRegistry>,
        preparer: Arc<dyn IndexPreparer>,
    ) -> Self {
        Self {
            store,
            privacy: PrivacyFilter::new(nipsa),
            preparer,
        }
    }

    /// Create and store an annotation written by `author`.
    ///
    /// # Errors
    ///
    /// [`Error::Authorization`] if `principals` cannot write to the
    /// annotation's group (after reply inheritance). Store and registry
    /// failures propagate unchanged.
    pub async fn create(
        &self,
        fields: AnnotationFields,
        author: &Author,
        principals: &Principals,
    ) -> Result<Annotation> {
        let mut annotation = Annotation::from_fields(fields);

        let parent = self.fetch_parent(&annotation).await?;
        set_group_if_reply(&mut annotation, parent.as_ref());

        check_group_write(principals, annotation.group.as_deref(), "create")?;

        annotation.assign_identity(new_annotation_id(), author, Utc::now());

        if self.privacy.has_nipsa(&author.id).await? {
            annotation.nipsa = true;
        }

        self.persist(&mut annotation).await?;

        debug!(
            subsystem = "annotations",
            component = "write_service",
            op = "create",
            annotation_id = annotation.id().unwrap_or_default(),
            user_id = %author.id,
            consumer = %author.consumer_key,
            "Created annotation"
        );
        Ok(annotation)
    }

    /// Merge `fields` into `annotation` and store the result.
    ///
    /// `has_admin_permission` is the caller's admin right on this annotation,
    /// required to change its permissions.
    ///
    /// # Errors
    ///
    /// [`Error::Authorization`] if the permissions change without admin
    /// rights, or if `principals` cannot write to the current group or to
    /// the requested new one. `annotation` is left untouched on error.
    pub async fn update(
        &self,
        annotation: &mut Annotation,
        fields: AnnotationFields,
        has_admin_permission: bool,
        principals: &Principals,
    ) -> Result<()> {
        let changing_permissions = fields
            .permissions
            .as_ref()
            .is_some_and(|requested| *requested != annotation.permissions_or_empty());
        if changing_permissions && !has_admin_permission {
            warn!(
                subsystem = "annotations",
                component = "write_service",
                op = "update",
                annotation_id = annotation.id().unwrap_or_default(),
                "Permission change rejected"
            );
            return Err(AuthorizationError::permissions_change().into());
        }

        // Only the current and requested groups are checked. A group
        // inherited from a newly referenced parent is not.
        check_group_write(principals, annotation.group.as_deref(), "update")?;
        check_group_write(principals, fields.group.as_deref(), "update")?;

        let mut updated = annotation.clone();
        updated.apply(fields);

        let parent = self.fetch_parent(&updated).await?;
        set_group_if_reply(&mut updated, parent.as_ref());

        if updated.deleted {
            anonymize_deleted(&mut updated);
        }

        updated.touch(Utc::now());
        self.persist(&mut updated).await?;

        debug!(
            subsystem = "annotations",
            component = "write_service",
            op = "update",
            annotation_id = updated.id().unwrap_or_default(),
            deleted = updated.deleted,
            "Updated annotation"
        );
        *annotation = updated;
        Ok(())
    }

    /// Permanently remove `annotation`.
    pub async fn delete(&self, annotation: &Annotation, principals: &Principals) -> Result<()> {
        check_group_write(principals, annotation.group.as_deref(), "delete")?;

        let id = annotation
            .id()
            .ok_or_else(|| Error::InvalidInput("cannot delete an unsaved annotation".to_string()))?;
        self.store.delete(id).await?;

        debug!(
            subsystem = "annotations",
            component = "write_service",
            op = "delete",
            annotation_id = id,
            "Deleted annotation"
        );
        Ok(())
    }

    async fn fetch_parent(&self, annotation: &Annotation) -> Result<Option<Annotation>> {
        match annotation.parent_id() {
            Some(parent_id) => self.store.fetch(parent_id).await,
            None => Ok(None),
        }
    }

    async fn persist(&self, annotation: &mut Annotation) -> Result<()> {
        self.preparer.prepare(annotation);
        self.store.save(annotation).await
    }
}

fn check_group_write(principals: &Principals, group_id: Option<&str>, op: &str) -> Result<()> {
    if authorized_to_write(principals, group_id) {
        return Ok(());
    }
    warn!(
        subsystem = "annotations",
        component = "write_service",
        op,
        group_id = group_id.unwrap_or_default(),
        "Group write rejected"
    );
    Err(AuthorizationError::group_write().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MemoryAnnotationStore, MemoryNipsaRegistry, RecordingPreparer};

    fn service(store: &MemoryAnnotationStore) -> AnnotationWriteService {
        AnnotationWriteService::new(
            Arc::new(store.clone()),
            Arc::new(MemoryNipsaRegistry::new()),
            Arc::new(RecordingPreparer::new()),
        )
    }

    fn author() -> Author {
        Author::new("acct:alice@example.com", "key-1")
    }

    #[tokio::test]
    async fn test_create_saves_once() {
        let store = MemoryAnnotationStore::new();
        let annotation = service(&store)
            .create(AnnotationFields::new().with_text("x"), &author(), &Principals::new())
            .await
            .unwrap();

        assert_eq!(store.call_count("save"), 1);
        assert_eq!(annotation.created(), annotation.updated());
        assert!(store.get(annotation.id().unwrap()).is_some());
    }

    #[tokio::test]
    async fn test_failed_update_leaves_annotation_untouched() {
        let store = MemoryAnnotationStore::new().with_failing_writes();
        let mut annotation = Annotation::from_fields(AnnotationFields::new().with_text("old"));
        annotation.assign_identity("a1", &author(), Utc::now());
        let before = annotation.clone();

        let err = service(&store)
            .update(
                &mut annotation,
                AnnotationFields::new().with_text("new"),
                false,
                &Principals::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store(_)));
        assert_eq!(annotation, before);
    }

    #[tokio::test]
    async fn test_delete_unsaved_is_invalid() {
        let store = MemoryAnnotationStore::new();
        let err = service(&store)
            .delete(&Annotation::default(), &Principals::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(store.call_count("delete"), 0);
    }
}
