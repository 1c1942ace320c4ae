//! Integration tests for AnnotationWriteService.
//!
//! These tests drive create, update and delete through in-memory
//! collaborators and check what reaches the store.

mod helpers;

use helpers::{alice, stored, Harness};
use marginalia_annotations::mock::MemoryAnnotationStore;
use marginalia_core::{AnnotationFields, Error, Permissions, Principals, PROTECTED_FIELDS};
use serde_json::json;

const U: &str = "acct:u@example.com";
const V: &str = "acct:v@example.com";

fn assert_unauthorized(err: Error, reason: &str) {
    assert!(err.is_authorization(), "expected authorization error, got {err:?}");
    assert_eq!(err.status_code(), 401);
    assert_eq!(err.reason(), reason);
}

// =============================================================================
// CREATE
// =============================================================================

#[tokio::test]
async fn test_create_ignores_protected_fields() {
    let h = Harness::new();
    let fields = AnnotationFields::from_json(json!({
        "text": "hello",
        "created": "2001-01-01T00:00:00Z",
        "updated": "2001-01-01T00:00:00Z",
        "user": "acct:mallory@example.com",
        "consumer": "mallory-client",
        "id": "chosen-id",
    }))
    .unwrap();

    let annotation = h.service.create(fields, &alice(), &Principals::new()).await.unwrap();

    assert_ne!(annotation.id(), Some("chosen-id"));
    assert_eq!(annotation.user(), Some("acct:alice@example.com"));
    assert_eq!(annotation.consumer(), Some("alice-client"));
    assert_ne!(annotation.created().unwrap().to_rfc3339(), "2001-01-01T00:00:00+00:00");

    let saved = h.store.get(annotation.id().unwrap()).unwrap();
    let json = serde_json::to_value(&saved).unwrap();
    assert_eq!(json["user"], "acct:alice@example.com");
    assert_eq!(json["consumer"], "alice-client");
    for field in PROTECTED_FIELDS {
        assert_ne!(json[field], json!("acct:mallory@example.com"));
        assert_ne!(json[field], json!("mallory-client"));
    }
}

#[tokio::test]
async fn test_create_in_group_requires_membership() {
    let h = Harness::new();
    let fields = AnnotationFields::new().with_text("x").with_group("g1");

    let err = h
        .service
        .create(fields.clone(), &alice(), &Principals::new().with_group("other"))
        .await
        .unwrap_err();
    assert_unauthorized(err, "Not authorized to write to group.");
    assert!(h.store.is_empty());

    let annotation = h
        .service
        .create(fields, &alice(), &Principals::new().with_group("g1"))
        .await
        .unwrap();
    assert_eq!(annotation.group.as_deref(), Some("g1"));
    assert_eq!(annotation.user(), Some("acct:alice@example.com"));
    assert_eq!(annotation.consumer(), Some("alice-client"));
}

#[tokio::test]
async fn test_create_sets_nipsa_only_for_flagged_authors() {
    let h = Harness::new();

    let clean = h
        .service
        .create(AnnotationFields::new(), &alice(), &Principals::new())
        .await
        .unwrap();
    assert!(!clean.nipsa);

    h.nipsa.flag("acct:alice@example.com");
    let flagged = h
        .service
        .create(AnnotationFields::new(), &alice(), &Principals::new())
        .await
        .unwrap();
    assert!(flagged.nipsa);
    assert_eq!(h.nipsa.lookup_count(), 2);
}

#[tokio::test]
async fn test_callers_cannot_set_nipsa() {
    let h = Harness::new();
    let fields = AnnotationFields::from_json(json!({"text": "x", "nipsa": true})).unwrap();

    let annotation = h.service.create(fields, &alice(), &Principals::new()).await.unwrap();
    assert!(!annotation.nipsa);
}

#[tokio::test]
async fn test_reply_inherits_parent_group_on_create() {
    let parent = stored("parent", AnnotationFields::new().with_group("g1"));
    let h = Harness::with_store(MemoryAnnotationStore::new().with_annotation(parent));

    let fields = AnnotationFields::new().replying_to(vec!["parent".into()]);

    let err = h
        .service
        .create(fields.clone(), &alice(), &Principals::new())
        .await
        .unwrap_err();
    assert_unauthorized(err, "Not authorized to write to group.");

    let reply = h
        .service
        .create(fields, &alice(), &Principals::new().with_group("g1"))
        .await
        .unwrap();
    assert_eq!(reply.group.as_deref(), Some("g1"));
}

#[tokio::test]
async fn test_reply_to_missing_parent_has_no_group() {
    let h = Harness::new();
    let fields = AnnotationFields::new().replying_to(vec!["gone".into()]);

    let reply = h.service.create(fields, &alice(), &Principals::new()).await.unwrap();
    assert!(reply.group.is_none());
    assert_eq!(h.store.call_count("fetch"), 1);
}

#[tokio::test]
async fn test_create_prepares_before_save() {
    let h = Harness::new();
    let annotation = h
        .service
        .create(AnnotationFields::new(), &alice(), &Principals::new())
        .await
        .unwrap();

    assert_eq!(h.preparer.prepared_ids(), vec![annotation.id().unwrap().to_string()]);
}

// =============================================================================
// UPDATE
// =============================================================================

fn with_permissions() -> Permissions {
    Permissions::new()
        .grant("admin", U)
        .grant("admin", V)
        .grant("read", U)
        .grant("read", V)
        .grant("update", V)
        .grant("delete", V)
}

#[tokio::test]
async fn test_permission_change_requires_admin() {
    let h = Harness::new();
    let mut annotation = stored("a1", AnnotationFields::new().with_permissions(with_permissions()));
    let requested = Permissions::new().grant("read", "group:__world__");

    let err = h
        .service
        .update(
            &mut annotation,
            AnnotationFields::new().with_permissions(requested.clone()),
            false,
            &Principals::new(),
        )
        .await
        .unwrap_err();
    assert_unauthorized(err, "Not authorized to change annotation permissions.");
    assert_eq!(h.store.call_count("save"), 0);

    h.service
        .update(
            &mut annotation,
            AnnotationFields::new().with_permissions(requested.clone()),
            true,
            &Principals::new(),
        )
        .await
        .unwrap();
    assert_eq!(annotation.permissions, Some(requested));
}

#[tokio::test]
async fn test_unchanged_permissions_need_no_admin() {
    let h = Harness::new();
    let mut annotation = stored("a1", AnnotationFields::new().with_permissions(with_permissions()));

    // Same sets, different order in the payload.
    let fields = AnnotationFields::from_json(json!({
        "permissions": {
            "admin": [V, U],
            "read": [V, U],
            "update": [V],
            "delete": [V],
        }
    }))
    .unwrap();

    h.service
        .update(&mut annotation, fields, false, &Principals::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_permissions_match_absent_permissions() {
    let h = Harness::new();
    let mut annotation = stored("a1", AnnotationFields::new());

    h.service
        .update(
            &mut annotation,
            AnnotationFields::new().with_permissions(Permissions::new()),
            false,
            &Principals::new(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_group_move_needs_both_groups() {
    let principals_old_only = Principals::new().with_group("old");
    let principals_new_only = Principals::new().with_group("new");
    let principals_both = Principals::new().with_group("old").with_group("new");

    for (principals, allowed) in [
        (principals_old_only, false),
        (principals_new_only, false),
        (principals_both, true),
    ] {
        let h = Harness::new();
        let mut annotation = stored("a1", AnnotationFields::new().with_group("old"));

        let result = h
            .service
            .update(
                &mut annotation,
                AnnotationFields::new().with_group("new"),
                false,
                &principals,
            )
            .await;

        if allowed {
            result.unwrap();
            assert_eq!(annotation.group.as_deref(), Some("new"));
        } else {
            assert_unauthorized(result.unwrap_err(), "Not authorized to write to group.");
            assert_eq!(annotation.group.as_deref(), Some("old"));
            assert_eq!(h.store.call_count("save"), 0);
        }
    }
}

#[tokio::test]
async fn test_update_without_group_checks_current_group() {
    let h = Harness::new();
    let mut annotation = stored("a1", AnnotationFields::new().with_group("g1"));

    let err = h
        .service
        .update(
            &mut annotation,
            AnnotationFields::new().with_text("edit"),
            false,
            &Principals::new(),
        )
        .await
        .unwrap_err();
    assert_unauthorized(err, "Not authorized to write to group.");

    h.service
        .update(
            &mut annotation,
            AnnotationFields::new().with_text("edit"),
            false,
            &Principals::new().with_group("g1"),
        )
        .await
        .unwrap();
    assert_eq!(annotation.text.as_deref(), Some("edit"));
    assert_eq!(annotation.group.as_deref(), Some("g1"));
}

#[tokio::test]
async fn test_deleted_update_anonymizes() {
    let h = Harness::new();
    let mut annotation = stored("a1", AnnotationFields::new().with_permissions(with_permissions()));
    annotation.assign_identity("a1", &marginalia_core::Author::new(U, "key"), chrono::Utc::now());

    h.service
        .update(
            &mut annotation,
            AnnotationFields::new().mark_deleted(true),
            false,
            &Principals::new(),
        )
        .await
        .unwrap();

    assert_eq!(annotation.user(), None);
    let permissions = annotation.permissions.as_ref().unwrap();
    for action in ["admin", "read", "update", "delete"] {
        assert!(!permissions.allows(action, U));
        assert!(permissions.allows(action, V));
    }
    assert_eq!(h.store.get("a1").unwrap(), annotation);
}

#[tokio::test]
async fn test_not_deleted_update_keeps_author() {
    let h = Harness::new();
    let mut annotation = stored("a1", AnnotationFields::new().with_permissions(with_permissions()));
    annotation.assign_identity("a1", &marginalia_core::Author::new(U, "key"), chrono::Utc::now());

    h.service
        .update(
            &mut annotation,
            AnnotationFields::new().mark_deleted(false),
            false,
            &Principals::new(),
        )
        .await
        .unwrap();

    assert_eq!(annotation.user(), Some(U));
    assert!(annotation.permissions.as_ref().unwrap().allows("admin", U));
}

#[tokio::test]
async fn test_update_refreshes_updated_only() {
    let h = Harness::new();
    let mut annotation = stored("a1", AnnotationFields::new().with_text("old"));
    let created = annotation.created();
    let before = annotation.updated();

    h.service
        .update(
            &mut annotation,
            AnnotationFields::new().with_text("new"),
            false,
            &Principals::new(),
        )
        .await
        .unwrap();

    assert_eq!(annotation.created(), created);
    assert!(annotation.updated() >= before);
    assert_eq!(annotation.id(), Some("a1"));
}

#[tokio::test]
async fn test_update_reply_joins_parent_group_without_membership() {
    let parent = stored("parent", AnnotationFields::new().with_group("g1"));
    let h = Harness::with_store(MemoryAnnotationStore::new().with_annotation(parent));
    let mut annotation = stored("a1", AnnotationFields::new());

    h.service
        .update(
            &mut annotation,
            AnnotationFields::new().replying_to(vec!["parent".into()]),
            false,
            &Principals::new(),
        )
        .await
        .unwrap();

    assert_eq!(annotation.group.as_deref(), Some("g1"));
    assert_eq!(h.store.get("a1").unwrap().group.as_deref(), Some("g1"));
}

// =============================================================================
// DELETE
// =============================================================================

#[tokio::test]
async fn test_delete_requires_group_membership() {
    let annotation = stored("a1", AnnotationFields::new().with_group("g1"));
    let h = Harness::with_store(MemoryAnnotationStore::new().with_annotation(annotation.clone()));

    let err = h
        .service
        .delete(&annotation, &Principals::new())
        .await
        .unwrap_err();
    assert_unauthorized(err, "Not authorized to write to group.");
    assert!(h.store.get("a1").is_some());

    h.service
        .delete(&annotation, &Principals::new().with_group("g1"))
        .await
        .unwrap();
    assert!(h.store.get("a1").is_none());
}

#[tokio::test]
async fn test_store_failures_are_not_authorization_errors() {
    let h = Harness::with_store(MemoryAnnotationStore::new().with_failing_writes());

    let err = h
        .service
        .create(AnnotationFields::new(), &alice(), &Principals::new())
        .await
        .unwrap_err();
    assert!(!err.is_authorization());
    assert_eq!(err.status_code(), 500);
}
