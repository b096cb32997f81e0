//! Ownership, forking and delivery through TemplateService

use mailforge_mailer::MemoryTransport;
use mailforge_model::{
    Context, DocumentId, DocumentPatch, DocumentRecord, NewDocument, Scalar, UserId, Visibility,
};
use mailforge_store::{MemoryStore, SqliteStore, TemplateStore};
use mailforge_workspace::{TemplateService, WorkspaceError, FALLBACK_SUBJECT};
use serde_json::json;
use std::sync::Arc;

struct Fixture {
    store: Arc<MemoryStore>,
    transport: Arc<MemoryTransport>,
    service: TemplateService,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(MemoryTransport::new());
    let service = TemplateService::new(store.clone(), transport.clone());
    Fixture {
        store,
        transport,
        service,
    }
}

fn alice() -> UserId {
    UserId::new("alice")
}

fn bob() -> UserId {
    UserId::new("bob")
}

fn public_template(service: &TemplateService) -> DocumentId {
    let input: NewDocument = serde_json::from_value(json!({
        "name": "Welcome",
        "category": "Onboarding",
        "subject": "Hello {{name}}",
        "visibility": "public",
        "blocks": [
            { "id": "h", "type": "header", "data": { "title": "Hi {{name}}" } },
            { "id": "t", "type": "text", "data": { "content": "From {{company}}" } }
        ]
    }))
    .unwrap();
    service.create(&alice(), input).unwrap()
}

#[test]
fn test_owner_update_in_place() {
    let f = fixture();
    let id = public_template(&f.service);

    let patch: DocumentPatch = serde_json::from_value(json!({
        "name": "Welcome v2",
        "visibility": "private"
    }))
    .unwrap();
    let outcome = f.service.save(&id, &alice(), patch).unwrap();

    assert_eq!(outcome.id, id);
    assert!(!outcome.created);
    let doc = f.service.fetch(&id, &alice()).unwrap();
    assert_eq!(doc.name, "Welcome v2");
    assert_eq!(doc.visibility, Visibility::Private);
    assert_eq!(doc.forked_from, None);
    assert_eq!(f.store.len(), 1);
}

#[test]
fn test_fork_identity() {
    let f = fixture();
    let id = public_template(&f.service);

    let patch: DocumentPatch = serde_json::from_value(json!({
        "subject": "My copy",
        "visibility": "public"
    }))
    .unwrap();
    let outcome = f.service.save(&id, &bob(), patch).unwrap();

    assert!(outcome.created);
    assert_ne!(outcome.id, id);

    let fork = f.service.fetch(&outcome.id, &bob()).unwrap();
    assert_eq!(fork.owner, bob());
    assert_eq!(fork.visibility, Visibility::Private);
    assert_eq!(fork.forked_from, Some(id.clone()));
    assert_eq!(fork.subject, "My copy");
    // Unpatched fields come from the original.
    assert_eq!(fork.name, "Welcome");
    assert_eq!(fork.blocks.len(), 2);

    // The original is untouched.
    let original = f.service.fetch(&id, &alice()).unwrap();
    assert_eq!(original.subject, "Hello {{name}}");
    assert_eq!(original.owner, alice());
}

#[test]
fn test_two_non_owners_fork_independently() {
    let f = fixture();
    let id = public_template(&f.service);

    let first = f
        .service
        .save(&id, &bob(), DocumentPatch::default())
        .unwrap();
    let second = f
        .service
        .save(&id, &UserId::new("carol"), DocumentPatch::default())
        .unwrap();

    assert_ne!(first.id, second.id);
    for outcome in [&first, &second] {
        let record = f.store.get_by_id(&outcome.id).unwrap().unwrap();
        assert_eq!(record.forked_from, Some(id.clone()));
    }
    assert_eq!(f.store.len(), 3);
}

fn assert_fork_owner_keeps_lineage(service: &TemplateService) {
    let id = public_template(service);
    let fork_id = service
        .save(&id, &bob(), DocumentPatch::default())
        .unwrap()
        .id;

    let patch: DocumentPatch = serde_json::from_value(json!({
        "name": "Bob's welcome",
        "visibility": "public"
    }))
    .unwrap();
    let outcome = service.save(&fork_id, &bob(), patch).unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.id, fork_id);

    let fork = service.fetch(&fork_id, &bob()).unwrap();
    assert_eq!(fork.name, "Bob's welcome");
    assert_eq!(fork.owner, bob());
    assert_eq!(fork.visibility, Visibility::Public);
    assert_eq!(fork.forked_from, Some(id));
}

#[test]
fn test_fork_owner_save_keeps_forked_from() {
    let f = fixture();
    assert_fork_owner_keeps_lineage(&f.service);
    assert_eq!(f.store.len(), 2);
}

#[test]
fn test_fork_owner_save_keeps_forked_from_on_sqlite() {
    let store: Arc<dyn TemplateStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let service = TemplateService::new(store, Arc::new(MemoryTransport::new()));
    assert_fork_owner_keeps_lineage(&service);
}

#[test]
fn test_private_documents_are_hidden_and_unforkable() {
    let f = fixture();
    let id = f
        .service
        .create(&alice(), NewDocument::default())
        .unwrap();

    assert!(matches!(
        f.service.fetch(&id, &bob()),
        Err(WorkspaceError::Forbidden(_))
    ));
    assert!(matches!(
        f.service.save(&id, &bob(), DocumentPatch::default()),
        Err(WorkspaceError::Forbidden(_))
    ));
    assert!(f.service.list(&bob()).unwrap().is_empty());
    assert_eq!(f.store.len(), 1);
}

#[test]
fn test_save_missing_document() {
    let f = fixture();
    assert!(matches!(
        f.service
            .save(&DocumentId::new("nope"), &alice(), DocumentPatch::default()),
        Err(WorkspaceError::NotFound(_))
    ));
}

#[test]
fn test_save_rejects_malformed_blocks() {
    let f = fixture();
    let id = public_template(&f.service);

    for blocks in [json!(7), json!({ "id": "x" }), json!("not json")] {
        let patch = DocumentPatch {
            blocks: Some(blocks),
            ..Default::default()
        };
        assert!(matches!(
            f.service.save(&id, &alice(), patch),
            Err(WorkspaceError::Validation(_))
        ));
    }

    let unknown = DocumentPatch {
        blocks: Some(json!([{ "id": "p", "type": "poll" }])),
        ..Default::default()
    };
    assert!(matches!(
        f.service.save(&id, &alice(), unknown),
        Err(WorkspaceError::Validation(_))
    ));

    // Nothing was written.
    assert_eq!(f.service.fetch(&id, &alice()).unwrap().blocks.len(), 2);
}

#[test]
fn test_save_accepts_serialized_blocks() {
    let f = fixture();
    let id = public_template(&f.service);
    let patch = DocumentPatch {
        blocks: Some(json!(r#"[{"id":"s","type":"spacer","style":{"height":"40px"}}]"#)),
        ..Default::default()
    };

    f.service.save(&id, &alice(), patch).unwrap();
    let doc = f.service.fetch(&id, &alice()).unwrap();
    assert_eq!(doc.blocks.len(), 1);
    assert_eq!(doc.blocks[0].id, "s");
}

#[test]
fn test_delete_authorization() {
    let f = fixture();
    let id = public_template(&f.service);

    assert!(matches!(
        f.service.delete(&id, &bob()),
        Err(WorkspaceError::Forbidden(_))
    ));
    assert_eq!(f.store.len(), 1);

    f.service.delete(&id, &alice()).unwrap();
    assert!(f.store.is_empty());

    assert!(matches!(
        f.service.delete(&id, &alice()),
        Err(WorkspaceError::NotFound(_))
    ));
}

#[test]
fn test_corrupt_stored_blocks_report_serialization_error() {
    let f = fixture();
    f.store
        .insert_record(DocumentRecord {
            id: DocumentId::new("broken"),
            owner: alice(),
            name: "Broken".to_string(),
            category: "Other".to_string(),
            subject: "S".to_string(),
            description: None,
            visibility: Visibility::Public,
            forked_from: None,
            blocks: json!("{truncated"),
            updated_at: chrono::Utc::now(),
        })
        .unwrap();

    let id = DocumentId::new("broken");
    assert!(matches!(
        f.service.fetch(&id, &alice()),
        Err(WorkspaceError::Serialization { .. })
    ));
    // A fork that would need the stored blocks fails without writing.
    assert!(matches!(
        f.service.save(&id, &bob(), DocumentPatch::default()),
        Err(WorkspaceError::Serialization { .. })
    ));
    assert_eq!(f.store.len(), 1);
}

#[test]
fn test_preview_interpolates_context() {
    let f = fixture();
    let id = public_template(&f.service);

    let mut context = Context::new();
    context.insert("name".to_string(), Scalar::from("Sam"));
    let html = f.service.preview(&id, &bob(), Some(context)).unwrap();

    assert!(html.contains("Hi Sam"));
    assert!(html.contains("From Your Company"));
    assert!(!html.contains("{{name}}"));
}

#[test]
fn test_send_hands_mail_to_transport() {
    let f = fixture();
    let id = public_template(&f.service);

    f.service.send(&id, &bob(), "sam@example.com", None).unwrap();

    let sent = f.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "sam@example.com");
    // Subject is sent as stored.
    assert_eq!(sent[0].subject, "Hello {{name}}");
    assert!(sent[0].html.contains("Hi Valued Customer"));
    assert!(sent[0].text.contains("Hi Valued Customer"));
}

#[test]
fn test_send_falls_back_to_default_subject() {
    let f = fixture();
    let input = NewDocument {
        subject: Some(String::new()),
        ..Default::default()
    };
    let id = f.service.create(&alice(), input).unwrap();

    f.service.send(&id, &alice(), "sam@example.com", None).unwrap();
    assert_eq!(f.transport.sent()[0].subject, FALLBACK_SUBJECT);
}

#[test]
fn test_send_surfaces_transport_failure() {
    let store = Arc::new(MemoryStore::new());
    let service = TemplateService::new(store, Arc::new(MemoryTransport::failing("relay refused")));
    let id = public_template(&service);

    match service.send(&id, &alice(), "sam@example.com", None) {
        Err(WorkspaceError::Transport(err)) => assert!(err.to_string().contains("relay refused")),
        other => panic!("expected transport error, got {:?}", other.map(|d| d.message_id)),
    }
}

#[test]
fn test_send_rejects_bad_recipient() {
    let f = fixture();
    let id = public_template(&f.service);
    assert!(matches!(
        f.service.send(&id, &alice(), "nobody", None),
        Err(WorkspaceError::Validation(_))
    ));
    assert!(f.transport.sent().is_empty());
}

#[test]
fn test_fork_flow_on_sqlite() {
    let store: Arc<dyn TemplateStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let service = TemplateService::new(store, Arc::new(MemoryTransport::new()));
    let id = public_template(&service);

    let outcome = service.save(&id, &bob(), DocumentPatch::default()).unwrap();
    assert!(outcome.created);

    let fork = service.fetch(&outcome.id, &bob()).unwrap();
    assert_eq!(fork.forked_from, Some(id));
    assert_eq!(fork.blocks.len(), 2);
    assert_eq!(service.list(&bob()).unwrap().len(), 2);
}
