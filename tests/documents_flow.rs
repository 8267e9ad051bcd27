mod common;

use common::{MockBackend, TOKEN};
use docflow::{
    normalize_template_values, DocFlowClient, DocumentFilter, DocumentKind, Error, LookupOutcome,
    PasswordChange, Session, UserProfile, ViewMode, Workspace,
};
use serde_json::json;
use std::collections::HashMap;

fn alice() -> UserProfile {
    UserProfile {
        id: "7".to_owned(),
        email: "alice@example.com".to_owned(),
        first_name: "Alice".to_owned(),
        last_name: "Tester".to_owned(),
        organization: String::new(),
        position: String::new(),
        phone: String::new(),
        iin: String::new(),
    }
}

#[tokio::test]
async fn upload_embeds_the_id_in_the_stored_name() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let mut workspace = Workspace::new(&alice());

    let item = workspace
        .upload_draft(&client, "contract.pdf", b"%PDF-1.7".to_vec(), "Lease 2024")
        .await
        .unwrap()
        .clone();

    assert_eq!(item.id, "1a2b");
    assert_eq!(item.name, "Lease 2024");
    assert_eq!(item.kind, DocumentKind::Draft);
    assert_eq!(
        workspace.view(),
        &ViewMode::DraftSettings {
            document_id: "1a2b".to_owned()
        }
    );

    let uploads = backend.state.uploads();
    assert_eq!(uploads.len(), 1);
    let file = uploads[0].iter().find(|part| part.name == "file").unwrap();
    assert_eq!(file.file_name.as_deref(), Some("contract-id1a2b.pdf"));
    assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(file.data, b"%PDF-1.7");
    let metadata = uploads[0]
        .iter()
        .find(|part| part.name == "metadata")
        .unwrap();
    let metadata: serde_json::Value = serde_json::from_slice(&metadata.data).unwrap();
    assert_eq!(
        metadata,
        json!({"name": "Lease 2024", "type": "DRAFT", "id": "1a2b"})
    );
}

#[tokio::test]
async fn failed_id_reservation_uploads_nothing() {
    let backend = MockBackend::start().await;
    backend.state.fail("GET /documents/next-id");
    let client = backend.client();

    let result = client
        .upload_as_draft("contract.pdf", b"%PDF-1.7".to_vec(), "Lease 2024")
        .await;

    assert!(matches!(result, Err(Error::Status { .. })));
    assert_eq!(backend.state.calls(), vec!["GET /documents/next-id"]);
    assert!(backend.state.uploads().is_empty());
}

#[tokio::test]
async fn unsupported_extension_is_rejected_offline() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let result = client
        .upload_as_draft("notes.txt", b"hello".to_vec(), "")
        .await;
    assert!(matches!(result, Err(Error::UnsupportedExtension(_))));
    assert!(backend.state.calls().is_empty());
}

#[tokio::test]
async fn listing_sends_filters_and_fills_preview_urls() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let filter = DocumentFilter {
        tags: vec!["legal".to_owned(), "hr".to_owned()],
        ..DocumentFilter::uploaded_by("7")
    };

    let documents = client.list_documents(&filter).await.unwrap();

    assert_eq!(
        backend.state.body("GET /documents/metadata"),
        Some(json!({"uploaderId": "7", "tags": "legal,hr"}))
    );
    assert_eq!(documents.len(), 2);
    assert_eq!(
        documents[0].preview_url,
        format!("{}/documents/1a2b", backend.base_url)
    );
    assert_eq!(documents[1].kind, DocumentKind::Sent);
    assert_eq!(documents[1].tags, vec!["legal".to_owned()]);
}

#[tokio::test]
async fn tag_catalogue() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    assert_eq!(client.list_tags("7").await.unwrap(), vec!["legal", "hr"]);
    client.add_tag("7", "\"urgent\"").await.unwrap();
    assert_eq!(backend.state.body("POST /tags/7"), Some(json!("urgent")));
    client.delete_tag("7", "hr").await.unwrap();
    assert_eq!(backend.state.body("DELETE /tags/7"), Some(json!("hr")));
    assert!(matches!(
        client.add_tag("7", "  ").await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn signer_lookup_prefills_the_form() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    match client.lookup_signer_by_email("bob@example.com").await {
        LookupOutcome::Found(form) => {
            assert_eq!(form.user_id.as_deref(), Some("8"));
            assert_eq!(form.full_name, "Bob Tester");
        }
        LookupOutcome::NotFound => panic!("bob should be found"),
    }
    match client.lookup_signer_by_iin("900101300123").await {
        LookupOutcome::Found(form) => assert_eq!(form.email, "carol@example.com"),
        LookupOutcome::NotFound => panic!("carol should be found"),
    }
    assert_eq!(
        client.lookup_signer_by_email("nobody@example.com").await,
        LookupOutcome::NotFound
    );
}

#[tokio::test]
async fn templates_are_filled_with_blank_placeholders() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let templates = client.list_templates().await.unwrap();
    assert_eq!(templates[0].id, "lease");
    let fields = client.template_fields("lease").await.unwrap();
    let mut values = HashMap::new();
    values.insert("tenant".to_owned(), "Alice".to_owned());
    let values = normalize_template_values(&fields, &values);

    let document = client.fill_template("lease", &values).await.unwrap();
    assert_eq!(document, b"rendered");
    assert_eq!(
        backend.state.body("POST /templates/lease/fill"),
        Some(json!({"tenant": "Alice", "city": " "}))
    );
}

#[tokio::test]
async fn session_lifecycle() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let mut client = DocFlowClient::new(backend.config()).unwrap();

    let mut session = Session::load(&path).unwrap();
    let user = session
        .establish(&mut client, TOKEN.to_owned())
        .await
        .unwrap();
    assert_eq!(user.email, "alice@example.com");
    assert!(path.exists());

    let restored = Session::load(&path).unwrap();
    assert!(restored.is_authenticated());
    assert_eq!(restored.user().map(|user| user.id.as_str()), Some("7"));

    let mut fresh = Session::load(dir.path().join("other.json")).unwrap();
    let rejected = fresh
        .establish(&mut client, "wrong-token".to_owned())
        .await;
    assert!(matches!(rejected, Err(Error::Status { .. })));
    assert!(!fresh.is_authenticated());

    session.logout(&mut client).unwrap();
    assert!(!path.exists());
    assert!(matches!(
        client.fetch_profile().await,
        Err(Error::NotAuthenticated)
    ));
}

fn password(old: &str, new: &str, confirm: &str) -> PasswordChange {
    PasswordChange {
        old_password: old.to_owned(),
        new_password: new.to_owned(),
        confirm_password: confirm.to_owned(),
    }
}

#[tokio::test]
async fn profile_edit_changes_password_then_refreshes() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let mut client = DocFlowClient::new(backend.config()).unwrap();
    let mut session = Session::load(&path).unwrap();
    session
        .establish(&mut client, TOKEN.to_owned())
        .await
        .unwrap();

    let mut edited = session.user().unwrap().clone();
    edited.position = "Lead".to_owned();
    edited.phone = "+7 700 000 0000".to_owned();
    let user = session
        .update_profile(&client, &edited, Some(&password("old", "new-1", "new-1")))
        .await
        .unwrap();
    assert_eq!(user.position, "Lead");

    assert_eq!(
        backend.state.calls(),
        vec![
            "GET /api/profile",
            "PUT /api/profile",
            "PUT /api/auth/password",
            "GET /api/profile",
        ]
    );
    assert_eq!(
        backend.state.body("PUT /api/auth/password"),
        Some(json!({"email": "alice@example.com", "oldPassword": "old", "newPassword": "new-1"}))
    );
    let restored = Session::load(&path).unwrap();
    assert_eq!(restored.user().map(|user| user.phone.as_str()), Some("+7 700 000 0000"));
}

#[tokio::test]
async fn mismatched_passwords_send_nothing() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut client = DocFlowClient::new(backend.config()).unwrap();
    let mut session = Session::load(dir.path().join("session.json")).unwrap();
    session
        .establish(&mut client, TOKEN.to_owned())
        .await
        .unwrap();
    let calls_before = backend.state.calls().len();

    let edited = session.user().unwrap().clone();
    let result = session
        .update_profile(&client, &edited, Some(&password("old", "new-1", "new-2")))
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(matches!(
        client
            .change_password("alice@example.com", &password("old", "a", "b"))
            .await,
        Err(Error::Validation(_))
    ));
    assert_eq!(backend.state.calls().len(), calls_before);
}

#[tokio::test]
async fn failed_profile_save_skips_password_and_refresh() {
    let backend = MockBackend::start().await;
    backend.state.fail("PUT /api/profile");
    let client = backend.client();

    let result = client.update_profile(&alice()).await;
    assert!(matches!(result, Err(Error::Status { .. })));

    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(dir.path().join("session.json")).unwrap();
    let unauthenticated = session
        .update_profile(&client, &alice(), Some(&password("old", "n", "n")))
        .await;
    assert!(matches!(unauthenticated, Err(Error::NotAuthenticated)));
    assert_eq!(backend.state.calls(), vec!["PUT /api/profile"]);
}
