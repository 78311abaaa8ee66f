use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docsync::DocSyncError;
use docsync::backend::{
    AuthBackend, Credentials, DocumentBackend, DocumentWrite, HttpBackend, Registration,
};
use docsync::editor::{Snapshot, delta_from_text};
use std::time::Duration;

async fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&format!("{}/api/", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn list_sends_bearer_and_reads_store_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "a1", "title": "Alpha", "updatedAt": "2026-02-01T10:00:00Z"},
            {"_id": "b2", "title": "Beta", "createdAt": "2026-01-01T00:00:00.000Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let documents = backend_for(&server)
        .await
        .list_documents("tok-1")
        .await
        .unwrap();

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].id, "a1");
    assert_eq!(documents[0].title, "Alpha");
    assert!(documents[0].updated_at.is_some());
    assert_eq!(documents[1].id, "b2");
    assert!(documents[1].created_at.is_some());
    server.verify().await;
}

#[tokio::test]
async fn create_posts_title_with_empty_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({"title": "Notes", "content": []})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"_id": "n1", "title": "Notes"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = backend_for(&server)
        .await
        .create_document(
            "tok",
            &DocumentWrite {
                title: "Notes".into(),
                content: Snapshot::empty(),
            },
        )
        .await
        .unwrap();

    assert_eq!(created.id, "n1");
    server.verify().await;
}

#[tokio::test]
async fn get_reads_null_content_and_update_puts_delta() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents/n1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"_id": "n1", "title": "Notes", "content": null}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/documents/n1"))
        .and(body_json(json!({
            "title": "Notes",
            "content": {"ops": [{"insert": "Hello\n"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "n1",
            "title": "Notes",
            "content": {"ops": [{"insert": "Hello\n"}]},
            "updatedAt": "2026-02-01T10:00:05Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server).await;
    let document = backend.get_document("tok", "n1").await.unwrap();
    assert!(document.content.is_null());

    let updated = backend
        .update_document(
            "tok",
            "n1",
            &DocumentWrite {
                title: "Notes".into(),
                content: delta_from_text("Hello"),
            },
        )
        .await
        .unwrap()
        .expect("server echoed the document");
    assert!(updated.updated_at.is_some());
    server.verify().await;
}

#[tokio::test]
async fn update_accepts_bodyless_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/documents/n1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let updated = backend_for(&server)
        .await
        .update_document(
            "tok",
            "n1",
            &DocumentWrite {
                title: "Notes".into(),
                content: Snapshot::blank(),
            },
        )
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn ids_are_path_escaped() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/documents/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    backend_for(&server)
        .await
        .delete_document("tok", "a/b")
        .await
        .unwrap();
    server.verify().await;
}

#[tokio::test]
async fn server_message_becomes_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Document not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let backend = backend_for(&server).await;

    let err = backend.get_document("tok", "missing").await.unwrap_err();
    let DocSyncError::Network(network) = &err else {
        panic!("expected network error, got {err:?}");
    };
    assert!(network.is_not_found());
    assert_eq!(network.message, "Document not found");

    let err = backend.list_documents("tok").await.unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn unreachable_store_is_a_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let backend = HttpBackend::new(&uri, Duration::from_secs(2)).unwrap();
    let err = backend.list_documents("tok").await.unwrap_err();
    assert!(matches!(err, DocSyncError::Network(_)));
}

#[tokio::test]
async fn login_and_register_return_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "jwt-login"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "jwt-register"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server).await;
    let token = backend
        .login(&Credentials::new("ada@example.com", "hunter2"))
        .await
        .unwrap();
    assert_eq!(token, "jwt-login");

    let token = backend
        .register(&Registration {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap();
    assert_eq!(token, "jwt-register");
    server.verify().await;
}

#[tokio::test]
async fn rejected_login_keeps_server_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .await
        .login(&Credentials::new("ada@example.com", "wrong"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid credentials"));
}
