//! Integration tests for the override value endpoints using wiremock
//!
//! These tests run the API client against a mocked Foreman server and check
//! the request shapes and the mapping of responses into models and errors.

use foreman_provider::api::override_value::OverrideValue;
use foreman_provider::{Client, ProviderConfig, ProviderError};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COLLECTION: &str = "/api/smart_class_parameters/7/override_values";

fn client(server: &MockServer) -> Client {
    Client::new(&ProviderConfig {
        server_url: Some(server.uri()),
        username: Some("admin".to_string()),
        password: Some("changeme".to_string()),
        location_id: Some(2),
        organization_id: Some(1),
        ..Default::default()
    })
    .expect("client should build")
}

mod crud_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_posts_wrapped_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COLLECTION))
            .and(basic_auth("admin", "changeme"))
            .and(query_param("location_id", "2"))
            .and(query_param("organization_id", "1"))
            .and(body_json(json!({
                "override_value": {"match": "os=RedHat", "value": "true", "omit": false}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 12,
                "match": "os=RedHat",
                "value": true,
                "omit": false,
                "created_at": "2024-03-01T10:00:00.000Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let value = OverrideValue::new(7, "os=RedHat", "true", false);
        let created = assert_ok!(client(&server).create_override_value(&value).await);

        assert_eq!(created.id, Some(12));
        assert_eq!(created.smart_class_parameter_id, 7);
        assert_eq!(created.value.as_deref(), Some("true"));
        assert_eq!(created.omit, Some(false));
    }

    #[tokio::test]
    async fn test_create_then_read_returns_same_content() {
        let server = MockServer::start().await;
        let stored = json!({"id": 12, "match": "os=RedHat", "value": "true", "omit": false});

        Mock::given(method("POST"))
            .and(path(COLLECTION))
            .respond_with(ResponseTemplate::new(201).set_body_json(&stored))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/12", COLLECTION)))
            .respond_with(ResponseTemplate::new(200).set_body_json(&stored))
            .mount(&server)
            .await;

        let client = client(&server);
        let created = assert_ok!(
            client
                .create_override_value(&OverrideValue::new(7, "os=RedHat", "true", false))
                .await
        );
        let read = assert_ok!(client.read_override_value(7, 12).await);
        assert_eq!(created, read);
    }

    #[tokio::test]
    async fn test_update_puts_to_member_path() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(format!("{}/12", COLLECTION)))
            .and(body_json(json!({
                "override_value": {"match": "os=Debian", "value": "false", "omit": true}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12, "match": "os=Debian", "value": "false", "omit": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut value = OverrideValue::new(7, "os=Debian", "false", true);
        value.id = Some(12);
        let updated = assert_ok!(client(&server).update_override_value(&value).await);
        assert_eq!(updated.matcher.as_deref(), Some("os=Debian"));
        assert_eq!(updated.omit, Some(true));
    }

    #[tokio::test]
    async fn test_update_without_id_fails_before_request() {
        let server = MockServer::start().await;
        let value = OverrideValue::new(7, "os=Debian", "false", true);

        let err = assert_err!(client(&server).update_override_value(&value).await);
        assert!(matches!(err, ProviderError::RequestConstruction(_)));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(format!("{}/12", COLLECTION)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12})))
            .expect(1)
            .mount(&server)
            .await;

        assert_ok!(client(&server).delete_override_value(7, 12).await);
    }
}

mod query_tests {
    use super::*;

    fn search_value() -> OverrideValue {
        OverrideValue {
            smart_class_parameter_id: 7,
            matcher: Some("os=RedHat".to_string()),
            ..Default::default()
        }
    }

    async fn mount_search(server: &MockServer, subtotal: u64, results: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(COLLECTION))
            .and(query_param("search", "name=\"os=RedHat\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 5,
                "subtotal": subtotal,
                "page": 1,
                "per_page": 20,
                "search": "name=\"os=RedHat\"",
                "results": results
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_query_single_match() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            1,
            json!([{"id": 12, "match": "os=RedHat", "value": "true", "omit": false}]),
        )
        .await;

        let response = assert_ok!(client(&server).query_override_values(&search_value()).await);
        assert_eq!(response.total, Some(5));
        let found = assert_ok!(response.into_single("override value"));
        assert_eq!(found.id, Some(12));
        assert_eq!(found.smart_class_parameter_id, 7);
    }

    #[tokio::test]
    async fn test_query_no_match() {
        let server = MockServer::start().await;
        mount_search(&server, 0, json!([])).await;

        let response = assert_ok!(client(&server).query_override_values(&search_value()).await);
        let err = assert_err!(response.into_single("override value"));
        assert_eq!(
            err.to_string(),
            "Query error: override value search returned no results"
        );
    }

    #[tokio::test]
    async fn test_query_several_matches() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            2,
            json!([
                {"id": 12, "match": "os=RedHat", "value": "a"},
                {"id": 13, "match": "os=RedHat", "value": "b"}
            ]),
        )
        .await;

        let response = assert_ok!(client(&server).query_override_values(&search_value()).await);
        let err = assert_err!(response.into_single("override value"));
        assert!(err.to_string().contains("more than 1 result"));
    }

    #[tokio::test]
    async fn test_query_requires_match() {
        let server = MockServer::start().await;
        let value = OverrideValue {
            smart_class_parameter_id: 7,
            ..Default::default()
        };
        assert_err!(client(&server).query_override_values(&value).await);
    }
}

mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_404_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/99", COLLECTION)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"message": "Resource override_value not found by id '99'"}
            })))
            .mount(&server)
            .await;

        let err = assert_err!(client(&server).read_override_value(7, 99).await);
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_401_is_permission_denied() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/12", COLLECTION)))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unable to authenticate user"))
            .mount(&server)
            .await;

        let err = assert_err!(client(&server).read_override_value(7, 12).await);
        assert!(matches!(err, ProviderError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_422_carries_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COLLECTION))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "error": {"full_messages": ["Match has already been taken"]}
            })))
            .mount(&server)
            .await;

        let value = OverrideValue::new(7, "os=RedHat", "true", false);
        let err = assert_err!(client(&server).create_override_value(&value).await);
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("already been taken"));
            },
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/12", COLLECTION)))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = assert_err!(client(&server).read_override_value(7, 12).await);
        assert!(matches!(err, ProviderError::Decode(_)));
    }
}
