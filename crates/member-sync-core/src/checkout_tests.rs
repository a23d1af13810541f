//! Tests for the checkout session client.

use super::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> FungiesClient {
    FungiesClient::new(&server.uri(), FungiesCredentials::new("pub_test", "sec_test")).unwrap()
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        amount: json!(25),
        email: "a@x.com".to_string(),
        name: "Ada".to_string(),
        success_url: "https://shop.example.com/payment-success".to_string(),
        cancel_url: "https://shop.example.com/payment-cancel".to_string(),
    }
}

mod construction {
    use super::*;

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = FungiesClient::new("not a url", FungiesCredentials::new("p", "s"));
        assert!(matches!(result, Err(CheckoutError::Configuration { .. })));
    }

    #[test]
    fn test_debug_redacts_secret_key() {
        let client = FungiesClient::new(DEFAULT_API_URL, FungiesCredentials::new("pub_1", "sec_hidden"))
            .unwrap();
        let debug = format!("{:?}", client);

        assert!(debug.contains("pub_1"));
        assert!(!debug.contains("sec_hidden"));
    }

    #[test]
    fn test_session_url_keeps_base_path() {
        let client = FungiesClient::new("https://gateway.example.com/proxy/", FungiesCredentials::new("p", "s"))
            .unwrap();

        assert_eq!(
            client.sessions_url(Some("cs_1")).unwrap().as_str(),
            "https://gateway.example.com/proxy/v1/sessions/cs_1"
        );
    }

    #[test]
    fn test_session_id_is_path_escaped() {
        let client = FungiesClient::new(DEFAULT_API_URL, FungiesCredentials::new("p", "s")).unwrap();

        assert_eq!(
            client.sessions_url(Some("a/../b")).unwrap().as_str(),
            "https://api.fungies.io/v1/sessions/a%2F..%2Fb"
        );
    }
}

mod create_session {
    use super::*;

    #[tokio::test]
    async fn test_posts_session_with_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/sessions"))
            .and(header("x-fngs-public-key", "pub_test"))
            .and(header("x-fngs-secret-key", "sec_test"))
            .and(body_json(json!({
                "amount": 25,
                "currency": "USD",
                "successUrl": "https://shop.example.com/payment-success",
                "cancelUrl": "https://shop.example.com/payment-cancel",
                "metadata": {"email": "a@x.com", "name": "Ada"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_123",
                "url": "https://checkout.fungies.io/cs_123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = client(&server).create_session(&checkout_request()).await.unwrap();

        assert_eq!(
            session,
            CheckoutSession {
                session_id: "cs_123".to_string(),
                checkout_url: "https://checkout.fungies.io/cs_123".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_url_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cs_1"})))
            .mount(&server)
            .await;

        let error = client(&server)
            .create_session(&checkout_request())
            .await
            .unwrap_err();

        assert!(matches!(error, CheckoutError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_rejection_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/sessions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let error = client(&server)
            .create_session(&checkout_request())
            .await
            .unwrap_err();

        assert_eq!(
            error,
            CheckoutError::Upstream {
                status: 401,
                body: "invalid key".to_string()
            }
        );
    }
}

mod session_status {
    use super::*;

    #[tokio::test]
    async fn test_returns_session_json_unchanged() {
        let server = MockServer::start().await;
        let session = json!({"id": "cs_123", "status": "paid", "amount": 25});
        Mock::given(method("GET"))
            .and(path("/v1/sessions/cs_123"))
            .and(header("x-fngs-secret-key", "sec_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let status = client(&server).session_status("cs_123").await.unwrap();

        assert_eq!(status, session);
    }

    #[tokio::test]
    async fn test_unknown_session_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/sessions/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let error = client(&server).session_status("missing").await.unwrap_err();

        assert!(matches!(error, CheckoutError::Upstream { status: 404, .. }));
    }
}
