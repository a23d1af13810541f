//! Tests for the HTTP error mapping.

use super::*;
use axum::body::to_bytes;
use serde_json::Value;

async fn render(error: BridgeError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

mod status_mapping {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let cases = [
            (BridgeError::MethodNotAllowed, 405, "method_not_allowed"),
            (BridgeError::InvalidJson, 400, "invalid_json"),
            (BridgeError::InvalidApiKey, 401, "invalid_api_key"),
            (BridgeError::InvalidSignature, 401, "invalid_signature"),
            (BridgeError::MissingEmail, 400, "missing_email"),
            (BridgeError::MissingFields, 400, "missing_fields"),
            (
                BridgeError::MissingConfiguration { key: "GHOST_API_URL" },
                500,
                "missing_configuration",
            ),
            (
                BridgeError::Upstream {
                    status: Some(500),
                    body: String::new(),
                },
                502,
                "upstream_error",
            ),
        ];

        for (error, status, code) in cases {
            assert_eq!(error.status_code().as_u16(), status, "{}", code);
            assert_eq!(error.code(), code);
        }
    }
}

mod response_body {
    use super::*;

    #[tokio::test]
    async fn test_simple_error_body() {
        let (status, body) = render(BridgeError::InvalidSignature).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_signature");
    }

    #[tokio::test]
    async fn test_missing_configuration_names_the_variable() {
        let (status, body) = render(BridgeError::MissingConfiguration {
            key: "FUNGIES_WEBHOOK_SECRET",
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "missing_configuration");
        assert_eq!(body["missing"], "FUNGIES_WEBHOOK_SECRET");
    }

    #[tokio::test]
    async fn test_upstream_body_carries_status_and_detail() {
        let (status, body) = render(BridgeError::Upstream {
            status: Some(422),
            body: "Member already exists".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "upstream_error");
        assert_eq!(body["upstream_status"], 422);
        assert_eq!(body["detail"], "Member already exists");
    }

    #[tokio::test]
    async fn test_upstream_without_response_has_null_status() {
        let (_, body) = render(BridgeError::Upstream {
            status: None,
            body: "connection refused".to_string(),
        })
        .await;

        assert!(body["upstream_status"].is_null());
    }

    #[tokio::test]
    async fn test_long_upstream_detail_is_truncated() {
        let (_, body) = render(BridgeError::Upstream {
            status: Some(500),
            body: "x".repeat(2000),
        })
        .await;

        let detail = body["detail"].as_str().unwrap();
        assert_eq!(detail.len(), MAX_DETAIL_LENGTH + 3);
        assert!(detail.ends_with("..."));
    }
}

mod conversions {
    use super::*;

    #[test]
    fn test_directory_status_keeps_upstream_status() {
        let error: BridgeError = DirectoryError::Upstream {
            status: 404,
            body: "gone".to_string(),
        }
        .into();

        assert!(matches!(
            error,
            BridgeError::Upstream {
                status: Some(404),
                ..
            }
        ));
    }

    #[test]
    fn test_directory_configuration_is_missing_configuration() {
        let error: BridgeError = DirectoryError::Configuration {
            message: "bad key".to_string(),
        }
        .into();

        assert_eq!(error.code(), "missing_configuration");
    }

    #[test]
    fn test_checkout_transport_has_no_status() {
        let error: BridgeError = CheckoutError::Transport {
            message: "timeout".to_string(),
        }
        .into();

        assert!(matches!(error, BridgeError::Upstream { status: None, .. }));
    }

    #[test]
    fn test_missing_email_conversion() {
        let error: BridgeError = NormalizeError::MissingEmail.into();
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }
}
