//! Tests for error messages.

use super::*;

#[test]
fn test_status_message_includes_body() {
    let error = ApiError::Status {
        status: 503,
        body: "maintenance".to_string(),
    };
    assert_eq!(error.to_string(), "Ghost Admin API returned 503: maintenance");
}

#[test]
fn test_credential_errors_name_the_key_form() {
    let error = ApiError::Auth(AuthError::InvalidAdminKey(AdminKeyError::MissingSeparator));
    assert!(error.to_string().contains("id:secret"));
}

#[test]
fn test_invalid_secret_carries_detail() {
    let error = AdminKeyError::InvalidSecret {
        message: "secret is not valid hex".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Admin API key secret is invalid: secret is not valid hex"
    );
}
