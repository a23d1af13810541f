//! Tests for the shared error taxonomy.

use super::*;

mod directory_error {
    use super::*;

    #[test]
    fn test_display_includes_status_and_body() {
        let error = DirectoryError::Upstream {
            status: 404,
            body: "Member not found".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Member directory returned 404: Member not found"
        );
    }
}

#[test]
fn test_missing_email_message() {
    assert_eq!(
        NormalizeError::MissingEmail.to_string(),
        "Payload does not contain a subscriber email"
    );
}
