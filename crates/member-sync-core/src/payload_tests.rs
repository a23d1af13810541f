//! Tests for payload field extraction.

use super::*;
use serde_json::json;

// ============================================================================
// Path resolution
// ============================================================================

mod path_resolution {
    use super::*;

    #[test]
    fn test_nested_object_path() {
        let payload = json!({"data": {"customer": {"email": "a@x.com"}}});
        assert_eq!(
            resolve_path(&payload, "data.customer.email"),
            Some(&json!("a@x.com"))
        );
    }

    #[test]
    fn test_numeric_segment_indexes_array() {
        let payload = json!({"items": [{"product_id": "P1"}, {"product_id": "P2"}]});
        assert_eq!(resolve_path(&payload, "items.0.product_id"), Some(&json!("P1")));
        assert_eq!(resolve_path(&payload, "items.1.product_id"), Some(&json!("P2")));
        assert_eq!(resolve_path(&payload, "items.2.product_id"), None);
    }

    #[test]
    fn test_path_through_scalar_is_absent() {
        let payload = json!({"data": "not an object"});
        assert_eq!(resolve_path(&payload, "data.id"), None);
    }

    #[test]
    fn test_non_numeric_segment_on_array_is_absent() {
        let payload = json!({"items": [{"id": 1}]});
        assert_eq!(resolve_path(&payload, "items.first.id"), None);
    }
}

// ============================================================================
// Event type canonicalization
// ============================================================================

mod event_key {
    use super::*;

    #[test]
    fn test_underscore_and_dot_forms_match() {
        assert_eq!(
            canonical_event_key("payment_success"),
            canonical_event_key("payment.success")
        );
    }

    #[test]
    fn test_trims_and_lowercases() {
        assert_eq!(
            canonical_event_key("  Subscription_Created "),
            "subscription.created"
        );
    }

    #[test]
    fn test_event_type_priority() {
        let payload = json!({"event": "payment_failed", "data": {"type": "payment.success"}});
        assert_eq!(raw_event_type(&payload), Some("payment_failed".to_string()));
    }

    #[test]
    fn test_nested_event_type() {
        let payload = json!({"event": {"type": "subscription.renewed"}});
        assert_eq!(raw_event_type(&payload), Some("subscription.renewed".to_string()));
    }
}

// ============================================================================
// Field extraction
// ============================================================================

mod extraction {
    use super::*;

    #[test]
    fn test_email_first_present_wins() {
        let payload = json!({
            "customer_email": "first@x.com",
            "customer": {"email": "second@x.com"}
        });
        assert_eq!(extract_email(&payload), Some("first@x.com".to_string()));
    }

    #[test]
    fn test_blank_email_is_skipped() {
        let payload = json!({"email": "   ", "user": {"email": "user@x.com"}});
        assert_eq!(extract_email(&payload), Some("user@x.com".to_string()));
    }

    #[test]
    fn test_email_from_checkout_metadata() {
        let payload = json!({"type": "payment_success", "data": {"metadata": {"email": "m@x.com", "name": "Mia"}}});
        assert_eq!(extract_email(&payload), Some("m@x.com".to_string()));
        assert_eq!(extract_name(&payload), Some("Mia".to_string()));
    }

    #[test]
    fn test_email_is_trimmed() {
        let payload = json!({"email": "  a@x.com\n"});
        assert_eq!(extract_email(&payload), Some("a@x.com".to_string()));
    }

    #[test]
    fn test_numeric_product_id_rendered_as_string() {
        let payload = json!({"product": {"id": 4321}});
        assert_eq!(extract_product_id(&payload), Some("4321".to_string()));
    }

    #[test]
    fn test_product_id_from_line_items() {
        let payload = json!({"line_items": [{"product": {"id": "P9"}}]});
        assert_eq!(extract_product_id(&payload), Some("P9".to_string()));
    }

    #[test]
    fn test_product_id_from_data_items() {
        let payload = json!({"data": {"items": [{"product_id": "P7"}]}});
        assert_eq!(extract_product_id(&payload), Some("P7".to_string()));
    }

    #[test]
    fn test_non_scalar_values_are_skipped() {
        let payload = json!({"product_id": {"nested": true}, "productId": "P3"});
        assert_eq!(extract_product_id(&payload), Some("P3".to_string()));
    }
}

// ============================================================================
// normalize
// ============================================================================

mod normalize_payload {
    use super::*;

    #[test]
    fn test_full_payload() {
        let payload = json!({
            "type": "subscription_created",
            "email": "a@x.com",
            "product_id": "P1",
            "customer": {"name": "Ada"}
        });

        let event = normalize(&payload).unwrap();

        assert_eq!(
            event,
            NormalizedEvent {
                event_key: "subscription.created".to_string(),
                email: "a@x.com".to_string(),
                product_id: Some("P1".to_string()),
                name: Some("Ada".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_email_is_an_error() {
        let payload = json!({"type": "payment.success", "product_id": "P1"});
        assert_eq!(normalize(&payload), Err(NormalizeError::MissingEmail));
    }

    #[test]
    fn test_missing_event_type_gives_empty_key() {
        let payload = json!({"email": "a@x.com"});
        let event = normalize(&payload).unwrap();

        assert_eq!(event.event_key, "");
        assert_eq!(event.product_id, None);
        assert_eq!(event.name, None);
    }

    #[test]
    fn test_non_object_payload_has_no_email() {
        assert_eq!(normalize(&json!([1, 2, 3])), Err(NormalizeError::MissingEmail));
    }
}
