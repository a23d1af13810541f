//! Tests for Ghost Admin API client construction.

use super::*;

fn test_key() -> AdminKey {
    AdminKey::parse("6489f2a1c0ffee0001a1b2c3:00112233445566778899aabbccddeeff").unwrap()
}

mod client_config {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();

        assert!(config.user_agent.starts_with("member-sync/"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.accept_version, "v5.0");
    }

    #[test]
    fn test_config_builders() {
        let config = ClientConfig::default()
            .with_user_agent("tests/1.0")
            .with_timeout(Duration::from_secs(5))
            .with_accept_version("v6.0");

        assert_eq!(config.user_agent, "tests/1.0");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.accept_version, "v6.0");
    }
}

mod construction {
    use super::*;

    #[test]
    fn test_api_base_appends_admin_path() {
        let client = GhostAdminClient::new("https://blog.example.com", test_key()).unwrap();
        assert_eq!(client.api_base(), "https://blog.example.com/ghost/api/admin");
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let client = GhostAdminClient::new("https://blog.example.com/", test_key()).unwrap();
        assert_eq!(client.api_base(), "https://blog.example.com/ghost/api/admin");
    }

    #[test]
    fn test_relative_url_rejected() {
        let result = GhostAdminClient::new("blog.example.com", test_key());
        assert!(matches!(result, Err(ApiError::InvalidUrl { .. })));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let result = GhostAdminClient::new("ftp://blog.example.com", test_key());
        assert!(matches!(result, Err(ApiError::InvalidUrl { .. })));
    }

    #[test]
    fn test_debug_shows_key_id_but_not_secret() {
        let client = GhostAdminClient::new("https://blog.example.com", test_key()).unwrap();
        let debug = format!("{:?}", client);

        assert!(debug.contains("6489f2a1c0ffee0001a1b2c3"));
        assert!(!debug.contains("00112233445566778899aabbccddeeff"));
    }
}
