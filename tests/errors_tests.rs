use std::error::Error;
use newsletter_digest::errors::{DigestError, truncate_body};

#[test]
fn test_digest_error_implements_error_trait() {
    fn assert_error<T: Error + Send + Sync + 'static>(_: &T) {}

    let error = DigestError::FetchError("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_digest_error_display() {
    let error = DigestError::AuthError("invalid_grant".to_string());
    assert_eq!(
        format!("{error}"),
        "Mailbox authentication failed: invalid_grant"
    );

    let error = DigestError::EmptyContent {
        message_id: "18c2f".to_string(),
    };
    assert_eq!(format!("{error}"), "Message 18c2f has no usable content");

    let error = DigestError::DeliveryError("503".to_string());
    assert_eq!(format!("{error}"), "Failed to deliver digest: 503");
}

#[test]
fn test_only_empty_content_is_non_fatal() {
    let non_fatal = DigestError::EmptyContent {
        message_id: "m".to_string(),
    };
    assert!(!non_fatal.is_fatal());

    for fatal in [
        DigestError::AuthError(String::new()),
        DigestError::FetchError(String::new()),
        DigestError::SummarizationError(String::new()),
        DigestError::DeliveryError(String::new()),
        DigestError::LedgerError(String::new()),
        DigestError::ConfigError(String::new()),
    ] {
        assert!(fatal.is_fatal(), "{fatal:?} should be fatal");
    }
}

#[test]
fn test_error_stages() {
    assert_eq!(DigestError::AuthError(String::new()).stage(), "fetch");
    assert_eq!(
        DigestError::SummarizationError(String::new()).stage(),
        "summarize"
    );
    assert_eq!(DigestError::LedgerError(String::new()).stage(), "ledger");
}

#[test]
fn test_yaml_errors_convert_to_config_error() {
    let yaml_err = serde_yaml::from_str::<Vec<String>>("{").unwrap_err();
    let err: DigestError = yaml_err.into();
    assert!(matches!(err, DigestError::ConfigError(_)));
}

#[test]
fn test_truncate_body() {
    assert_eq!(truncate_body("short", 10), "short");
    assert_eq!(truncate_body("abcdef", 3), "abc... (truncated)");
}
