use newsletter_digest::{setup_logging, setup_logging_with};

#[test]
fn test_logging_setup() {
    // Installing the subscriber must not panic, even when called twice.
    let result = std::panic::catch_unwind(|| {
        setup_logging();
        setup_logging_with(true);
    });

    assert!(result.is_ok(), "setup_logging should not panic");
}
