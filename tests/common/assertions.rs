//! Custom assertion macros
//!
//! Assertions over `Result` and controller `Outcome`s with more descriptive
//! failure output.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a result is an error, optionally of a given shape
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        assert!($result.is_err(), "Expected Err, got Ok");
    };
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => panic!("Expected different error variant, got: {:?}", e),
        }
    };
}

/// Assert that an operation was skipped for the given reason
#[macro_export]
macro_rules! assert_skipped {
    ($result:expr, $reason:expr) => {
        match $result {
            Ok(campus_chat::client::Outcome::Skipped(reason)) => assert_eq!(reason, $reason),
            Ok(outcome) => panic!("Expected Skipped({:?}), got {:?}", $reason, outcome),
            Err(e) => panic!("Expected Skipped({:?}), got Err: {:?}", $reason, e),
        }
    };
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}
