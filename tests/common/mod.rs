//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - A scripted in-memory `ChatApi`
//! - Contact and message fixtures
//! - Custom assertion macros

pub mod assertions;
pub mod fake_api;

pub use fake_api::*;
pub use fixtures::*;
