//! Integration tests for Summit.
//!
//! # Running Tests
//!
//! These tests require a running stack:
//!
//! ```bash
//! # Start PostgreSQL and run migrations
//! cargo run -p summit-cli -- migrate
//!
//! # Start the server (with a stub identity provider for the test credentials)
//! cargo run -p summit-server
//!
//! # Run the ignored integration tests
//! cargo test -p summit-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `SUMMIT_BASE_URL` - Server under test (default: `http://localhost:3000`)
//! - `SUMMIT_TEST_CREDENTIAL` - A provider credential resolving to a member
//! - `SUMMIT_TEST_ADMIN_CREDENTIAL` - A provider credential resolving to an admin

use reqwest::Client;

/// Base URL of the server under test (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("SUMMIT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// A provider credential that resolves to a regular member, from the
/// environment. Panics with a pointer to the setup docs if unset, which is
/// fine inside `#[ignore]`d tests.
#[must_use]
pub fn member_credential() -> String {
    std::env::var("SUMMIT_TEST_CREDENTIAL")
        .expect("SUMMIT_TEST_CREDENTIAL must be set for integration tests")
}

/// A provider credential that resolves to an admin, from the environment.
#[must_use]
pub fn admin_credential() -> String {
    std::env::var("SUMMIT_TEST_ADMIN_CREDENTIAL")
        .expect("SUMMIT_TEST_ADMIN_CREDENTIAL must be set for integration tests")
}

/// HTTP client that does not follow redirects, so gating redirects are
/// observable as 303/307 responses rather than being chased.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
