//! Integration tests for the person registry.
//!
//! # Running Tests
//!
//! ```bash
//! registry migrate
//! echo 'integration-secret' | registry user create --username integration
//! cargo run -p registry-server &
//! cargo test -p registry-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `REGISTRY_TEST_BASE_URL` - Server under test (default: <http://localhost:3000>)
//! - `REGISTRY_TEST_USERNAME` - Operator account (default: integration)
//! - `REGISTRY_TEST_PASSWORD` - Its password (default: integration-secret)

use reqwest::{Client, Response, header, redirect};

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("REGISTRY_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// Client that keeps cookies and does not follow redirects, so tests can
/// assert on each `Location`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Client logged in as the integration operator.
///
/// # Panics
///
/// Panics if the login request fails or is refused.
pub async fn logged_in_client() -> Client {
    let username =
        std::env::var("REGISTRY_TEST_USERNAME").unwrap_or_else(|_| "integration".to_owned());
    let password = std::env::var("REGISTRY_TEST_PASSWORD")
        .unwrap_or_else(|_| "integration-secret".to_owned());

    let client = client();
    let resp = client
        .post(format!("{}/auth/login", base_url()))
        .form(&[("username", username.as_str()), ("password", password.as_str())])
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(
        location(&resp),
        "/persons",
        "login refused; create the account with `registry user create`"
    );
    client
}

/// The `Location` header of a redirect.
///
/// # Panics
///
/// Panics if the response is not a redirect.
#[must_use]
pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| panic!("expected a redirect, got {}", resp.status()))
}

/// Person id from a `/persons/{id}` or `/persons/{id}/edit` location.
///
/// # Panics
///
/// Panics if the location has another shape.
#[must_use]
pub fn person_id(location: &str) -> i32 {
    location
        .trim_start_matches("/persons/")
        .trim_end_matches("/edit")
        .parse()
        .unwrap_or_else(|_| panic!("not a person location: {location}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_id() {
        assert_eq!(person_id("/persons/12"), 12);
        assert_eq!(person_id("/persons/7/edit"), 7);
    }
}
