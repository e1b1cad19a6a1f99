//! Test harness helpers for the Pixelpress integration tests.
//!
//! The HTTP tests run against a live server and database:
//!
//! - `PIXELPRESS_BASE_URL` - base URL of a running server
//! - `DATABASE_URL` - the server's database, used to seed catalog fixtures
//!
//! Tests that need either variable skip themselves when it is unset, so
//! `cargo test` stays green on a checkout with no environment.

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;
use uuid::Uuid;

pub use pixelpress_server::middleware::auth::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};

/// Base URL of the server under test, if configured.
#[must_use]
pub fn base_url() -> Option<String> {
    std::env::var("PIXELPRESS_BASE_URL").ok()
}

/// Database URL for seeding fixtures, if configured.
#[must_use]
pub fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Plain HTTP client.
///
/// # Panics
///
/// Panics if the client cannot be constructed (test harness only).
#[must_use]
pub fn client() -> Client {
    Client::builder().build().expect("Failed to create HTTP client")
}

/// Gateway headers for a freshly generated client actor.
#[must_use]
pub fn client_actor() -> (Uuid, [(&'static str, String); 2]) {
    let id = Uuid::new_v4();
    (
        id,
        [
            (ACTOR_ID_HEADER, id.to_string()),
            (ACTOR_ROLE_HEADER, "client".to_string()),
        ],
    )
}

/// Gateway headers for a freshly generated admin actor.
#[must_use]
pub fn admin_actor() -> (Uuid, [(&'static str, String); 2]) {
    let id = Uuid::new_v4();
    (
        id,
        [
            (ACTOR_ID_HEADER, id.to_string()),
            (ACTOR_ROLE_HEADER, "admin".to_string()),
        ],
    )
}
