//! Gateway: HTTP surface for the map frontend.
//!
//! Lifecycle:
//! 1. Resolve config (file, then environment)
//! 2. Seed the token store and build the CRM client
//! 3. Serve the OAuth and contact routes
//!
//! Credential handling lives in `rolemap-oauth`, CRM calls in `rolemap-crm`.

pub mod auth;
pub mod contacts;
pub mod error;
pub mod server;
pub mod state;

pub use {
    error::ApiError,
    server::{build_app, start_server},
    state::AppState,
};
