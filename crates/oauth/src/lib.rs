//! OAuth credential lifecycle: in-memory token store, authorization-code
//! flow, and on-demand access token refresh.

pub mod error;
pub mod flow;
pub mod manager;
pub mod storage;
pub mod types;

pub use {
    error::OAuthError,
    flow::OAuthFlow,
    manager::TokenManager,
    storage::{MemoryTokenStore, TokenStore},
    types::{AuthState, AuthStatus, CredentialSet, OAuthConfig, TokenResponse, now_ms},
};
