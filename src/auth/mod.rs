//! Authentication
//!
//! Handles:
//! - Request signature verification and response signing
//! - OAuth provider login
//! - Bearer token refresh

mod middleware;
mod oauth;
mod providers;

pub use middleware::{
    SIGNATURE_HEADER, SignedActor, USERNAME_HEADER, require_signature, requires_signature,
};
pub use oauth::auth_router;
pub use providers::{Provider, ProviderVerifier, TokenVerifier, username_from_profile};

#[cfg(test)]
pub use providers::MockTokenVerifier;
