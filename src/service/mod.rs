//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database and federation operations.

mod activity;
mod actor;
mod auth;
mod object;

pub use activity::ActivityService;
pub use actor::{ACTOR_TYPES, ActorService, USERNAME_MAX_CHARS, VaultCheck, validate_username};
pub use auth::{AuthService, IssuedToken};
pub use object::{ObjectService, sanitize_content};
