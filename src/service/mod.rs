//! Service layer
//!
//! Contains the gateway logic separated from HTTP handlers.
//! Services orchestrate the authorization cache and remote Mastodon calls.

mod authorization;
mod interactions;

pub use authorization::AuthorizationGate;
pub use interactions::{InteractionService, Interactions};
