//! `claimdesk-auth`: pure authorization boundary for the claim request system.
//!
//! Decides which actions a user may invoke on claims and projects based on
//! role, lifecycle status and ownership. This crate is intentionally decoupled
//! from HTTP and storage.

pub mod actions;
pub mod authorize;
pub mod command;
pub mod error;
pub mod navigation;
pub mod principal;
pub mod resource;
pub mod roles;
pub mod rules;
pub mod status;
pub mod token;

pub use actions::ActionKind;
pub use authorize::{ActionAuthorizer, DenialKind, OwnershipPolicy, ResolutionExplanation};
pub use command::{ActionCommand, CommandEndpoint, CommandTarget};
pub use error::{ActionError, ParseError};
pub use principal::Requester;
pub use resource::{ClaimRef, ProjectRef, Resource};
pub use roles::Role;
pub use rules::{ActionRule, RuleTable};
pub use status::{ClaimStatus, EntityKind, EntityStatus, ProjectStatus};
pub use token::{AccessTokenClaims, TokenValidationError, decode_claims, token_expiry, validate_claims};
