//! `claimdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the authorization
//! and session crates (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::DomainError;
pub use id::{ClaimId, ProjectId, UserId};
