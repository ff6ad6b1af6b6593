use serde::{Deserialize, Serialize};

use claimdesk_core::UserId;

use crate::Role;

/// The authenticated user asking which actions are available.
///
/// `role` is `None` when the login response carried a role string outside the
/// known vocabulary; such a requester is never granted any action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: UserId,
    pub full_name: String,
    pub role: Option<Role>,
}

impl Requester {
    pub fn new(id: UserId, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            role: Some(role),
        }
    }

    /// Build a requester from the raw login payload fields.
    pub fn from_wire(id: UserId, full_name: impl Into<String>, role: &str) -> Self {
        let role = match role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(err) => {
                tracing::warn!(user_id = %id, error = %err, "unrecognised role; no actions will be granted");
                None
            }
        };
        Self {
            id,
            full_name: full_name.into(),
            role,
        }
    }
}
