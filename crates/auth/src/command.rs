//! Authorized action commands.
//!
//! A command is only constructed after the authorizer permits the action, so
//! handlers holding an `ActionCommand` never need to re-check the view's rules.

use serde_json::{Value as JsonValue, json};

use claimdesk_core::{ClaimId, ProjectId, UserId};

use crate::authorize::ActionAuthorizer;
use crate::error::ActionError;
use crate::resource::Resource;
use crate::{ActionKind, Requester};

/// Minimum remark length (after trimming) for cancel/reject/return.
pub const MIN_REMARK_LEN: usize = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandTarget {
    Claim(ClaimId),
    Project(ProjectId),
}

/// HTTP route a command is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEndpoint {
    pub method: &'static str,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionCommand {
    pub action: ActionKind,
    pub target: CommandTarget,
    pub actor: UserId,
    pub remark: Option<String>,
    /// Form body for `update` (owned by the caller's form layer).
    pub payload: Option<JsonValue>,
}

impl ActionCommand {
    /// Build a command after checking the action against the authorizer and
    /// validating the remark.
    pub fn prepare<'a>(
        authorizer: &ActionAuthorizer,
        resource: impl Into<Resource<'a>>,
        requester: &Requester,
        action: ActionKind,
        remark: Option<&str>,
    ) -> Result<Self, ActionError> {
        let resource = resource.into();
        if !authorizer.permits(resource, requester, action) {
            tracing::info!(
                action = %action,
                entity_id = %resource.id_string(),
                user_id = %requester.id,
                "action refused by client-side rules"
            );
            return Err(ActionError::NotPermitted(action));
        }

        let remark = validate_remark(action, remark)?;
        let target = match resource {
            Resource::Claim(c) => CommandTarget::Claim(c.id),
            Resource::Project(p) => CommandTarget::Project(p.id),
        };

        Ok(Self {
            action,
            target,
            actor: requester.id,
            remark,
            payload: None,
        })
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = Some(payload);
        self
    }

    /// API route for the command; `None` for actions handled outside the
    /// command API (navigation, printing, the payment flow).
    pub fn endpoint(&self) -> Option<CommandEndpoint> {
        use ActionKind::*;

        let path = match (self.target, self.action) {
            (CommandTarget::Claim(id), Cancel | Approve | Reject | Return | Submit | Update) => {
                format!("/claims/{id}/{}", self.action.as_str())
            }
            (CommandTarget::Project(id), Delete | Update) => {
                format!("/projects/{id}/{}", self.action.as_str())
            }
            _ => return None,
        };

        Some(CommandEndpoint { method: "PUT", path })
    }

    /// JSON body for the command.
    pub fn body(&self) -> JsonValue {
        match self.action {
            ActionKind::Cancel => json!({ "remark": self.remark }),
            ActionKind::Reject | ActionKind::Return => json!({
                "remark": self.remark,
                "approverId": self.actor,
            }),
            ActionKind::Update => self.payload.clone().unwrap_or(JsonValue::Null),
            _ => JsonValue::Null,
        }
    }
}

fn validate_remark(action: ActionKind, remark: Option<&str>) -> Result<Option<String>, ActionError> {
    let trimmed = remark.map(str::trim).filter(|r| !r.is_empty());
    if !action.requires_remark() {
        return Ok(trimmed.map(str::to_string));
    }

    let Some(remark) = trimmed else {
        return Err(ActionError::RemarkRequired(action));
    };
    let actual = remark.chars().count();
    if actual < MIN_REMARK_LEN {
        return Err(ActionError::RemarkTooShort {
            min: MIN_REMARK_LEN,
            actual,
        });
    }
    Ok(Some(remark.to_string()))
}
