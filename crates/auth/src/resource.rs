//! Read-only views of the entities actions are resolved against.

use serde::{Deserialize, Serialize};

use claimdesk_core::{ClaimId, Entity, ProjectId, UserId};

use crate::status::{ClaimStatus, EntityKind, EntityStatus, ProjectStatus};

/// A claim as listed by the API.
///
/// Claim listings identify the creator by display name (`staffName`); the
/// creator id is only present on some payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRef {
    pub id: ClaimId,
    pub status: ClaimStatus,
    pub owner_name: String,
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

/// A project as listed by the API; the owner is the project manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: ProjectId,
    pub status: ProjectStatus,
    pub manager_id: UserId,
}

impl Entity for ClaimRef {
    type Id = ClaimId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Entity for ProjectRef {
    type Id = ProjectId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Borrowed view over either entity kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resource<'a> {
    Claim(&'a ClaimRef),
    Project(&'a ProjectRef),
}

impl Resource<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Resource::Claim(_) => EntityKind::Claim,
            Resource::Project(_) => EntityKind::Project,
        }
    }

    pub fn status(&self) -> EntityStatus {
        match self {
            Resource::Claim(c) => EntityStatus::Claim(c.status),
            Resource::Project(p) => EntityStatus::Project(p.status),
        }
    }

    /// Identifier rendered as a string (for logs and explanations).
    pub fn id_string(&self) -> String {
        match self {
            Resource::Claim(c) => c.id().to_string(),
            Resource::Project(p) => p.id().to_string(),
        }
    }
}

impl<'a> From<&'a ClaimRef> for Resource<'a> {
    fn from(value: &'a ClaimRef) -> Self {
        Resource::Claim(value)
    }
}

impl<'a> From<&'a ProjectRef> for Resource<'a> {
    fn from(value: &'a ProjectRef) -> Self {
        Resource::Project(value)
    }
}
