//! Lifecycle statuses of claims and projects.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Lifecycle of a claim request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Paid,
}

/// Lifecycle of a project.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    Draft,
    Ongoing,
    Rejected,
    Archived,
}

/// Which kind of entity a status (or rule) applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Claim,
    Project,
}

/// A status tagged with its entity kind.
///
/// Claim statuses and project statuses share names (`Draft`, `Rejected`) but
/// are distinct lifecycles, so rules are keyed on this tagged form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum EntityStatus {
    Claim(ClaimStatus),
    Project(ProjectStatus),
}

impl EntityStatus {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityStatus::Claim(_) => EntityKind::Claim,
            EntityStatus::Project(_) => EntityKind::Project,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Claim(s) => s.as_str(),
            EntityStatus::Project(s) => s.as_str(),
        }
    }

    /// Position in the entity's lifecycle, following `ClaimStatus::ALL` /
    /// `ProjectStatus::ALL`.
    pub fn lifecycle_index(&self) -> usize {
        match self {
            EntityStatus::Claim(s) => ClaimStatus::ALL.iter().position(|st| st == s),
            EntityStatus::Project(s) => ProjectStatus::ALL.iter().position(|st| st == s),
        }
        .unwrap_or(usize::MAX)
    }

    /// Parse a wire status for the given entity kind.
    pub fn parse(kind: EntityKind, s: &str) -> Result<Self, ParseError> {
        match kind {
            EntityKind::Claim => s.parse().map(EntityStatus::Claim),
            EntityKind::Project => s.parse().map(EntityStatus::Project),
        }
    }
}

impl From<ClaimStatus> for EntityStatus {
    fn from(value: ClaimStatus) -> Self {
        EntityStatus::Claim(value)
    }
}

impl From<ProjectStatus> for EntityStatus {
    fn from(value: ProjectStatus) -> Self {
        EntityStatus::Project(value)
    }
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 6] = [
        ClaimStatus::Draft,
        ClaimStatus::Pending,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
        ClaimStatus::Cancelled,
        ClaimStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "Draft",
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Cancelled => "Cancelled",
            ClaimStatus::Paid => "Paid",
        }
    }
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Draft,
        ProjectStatus::Ongoing,
        ProjectStatus::Rejected,
        ProjectStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "Draft",
            ProjectStatus::Ongoing => "Ongoing",
            ProjectStatus::Rejected => "Rejected",
            ProjectStatus::Archived => "Archived",
        }
    }
}

impl FromStr for ClaimStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ParseError::UnknownStatus(s.to_string()))
    }
}

impl FromStr for ProjectStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ParseError::UnknownStatus(s.to_string()))
    }
}

impl core::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
