use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// System role of an authenticated user.
///
/// Fixed for the lifetime of a session; the role string comes from the login
/// response (`"Staff"`, `"Approver"`, `"Finance"`, `"Admin"`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Staff,
    Approver,
    Finance,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Staff, Role::Approver, Role::Finance, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "Staff",
            Role::Approver => "Approver",
            Role::Finance => "Finance",
            Role::Admin => "Admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseError::UnknownRole(s.to_string()))
    }
}
