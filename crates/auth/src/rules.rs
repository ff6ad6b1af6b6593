//! Static role × status → action tables.

use std::collections::HashMap;

use serde::Serialize;

use crate::status::{ClaimStatus, EntityStatus, ProjectStatus};
use crate::{ActionKind, Role};

/// One entry of a rule table: an action, optionally restricted to the owner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActionRule {
    pub action: ActionKind,
    pub owner_only: bool,
}

impl ActionRule {
    pub const fn any(action: ActionKind) -> Self {
        Self {
            action,
            owner_only: false,
        }
    }

    pub const fn owner_only(action: ActionKind) -> Self {
        Self {
            action,
            owner_only: true,
        }
    }
}

/// Immutable mapping `(Role, EntityStatus) → [ActionRule]`.
///
/// Built once (usually `RuleTable::standard()`) and shared read-only; the order
/// of rules within an entry is the order actions are presented in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: HashMap<(Role, EntityStatus), Vec<ActionRule>>,
}

impl RuleTable {
    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::default()
    }

    /// The claim and project tables of the claim request system.
    pub fn standard() -> Self {
        Self::builder()
            .extend(Self::claim_defaults())
            .extend(Self::project_defaults())
            .build()
    }

    pub fn claim_defaults() -> RuleTable {
        use ActionKind::*;

        Self::builder()
            .allow(
                Role::Staff,
                ClaimStatus::Draft,
                [
                    ActionRule::owner_only(Cancel),
                    ActionRule::owner_only(Update),
                    ActionRule::owner_only(Submit),
                ],
            )
            .allow(
                Role::Approver,
                ClaimStatus::Pending,
                [ActionRule::any(Approve), ActionRule::any(Reject), ActionRule::any(Return)],
            )
            .allow(
                Role::Finance,
                ClaimStatus::Approved,
                [ActionRule::any(MarkPaid), ActionRule::any(Print)],
            )
            .build()
    }

    pub fn project_defaults() -> RuleTable {
        use ActionKind::*;

        let editable = [
            ActionRule::owner_only(Delete),
            ActionRule::owner_only(Update),
            ActionRule::any(View),
        ];

        let mut builder = Self::builder();
        for role in [Role::Admin, Role::Staff] {
            builder = builder
                .allow(role, ProjectStatus::Draft, editable)
                .allow(
                    role,
                    ProjectStatus::Ongoing,
                    [ActionRule::owner_only(Update), ActionRule::any(View)],
                )
                .allow(role, ProjectStatus::Rejected, editable)
                .allow(role, ProjectStatus::Archived, [ActionRule::any(View)]);
        }
        builder.build()
    }

    /// Rules registered for the pair, in declaration order (empty if none).
    pub fn rules_for(&self, role: Role, status: EntityStatus) -> &[ActionRule] {
        self.rules
            .get(&(role, status))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, role: Role, status: EntityStatus) -> bool {
        self.rules.contains_key(&(role, status))
    }

    /// Number of `(role, status)` entries.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All entries, sorted by role, then entity kind, then lifecycle order
    /// (for audit output).
    pub fn entries(&self) -> Vec<(Role, EntityStatus, &[ActionRule])> {
        let mut out: Vec<_> = self
            .rules
            .iter()
            .map(|((role, status), rules)| (*role, *status, rules.as_slice()))
            .collect();
        out.sort_by_key(|(role, status, _)| (*role, status.kind() as u8, status.lifecycle_index()));
        out
    }
}

#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    rules: HashMap<(Role, EntityStatus), Vec<ActionRule>>,
}

impl RuleTableBuilder {
    /// Append rules for a pair. An action already registered for the pair
    /// keeps its original position and flags.
    pub fn allow(
        mut self,
        role: Role,
        status: impl Into<EntityStatus>,
        rules: impl IntoIterator<Item = ActionRule>,
    ) -> Self {
        let entry = self.rules.entry((role, status.into())).or_default();
        for rule in rules {
            if !entry.iter().any(|r| r.action == rule.action) {
                entry.push(rule);
            }
        }
        self
    }

    /// Merge every entry of another table.
    pub fn extend(mut self, other: RuleTable) -> Self {
        for ((role, status), rules) in other.rules {
            self = self.allow(role, status, rules);
        }
        self
    }

    pub fn build(self) -> RuleTable {
        RuleTable { rules: self.rules }
    }
}
