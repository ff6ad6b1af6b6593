use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::resource::Resource;
use crate::rules::{ActionRule, RuleTable};
use crate::status::{EntityKind, EntityStatus};
use crate::{ActionKind, Requester, Role};

/// How the owner of an entity is compared with the requester.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipPolicy {
    /// Claims compare the creator's display name, projects the manager id.
    ///
    /// Two users sharing a display name are treated as the same claim owner.
    #[default]
    Legacy,
    /// Claims and projects both compare user ids. A claim without a creator
    /// id has no owner.
    ById,
}

/// Resolves which actions a requester may invoke on a claim or project.
///
/// Advisory only: the remote API enforces access independently, so a granted
/// action is a rendering decision, not a security guarantee.
///
/// - No IO
/// - No panics
/// - Recomputed on every call
#[derive(Debug, Clone)]
pub struct ActionAuthorizer {
    table: Arc<RuleTable>,
    policy: OwnershipPolicy,
}

impl ActionAuthorizer {
    pub fn new(table: Arc<RuleTable>) -> Self {
        Self {
            table,
            policy: OwnershipPolicy::default(),
        }
    }

    /// Authorizer over `RuleTable::standard()`.
    pub fn standard() -> Self {
        Self::new(Arc::new(RuleTable::standard()))
    }

    pub fn with_policy(mut self, policy: OwnershipPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> OwnershipPolicy {
        self.policy
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Ordered list of actions the requester may invoke on the resource.
    ///
    /// Empty when the role is unknown or has no rule for the status.
    pub fn resolve<'a>(&self, resource: impl Into<Resource<'a>>, requester: &Requester) -> Vec<ActionKind> {
        let resource = resource.into();
        let Some(rules) = self.matching_rules(resource, requester) else {
            return Vec::new();
        };

        let owner = rules.iter().any(|r| r.owner_only) && self.is_owner(resource, requester);

        let actions: Vec<ActionKind> = rules
            .iter()
            .filter(|r| !r.owner_only || owner)
            .map(|r| r.action)
            .collect();

        tracing::debug!(
            entity_kind = ?resource.kind(),
            entity_id = %resource.id_string(),
            status = %resource.status(),
            role = ?requester.role,
            owner,
            actions = ?actions,
            "resolved actions"
        );
        actions
    }

    /// Whether `action` is among the resolved actions.
    pub fn permits<'a>(
        &self,
        resource: impl Into<Resource<'a>>,
        requester: &Requester,
        action: ActionKind,
    ) -> bool {
        self.resolve(resource, requester).contains(&action)
    }

    fn matching_rules(&self, resource: Resource<'_>, requester: &Requester) -> Option<&[ActionRule]> {
        let role = requester.role?;
        let rules = self.table.rules_for(role, resource.status());
        (!rules.is_empty()).then_some(rules)
    }

    fn is_owner(&self, resource: Resource<'_>, requester: &Requester) -> bool {
        match (resource, self.policy) {
            (Resource::Claim(claim), OwnershipPolicy::Legacy) => {
                let matched = !claim.owner_name.is_empty() && claim.owner_name == requester.full_name;
                if matched && claim.owner_id.is_some_and(|id| id != requester.id) {
                    tracing::debug!(
                        claim_id = %claim.id,
                        "claim ownership matched on display name while creator id differs"
                    );
                }
                matched
            }
            (Resource::Claim(claim), OwnershipPolicy::ById) => claim.owner_id == Some(requester.id),
            (Resource::Project(project), _) => project.manager_id == requester.id,
        }
    }

    /// Explain why a resolution came out the way it did.
    ///
    /// Lists granted actions and every registered action that was left out,
    /// with the reason.
    pub fn explain<'a>(&self, resource: impl Into<Resource<'a>>, requester: &Requester) -> ResolutionExplanation {
        let resource = resource.into();
        let summary = ResourceSummary {
            kind: resource.kind(),
            id: resource.id_string(),
            status: resource.status(),
        };

        let Some(role) = requester.role else {
            return ResolutionExplanation {
                resource: summary,
                role: None,
                granted: Vec::new(),
                omitted: Vec::new(),
                denial: Some(DenialKind::UnknownRole),
                reason: "Requester has no recognised role; no actions are available".to_string(),
            };
        };

        let Some(rules) = self.matching_rules(resource, requester) else {
            return ResolutionExplanation {
                resource: summary,
                role: Some(role),
                granted: Vec::new(),
                omitted: Vec::new(),
                denial: Some(DenialKind::NoRuleMatch),
                reason: format!(
                    "No rules registered for role {} on a {} {:?}",
                    role,
                    resource.status(),
                    resource.kind()
                ),
            };
        };

        let owner = self.is_owner(resource, requester);
        let mut granted = Vec::new();
        let mut omitted = Vec::new();
        for rule in rules {
            if rule.owner_only && !owner {
                omitted.push(OmittedAction {
                    action: rule.action,
                    kind: DenialKind::OwnershipDenied,
                    message: format!("'{}' is restricted to the {}", rule.action, owner_label(resource.kind())),
                });
            } else {
                granted.push(rule.action);
            }
        }

        let (denial, reason) = if granted.is_empty() {
            (
                Some(DenialKind::OwnershipDenied),
                format!("Every action for role {} requires being the {}", role, owner_label(resource.kind())),
            )
        } else {
            (None, format!("Role {} grants {} action(s)", role, granted.len()))
        };

        ResolutionExplanation {
            resource: summary,
            role: Some(role),
            granted,
            omitted,
            denial,
            reason,
        }
    }
}

fn owner_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Claim => "claim creator",
        EntityKind::Project => "project manager",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed, serialisable account of a resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionExplanation {
    pub resource: ResourceSummary,
    pub role: Option<Role>,
    pub granted: Vec<ActionKind>,
    pub omitted: Vec<OmittedAction>,
    /// Set when nothing was granted.
    pub denial: Option<DenialKind>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSummary {
    pub kind: EntityKind,
    pub id: String,
    pub status: EntityStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct OmittedAction {
    pub action: ActionKind,
    pub kind: DenialKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    UnknownRole,
    NoRuleMatch,
    OwnershipDenied,
}
