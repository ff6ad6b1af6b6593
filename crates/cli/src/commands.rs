use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use serde_json::{Value as JsonValue, json};

use claimdesk_auth::navigation::menu_for;
use claimdesk_auth::{ActionAuthorizer, ClaimRef, EntityKind, EntityStatus, OwnershipPolicy, ProjectRef, Requester, Role, RuleTable};
use claimdesk_core::{ClaimId, ProjectId, UserId};
use claimdesk_session::{FileSessionStore, HttpTokenRefresher, SessionConfig, SessionGuard};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Claim,
    Project,
}

impl From<KindArg> for EntityKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Claim => EntityKind::Claim,
            KindArg::Project => EntityKind::Project,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Legacy,
    ById,
}

impl From<PolicyArg> for OwnershipPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Legacy => OwnershipPolicy::Legacy,
            PolicyArg::ById => OwnershipPolicy::ById,
        }
    }
}

#[derive(Args, Debug)]
pub struct ActionsArgs {
    /// Entity kind
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Entity status as sent by the API (e.g. Draft, Pending, Ongoing)
    #[arg(long)]
    pub status: String,

    /// Entity id (random when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Display name of the claim creator
    #[arg(long, default_value = "")]
    pub owner_name: String,

    /// User id of the claim creator or project manager
    #[arg(long)]
    pub owner_id: Option<String>,

    /// Role of the requesting user
    #[arg(long)]
    pub role: String,

    /// Id of the requesting user (random when omitted)
    #[arg(long)]
    pub user_id: Option<String>,

    /// Display name of the requesting user
    #[arg(long, default_value = "")]
    pub user_name: String,

    /// Ownership comparison (defaults to CLAIMDESK_OWNERSHIP_POLICY)
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Print the full resolution explanation instead of the action list
    #[arg(long)]
    pub explain: bool,
}

#[derive(Args, Debug)]
pub struct MenuArgs {
    /// Role to filter the menu for
    #[arg(long)]
    pub role: String,
}

fn parse_user_id(raw: Option<&str>, what: &str) -> Result<Option<UserId>> {
    raw.map(|s| s.parse::<UserId>().with_context(|| format!("invalid {what}: {s}")))
        .transpose()
}

pub fn actions(args: &ActionsArgs, config: &SessionConfig) -> Result<JsonValue> {
    let policy = args.policy.map(OwnershipPolicy::from).unwrap_or(config.ownership_policy);
    let authorizer = ActionAuthorizer::standard().with_policy(policy);

    let user_id = parse_user_id(args.user_id.as_deref(), "user id")?.unwrap_or_default();
    let requester = Requester::from_wire(user_id, args.user_name.as_str(), &args.role);
    let owner_id = parse_user_id(args.owner_id.as_deref(), "owner id")?;

    let status = EntityStatus::parse(args.kind.into(), &args.status)?;
    match status {
        EntityStatus::Claim(status) => {
            let id = match args.id.as_deref() {
                Some(raw) => raw.parse::<ClaimId>().with_context(|| format!("invalid claim id: {raw}"))?,
                None => ClaimId::new(),
            };
            let claim = ClaimRef {
                id,
                status,
                owner_name: args.owner_name.clone(),
                owner_id,
            };
            render(&authorizer, &claim, &requester, args.explain)
        }
        EntityStatus::Project(status) => {
            let id = match args.id.as_deref() {
                Some(raw) => raw.parse::<ProjectId>().with_context(|| format!("invalid project id: {raw}"))?,
                None => ProjectId::new(),
            };
            let Some(manager_id) = owner_id else {
                bail!("--owner-id is required for projects");
            };
            let project = ProjectRef { id, status, manager_id };
            render(&authorizer, &project, &requester, args.explain)
        }
    }
}

fn render<'a>(
    authorizer: &ActionAuthorizer,
    resource: impl Into<claimdesk_auth::Resource<'a>>,
    requester: &Requester,
    explain: bool,
) -> Result<JsonValue> {
    let resource = resource.into();
    if explain {
        return Ok(serde_json::to_value(authorizer.explain(resource, requester))?);
    }
    Ok(json!({ "actions": authorizer.resolve(resource, requester) }))
}

pub fn menu(args: &MenuArgs) -> Result<JsonValue> {
    let role = args.role.parse::<Role>()?;
    Ok(serde_json::to_value(menu_for(Some(role)))?)
}

/// The standard rule table, one object per `(role, status)` entry.
pub fn rules() -> JsonValue {
    let table = RuleTable::standard();
    let entries: Vec<JsonValue> = table
        .entries()
        .into_iter()
        .map(|(role, status, rules)| {
            let actions: Vec<JsonValue> = rules
                .iter()
                .map(|rule| {
                    json!({
                        "action": rule.action,
                        "label": rule.action.label(),
                        "ownerOnly": rule.owner_only,
                    })
                })
                .collect();
            json!({ "role": role, "entity": status.kind(), "status": status.as_str(), "actions": actions })
        })
        .collect();
    JsonValue::Array(entries)
}

fn guard_for(config: &SessionConfig) -> Result<SessionGuard> {
    let store = Arc::new(FileSessionStore::new(config.session_file.clone()));
    let refresher = Arc::new(HttpTokenRefresher::with_timeout(&config.api_url, config.refresh_timeout)?);
    Ok(SessionGuard::new(store, refresher, config))
}

pub async fn check_session(config: &SessionConfig) -> Result<JsonValue> {
    let guard = guard_for(config)?;
    let valid = guard.ensure_valid().await;
    tracing::info!(valid, state = ?guard.state(), "session checked");
    Ok(json!({
        "valid": valid,
        "state": guard.state(),
        "sessionFile": config.session_file.display().to_string(),
    }))
}

pub async fn logout(config: &SessionConfig) -> Result<JsonValue> {
    let guard = guard_for(config)?;
    guard.logout().await?;
    Ok(json!({
        "state": guard.state(),
        "cleared": config.session_file.display().to_string(),
    }))
}
