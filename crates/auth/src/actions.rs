use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Action a user can invoke on a claim or project.
///
/// Each variant has a stable identifier (`as_str`) that view code keys its
/// controls on; rendering is entirely the view layer's concern.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Cancel,
    Approve,
    Reject,
    Return,
    MarkPaid,
    Print,
    Submit,
    Update,
    View,
    Delete,
    Archive,
}

impl ActionKind {
    pub const ALL: [ActionKind; 11] = [
        ActionKind::Cancel,
        ActionKind::Approve,
        ActionKind::Reject,
        ActionKind::Return,
        ActionKind::MarkPaid,
        ActionKind::Print,
        ActionKind::Submit,
        ActionKind::Update,
        ActionKind::View,
        ActionKind::Delete,
        ActionKind::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Cancel => "cancel",
            ActionKind::Approve => "approve",
            ActionKind::Reject => "reject",
            ActionKind::Return => "return",
            ActionKind::MarkPaid => "markPaid",
            ActionKind::Print => "print",
            ActionKind::Submit => "submit",
            ActionKind::Update => "update",
            ActionKind::View => "view",
            ActionKind::Delete => "delete",
            ActionKind::Archive => "archive",
        }
    }

    /// Human-readable label (tooltip / dialog title).
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Cancel => "Cancel",
            ActionKind::Approve => "Approve",
            ActionKind::Reject => "Reject",
            ActionKind::Return => "Return",
            ActionKind::MarkPaid => "Mark as Paid",
            ActionKind::Print => "Print",
            ActionKind::Submit => "Submit",
            ActionKind::Update => "Update",
            ActionKind::View => "View",
            ActionKind::Delete => "Delete",
            ActionKind::Archive => "Archive",
        }
    }

    /// Whether the command must carry a reviewer/claimer remark.
    pub fn requires_remark(&self) -> bool {
        matches!(self, ActionKind::Cancel | ActionKind::Reject | ActionKind::Return)
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseError;

    /// Accepts the stable identifier; `"paid"` is kept as an alias of
    /// `markPaid` for older views.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "paid" {
            return Ok(ActionKind::MarkPaid);
        }
        ActionKind::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseError::UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_round_trip_through_from_str() {
        for action in ActionKind::ALL {
            assert_eq!(action.as_str().parse::<ActionKind>().unwrap(), action);
        }
    }

    #[test]
    fn serde_uses_stable_identifiers() {
        let json = serde_json::to_string(&ActionKind::MarkPaid).unwrap();
        assert_eq!(json, "\"markPaid\"");
    }

    #[test]
    fn paid_alias_maps_to_mark_paid() {
        assert_eq!("paid".parse::<ActionKind>().unwrap(), ActionKind::MarkPaid);
        assert!(matches!("pay".parse::<ActionKind>(), Err(ParseError::UnknownAction(_))));
    }

    #[test]
    fn only_reviewing_and_cancelling_need_remarks() {
        let with_remark: Vec<_> = ActionKind::ALL
            .into_iter()
            .filter(|a| a.requires_remark())
            .collect();
        assert_eq!(
            with_remark,
            vec![ActionKind::Cancel, ActionKind::Reject, ActionKind::Return]
        );
    }
}
