use thiserror::Error;

use crate::ActionKind;

/// Failure to interpret a wire string as one of the closed vocabularies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("unknown status '{0}'")]
    UnknownStatus(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

/// Rejection of an action command before it is sent to the API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("action '{0}' is not permitted for this user on this entity")]
    NotPermitted(ActionKind),

    #[error("action '{0}' requires a remark")]
    RemarkRequired(ActionKind),

    #[error("remark must be at least {min} characters (got {actual})")]
    RemarkTooShort { min: usize, actual: usize },
}
