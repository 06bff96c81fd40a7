use thiserror::Error;

use crate::state::VarType;

pub type Result<T> = std::result::Result<T, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("unknown action `{0}` in flow asset")]
    UnknownAction(String),
    #[error("duplicate action id `{0}` in flow asset")]
    DuplicateAction(String),
    #[error("flow asset `{0}` has no actions")]
    EmptyAsset(String),
    #[error("no start action could be resolved for flow asset `{0}`")]
    MissingStartAction(String),
    #[error("action type `{0}` not registered")]
    ActionNotRegistered(String),
    #[error("invalid parameters for action `{action}`: {reason}")]
    InvalidParams { action: String, reason: String },
    #[error("variable `{0}` not found")]
    UnknownVariable(String),
    #[error("variable type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: VarType, found: VarType },
    #[error("variable handle does not belong to this store")]
    ForeignHandle,
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("invalid flow asset: {0}")]
    Asset(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
