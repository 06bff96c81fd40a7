pub mod action;
pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod runtime;
pub mod script;
pub mod state;
pub mod utils;

pub use action::{ActionContext, ActionFactory, ActionFactoryRegistry, FlowAction, UpdateContext};
pub use cli::{run_headless, summarize_asset, AssetSummary, RunOutcome};
pub use config::{ActionConfig, ConditionConfig, EnvConfig, FlowAssetConfig};
pub use error::{FlowError, Result};
pub use flow::{
    first_valid_link, for_each_valid_link, load_asset_from_path, load_asset_from_str,
    load_asset_from_value, random_valid_link, ActionDescriptor, ActionId, CompareOp, Condition,
    FlowAsset, FlowAssetBuilder, FlowLink, FlowRegistry,
};
pub use runtime::{
    FinishReport, FlowPlayer, PlayerConfig, PlayerObserver, PlayerState, StartOptions,
};
pub use script::{ExpressionBridge, RhaiBridge, ScriptValue};
pub use state::{
    EntityId, LogLevel, ScopeKind, Session, SessionLog, SessionScopes, TracingLog, VarHandle,
    VarType, VarValue, VarVisitor, VariableStore,
};
pub use utils::{logging, validation};
