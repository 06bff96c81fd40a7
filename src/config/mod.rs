pub mod asset;
pub mod conditions;
pub mod env;

pub use asset::{ActionConfig, FlowAssetConfig};
pub use conditions::ConditionConfig;
pub use env::EnvConfig;
