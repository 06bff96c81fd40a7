// Flow 模块 - 流程资源定义、条件与连接选择

pub mod builder;
pub mod conditions;
pub mod links;
pub mod loader;
pub mod registry;
pub mod types;

// 重新导出核心类型
pub use builder::FlowAssetBuilder;
pub use conditions::{compare_values, CompareError, CompareOp, Condition};
pub use links::{first_valid_link, for_each_valid_link, random_valid_link};
pub use loader::{
    build_asset_from_config, load_asset_from_path, load_asset_from_str, load_asset_from_value,
};
pub use registry::FlowRegistry;
pub use types::{ActionDescriptor, ActionId, FlowAsset, FlowLink};
