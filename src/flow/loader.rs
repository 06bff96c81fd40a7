use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::config::FlowAssetConfig;
use crate::error::Result;
use crate::flow::builder::FlowAssetBuilder;
use crate::flow::types::FlowAsset;

/// 从配置构建 FlowAsset
pub fn build_asset_from_config(config: &FlowAssetConfig) -> Result<FlowAsset> {
    let mut builder = FlowAssetBuilder::new(config.name.clone());
    if let Some(start) = &config.start {
        builder.set_start(start);
    }

    for (name, value) in &config.variables {
        builder.set_variable(name, value.clone());
    }

    for action in &config.actions {
        builder.add_action_with_params(&action.id, &action.action_type, action.params.clone());
        for link in &action.links {
            builder.add_link(&action.id, link.clone());
        }
    }

    let asset = builder.build()?;
    debug!(flow = asset.name(), actions = asset.len(), "flow asset loaded");
    Ok(asset)
}

/// 从 JSON 字符串加载流程资源
pub fn load_asset_from_str(json: &str) -> Result<FlowAsset> {
    build_asset_from_config(&FlowAssetConfig::from_json(json)?)
}

/// 从 JSON Value 加载流程资源
pub fn load_asset_from_value(value: Value) -> Result<FlowAsset> {
    build_asset_from_config(&FlowAssetConfig::from_value(value)?)
}

/// 从文件加载流程资源
pub fn load_asset_from_path<P: AsRef<Path>>(path: P) -> Result<FlowAsset> {
    let content = fs::read_to_string(path.as_ref())?;
    load_asset_from_str(&content)
}
