use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::flow::types::FlowLink;
use crate::state::VarValue;

/// JSON 形式的流程资源
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowAssetConfig {
    pub name: String,

    /// 默认起始动作
    #[serde(default)]
    pub start: Option<String>,

    /// 默认变量绑定
    #[serde(default)]
    pub variables: BTreeMap<String, VarValue>,

    pub actions: Vec<ActionConfig>,
}

/// 动作定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// 动作唯一标识
    pub id: String,

    /// 动作类型，对应工厂注册表中的名称
    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(default)]
    pub params: Value,

    /// 按声明顺序求值的出边
    #[serde(default)]
    pub links: Vec<FlowLink>,
}

impl FlowAssetConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FlowError::Asset(format!("failed to parse flow asset: {e}")))
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| FlowError::Asset(format!("failed to parse flow asset value: {e}")))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
