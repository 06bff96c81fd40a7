use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 结构化的条件定义
///
/// 类型为空或缺省时表示无条件通过。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    /// 条件类型: true, false, and, or, not, var_compare_constant,
    /// var_compare_variable, script
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<String>,

    /// 条件参数
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ConditionConfig {
    pub fn new(condition_type: impl Into<String>) -> Self {
        Self {
            condition_type: Some(condition_type.into()),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}
