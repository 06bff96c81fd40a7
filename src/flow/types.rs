use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::flow::conditions::Condition;
use crate::state::VariableStore;

/// 动作 ID
pub type ActionId = String;

/// 动作之间的连接
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub to: ActionId,
    #[serde(default)]
    pub condition: Condition,
    /// 为真时目标动作推迟到下一次 update 才实例化
    #[serde(rename = "yield", default)]
    pub yield_frame: bool,
}

impl FlowLink {
    pub fn new(to: impl Into<ActionId>) -> Self {
        Self {
            to: to.into(),
            condition: Condition::True,
            yield_frame: false,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn yielding(mut self) -> Self {
        self.yield_frame = true;
        self
    }
}

/// 动作描述
#[derive(Clone, Debug)]
pub struct ActionDescriptor {
    pub id: ActionId,
    pub type_name: String,
    pub links: Vec<FlowLink>,
    pub params: Value,
}

impl ActionDescriptor {
    pub fn new(id: impl Into<ActionId>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            links: Vec::new(),
            params: Value::Null,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// 将参数包反序列化为具体类型
    pub fn parse_params<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.params.clone()).map_err(|e| FlowError::InvalidParams {
            action: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

/// 流程资源
///
/// 加载后不可变，可在多个播放器之间通过 `Arc` 共享。
#[derive(Clone, Debug)]
pub struct FlowAsset {
    name: String,
    actions: Vec<ActionDescriptor>,
    index: HashMap<ActionId, usize>,
    default_start: Option<ActionId>,
    default_variables: VariableStore,
}

impl FlowAsset {
    pub(crate) fn from_parts(
        name: String,
        actions: Vec<ActionDescriptor>,
        default_start: Option<ActionId>,
        default_variables: VariableStore,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(actions.len());
        for (position, action) in actions.iter().enumerate() {
            if index.insert(action.id.clone(), position).is_some() {
                return Err(FlowError::DuplicateAction(action.id.clone()));
            }
        }
        Ok(Self {
            name,
            actions,
            index,
            default_start,
            default_variables,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn find_action(&self, id: &str) -> Option<&ActionDescriptor> {
        self.index.get(id).map(|position| &self.actions[*position])
    }

    pub fn default_start_action_id(&self) -> Option<&str> {
        self.default_start.as_deref()
    }

    /// 播放器启动时复制的默认变量绑定
    pub fn default_variables(&self) -> &VariableStore {
        &self.default_variables
    }
}
