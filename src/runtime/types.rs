use serde::{Deserialize, Serialize};

use crate::config::env::EnvConfig;
use crate::error::Result;
use crate::flow::ActionId;
use crate::state::{VarValue, VariableStore};

pub const DEFAULT_MAX_TRANSITIONS: usize = 256;

/// 播放器状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// 未挂载流程
    Idle,
    /// 已设置起始动作，尚未实例化
    PendingStart,
    /// 有存活的动作实例
    Active,
    /// 跨帧等待：下一动作已确定，下一次 update 时实例化
    Yielded,
    /// 正在发出完成通知，随后回到 Idle
    Finished,
}

/// 一次运行结束时的报告
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FinishReport {
    pub flow: String,
    pub last_action_id: Option<ActionId>,
    pub with_error: bool,
}

/// 启动参数
#[derive(Clone, Debug, Default)]
pub struct StartOptions {
    pub start_action: Option<ActionId>,
    pub seed: Option<u64>,
    pub variables: VariableStore,
}

impl StartOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖流程默认的起始动作
    pub fn with_start(mut self, action: impl Into<ActionId>) -> Self {
        self.start_action = Some(action.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 在流程默认变量之上追加的绑定
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.variables.set(name, value);
        self
    }

    pub fn with_variables(mut self, variables: VariableStore) -> Self {
        self.variables = variables;
        self
    }
}

/// 运行生命周期通知
pub trait PlayerObserver: Send {
    fn on_start(&mut self, _flow: &str) {}

    fn on_finish(&mut self, _report: &FinishReport) {}
}

/// 播放器配置
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// 单次 update 内同帧连续跳转的上限，达到后顺延到下一次 update
    #[serde(default = "default_max_transitions")]
    pub max_transitions_per_update: usize,
    /// 创建播放器时使用的随机种子；为空时取系统熵
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_transitions() -> usize {
    DEFAULT_MAX_TRANSITIONS
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_transitions_per_update: DEFAULT_MAX_TRANSITIONS,
            seed: None,
        }
    }
}

impl PlayerConfig {
    /// 在默认值之上叠加环境变量
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(limit) = EnvConfig::max_transitions()? {
            config.max_transitions_per_update = limit.max(1);
        }
        config.seed = EnvConfig::seed()?;
        Ok(config)
    }

    pub fn with_max_transitions(mut self, limit: usize) -> Self {
        self.max_transitions_per_update = limit.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_when_fields_missing() {
        let config: PlayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PlayerConfig::default());
        assert_eq!(config.max_transitions_per_update, DEFAULT_MAX_TRANSITIONS);
    }

    #[test]
    fn start_options_layer_variables() {
        let mut preset = VariableStore::new();
        preset.set("gold", 10);
        preset.set("name", "Aria");

        let options = StartOptions::new()
            .with_variables(preset)
            .with_variable("gold", 25)
            .with_seed(3);
        assert_eq!(options.variables.get_by_name::<i64>("gold").unwrap(), 25);
        assert_eq!(options.variables.get_by_name::<String>("name").unwrap(), "Aria");
        assert_eq!(options.seed, Some(3));
    }

    #[test]
    fn transition_limit_never_zero() {
        let config = PlayerConfig::default().with_max_transitions(0);
        assert_eq!(config.max_transitions_per_update, 1);
    }
}
