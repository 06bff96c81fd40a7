use crate::error::{FlowError, Result};
use std::env;
use std::str::FromStr;

pub const DEBUG_VAR: &str = "FLOWPLAYER_DEBUG";
pub const SEED_VAR: &str = "FLOWPLAYER_SEED";
pub const MAX_TRANSITIONS_VAR: &str = "FLOWPLAYER_MAX_TRANSITIONS";

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 获取可选的环境变量
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok()
    }

    /// 获取并解析可选的环境变量；值存在但无法解析时返回错误
    pub fn parse_optional<T: FromStr>(key: &str) -> Result<Option<T>> {
        match Self::get_env_optional(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                FlowError::Validation(format!("环境变量 '{key}' 的值 '{raw}' 无法解析"))
            }),
        }
    }

    /// 检查是否启用调试模式
    pub fn is_debug_mode() -> bool {
        env::var(DEBUG_VAR).is_ok()
    }

    pub fn seed() -> Result<Option<u64>> {
        Self::parse_optional(SEED_VAR)
    }

    pub fn max_transitions() -> Result<Option<usize>> {
        Self::parse_optional(MAX_TRANSITIONS_VAR)
    }
}
