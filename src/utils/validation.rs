use crate::error::{FlowError, Result};

/// 配置验证器
pub struct ConfigValidator;

const MAX_NAME_LEN: usize = 100;

impl ConfigValidator {
    /// 验证动作 ID
    pub fn validate_action_id(action_id: &str) -> Result<()> {
        if action_id.is_empty() {
            return Err(FlowError::Validation("动作 ID 不能为空".to_string()));
        }

        if !action_id
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
        {
            return Err(FlowError::Validation(format!(
                "动作 ID '{action_id}' 包含无效字符，应该只包含字母、数字、下划线、短横线、点和冒号"
            )));
        }

        Ok(())
    }

    /// 验证变量名称
    ///
    /// 变量会以同名标识符注入脚本作用域，因此必须是合法标识符。
    pub fn validate_variable_name(name: &str) -> Result<()> {
        let mut chars = name.chars();
        let valid_head = chars
            .next()
            .map(|c| c.is_alphabetic() || c == '_')
            .unwrap_or(false);
        if !valid_head || !chars.all(|c| c.is_alphanumeric() || c == '_') {
            return Err(FlowError::Validation(format!(
                "变量名称 '{name}' 不是合法标识符"
            )));
        }
        Ok(())
    }

    /// 验证流程名称
    pub fn validate_flow_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(FlowError::Validation("流程名称不能为空".to_string()));
        }

        if name.len() > MAX_NAME_LEN {
            return Err(FlowError::Validation(format!(
                "流程名称过长（最多 {MAX_NAME_LEN} 字符）"
            )));
        }

        Ok(())
    }

    /// 验证帧时间增量
    pub fn validate_tick_delta(dt: f32) -> Result<()> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(FlowError::Validation(format!(
                "帧时间增量必须是非负有限值，当前值: {dt}"
            )));
        }
        Ok(())
    }
}
