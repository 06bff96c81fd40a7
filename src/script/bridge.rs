use rhai::{Dynamic, Engine, Scope};

use crate::error::{FlowError, Result};
use crate::state::{VarValue, VariableStore};

use super::value::ScriptValue;

/// 表达式桥接
pub trait ExpressionBridge: Send + Sync {
    fn evaluate(&self, expression: &str, variables: &VariableStore) -> Result<ScriptValue>;
}

/// 基于 Rhai 的表达式桥接
///
/// 每次求值都新建一个 `Scope`，把变量存储中的值按名称注入；求值结束后作用域即被丢弃，
/// 表达式对变量的修改不会写回存储。
pub struct RhaiBridge {
    engine: Engine,
}

const MAX_OPERATIONS: u64 = 100_000;

impl RhaiBridge {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_OPERATIONS);
        Self { engine }
    }

    pub fn with_engine(engine: Engine) -> Self {
        Self { engine }
    }
}

impl Default for RhaiBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionBridge for RhaiBridge {
    fn evaluate(&self, expression: &str, variables: &VariableStore) -> Result<ScriptValue> {
        let mut scope = Scope::new();
        for (name, value) in variables.iter() {
            scope.push_dynamic(name.to_string(), to_dynamic(value));
        }
        self.engine
            .eval_with_scope::<Dynamic>(&mut scope, expression)
            .map(ScriptValue::from)
            .map_err(|e| FlowError::Script(format!("`{expression}`: {e}")))
    }
}

/// 超出脚本整数范围的实体 ID 与空引用一样以 unit 暴露
fn to_dynamic(value: &VarValue) -> Dynamic {
    match value {
        VarValue::Bool(value) => Dynamic::from_bool(*value),
        VarValue::Int(value) => Dynamic::from_int(*value),
        VarValue::Float(value) => Dynamic::from_float(*value),
        VarValue::String(value) => Dynamic::from(value.clone()),
        VarValue::Entity(Some(id)) => i64::try_from(id.0)
            .map(Dynamic::from_int)
            .unwrap_or(Dynamic::UNIT),
        VarValue::Entity(None) => Dynamic::UNIT,
    }
}
