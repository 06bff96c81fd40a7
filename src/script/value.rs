use std::fmt;

use rhai::Dynamic;

/// 表达式求值结果
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptValue {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Other { type_name: String, text: String },
}

impl ScriptValue {
    /// 脚本语言自身的真值规则：只有空值和 `false` 为假，`0` 与空字符串都为真
    pub fn is_truthy(&self) -> bool {
        !matches!(self, ScriptValue::Unit | ScriptValue::Bool(false))
    }

    pub fn type_name(&self) -> &str {
        match self {
            ScriptValue::Unit => "()",
            ScriptValue::Bool(_) => "bool",
            ScriptValue::Int(_) => "int",
            ScriptValue::Float(_) => "float",
            ScriptValue::String(_) => "string",
            ScriptValue::Other { type_name, .. } => type_name,
        }
    }
}

impl From<Dynamic> for ScriptValue {
    fn from(value: Dynamic) -> Self {
        if value.is_unit() {
            return ScriptValue::Unit;
        }
        if let Ok(flag) = value.as_bool() {
            return ScriptValue::Bool(flag);
        }
        if let Ok(number) = value.as_int() {
            return ScriptValue::Int(number);
        }
        if let Ok(number) = value.as_float() {
            return ScriptValue::Float(number);
        }
        if value.is_string() {
            return ScriptValue::String(value.to_string());
        }
        ScriptValue::Other {
            type_name: value.type_name().to_string(),
            text: value.to_string(),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Unit => f.write_str("()"),
            ScriptValue::Bool(value) => write!(f, "{value}"),
            ScriptValue::Int(value) => write!(f, "{value}"),
            ScriptValue::Float(value) => write!(f, "{value}"),
            ScriptValue::String(value) => write!(f, "{value:?}"),
            ScriptValue::Other { text, .. } => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unit_and_false_are_falsy() {
        assert!(!ScriptValue::Unit.is_truthy());
        assert!(!ScriptValue::Bool(false).is_truthy());
        assert!(ScriptValue::Bool(true).is_truthy());
        assert!(ScriptValue::Int(0).is_truthy());
        assert!(ScriptValue::Float(0.0).is_truthy());
        assert!(ScriptValue::String(String::new()).is_truthy());
    }
}
