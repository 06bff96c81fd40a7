use std::fmt;

use serde::{Deserialize, Serialize};

/// 实体引用 ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 变量的存储类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarType {
    Bool,
    Int,
    Float,
    String,
    Entity,
}

impl VarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VarType::Bool => "bool",
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::String => "string",
            VarType::Entity => "entity",
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 带类型的变量值
///
/// JSON 中既可以写成 `{"type": "int", "value": 3}`，也可以直接写字面量
/// （`true`、`3`、`1.5`、`"text"`），字面量按 JSON 类型推断。
/// 实体引用只能使用带类型的写法，`null` 表示空引用。
/// 超出 `i64` 范围的整数字面量会被拒绝，不会退化为浮点数。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "value",
    rename_all = "snake_case",
    try_from = "VarValueRepr"
)]
pub enum VarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Entity(Option<EntityId>),
}

impl VarValue {
    pub fn var_type(&self) -> VarType {
        match self {
            VarValue::Bool(_) => VarType::Bool,
            VarValue::Int(_) => VarType::Int,
            VarValue::Float(_) => VarType::Float,
            VarValue::String(_) => VarType::String,
            VarValue::Entity(_) => VarType::Entity,
        }
    }

    /// 按存储类型分派到访问者
    pub fn accept<V: VarVisitor>(&self, visitor: V) -> V::Output {
        match self {
            VarValue::Bool(value) => visitor.visit_bool(*value),
            VarValue::Int(value) => visitor.visit_int(*value),
            VarValue::Float(value) => visitor.visit_float(*value),
            VarValue::String(value) => visitor.visit_string(value),
            VarValue::Entity(value) => visitor.visit_entity(*value),
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Bool(value) => write!(f, "{value}"),
            VarValue::Int(value) => write!(f, "{value}"),
            VarValue::Float(value) => write!(f, "{value}"),
            VarValue::String(value) => write!(f, "{value:?}"),
            VarValue::Entity(Some(id)) => write!(f, "{id}"),
            VarValue::Entity(None) => f.write_str("#none"),
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
enum TaggedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Entity(Option<EntityId>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VarValueRepr {
    Tagged(TaggedValue),
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl TryFrom<VarValueRepr> for VarValue {
    type Error = String;

    fn try_from(repr: VarValueRepr) -> Result<Self, Self::Error> {
        let value = match repr {
            VarValueRepr::Tagged(TaggedValue::Bool(value)) | VarValueRepr::Bool(value) => {
                VarValue::Bool(value)
            }
            VarValueRepr::Tagged(TaggedValue::Int(value)) => VarValue::Int(value),
            VarValueRepr::Tagged(TaggedValue::Float(value)) => VarValue::Float(value),
            VarValueRepr::Number(number) => {
                if let Some(value) = number.as_i64() {
                    VarValue::Int(value)
                } else if number.is_u64() {
                    return Err(format!("integer {number} is out of range for an int variable"));
                } else {
                    VarValue::Float(number.as_f64().unwrap_or_default())
                }
            }
            VarValueRepr::Tagged(TaggedValue::String(value)) | VarValueRepr::String(value) => {
                VarValue::String(value)
            }
            VarValueRepr::Tagged(TaggedValue::Entity(value)) => VarValue::Entity(value),
        };
        Ok(value)
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        VarValue::Bool(value)
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        VarValue::Int(value)
    }
}

impl From<i32> for VarValue {
    fn from(value: i32) -> Self {
        VarValue::Int(value.into())
    }
}

impl From<f64> for VarValue {
    fn from(value: f64) -> Self {
        VarValue::Float(value)
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        VarValue::String(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        VarValue::String(value)
    }
}

impl From<EntityId> for VarValue {
    fn from(value: EntityId) -> Self {
        VarValue::Entity(Some(value))
    }
}

impl From<Option<EntityId>> for VarValue {
    fn from(value: Option<EntityId>) -> Self {
        VarValue::Entity(value)
    }
}

/// 变量值访问者
///
/// 每种存储类型对应一个方法，调用方只需写一次泛型处理逻辑，无需自行匹配类型标签。
pub trait VarVisitor {
    type Output;

    fn visit_bool(self, value: bool) -> Self::Output;
    fn visit_int(self, value: i64) -> Self::Output;
    fn visit_float(self, value: f64) -> Self::Output;
    fn visit_string(self, value: &str) -> Self::Output;
    fn visit_entity(self, value: Option<EntityId>) -> Self::Output;
}

/// 可以从变量存储中按类型读取的值
pub trait FromVar: Sized {
    const TYPE: VarType;

    fn from_var(value: &VarValue) -> Option<Self>;
}

impl FromVar for bool {
    const TYPE: VarType = VarType::Bool;

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromVar for i64 {
    const TYPE: VarType = VarType::Int;

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromVar for f64 {
    const TYPE: VarType = VarType::Float;

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromVar for String {
    const TYPE: VarType = VarType::String;

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::String(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl FromVar for Option<EntityId> {
    const TYPE: VarType = VarType::Entity;

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Entity(value) => Some(*value),
            _ => None,
        }
    }
}
