use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ConditionConfig;
use crate::state::{EntityId, Session, VarType, VarValue, VarVisitor, VariableStore};

/// 比较运算符
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    fn test(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
        }
    }

    /// 浮点比较：无法排序（NaN）时只有 `!=` 成立
    fn test_partial(&self, ordering: Option<Ordering>) -> bool {
        match ordering {
            Some(ordering) => self.test(ordering),
            None => *self == CompareOp::Ne,
        }
    }
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" | "lt" => Ok(CompareOp::Lt),
            "<=" | "le" => Ok(CompareOp::Le),
            ">" | "gt" => Ok(CompareOp::Gt),
            ">=" | "ge" => Ok(CompareOp::Ge),
            "==" | "eq" => Ok(CompareOp::Eq),
            "!=" | "ne" => Ok(CompareOp::Ne),
            other => Err(format!("unknown comparison operator `{other}`")),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 比较失败原因
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompareError {
    /// 两种类型之间既不能判等也不能排序
    Incomparable { left: VarType, right: VarType },
    /// 类型之间只支持判等
    UnsupportedOperator { op: CompareOp, left: VarType, right: VarType },
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareError::Incomparable { left, right } => {
                write!(f, "cannot compare {left} with {right}")
            }
            CompareError::UnsupportedOperator { op, left, right } => {
                write!(f, "operator `{op}` is not supported between {left} and {right}")
            }
        }
    }
}

/// 把访问到的左值与右值比较
struct CompareWith<'a> {
    op: CompareOp,
    rhs: &'a VarValue,
}

impl CompareWith<'_> {
    fn equality_only(&self, left: VarType, equal: bool) -> Result<bool, CompareError> {
        match self.op {
            CompareOp::Eq => Ok(equal),
            CompareOp::Ne => Ok(!equal),
            op => Err(CompareError::UnsupportedOperator {
                op,
                left,
                right: self.rhs.var_type(),
            }),
        }
    }

    fn incomparable(&self, left: VarType) -> Result<bool, CompareError> {
        Err(CompareError::Incomparable {
            left,
            right: self.rhs.var_type(),
        })
    }
}

impl VarVisitor for CompareWith<'_> {
    type Output = Result<bool, CompareError>;

    fn visit_bool(self, value: bool) -> Self::Output {
        match self.rhs {
            VarValue::Bool(rhs) => self.equality_only(VarType::Bool, value == *rhs),
            _ => self.incomparable(VarType::Bool),
        }
    }

    fn visit_int(self, value: i64) -> Self::Output {
        match self.rhs {
            VarValue::Int(rhs) => Ok(self.op.test(value.cmp(rhs))),
            VarValue::Float(rhs) => Ok(self.op.test_partial((value as f64).partial_cmp(rhs))),
            _ => self.incomparable(VarType::Int),
        }
    }

    fn visit_float(self, value: f64) -> Self::Output {
        match self.rhs {
            VarValue::Float(rhs) => Ok(self.op.test_partial(value.partial_cmp(rhs))),
            VarValue::Int(rhs) => Ok(self.op.test_partial(value.partial_cmp(&(*rhs as f64)))),
            _ => self.incomparable(VarType::Float),
        }
    }

    fn visit_string(self, value: &str) -> Self::Output {
        match self.rhs {
            VarValue::String(rhs) => Ok(self.op.test(value.cmp(rhs.as_str()))),
            _ => self.incomparable(VarType::String),
        }
    }

    fn visit_entity(self, value: Option<EntityId>) -> Self::Output {
        match self.rhs {
            VarValue::Entity(rhs) => self.equality_only(VarType::Entity, value == *rhs),
            _ => self.incomparable(VarType::Entity),
        }
    }
}

/// 按运算符比较两个值
pub fn compare_values(
    left: &VarValue,
    op: CompareOp,
    right: &VarValue,
) -> Result<bool, CompareError> {
    left.accept(CompareWith { op, rhs: right })
}

/// 条件表达式
///
/// 空条件（没有类型）等同于 `True`。无法识别的描述会保留为 `Invalid`，
/// 求值时上报配置错误并返回 `false`。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConditionConfig", into = "ConditionConfig")]
pub enum Condition {
    #[default]
    True,
    False,
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    VarCompareConstant {
        var: String,
        op: CompareOp,
        value: VarValue,
    },
    VarCompareVariable {
        left: String,
        op: CompareOp,
        right: String,
    },
    ScriptExpression(String),
    Invalid {
        type_name: String,
        reason: String,
    },
}

impl Condition {
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(conditions.into_iter().collect())
    }

    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(conditions.into_iter().collect())
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    pub fn var_equals(var: impl Into<String>, value: impl Into<VarValue>) -> Self {
        Self::var_compare(var, CompareOp::Eq, value)
    }

    pub fn var_compare(var: impl Into<String>, op: CompareOp, value: impl Into<VarValue>) -> Self {
        Condition::VarCompareConstant {
            var: var.into(),
            op,
            value: value.into(),
        }
    }

    pub fn vars_compare(left: impl Into<String>, op: CompareOp, right: impl Into<String>) -> Self {
        Condition::VarCompareVariable {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    pub fn script(expression: impl Into<String>) -> Self {
        Condition::ScriptExpression(expression.into())
    }

    /// 求值条件
    ///
    /// 变量依次在 `variables`、会话的 runtime 作用域、persistent 作用域中查找。
    pub fn evaluate(&self, session: &Session, variables: &VariableStore) -> bool {
        match self {
            Condition::True => true,
            Condition::False => false,
            Condition::And(conditions) => conditions
                .iter()
                .all(|condition| condition.evaluate(session, variables)),
            Condition::Or(conditions) => conditions
                .iter()
                .any(|condition| condition.evaluate(session, variables)),
            Condition::Not(condition) => !condition.evaluate(session, variables),
            Condition::VarCompareConstant { var, op, value } => {
                let Some(left) = resolve_variable(session, variables, var) else {
                    session.error(format!("condition: variable `{var}` not found"));
                    return false;
                };
                match compare_values(&left, *op, value) {
                    Ok(result) => result,
                    Err(err) => {
                        session.error(format!("condition: `{var} {op} {value}`: {err}"));
                        false
                    }
                }
            }
            Condition::VarCompareVariable { left, op, right } => {
                let lhs = resolve_variable(session, variables, left);
                let rhs = resolve_variable(session, variables, right);
                let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
                    session.error(format!(
                        "condition: variables `{left}` / `{right}` could not both be resolved"
                    ));
                    return false;
                };
                if lhs.var_type() != rhs.var_type() {
                    return false;
                }
                match compare_values(&lhs, *op, &rhs) {
                    Ok(result) => result,
                    Err(err) => {
                        session.error(format!("condition: `{left} {op} {right}`: {err}"));
                        false
                    }
                }
            }
            Condition::ScriptExpression(expression) => {
                match session.bridge().evaluate(expression, variables) {
                    Ok(value) => value.is_truthy(),
                    Err(err) => {
                        session.error(format!("condition: {err}"));
                        false
                    }
                }
            }
            Condition::Invalid { type_name, reason } => {
                session.error(format!("condition `{type_name}`: {reason}"));
                false
            }
        }
    }

    fn invalid(type_name: &str, reason: impl Into<String>) -> Self {
        Condition::Invalid {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }

    fn from_nested(type_name: &str, value: &Value) -> Self {
        match serde_json::from_value::<ConditionConfig>(value.clone()) {
            Ok(config) => Condition::from(config),
            Err(err) => Self::invalid(type_name, format!("nested condition: {err}")),
        }
    }

    fn from_list(type_name: &str, config: &ConditionConfig) -> Result<Vec<Self>, Self> {
        match config.param("conditions") {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items
                .iter()
                .map(|item| Self::from_nested(type_name, item))
                .collect()),
            Some(_) => Err(Self::invalid(type_name, "`conditions` must be an array")),
        }
    }
}

fn resolve_variable(session: &Session, variables: &VariableStore, name: &str) -> Option<VarValue> {
    variables
        .lookup(name)
        .cloned()
        .or_else(|| session.resolve_scoped(name))
}

fn parse_op(type_name: &str, config: &ConditionConfig) -> Result<CompareOp, Condition> {
    let raw = config.str_param("op").unwrap_or("==");
    raw.parse()
        .map_err(|reason: String| Condition::invalid(type_name, reason))
}

fn required_str<'a>(
    type_name: &str,
    config: &'a ConditionConfig,
    key: &str,
) -> Result<&'a str, Condition> {
    config
        .str_param(key)
        .ok_or_else(|| Condition::invalid(type_name, format!("missing string parameter `{key}`")))
}

fn parse_compare_constant(type_name: &str, config: &ConditionConfig) -> Result<Condition, Condition> {
    let var = required_str(type_name, config, "var")?;
    let op = parse_op(type_name, config)?;
    let raw = config
        .param("value")
        .cloned()
        .ok_or_else(|| Condition::invalid(type_name, "missing `value`"))?;
    let value = serde_json::from_value::<VarValue>(raw)
        .map_err(|e| Condition::invalid(type_name, format!("`value`: {e}")))?;
    Ok(Condition::var_compare(var, op, value))
}

fn parse_compare_variable(type_name: &str, config: &ConditionConfig) -> Result<Condition, Condition> {
    let left = required_str(type_name, config, "left")?;
    let right = required_str(type_name, config, "right")?;
    let op = parse_op(type_name, config)?;
    Ok(Condition::vars_compare(left, op, right))
}

impl From<ConditionConfig> for Condition {
    fn from(config: ConditionConfig) -> Self {
        let type_name = config.condition_type.as_deref().unwrap_or("").trim();
        let parsed = match type_name {
            "" | "true" => Ok(Condition::True),
            "false" => Ok(Condition::False),
            "and" => Condition::from_list(type_name, &config).map(Condition::And),
            "or" => Condition::from_list(type_name, &config).map(Condition::Or),
            "not" => match config.param("condition") {
                Some(nested) => Ok(Condition::negate(Condition::from_nested(type_name, nested))),
                None => Err(Condition::invalid(type_name, "missing nested `condition`")),
            },
            "var_compare_constant" => parse_compare_constant(type_name, &config),
            "var_compare_variable" => parse_compare_variable(type_name, &config),
            "script" | "script_expression" => {
                required_str(type_name, &config, "expression").map(Condition::script)
            }
            "invalid" => Err(Condition::invalid(
                config.str_param("for").unwrap_or("invalid"),
                config.str_param("reason").unwrap_or("invalid condition"),
            )),
            other => Err(Condition::invalid(other, "unknown condition type")),
        };
        parsed.unwrap_or_else(|invalid| invalid)
    }
}

impl From<Condition> for ConditionConfig {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::True => ConditionConfig::default(),
            Condition::False => ConditionConfig::new("false"),
            Condition::And(conditions) => {
                ConditionConfig::new("and").with_param("conditions", list_to_value(conditions))
            }
            Condition::Or(conditions) => {
                ConditionConfig::new("or").with_param("conditions", list_to_value(conditions))
            }
            Condition::Not(condition) => ConditionConfig::new("not")
                .with_param("condition", condition_to_value(*condition)),
            Condition::VarCompareConstant { var, op, value } => {
                ConditionConfig::new("var_compare_constant")
                    .with_param("var", json!(var))
                    .with_param("op", json!(op.as_str()))
                    .with_param("value", serde_json::to_value(value).unwrap_or(Value::Null))
            }
            Condition::VarCompareVariable { left, op, right } => {
                ConditionConfig::new("var_compare_variable")
                    .with_param("left", json!(left))
                    .with_param("op", json!(op.as_str()))
                    .with_param("right", json!(right))
            }
            Condition::ScriptExpression(expression) => {
                ConditionConfig::new("script").with_param("expression", json!(expression))
            }
            Condition::Invalid { type_name, reason } => ConditionConfig::new("invalid")
                .with_param("for", json!(type_name))
                .with_param("reason", json!(reason)),
        }
    }
}

fn condition_to_value(condition: Condition) -> Value {
    serde_json::to_value(ConditionConfig::from(condition)).unwrap_or(Value::Null)
}

fn list_to_value(conditions: Vec<Condition>) -> Value {
    Value::Array(conditions.into_iter().map(condition_to_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_numeric_pairs() {
        let int = VarValue::Int(3);
        let float = VarValue::Float(3.0);
        assert_eq!(compare_values(&int, CompareOp::Eq, &float), Ok(true));
        assert_eq!(compare_values(&int, CompareOp::Lt, &VarValue::Int(4)), Ok(true));
        assert_eq!(compare_values(&float, CompareOp::Ge, &VarValue::Int(4)), Ok(false));
    }

    #[test]
    fn test_compare_nan_only_not_equal() {
        let nan = VarValue::Float(f64::NAN);
        assert_eq!(compare_values(&nan, CompareOp::Eq, &nan), Ok(false));
        assert_eq!(compare_values(&nan, CompareOp::Ne, &nan), Ok(true));
        assert_eq!(compare_values(&nan, CompareOp::Lt, &VarValue::Float(1.0)), Ok(false));
    }

    #[test]
    fn test_bool_supports_equality_only() {
        let value = VarValue::Bool(true);
        assert_eq!(compare_values(&value, CompareOp::Ne, &VarValue::Bool(false)), Ok(true));
        assert!(matches!(
            compare_values(&value, CompareOp::Gt, &VarValue::Bool(false)),
            Err(CompareError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn test_mixed_pairs_are_incomparable() {
        assert_eq!(
            compare_values(&VarValue::String("1".into()), CompareOp::Eq, &VarValue::Int(1)),
            Err(CompareError::Incomparable {
                left: VarType::String,
                right: VarType::Int
            })
        );
    }

    #[test]
    fn test_strings_order_lexicographically() {
        let a = VarValue::String("apple".into());
        let b = VarValue::String("banana".into());
        assert_eq!(compare_values(&a, CompareOp::Lt, &b), Ok(true));
    }

    #[test]
    fn test_op_parsing() {
        assert_eq!("<=".parse::<CompareOp>(), Ok(CompareOp::Le));
        assert_eq!("ne".parse::<CompareOp>(), Ok(CompareOp::Ne));
        assert!("=~".parse::<CompareOp>().is_err());
    }

    #[test]
    fn test_config_round_trip_keeps_structure() {
        let condition = Condition::and([
            Condition::var_compare("gold", CompareOp::Ge, 10i64),
            Condition::negate(Condition::script("has_key")),
        ]);
        let value = serde_json::to_value(&condition).unwrap();
        let parsed: Condition = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, condition);
    }
}
