// 表达式桥接模块

mod bridge;
mod value;

pub use bridge::{ExpressionBridge, RhaiBridge};
pub use value::ScriptValue;
