// 状态管理模块

mod scope;
mod session;
mod store;
mod value;

pub use scope::{ScopeKind, SessionScopes, FALLBACK_SCOPES};
pub use session::{LogLevel, Session, SessionLog, TracingLog};
pub use store::{VarHandle, VariableStore};
pub use value::{EntityId, FromVar, VarType, VarValue, VarVisitor};
