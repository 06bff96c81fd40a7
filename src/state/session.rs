use std::fmt;
use std::sync::Arc;

use crate::script::{ExpressionBridge, RhaiBridge};

use super::scope::{ScopeKind, SessionScopes, FALLBACK_SCOPES};
use super::value::VarValue;

/// 会话日志级别
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// 会话日志输出
pub trait SessionLog: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// 默认日志输出，转发到 tracing
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl SessionLog for TracingLog {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(target: "flowplayer::session", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "flowplayer::session", "{message}"),
            LogLevel::Info => tracing::info!(target: "flowplayer::session", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "flowplayer::session", "{message}"),
        }
    }
}

/// 会话上下文
///
/// 在每次调用中透传，提供具名作用域、日志输出和表达式桥接。
#[derive(Clone)]
pub struct Session {
    scopes: Arc<SessionScopes>,
    log: Arc<dyn SessionLog>,
    bridge: Arc<dyn ExpressionBridge>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            scopes: Arc::new(SessionScopes::new()),
            log: Arc::new(TracingLog),
            bridge: Arc::new(RhaiBridge::new()),
        }
    }

    pub fn with_log(mut self, log: Arc<dyn SessionLog>) -> Self {
        self.log = log;
        self
    }

    pub fn with_bridge(mut self, bridge: Arc<dyn ExpressionBridge>) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn with_scopes(mut self, scopes: Arc<SessionScopes>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn scopes(&self) -> &SessionScopes {
        &self.scopes
    }

    pub fn bridge(&self) -> &dyn ExpressionBridge {
        self.bridge.as_ref()
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.log.log(level, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn set_scoped(&self, kind: ScopeKind, name: impl Into<String>, value: impl Into<VarValue>) {
        self.scopes.set(kind, name, value);
    }

    /// 依次在 runtime、persistent 作用域中查找变量
    pub fn resolve_scoped(&self, name: &str) -> Option<VarValue> {
        self.scopes.resolve(name, &FALLBACK_SCOPES)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_can_share_scopes() {
        let shared = Arc::new(SessionScopes::new());
        let first = Session::new().with_scopes(Arc::clone(&shared));
        let second = Session::new().with_scopes(shared);

        first.set_scoped(ScopeKind::Persistent, "gold", 5);
        first.set_scoped(ScopeKind::Runtime, "gold", 9);
        assert_eq!(second.resolve_scoped("gold"), Some(VarValue::Int(9)));

        // 清空 runtime 后回退到 persistent
        second.scopes().clear(&ScopeKind::Runtime);
        assert_eq!(first.resolve_scoped("gold"), Some(VarValue::Int(5)));
        assert!(first.scopes().get(&ScopeKind::Runtime, "gold").is_none());
    }
}
