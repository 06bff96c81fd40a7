use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::store::VariableStore;
use super::value::VarValue;

/// 会话级变量作用域
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// 当前运行期间有效
    Runtime,
    /// 跨运行持久保存
    Persistent,
    Custom(String),
}

impl ScopeKind {
    pub fn as_str(&self) -> &str {
        match self {
            ScopeKind::Runtime => "runtime",
            ScopeKind::Persistent => "persistent",
            ScopeKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 条件求值时的回退查找顺序
pub const FALLBACK_SCOPES: [ScopeKind; 2] = [ScopeKind::Runtime, ScopeKind::Persistent];

/// 具名作用域集合
#[derive(Default)]
pub struct SessionScopes {
    scopes: RwLock<HashMap<ScopeKind, VariableStore>>,
}

impl SessionScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope<R>(&self, kind: &ScopeKind, apply: impl FnOnce(&VariableStore) -> R) -> Option<R> {
        self.scopes.read().get(kind).map(apply)
    }

    /// 作用域不存在时自动创建
    pub fn with_scope_mut<R>(
        &self,
        kind: ScopeKind,
        apply: impl FnOnce(&mut VariableStore) -> R,
    ) -> R {
        let mut scopes = self.scopes.write();
        apply(scopes.entry(kind).or_default())
    }

    pub fn set(&self, kind: ScopeKind, name: impl Into<String>, value: impl Into<VarValue>) {
        self.with_scope_mut(kind, |store| {
            store.set(name, value);
        });
    }

    pub fn get(&self, kind: &ScopeKind, name: &str) -> Option<VarValue> {
        self.with_scope(kind, |store| store.lookup(name).cloned())
            .flatten()
    }

    /// 按给定顺序逐个作用域查找变量
    pub fn resolve(&self, name: &str, kinds: &[ScopeKind]) -> Option<VarValue> {
        let scopes = self.scopes.read();
        kinds
            .iter()
            .filter_map(|kind| scopes.get(kind))
            .find_map(|store| store.lookup(name).cloned())
    }

    pub fn clear(&self, kind: &ScopeKind) {
        self.scopes.write().remove(kind);
    }
}

impl fmt::Debug for SessionScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scopes = self.scopes.read();
        f.debug_struct("SessionScopes")
            .field("kinds", &scopes.keys().collect::<Vec<_>>())
            .finish()
    }
}
