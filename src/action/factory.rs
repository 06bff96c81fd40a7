use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::{FlowError, Result};
use crate::flow::ActionDescriptor;

use super::action::FlowAction;
use super::builtin::register_builtins;

pub type ActionFactory =
    Arc<dyn Fn(&ActionDescriptor) -> Result<Box<dyn FlowAction>> + Send + Sync>;

static BUILTIN_ACTIONS: Lazy<Arc<ActionFactoryRegistry>> =
    Lazy::new(|| Arc::new(ActionFactoryRegistry::with_builtins()));

/// 按类型名创建动作实例的工厂表
#[derive(Clone, Default)]
pub struct ActionFactoryRegistry {
    factories: HashMap<String, ActionFactory>,
}

impl ActionFactoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// 预先注册了内置动作的工厂表
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// 进程内共享的内置动作工厂表
    pub fn builtins() -> Arc<Self> {
        Arc::clone(&BUILTIN_ACTIONS)
    }

    pub fn register_factory<T: Into<String>>(&mut self, name: T, factory: ActionFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn register<T, F>(&mut self, name: T, factory: F)
    where
        T: Into<String>,
        F: Fn(&ActionDescriptor) -> Result<Box<dyn FlowAction>> + Send + Sync + 'static,
    {
        self.register_factory(name, Arc::new(factory));
    }

    /// 注册无需参数、用 `Default` 构造的动作
    pub fn register_default<A, T>(&mut self, name: T)
    where
        A: FlowAction + Default + 'static,
        T: Into<String>,
    {
        self.register(name, |_| Ok(Box::new(A::default()) as Box<dyn FlowAction>));
    }

    pub fn build(&self, type_name: &str, descriptor: &ActionDescriptor) -> Result<Box<dyn FlowAction>> {
        let builder = self
            .factories
            .get(type_name)
            .ok_or_else(|| FlowError::ActionNotRegistered(type_name.to_string()))?;
        builder(descriptor)
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
