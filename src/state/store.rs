use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{FlowError, Result};

use super::value::{FromVar, VarType, VarValue, VarVisitor};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// 变量句柄
///
/// 只在产生它的存储内有效，其他存储会拒绝该句柄。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VarHandle {
    store: u64,
    slot: usize,
}

/// 带类型的变量存储
pub struct VariableStore {
    id: u64,
    names: HashMap<String, usize>,
    slots: Vec<(String, VarValue)>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            names: HashMap::new(),
            slots: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn find(&self, name: &str) -> Option<VarHandle> {
        self.names.get(name).map(|slot| VarHandle {
            store: self.id,
            slot: *slot,
        })
    }

    /// 写入变量；已存在的变量复用原有槽位，之前取得的句柄继续有效
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<VarValue>) -> VarHandle {
        let name = name.into();
        let value = value.into();
        let slot = match self.names.get(&name) {
            Some(slot) => {
                self.slots[*slot].1 = value;
                *slot
            }
            None => {
                let slot = self.slots.len();
                self.names.insert(name.clone(), slot);
                self.slots.push((name, value));
                slot
            }
        };
        VarHandle {
            store: self.id,
            slot,
        }
    }

    pub fn value(&self, handle: VarHandle) -> Result<&VarValue> {
        if handle.store != self.id {
            return Err(FlowError::ForeignHandle);
        }
        self.slots
            .get(handle.slot)
            .map(|(_, value)| value)
            .ok_or(FlowError::ForeignHandle)
    }

    pub fn lookup(&self, name: &str) -> Option<&VarValue> {
        self.names.get(name).map(|slot| &self.slots[*slot].1)
    }

    pub fn var_type(&self, handle: VarHandle) -> Result<VarType> {
        self.value(handle).map(VarValue::var_type)
    }

    pub fn get<T: FromVar>(&self, handle: VarHandle) -> Result<T> {
        let value = self.value(handle)?;
        T::from_var(value).ok_or(FlowError::TypeMismatch {
            expected: T::TYPE,
            found: value.var_type(),
        })
    }

    pub fn try_get<T: FromVar>(&self, handle: VarHandle) -> Option<T> {
        self.get(handle).ok()
    }

    pub fn get_by_name<T: FromVar>(&self, name: &str) -> Result<T> {
        let handle = self
            .find(name)
            .ok_or_else(|| FlowError::UnknownVariable(name.to_string()))?;
        self.get(handle)
    }

    pub fn visit<V: VarVisitor>(&self, handle: VarHandle, visitor: V) -> Result<V::Output> {
        Ok(self.value(handle)?.accept(visitor))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VarValue)> {
        self.slots
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// 用另一个存储中的值覆盖本存储
    pub fn merge_from(&mut self, other: &VariableStore) {
        for (name, value) in other.iter() {
            self.set(name, value.clone());
        }
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 克隆得到的是一个新的存储，原存储的句柄对其无效
impl Clone for VariableStore {
    fn clone(&self) -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            names: self.names.clone(),
            slots: self.slots.clone(),
        }
    }
}

impl fmt::Debug for VariableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(name, value)| (name, value)))
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for VariableStore
where
    K: Into<String>,
    V: Into<VarValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = VariableStore::new();
        for (name, value) in iter {
            store.set(name, value);
        }
        store
    }
}
