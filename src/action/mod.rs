// 动作模块 - 节点行为契约、工厂与内置动作

mod action;
pub mod builtin;
mod factory;
mod update;

pub use action::{ActionContext, FlowAction};
pub use factory::{ActionFactory, ActionFactoryRegistry};
pub use update::UpdateContext;
