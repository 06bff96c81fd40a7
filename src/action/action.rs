use std::ops::ControlFlow;

use rand::rngs::StdRng;

use crate::flow::{self, ActionDescriptor, FlowLink};
use crate::state::{Session, VariableStore};

use super::update::UpdateContext;

/// 动作执行时可访问的上下文
pub struct ActionContext<'a> {
    pub descriptor: &'a ActionDescriptor,
    pub session: &'a Session,
    pub variables: &'a mut VariableStore,
    pub rng: &'a mut StdRng,
}

impl<'a> ActionContext<'a> {
    pub fn id(&self) -> &'a str {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &'a ActionDescriptor {
        self.descriptor
    }

    pub fn session(&self) -> &'a Session {
        self.session
    }

    pub fn first_valid_link(&self) -> Option<&'a FlowLink> {
        flow::first_valid_link(self.descriptor, self.session, &*self.variables)
    }

    pub fn random_valid_link(&mut self) -> Option<&'a FlowLink> {
        flow::random_valid_link(self.descriptor, self.session, &*self.variables, &mut *self.rng)
    }

    pub fn for_each_valid_link(&self, visit: impl FnMut(&'a FlowLink) -> ControlFlow<()>) {
        flow::for_each_valid_link(self.descriptor, self.session, &*self.variables, visit)
    }
}

/// 流程动作
///
/// 由播放器通过工厂按类型名创建。`update` 通过 [`UpdateContext`] 的辅助方法
/// 告知播放器继续、跳转、结束或报错。
pub trait FlowAction: Send {
    fn on_start(&mut self, _ctx: &mut ActionContext<'_>) {}

    fn update(&mut self, ctx: &mut ActionContext<'_>, update: &mut UpdateContext);

    /// 被中途取消时调用
    fn on_cancel(&mut self) {}
}
