use crate::flow::{ActionId, FlowLink};

/// 单次 `update` 调用的上下文
///
/// 每次调用前重置为“继续”状态：时间不变、无下一动作、无错误、未完成、不让出帧。
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateContext {
    remaining: f32,
    next_action: Option<ActionId>,
    error: Option<String>,
    finished: bool,
    yield_frame: bool,
}

impl UpdateContext {
    pub fn new(remaining: f32) -> Self {
        Self {
            remaining: remaining.max(0.0),
            next_action: None,
            error: None,
            finished: false,
            yield_frame: false,
        }
    }

    pub fn reset(&mut self, remaining: f32) {
        *self = Self::new(remaining);
    }

    /// 本帧剩余的时间预算
    pub fn remaining_time(&self) -> f32 {
        self.remaining
    }

    pub fn next_action(&self) -> Option<&str> {
        self.next_action.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn should_yield(&self) -> bool {
        self.yield_frame
    }

    pub(crate) fn take_next_action(&mut self) -> Option<ActionId> {
        self.next_action.take()
    }

    /// 保持当前动作，下一次 update 继续执行
    pub fn keep_active(&mut self) {
        self.error = None;
        self.finished = false;
    }

    /// 结束整个流程
    pub fn break_flow(&mut self) {
        self.next_action = None;
        self.error = None;
        self.finished = true;
    }

    /// 报告错误；可重试时当前动作保留到下一次 update，否则流程以错误结束
    pub fn throw(&mut self, message: impl Into<String>, can_retry: bool) {
        self.error = Some(message.into());
        self.finished = !can_retry;
    }

    /// 沿连接跳转，消耗 `consumed` 秒（剩余预算最低为零）；没有连接时等同于 `break_flow`
    pub fn goto(&mut self, link: Option<&FlowLink>, consumed: f32) {
        let Some(link) = link else {
            self.break_flow();
            return;
        };
        self.error = None;
        self.finished = true;
        self.remaining = (self.remaining - consumed.max(0.0)).max(0.0);
        self.next_action = Some(link.to.clone());
        self.yield_frame = link.yield_frame;
    }
}

impl Default for UpdateContext {
    fn default() -> Self {
        Self::new(0.0)
    }
}
