use std::ops::ControlFlow;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::state::{Session, VariableStore};

use super::types::{ActionDescriptor, FlowLink};

/// 按声明顺序遍历条件成立的连接，回调返回 `Break` 时提前结束
pub fn for_each_valid_link<'a>(
    descriptor: &'a ActionDescriptor,
    session: &Session,
    variables: &VariableStore,
    mut visit: impl FnMut(&'a FlowLink) -> ControlFlow<()>,
) {
    for link in &descriptor.links {
        if link.condition.evaluate(session, variables) && visit(link).is_break() {
            break;
        }
    }
}

/// 第一个条件成立的连接
pub fn first_valid_link<'a>(
    descriptor: &'a ActionDescriptor,
    session: &Session,
    variables: &VariableStore,
) -> Option<&'a FlowLink> {
    let mut found = None;
    for_each_valid_link(descriptor, session, variables, |link| {
        found = Some(link);
        ControlFlow::Break(())
    });
    found
}

/// 在所有条件成立的连接中等概率随机选择一个
///
/// 相同的种子与调用顺序会得到相同的结果。
pub fn random_valid_link<'a, R: Rng + ?Sized>(
    descriptor: &'a ActionDescriptor,
    session: &Session,
    variables: &VariableStore,
    rng: &mut R,
) -> Option<&'a FlowLink> {
    let mut valid = Vec::new();
    for_each_valid_link(descriptor, session, variables, |link| {
        valid.push(link);
        ControlFlow::Continue(())
    });
    valid.choose(rng).copied()
}
