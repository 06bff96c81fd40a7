use serde::Deserialize;

use crate::error::{FlowError, Result};
use crate::flow::ActionDescriptor;
use crate::state::{LogLevel, ScopeKind, VarValue};

use super::action::{ActionContext, FlowAction};
use super::factory::ActionFactoryRegistry;
use super::update::UpdateContext;

pub const BRANCH: &str = "branch";
pub const RANDOM_BRANCH: &str = "random_branch";
pub const WAIT: &str = "wait";
pub const SET_VARIABLE: &str = "set_variable";
pub const LOG: &str = "log";
pub const END: &str = "end";
pub const FAIL: &str = "fail";

/// 注册内置动作
pub fn register_builtins(registry: &mut ActionFactoryRegistry) {
    registry.register_default::<Branch, _>(BRANCH);
    registry.register_default::<RandomBranch, _>(RANDOM_BRANCH);
    registry.register_default::<End, _>(END);
    registry.register(WAIT, |descriptor| {
        Ok(Box::new(Wait::from_descriptor(descriptor)?) as Box<dyn FlowAction>)
    });
    registry.register(SET_VARIABLE, |descriptor| {
        Ok(Box::new(SetVariable::from_descriptor(descriptor)?) as Box<dyn FlowAction>)
    });
    registry.register(LOG, |descriptor| {
        Ok(Box::new(Log::from_descriptor(descriptor)?) as Box<dyn FlowAction>)
    });
    registry.register(FAIL, |descriptor| {
        Ok(Box::new(Fail::from_descriptor(descriptor)?) as Box<dyn FlowAction>)
    });
}

/// 走第一个条件成立的连接，没有则结束流程
#[derive(Debug, Default)]
pub struct Branch;

impl FlowAction for Branch {
    fn update(&mut self, ctx: &mut ActionContext<'_>, update: &mut UpdateContext) {
        update.goto(ctx.first_valid_link(), 0.0);
    }
}

/// 在条件成立的连接中随机选择
#[derive(Debug, Default)]
pub struct RandomBranch;

impl FlowAction for RandomBranch {
    fn update(&mut self, ctx: &mut ActionContext<'_>, update: &mut UpdateContext) {
        update.goto(ctx.random_valid_link(), 0.0);
    }
}

/// 结束流程
#[derive(Debug, Default)]
pub struct End;

impl FlowAction for End {
    fn update(&mut self, _ctx: &mut ActionContext<'_>, update: &mut UpdateContext) {
        update.break_flow();
    }
}

#[derive(Debug, Deserialize)]
struct WaitParams {
    seconds: f32,
}

/// 等待指定秒数后走第一个条件成立的连接
///
/// 跨帧累计时间；完成时只消耗实际需要的那部分预算，剩余预算留给后续动作。
#[derive(Debug)]
pub struct Wait {
    seconds: f32,
    elapsed: f32,
}

impl Wait {
    pub fn new(seconds: f32) -> Self {
        Self {
            seconds: seconds.max(0.0),
            elapsed: 0.0,
        }
    }

    fn from_descriptor(descriptor: &ActionDescriptor) -> Result<Self> {
        let params: WaitParams = descriptor.parse_params()?;
        if !params.seconds.is_finite() {
            return Err(FlowError::InvalidParams {
                action: descriptor.id.clone(),
                reason: "`seconds` must be finite".to_string(),
            });
        }
        Ok(Self::new(params.seconds))
    }
}

impl FlowAction for Wait {
    fn on_start(&mut self, _ctx: &mut ActionContext<'_>) {
        self.elapsed = 0.0;
    }

    fn update(&mut self, ctx: &mut ActionContext<'_>, update: &mut UpdateContext) {
        let needed = (self.seconds - self.elapsed).max(0.0);
        let available = update.remaining_time();
        if available >= needed {
            self.elapsed = self.seconds;
            update.goto(ctx.first_valid_link(), needed);
        } else {
            self.elapsed += available;
            update.keep_active();
        }
    }
}

#[derive(Debug, Deserialize)]
struct SetVariableParams {
    name: String,
    value: VarValue,
    #[serde(default)]
    scope: Option<ScopeKind>,
}

/// 写入变量后走第一个条件成立的连接
///
/// 未指定 `scope` 时写入播放器自己的变量存储。
#[derive(Debug)]
pub struct SetVariable {
    name: String,
    value: VarValue,
    scope: Option<ScopeKind>,
}

impl SetVariable {
    fn from_descriptor(descriptor: &ActionDescriptor) -> Result<Self> {
        let params: SetVariableParams = descriptor.parse_params()?;
        Ok(Self {
            name: params.name,
            value: params.value,
            scope: params.scope,
        })
    }
}

impl FlowAction for SetVariable {
    fn update(&mut self, ctx: &mut ActionContext<'_>, update: &mut UpdateContext) {
        match &self.scope {
            Some(scope) => ctx
                .session
                .set_scoped(scope.clone(), self.name.clone(), self.value.clone()),
            None => {
                ctx.variables.set(self.name.clone(), self.value.clone());
            }
        }
        update.goto(ctx.first_valid_link(), 0.0);
    }
}

#[derive(Debug, Deserialize)]
struct LogParams {
    message: String,
    #[serde(default)]
    level: Option<String>,
}

/// 向会话日志写一条消息
#[derive(Debug)]
pub struct Log {
    message: String,
    level: LogLevel,
}

impl Log {
    fn from_descriptor(descriptor: &ActionDescriptor) -> Result<Self> {
        let params: LogParams = descriptor.parse_params()?;
        let level = match params.level.as_deref().unwrap_or("info") {
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            other => {
                return Err(FlowError::InvalidParams {
                    action: descriptor.id.clone(),
                    reason: format!("unknown log level `{other}`"),
                })
            }
        };
        Ok(Self {
            message: params.message,
            level,
        })
    }
}

impl FlowAction for Log {
    fn update(&mut self, ctx: &mut ActionContext<'_>, update: &mut UpdateContext) {
        ctx.session.log(self.level, &self.message);
        update.goto(ctx.first_valid_link(), 0.0);
    }
}

#[derive(Debug, Deserialize)]
struct FailParams {
    #[serde(default = "default_fail_message")]
    message: String,
    #[serde(default)]
    retry: bool,
}

fn default_fail_message() -> String {
    "action failed".to_string()
}

/// 抛出错误；`retry` 为真时每帧重试
#[derive(Debug)]
pub struct Fail {
    message: String,
    retry: bool,
}

impl Fail {
    fn from_descriptor(descriptor: &ActionDescriptor) -> Result<Self> {
        let params: FailParams = if descriptor.params.is_null() {
            FailParams {
                message: default_fail_message(),
                retry: false,
            }
        } else {
            descriptor.parse_params()?
        };
        Ok(Self {
            message: params.message,
            retry: params.retry,
        })
    }
}

impl FlowAction for Fail {
    fn update(&mut self, _ctx: &mut ActionContext<'_>, update: &mut UpdateContext) {
        update.throw(self.message.clone(), self.retry);
    }
}
