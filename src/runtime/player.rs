use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::action::{ActionContext, ActionFactoryRegistry, FlowAction, UpdateContext};
use crate::error::{FlowError, Result};
use crate::flow::{ActionId, FlowAsset};
use crate::state::{Session, VariableStore};
use crate::utils::validation::ConfigValidator;

use super::types::{FinishReport, PlayerConfig, PlayerObserver, PlayerState, StartOptions};

/// 当前存活的动作实例
struct LiveAction {
    id: ActionId,
    instance: Box<dyn FlowAction>,
}

/// 流程播放器
///
/// 同一时刻最多持有一个动作实例。跨帧挂起只依赖两个字段：
/// `current`（存活实例）和 `pending`（下一次 update 时才实例化的动作 id）。
pub struct FlowPlayer {
    config: PlayerConfig,
    factories: Arc<ActionFactoryRegistry>,
    asset: Option<Arc<FlowAsset>>,
    current: Option<LiveAction>,
    pending: Option<ActionId>,
    last_action: Option<ActionId>,
    last_report: Option<FinishReport>,
    state: PlayerState,
    variables: VariableStore,
    rng: StdRng,
    observers: Vec<Box<dyn PlayerObserver>>,
}

impl FlowPlayer {
    /// 使用内置动作和默认配置
    pub fn new() -> Self {
        Self::with_config(ActionFactoryRegistry::builtins(), PlayerConfig::default())
    }

    pub fn with_factories(factories: Arc<ActionFactoryRegistry>) -> Self {
        Self::with_config(factories, PlayerConfig::default())
    }

    pub fn with_config(factories: Arc<ActionFactoryRegistry>, config: PlayerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            factories,
            asset: None,
            current: None,
            pending: None,
            last_action: None,
            last_report: None,
            state: PlayerState::Idle,
            variables: VariableStore::new(),
            rng,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: impl PlayerObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn asset(&self) -> Option<&Arc<FlowAsset>> {
        self.asset.as_ref()
    }

    pub fn current_action_id(&self) -> Option<&str> {
        self.current.as_ref().map(|live| live.id.as_str())
    }

    pub fn pending_action_id(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// 最近一次运行的完成报告；`start` 时清空
    pub fn last_report(&self) -> Option<&FinishReport> {
        self.last_report.as_ref()
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.variables
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some() || self.pending.is_some()
    }

    /// 挂载流程并进入 PendingStart
    ///
    /// 先校验（流程非空、起始动作可解析），校验失败时不改动任何状态。
    pub fn start(&mut self, asset: Arc<FlowAsset>, options: StartOptions) -> Result<()> {
        if asset.is_empty() {
            return Err(FlowError::EmptyAsset(asset.name().to_string()));
        }
        let start_id = options
            .start_action
            .as_deref()
            .or_else(|| asset.default_start_action_id())
            .ok_or_else(|| FlowError::MissingStartAction(asset.name().to_string()))?;
        if asset.find_action(start_id).is_none() {
            return Err(FlowError::UnknownAction(start_id.to_string()));
        }
        let start_id = start_id.to_string();

        self.stop();
        self.last_report = None;

        let mut variables = asset.default_variables().clone();
        variables.merge_from(&options.variables);
        self.variables = variables;
        if let Some(seed) = options.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        info!(flow = %asset.name(), start = %start_id, "flow started");
        for observer in &mut self.observers {
            observer.on_start(asset.name());
        }

        self.asset = Some(asset);
        self.pending = Some(start_id);
        self.last_action = None;
        self.state = PlayerState::PendingStart;
        Ok(())
    }

    /// 停止当前运行；存活的动作会收到一次 `on_cancel`
    pub fn stop(&mut self) {
        if self.asset.is_none() {
            return;
        }
        if let Some(mut live) = self.current.take() {
            debug!(action = %live.id, "cancelling live action");
            live.instance.on_cancel();
            self.last_action = Some(live.id);
        }
        self.finish(false);
    }

    /// 推进一帧
    pub fn update(&mut self, session: &Session, dt: f32) {
        let Some(asset) = self.asset.clone() else {
            return;
        };
        let mut remaining = match ConfigValidator::validate_tick_delta(dt) {
            Ok(()) => dt,
            Err(err) => {
                crate::log_warn!(error = %err, "invalid tick delta, using zero");
                0.0
            }
        };

        if let Some(id) = self.pending.take() {
            if !self.begin_action(&asset, session, id) {
                return;
            }
        }

        let limit = self.config.max_transitions_per_update.max(1);
        let mut transitions = 0usize;
        let mut update = UpdateContext::new(remaining);

        while let Some(live) = self.current.as_mut() {
            let Some(descriptor) = asset.find_action(&live.id) else {
                session.error(format!("action `{}` vanished from flow `{}`", live.id, asset.name()));
                self.finish(true);
                return;
            };

            update.reset(remaining);
            {
                let mut ctx = ActionContext {
                    descriptor,
                    session,
                    variables: &mut self.variables,
                    rng: &mut self.rng,
                };
                live.instance.update(&mut ctx, &mut update);
            }

            if let Some(message) = update.error() {
                let text = format!("action `{}` failed: {}", descriptor.id, message);
                if update.is_finished() {
                    session.error(text);
                } else {
                    session.warn(text);
                }
            }

            if !update.is_finished() {
                break;
            }

            remaining = update.remaining_time();
            let next = update.take_next_action();
            let failed = update.error().is_some();
            let Some(next) = next.filter(|_| !failed) else {
                self.finish(failed);
                return;
            };

            debug!(from = %descriptor.id, to = %next, yielded = update.should_yield(), "transition");
            self.current = None;

            if update.should_yield() {
                self.pending = Some(next);
                self.state = PlayerState::Yielded;
                return;
            }

            transitions += 1;
            if transitions >= limit {
                session.warn(format!(
                    "flow `{}` reached {} transitions in one update, resuming `{}` next update",
                    asset.name(),
                    limit,
                    next
                ));
                self.pending = Some(next);
                self.state = PlayerState::Yielded;
                return;
            }

            if !self.begin_action(&asset, session, next) {
                return;
            }
        }
    }

    /// 实例化动作并调用 `on_start`；失败时报告并以错误结束运行
    fn begin_action(&mut self, asset: &FlowAsset, session: &Session, id: ActionId) -> bool {
        let Some(descriptor) = asset.find_action(&id) else {
            session.error(format!("unknown action `{}` in flow `{}`", id, asset.name()));
            self.pending = Some(id);
            self.finish(true);
            return false;
        };

        let mut instance = match self.factories.build(&descriptor.type_name, descriptor) {
            Ok(instance) => instance,
            Err(err) => {
                session.error(format!("cannot create action `{}`: {}", id, err));
                self.pending = Some(id);
                self.finish(true);
                return false;
            }
        };

        debug!(action = %id, kind = %descriptor.type_name, "action started");
        let mut ctx = ActionContext {
            descriptor,
            session,
            variables: &mut self.variables,
            rng: &mut self.rng,
        };
        instance.on_start(&mut ctx);

        self.last_action = Some(id.clone());
        self.current = Some(LiveAction { id, instance });
        self.state = PlayerState::Active;
        true
    }

    fn finish(&mut self, with_error: bool) {
        let last_action_id = self
            .current
            .take()
            .map(|live| live.id)
            .or_else(|| self.last_action.take())
            .or_else(|| self.pending.clone());
        self.pending = None;
        self.last_action = None;
        self.state = PlayerState::Finished;

        let flow = self
            .asset
            .take()
            .map(|asset| asset.name().to_string())
            .unwrap_or_default();
        let report = FinishReport {
            flow,
            last_action_id,
            with_error,
        };
        info!(
            flow = %report.flow,
            last_action = ?report.last_action_id,
            with_error,
            "flow finished"
        );
        for observer in &mut self.observers {
            observer.on_finish(&report);
        }

        self.last_report = Some(report);
        self.state = PlayerState::Idle;
    }
}

impl Default for FlowPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FlowPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowPlayer")
            .field("state", &self.state)
            .field("flow", &self.asset.as_ref().map(|asset| asset.name()))
            .field("current", &self.current_action_id())
            .field("pending", &self.pending)
            .field("variables", &self.variables)
            .finish()
    }
}
