use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::flow::FlowAsset;
use crate::runtime::{FinishReport, FlowPlayer, StartOptions};
use crate::state::Session;

#[derive(Clone, Debug, Serialize)]
pub struct LinkSummary {
    pub to: String,
    #[serde(rename = "yield")]
    pub yield_frame: bool,
    pub condition: Value,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActionSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub links: Vec<LinkSummary>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AssetSummary {
    pub name: String,
    pub start: Option<String>,
    pub variables: Vec<(String, String)>,
    pub actions: Vec<ActionSummary>,
}

pub fn summarize_asset(asset: &FlowAsset) -> AssetSummary {
    let actions = asset
        .actions()
        .iter()
        .map(|action| ActionSummary {
            id: action.id.clone(),
            type_name: action.type_name.clone(),
            links: action
                .links
                .iter()
                .map(|link| LinkSummary {
                    to: link.to.clone(),
                    yield_frame: link.yield_frame,
                    condition: serde_json::to_value(&link.condition).unwrap_or(Value::Null),
                })
                .collect(),
        })
        .collect();

    AssetSummary {
        name: asset.name().to_string(),
        start: asset.default_start_action_id().map(str::to_string),
        variables: asset
            .default_variables()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        actions,
    }
}

/// 无界面运行的结果
#[derive(Clone, Debug, Serialize)]
pub struct RunOutcome {
    pub ticks: usize,
    pub report: Option<FinishReport>,
}

/// 以固定帧间隔驱动流程，直到结束或达到帧数上限
pub fn run_headless(
    player: &mut FlowPlayer,
    session: &Session,
    asset: Arc<FlowAsset>,
    options: StartOptions,
    dt: f32,
    max_ticks: usize,
) -> Result<RunOutcome> {
    player.start(asset, options)?;

    let mut ticks = 0;
    while player.is_playing() && ticks < max_ticks {
        player.update(session, dt);
        ticks += 1;
    }

    let report = if player.is_playing() {
        None
    } else {
        player.last_report().cloned()
    };
    Ok(RunOutcome { ticks, report })
}
