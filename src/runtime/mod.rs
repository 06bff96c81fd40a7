// 运行时模块 - 按帧驱动的流程播放器

mod player;
mod types;

pub use player::FlowPlayer;
pub use types::{
    FinishReport, PlayerConfig, PlayerObserver, PlayerState, StartOptions,
    DEFAULT_MAX_TRANSITIONS,
};
