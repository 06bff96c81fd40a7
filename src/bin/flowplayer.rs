use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use flowplayer::logging::LoggingConfig;
use flowplayer::validation::ConfigValidator;
use flowplayer::{
    load_asset_from_path, run_headless, summarize_asset, ActionFactoryRegistry, FinishReport,
    FlowAsset, FlowPlayer, PlayerConfig, PlayerObserver, Session, StartOptions,
};

#[derive(Parser)]
#[command(name = "flowplayer", version, about = "Flow graph player CLI", author)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 运行流程直到结束
    Run {
        asset: PathBuf,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        #[arg(long, default_value_t = 10_000)]
        max_ticks: usize,
        /// 按真实时间间隔推进
        #[arg(long)]
        realtime: bool,
    },
    /// 打印动作与连接
    Inspect {
        asset: PathBuf,
        /// 输出单行 JSON
        #[arg(long)]
        compact: bool,
    },
}

struct PrintFinish;

impl PlayerObserver for PrintFinish {
    fn on_start(&mut self, flow: &str) {
        println!("flow `{flow}` started");
    }

    fn on_finish(&mut self, report: &FinishReport) {
        println!(
            "flow `{}` finished at `{}`{}",
            report.flow,
            report.last_action_id.as_deref().unwrap_or("-"),
            if report.with_error { " with error" } else { "" }
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            asset,
            start,
            seed,
            dt,
            max_ticks,
            realtime,
        } => handle_run(asset, start, seed, dt, max_ticks, realtime).await?,
        Command::Inspect { asset, compact } => handle_inspect(asset, compact)?,
    }
    Ok(())
}

async fn handle_run(
    path: PathBuf,
    start: Option<String>,
    seed: Option<u64>,
    dt: f32,
    max_ticks: usize,
    realtime: bool,
) -> anyhow::Result<()> {
    ConfigValidator::validate_tick_delta(dt)?;
    let asset = Arc::new(load_asset_from_path(&path)?);
    let mut options = StartOptions::new();
    if let Some(start) = start {
        options = options.with_start(start);
    }
    if let Some(seed) = seed {
        options = options.with_seed(seed);
    }

    let mut player =
        FlowPlayer::with_config(ActionFactoryRegistry::builtins(), PlayerConfig::from_env()?);
    player.add_observer(PrintFinish);
    let session = Session::new();

    if realtime {
        run_realtime(&mut player, &session, asset, options, dt, max_ticks).await?;
        return Ok(());
    }

    let outcome = run_headless(&mut player, &session, asset, options, dt, max_ticks)?;
    if outcome.report.is_none() {
        println!("flow still running after {} ticks", outcome.ticks);
    }
    Ok(())
}

async fn run_realtime(
    player: &mut FlowPlayer,
    session: &Session,
    asset: Arc<FlowAsset>,
    options: StartOptions,
    dt: f32,
    max_ticks: usize,
) -> anyhow::Result<()> {
    player.start(asset, options)?;

    let mut interval = tokio::time::interval(Duration::from_secs_f32(dt.max(0.001)));
    let mut ticks = 0;
    while player.is_playing() && ticks < max_ticks {
        interval.tick().await;
        player.update(session, dt);
        ticks += 1;
    }
    if player.is_playing() {
        println!("flow still running after {ticks} ticks");
    }
    Ok(())
}

fn handle_inspect(path: PathBuf, compact: bool) -> anyhow::Result<()> {
    let asset = load_asset_from_path(&path)?;
    let summary = summarize_asset(&asset);
    let content = if compact {
        serde_json::to_string(&summary)?
    } else {
        serde_json::to_string_pretty(&summary)?
    };
    println!("{content}");
    Ok(())
}
