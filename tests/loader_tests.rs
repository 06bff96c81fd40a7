use std::fs;
use std::sync::Arc;

use serde_json::json;

use flowplayer::{
    load_asset_from_path, load_asset_from_str, load_asset_from_value, summarize_asset,
    run_headless, Condition, FlowAssetConfig, FlowError, FlowPlayer, FlowRegistry, Session,
    StartOptions, VarValue,
};

fn quest_json() -> serde_json::Value {
    json!({
        "name": "village_quest",
        "start": "intro",
        "variables": {
            "gold": 40,
            "reputation": { "type": "float", "value": 1.0 },
            "guard": { "type": "entity", "value": null }
        },
        "actions": [
            {
                "id": "intro",
                "type": "log",
                "params": { "message": "quest begins" },
                "links": [ { "to": "reward", "yield": true } ]
            },
            {
                "id": "reward",
                "type": "set_variable",
                "params": { "name": "gold", "value": 140 },
                "links": [ { "to": "gate" } ]
            },
            {
                "id": "gate",
                "type": "branch",
                "links": [
                    {
                        "to": "rich",
                        "condition": { "type": "var_compare_constant", "var": "gold", "op": ">=", "value": 100 }
                    },
                    { "to": "poor" }
                ]
            },
            { "id": "rich", "type": "end" },
            { "id": "poor", "type": "end" }
        ]
    })
}

#[test]
fn loads_asset_from_json_value() -> anyhow::Result<()> {
    let asset = load_asset_from_value(quest_json())?;

    assert_eq!(asset.name(), "village_quest");
    assert_eq!(asset.len(), 5);
    assert_eq!(asset.default_start_action_id(), Some("intro"));
    assert_eq!(asset.default_variables().get_by_name::<i64>("gold")?, 40);
    assert_eq!(
        asset.default_variables().lookup("guard"),
        Some(&VarValue::Entity(None))
    );

    let intro = asset.find_action("intro").ok_or_else(|| anyhow::anyhow!("intro missing"))?;
    assert!(intro.links[0].yield_frame);
    let gate = asset.find_action("gate").ok_or_else(|| anyhow::anyhow!("gate missing"))?;
    assert!(matches!(gate.links[0].condition, Condition::VarCompareConstant { .. }));
    assert_eq!(gate.links[1].condition, Condition::True);
    Ok(())
}

#[test]
fn loaded_asset_runs_headless() -> anyhow::Result<()> {
    let asset = Arc::new(load_asset_from_value(quest_json())?);
    let mut player = FlowPlayer::new();
    let outcome = run_headless(
        &mut player,
        &Session::new(),
        asset,
        StartOptions::new().with_seed(1),
        0.016,
        10,
    )?;

    // intro 让出一帧，第二帧完成剩余链路
    assert_eq!(outcome.ticks, 2);
    let report = outcome.report.ok_or_else(|| anyhow::anyhow!("flow did not finish"))?;
    assert_eq!(report.last_action_id.as_deref(), Some("rich"));
    assert!(!report.with_error);
    Ok(())
}

#[test]
fn headless_runs_reuse_one_player() -> anyhow::Result<()> {
    let asset = Arc::new(load_asset_from_value(quest_json())?);
    let mut player = FlowPlayer::new();
    let session = Session::new();

    let first = run_headless(&mut player, &session, Arc::clone(&asset), StartOptions::new(), 0.016, 10)?;
    assert_eq!(
        first.report.and_then(|r| r.last_action_id),
        Some("rich".to_string())
    );

    // 只跑一帧时流程仍在进行，不能返回上一次运行的报告
    let cut_short = run_headless(&mut player, &session, Arc::clone(&asset), StartOptions::new(), 0.016, 1)?;
    assert_eq!(cut_short.ticks, 1);
    assert!(cut_short.report.is_none());
    assert!(player.is_playing());

    let again = run_headless(&mut player, &session, asset, StartOptions::new(), 0.016, 10)?;
    let report = again.report.ok_or_else(|| anyhow::anyhow!("flow did not finish"))?;
    assert_eq!(report.flow, "village_quest");
    assert_eq!(report.last_action_id.as_deref(), Some("rich"));
    Ok(())
}

#[test]
fn config_round_trips_through_pretty_json() -> anyhow::Result<()> {
    let config = FlowAssetConfig::from_value(quest_json())?;
    let text = config.to_json_pretty()?;
    let asset = load_asset_from_str(&text)?;
    assert_eq!(asset.len(), 5);
    assert_eq!(asset.default_variables().get_by_name::<f64>("reputation")?, 1.0);
    Ok(())
}

#[test]
fn rejects_links_to_unknown_actions() {
    let result = load_asset_from_value(json!({
        "name": "broken",
        "actions": [ { "id": "a", "type": "branch", "links": [ { "to": "nowhere" } ] } ]
    }));
    assert!(matches!(result, Err(FlowError::UnknownAction(id)) if id == "nowhere"));
}

#[test]
fn rejects_duplicate_action_ids() {
    let result = load_asset_from_value(json!({
        "name": "dupes",
        "actions": [ { "id": "a", "type": "end" }, { "id": "a", "type": "end" } ]
    }));
    assert!(matches!(result, Err(FlowError::DuplicateAction(id)) if id == "a"));
}

#[test]
fn malformed_json_is_an_asset_error() {
    assert!(matches!(
        load_asset_from_str("{ \"name\": "),
        Err(FlowError::Asset(_))
    ));
}

#[test]
fn loads_from_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("quest.json");
    fs::write(&path, serde_json::to_string_pretty(&quest_json())?)?;

    let asset = load_asset_from_path(&path)?;
    assert_eq!(asset.name(), "village_quest");
    assert!(matches!(
        load_asset_from_path(dir.path().join("missing.json")),
        Err(FlowError::Io(_))
    ));
    Ok(())
}

#[test]
fn registry_loads_directory_and_skips_bad_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("quest.json"), quest_json().to_string())?;
    fs::write(
        dir.path().join("tiny.json"),
        json!({ "name": "tiny", "actions": [ { "id": "only", "type": "end" } ] }).to_string(),
    )?;
    fs::write(dir.path().join("broken.json"), "not json")?;
    fs::write(dir.path().join("notes.txt"), "ignored")?;

    let mut registry = FlowRegistry::new();
    let loaded = registry.load_directory(dir.path())?;

    assert_eq!(loaded, 2);
    assert!(registry.get("village_quest").is_some());
    assert!(registry.get("tiny").is_some());
    let mut names: Vec<_> = registry.list().map(|asset| asset.name().to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["tiny", "village_quest"]);
    Ok(())
}

#[test]
fn summary_lists_actions_and_conditions() -> anyhow::Result<()> {
    let asset = load_asset_from_value(quest_json())?;
    let summary = summarize_asset(&asset);

    assert_eq!(summary.start.as_deref(), Some("intro"));
    assert_eq!(summary.actions.len(), 5);
    let gate = &summary.actions[2];
    assert_eq!(gate.type_name, "branch");
    assert_eq!(gate.links[0].condition["type"], "var_compare_constant");
    assert_eq!(gate.links[1].condition, json!({}));
    Ok(())
}
