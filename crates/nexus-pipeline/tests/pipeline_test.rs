mod common;

use std::sync::{Arc, Mutex};

use common::ScriptStage;
use nexus_pipeline::{Pipeline, RunState};

#[tokio::test]
async fn stages_run_in_push_order() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = Pipeline::new();
    pipeline.push(ScriptStage::ok("first", &journal));
    pipeline.push(ScriptStage::ok("second", &journal));
    pipeline.push(ScriptStage::ok("third", &journal));

    let state = pipeline.run(RunState::new()).await;

    assert!(state.succeeded());
    assert_eq!(*journal.lock().unwrap(), ["first", "second", "third"]);
}

#[tokio::test]
async fn failure_skips_remaining_stages() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = Pipeline::new();
    pipeline.push(ScriptStage::ok("first", &journal));
    pipeline.push(ScriptStage::failing("second", &journal));
    pipeline.push(ScriptStage::ok("third", &journal));

    let state = pipeline.run(RunState::new()).await;

    assert!(!state.succeeded());
    // 3番目は実行されない
    assert_eq!(*journal.lock().unwrap(), ["first", "second"]);
    assert_eq!(state.errors, vec!["second exploded".to_string()]);
}

#[tokio::test]
async fn stage_names_reflect_push_order() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = Pipeline::new();
    pipeline.push(ScriptStage::ok("network", &journal));
    pipeline.push(ScriptStage::ok("discovery", &journal));

    assert_eq!(pipeline.stage_names(), ["network", "discovery"]);
    assert_eq!(pipeline.len(), 2);
}

#[tokio::test]
async fn empty_pipeline_succeeds_without_side_effects() {
    let pipeline = Pipeline::new();
    assert!(pipeline.is_empty());

    let state = pipeline.run(RunState::new()).await;
    assert!(state.succeeded());
    assert!(state.errors.is_empty());
    assert!(state.logs.is_empty());
}
