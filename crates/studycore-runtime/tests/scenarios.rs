//! End-to-end scenarios driving the full stack — session manager,
//! scheduler, device store, rule engine, goal checker, event bus — through
//! the public `StudyCore` facade rather than any single module in
//! isolation.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde_json::json;

use studycore_runtime::RuntimeEvent;
use studycore_testing::assertions::{
    assert_at_most_one_terminal, assert_contiguous_task_order, assert_task_aborted, assert_task_completed, assert_task_timed_out,
};
use studycore_testing::fixtures::explanation_config_integrated_on_demand;
use studycore_testing::{GameConfigFixture, World};
use studycore_types::{Clock, DeviceId, InteractionName, TaskId, Value};

fn two_task_config() -> String {
    GameConfigFixture::new()
        .with_tasks(vec![
            json!({
                "id": "T1",
                "description": "turn on the light",
                "goals": [{"device": "light", "interaction": "power", "operator": "==", "value": true}],
                "defaultDeviceProperties": [{"device": "light", "interaction": "power", "value": false}],
                "abortionOptions": ["too hard", "uninterested"]
            }),
            json!({"id": "T2", "description": "a second task"}),
        ])
        .build()
}

/// Scenario 1, "Happy path completion".
#[tokio::test]
async fn happy_path_completion_advances_to_the_next_task() {
    let world = World::with_game_config(two_task_config());
    let session_id = World::new_session_id();
    world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();

    let mut events = world.core.subscribe(&session_id).await.unwrap();
    world.clock.advance(Duration::seconds(2));
    world
        .core
        .device_interaction(&session_id, DeviceId::from("light"), InteractionName::from("power"), Value::Bool(true))
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        RuntimeEvent::GameUpdate { updated_tasks, .. } => {
            assert!(updated_tasks[0].is_completed);
            assert_eq!(updated_tasks[1].task_id, TaskId::from("T2"));
        }
        other => panic!("expected a game-update push, got {other:?}"),
    }

    let data = world.core.game_data(&session_id).await.unwrap();
    assert_task_completed(&data.tasks[0].task).unwrap();
    assert!(!data.tasks[1].task.is_completed);
    assert_contiguous_task_order(&data.tasks.iter().map(|t| t.task.clone()).collect::<Vec<_>>()).unwrap();
}

/// Scenario 2, "Timeout cascade": a participant who reconnects long after
/// a task's window elapsed resumes the schedule from the reconnect.
#[tokio::test]
async fn reconnecting_after_a_timeout_resumes_the_schedule_from_now() {
    let world = World::with_game_config(two_task_config());
    let session_id = World::new_session_id();
    world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();

    world.clock.advance(Duration::seconds(90));
    let data = world.core.game_data(&session_id).await.unwrap();

    assert_task_timed_out(&data.tasks[0].task).unwrap();
    assert_at_most_one_terminal(&data.tasks[0].task).unwrap();
    assert_eq!(data.tasks[0].task.duration, Some(60.0));
    assert_eq!(data.tasks[1].task.start_time, world.clock.now());
}

/// Scenario 3, "Rule with delay": the device mutation a rule's action
/// performs only lands on the bus once the rule's configured delay has
/// actually elapsed.
#[tokio::test]
async fn a_delayed_rule_action_lands_only_after_its_delay() {
    let fixture = GameConfigFixture::new()
        .with_devices(vec![
            json!({"id": "light", "interactions": [{"name": "power", "type": "boolean", "value": false}]}),
            json!({"id": "sensor", "interactions": [{"name": "motion", "type": "boolean", "value": false}]}),
        ])
        .with_tasks(vec![json!({
            "id": "T1",
            "description": "wait for the light",
            "goals": [{"device": "light", "interaction": "power", "operator": "==", "value": true}]
        })])
        .with_rules(vec![json!({
            "id": "R1",
            "precondition": [{"kind": "device", "device": "sensor", "interaction": "motion", "operator": "==", "value": true}],
            "action": [{"kind": "device_interaction", "device": "light", "interaction": "power", "value": true}],
            "delay": 2.0
        })])
        .build();

    let world = World::with_game_config(fixture);
    let session_id = World::new_session_id();
    world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();
    let mut events = world.core.subscribe(&session_id).await.unwrap();

    world
        .core
        .device_interaction(&session_id, DeviceId::from("sensor"), InteractionName::from("motion"), Value::Bool(true))
        .await
        .unwrap();

    let too_soon = tokio::time::timeout(StdDuration::from_millis(300), events.recv()).await;
    assert!(too_soon.is_err(), "the rule's action must not land before its delay elapses");

    let pushed = tokio::time::timeout(StdDuration::from_millis(2500), events.recv())
        .await
        .expect("rule action never arrived")
        .unwrap();
    match pushed {
        RuntimeEvent::UpdateInteraction { device_id, interaction, value } => {
            assert_eq!(device_id, DeviceId::from("light"));
            assert_eq!(interaction, InteractionName::from("power"));
            assert_eq!(value, Value::Bool(true));
        }
        other => panic!("expected update-interaction, got {other:?}"),
    }

    let data = world.core.game_data(&session_id).await.unwrap();
    let light = data.game_config["devices"].as_array().unwrap().iter().find(|d| d["id"] == "light").unwrap();
    let power = light["interactions"].as_array().unwrap().iter().find(|i| i["name"] == "power").unwrap();
    assert_eq!(power["value"], true);
}

/// Scenario 4, "Abort": an unrecognized abort option is ignored; a
/// configured one records the reason and re-times whatever follows.
#[tokio::test]
async fn abort_ignores_unknown_options_and_records_a_configured_one() {
    let world = World::with_game_config(two_task_config());
    let session_id = World::new_session_id();
    world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();

    world.core.task_abort(&session_id, TaskId::from("T1"), "unknown".to_string()).await.unwrap();
    let data = world.core.game_data(&session_id).await.unwrap();
    assert!(!data.tasks[0].task.is_aborted, "an unconfigured abort option must be ignored");

    world.clock.advance(Duration::seconds(5));
    world.core.task_abort(&session_id, TaskId::from("T1"), "too hard".to_string()).await.unwrap();

    let data = world.core.game_data(&session_id).await.unwrap();
    assert_task_aborted(&data.tasks[0].task, "too hard").unwrap();
    assert_eq!(data.tasks[1].task.start_time, world.clock.now());
}

/// Scenario 5, "Stateless action": a `StatelessAction` interaction never
/// persists, and every event on it is evaluated against a snapshot with
/// that interaction forced to `true` regardless of the raw value sent —
/// so a second event retriggers the same rule again.
#[tokio::test]
async fn stateless_interactions_never_persist_and_are_always_evaluated_as_true() {
    let fixture = GameConfigFixture::new()
        .with_devices(vec![
            json!({"id": "light", "interactions": [{"name": "power", "type": "boolean", "value": false}]}),
            json!({"id": "doorbell", "interactions": [{"name": "press", "type": "statelessAction", "value": false}]}),
        ])
        .with_tasks(vec![json!({
            "id": "T1",
            "description": "answer the door",
            "goals": [{"device": "light", "interaction": "power", "operator": "==", "value": true}]
        })])
        .with_rules(vec![json!({
            "id": "R1",
            "precondition": [{"kind": "device", "device": "doorbell", "interaction": "press", "operator": "==", "value": true}],
            "action": [{"kind": "device_interaction", "device": "light", "interaction": "power", "value": true}]
        })])
        .build();

    let world = World::with_game_config(fixture);
    let session_id = World::new_session_id();
    world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();
    let mut events = world.core.subscribe(&session_id).await.unwrap();

    world
        .core
        .device_interaction(&session_id, DeviceId::from("doorbell"), InteractionName::from("press"), Value::Bool(true))
        .await
        .unwrap();

    assert!(matches!(events.recv().await.unwrap(), RuntimeEvent::UpdateInteraction { .. }));
    assert!(matches!(events.recv().await.unwrap(), RuntimeEvent::GameUpdate { .. }));

    let data = world.core.game_data(&session_id).await.unwrap();
    let doorbell = data.game_config["devices"].as_array().unwrap().iter().find(|d| d["id"] == "doorbell").unwrap();
    let press = doorbell["interactions"].as_array().unwrap().iter().find(|i| i["name"] == "press").unwrap();
    assert_eq!(press["value"], false, "a stateless interaction must never be persisted");

    // A second event on the same stateless interaction — even carrying
    // `false` — is still forced to `true` in the rule-evaluation
    // snapshot, so the rule fires again.
    world
        .core
        .device_interaction(&session_id, DeviceId::from("doorbell"), InteractionName::from("press"), Value::Bool(false))
        .await
        .unwrap();
    let refired = tokio::time::timeout(StdDuration::from_millis(300), events.recv()).await;
    assert!(
        matches!(refired, Ok(Some(RuntimeEvent::UpdateInteraction { .. }))),
        "a fresh stateless event must refire the rule regardless of its raw value"
    );
}

/// Scenario 6, "On-demand explanation": before the delayed rule action
/// lands, a request gets the fallback text; after, it drains the one
/// cached explanation exactly once.
#[tokio::test]
async fn on_demand_explanation_drains_the_cache_once_the_rule_lands() {
    let fixture = GameConfigFixture::new()
        .with_devices(vec![
            json!({"id": "sensor", "interactions": [{"name": "motion", "type": "boolean", "value": false}]}),
            json!({"id": "light", "interactions": [{"name": "power", "type": "boolean", "value": false}]}),
        ])
        // A goal that's never satisfied in this scenario, so `check_goals`
        // never completes T1 out from under the explanation assertions —
        // an empty goal list is vacuously satisfied on the very first check.
        .with_tasks(vec![json!({
            "id": "T1",
            "description": "a task",
            "goals": [{"device": "light", "interaction": "power", "operator": "==", "value": true}]
        })])
        .with_rules(vec![json!({
            "id": "R1",
            "precondition": [{"kind": "device", "device": "sensor", "interaction": "motion", "operator": "==", "value": true}],
            "action": [{"kind": "explanation", "key": "rule_fired"}],
            "delay": 3.0
        })])
        .build();

    let world = World::with_configs(fixture, explanation_config_integrated_on_demand());
    let session_id = World::new_session_id();
    world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();
    let mut events = world.core.subscribe(&session_id).await.unwrap();

    world
        .core
        .device_interaction(&session_id, DeviceId::from("sensor"), InteractionName::from("motion"), Value::Bool(true))
        .await
        .unwrap();

    tokio::time::sleep(StdDuration::from_secs(1)).await;
    world.core.explanation_request(&session_id, None).await.unwrap();
    match events.recv().await.unwrap() {
        RuntimeEvent::Explanation { explanation, rating, .. } => {
            assert_eq!(explanation, "no explanation available right now");
            assert_eq!(rating, None);
        }
        other => panic!("expected a fallback explanation push, got {other:?}"),
    }

    tokio::time::sleep(StdDuration::from_secs(3)).await;
    world.core.explanation_request(&session_id, None).await.unwrap();
    match events.recv().await.unwrap() {
        RuntimeEvent::Explanation { explanation, .. } => assert_eq!(explanation, "A rule just fired."),
        other => panic!("expected the cached explanation, got {other:?}"),
    }
}
