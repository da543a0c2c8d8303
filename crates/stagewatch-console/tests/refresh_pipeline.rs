use chrono::NaiveDate;
use serde_json::json;
use stagewatch_console::app::{App, Effect};
use stagewatch_console::config::ConsoleConfig;
use stagewatch_console::notice::NoticeLevel;
use stagewatch_console::refresh::{RefreshKind, RefreshOutcome};
use stagewatch_console::runtime::run_effect;
use stagewatch_console::view::{PanelTab, ViewAction, SCROLL_RESTORE_DELAY};
use stagewatch_core::WorkflowSummary;
use stagewatch_service::{ActionKind, MemoryWorkflowService};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn config() -> ConsoleConfig {
    ConsoleConfig {
        app_id: Some("treasury".to_string()),
        config_id: Some("eod".to_string()),
        date: NaiveDate::from_ymd_opt(2025, 5, 19).expect("date"),
        refresh_secs: 30,
        idle_window: Duration::from_secs(120),
        auto_refresh: true,
        actor: "ops".to_string(),
        ..ConsoleConfig::default()
    }
}

fn summary(validate_status: &str) -> WorkflowSummary {
    serde_json::from_value(json!({
        "processRecords": [
            {"processId": 101, "stageId": 1, "stageName": "Load", "substageId": "10",
             "substageName": "Fetch rates", "substageSeq": 1, "status": "COMPLETED"},
            {"processId": 102, "stageId": 1, "stageName": "Load", "substageId": "11",
             "substageName": "Validate", "substageSeq": 2, "status": validate_status,
             "requiresApproval": "Y", "dependsOn": "10"},
            {"processId": 201, "stageId": 2, "stageName": "Publish", "substageId": "20",
             "substageName": "Send", "substageSeq": 3, "status": "NOT STARTED"}
        ]
    }))
    .expect("summary")
}

/// Runs effects to completion, feeding every follow-up effect back in.
async fn settle(
    app: &mut App,
    service: &Arc<MemoryWorkflowService>,
    effects: Vec<Effect>,
    now: Instant,
) {
    let mut queue = effects;
    while let Some(effect) = queue.pop() {
        let event = run_effect(Arc::clone(service), effect).await;
        queue.extend(app.apply_event(event, now));
    }
}

async fn loaded(now: Instant) -> (App, Arc<MemoryWorkflowService>) {
    let service = Arc::new(MemoryWorkflowService::with_summary(summary("IN PROGRESS")));
    let mut app = App::new(config(), now);
    let effects = app.start(now);
    settle(&mut app, &service, effects, now).await;
    assert!(app.store().aggregation().is_some());
    (app, service)
}

#[tokio::test]
async fn back_to_back_refresh_requests_fetch_once() {
    let now = Instant::now();
    let (mut app, service) = loaded(now).await;
    let calls_before = service.summary_calls();

    let first = app.request_refresh(RefreshKind::Manual, now);
    let second = app.request_refresh(RefreshKind::Manual, now);
    assert!(first.is_some());
    assert!(second.is_none());

    let effects = first.map(Effect::FetchSummary).into_iter().collect();
    settle(&mut app, &service, effects, now).await;
    assert_eq!(service.summary_calls(), calls_before + 1);
    assert!(!app.is_refreshing());
}

#[tokio::test]
async fn failed_refresh_keeps_data_and_view() {
    let now = Instant::now();
    let (mut app, service) = loaded(now).await;
    app.dispatch(ViewAction::SelectTask("11".to_string()));
    app.dispatch(ViewAction::ShowTab(PanelTab::Dependencies));
    let view_before = app.view().clone();
    let generation_before = app.store().generation();

    service.fail_next_summary("gateway timeout");
    let ticket = app
        .request_refresh(RefreshKind::Manual, now)
        .expect("ticket");
    let event = run_effect(Arc::clone(&service), Effect::FetchSummary(ticket)).await;
    app.apply_event(event, now);

    assert_eq!(app.view(), &view_before);
    assert_eq!(app.store().generation(), generation_before);
    assert_eq!(app.active_tasks().len(), 2);
    let latest = app.notices().latest().expect("notice");
    assert_eq!(latest.level, NoticeLevel::Error);
    assert!(latest.text.contains("gateway timeout"));
}

#[tokio::test]
async fn rejected_envelope_is_a_failure_too() {
    let now = Instant::now();
    let (mut app, service) = loaded(now).await;
    service.reject_next_summary("business date closed");
    let ticket = app
        .request_refresh(RefreshKind::Manual, now)
        .expect("ticket");
    let event = run_effect(Arc::clone(&service), Effect::FetchSummary(ticket)).await;
    let stagewatch_console::app::AppEvent::Summary(event) = event else {
        panic!("expected summary event");
    };
    assert_eq!(
        app.complete_refresh(event, now),
        RefreshOutcome::Failed("business date closed".to_string())
    );
}

#[tokio::test]
async fn completion_after_teardown_is_ignored() {
    let now = Instant::now();
    let service = Arc::new(MemoryWorkflowService::with_summary(summary("IN PROGRESS")));
    let mut app = App::new(config(), now);
    let effects = app.start(now);
    assert_eq!(effects.len(), 1);

    app.teardown();
    let event = run_effect(Arc::clone(&service), effects[0].clone()).await;
    assert!(app.apply_event(event, now).is_empty());
    assert!(app.store().is_empty());
    assert!(app.request_refresh(RefreshKind::Manual, now).is_none());
    assert!(app.on_tick(now + Duration::from_secs(60)).is_empty());
}

#[tokio::test]
async fn refresh_restores_the_operator_view() {
    let now = Instant::now();
    let (mut app, service) = loaded(now).await;
    app.dispatch(ViewAction::SelectStage("1".to_string()));
    app.dispatch(ViewAction::SelectTask("11".to_string()));
    app.dispatch(ViewAction::ShowTab(PanelTab::Dependencies));
    app.dispatch(ViewAction::ScrollTo(4));
    let before = app.view().clone();

    service.set_summary(summary("COMPLETED"));
    let ticket = app
        .request_refresh(RefreshKind::Manual, now)
        .expect("ticket");
    // Layout churn while the fetch is out.
    app.dispatch(ViewAction::ScrollTo(0));
    settle(&mut app, &service, vec![Effect::FetchSummary(ticket)], now).await;

    assert_eq!(app.view().selected_task, before.selected_task);
    assert_eq!(app.view().panel_tab, PanelTab::Dependencies);
    assert_eq!(app.view().scroll_y, 0);
    assert_eq!(
        app.selected_task().map(|task| task.raw_status.as_str()),
        Some("COMPLETED")
    );

    app.on_tick(now + SCROLL_RESTORE_DELAY);
    assert_eq!(app.view(), &before);
}

#[tokio::test]
async fn idle_operator_gets_no_background_refresh() {
    let t0 = Instant::now();
    let (mut app, service) = loaded(t0).await;
    let calls_after_load = service.summary_calls();
    assert!(app.on_tick(t0).is_empty());

    let mut fired_at = Vec::new();
    let mut countdowns = Vec::new();
    for s in 1..=400 {
        let now = t0 + Duration::from_secs(s);
        let effects = app.on_tick(now);
        if !effects.is_empty() {
            fired_at.push(s);
        }
        settle(&mut app, &service, effects, now).await;
        if s > 120 {
            countdowns.push(app.scheduler().countdown_secs());
        }
    }

    assert!(!app.scheduler().is_armed());
    assert!(
        countdowns.windows(2).all(|pair| pair[0] != pair[1]),
        "countdown stopped ticking while idle"
    );

    assert_eq!(fired_at, vec![30, 60, 90]);
    assert_eq!(service.summary_calls(), calls_after_load + 3);
}

#[tokio::test]
async fn approval_records_action_and_refreshes_silently() {
    let now = Instant::now();
    let (mut app, service) = loaded(now).await;
    app.dispatch(ViewAction::SelectTask("11".to_string()));
    let calls_before = service.summary_calls();

    let ticket = app
        .request_action(ActionKind::Approve, "figures tie out", now)
        .expect("ticket");
    settle(&mut app, &service, vec![Effect::RunAction(ticket)], now).await;

    let actions = service.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].process_id, 102);
    assert_eq!(actions[0].actor, "ops");
    assert_eq!(actions[0].commentary.as_deref(), Some("figures tie out"));
    assert_eq!(service.summary_calls(), calls_before + 1);
    assert_eq!(
        app.notices().latest().map(|notice| notice.level),
        Some(NoticeLevel::Success)
    );
}

#[tokio::test]
async fn rows_sharing_a_key_across_stages_stay_distinct() {
    let now = Instant::now();
    let summary: WorkflowSummary = serde_json::from_value(json!({
        "processRecords": [
            {"processId": 101, "stageId": 1, "stageName": "Load", "substageName": "Load A",
             "substageSeq": 1, "status": "COMPLETED"},
            {"processId": 201, "stageId": 2, "stageName": "Publish", "substageName": "Publish A",
             "substageSeq": 1, "status": "RUNNING"}
        ]
    }))
    .expect("summary");
    let service = Arc::new(MemoryWorkflowService::with_summary(summary));
    let mut app = App::new(config(), now);
    let effects = app.start(now);
    settle(&mut app, &service, effects, now).await;

    app.dispatch(ViewAction::SelectStage("2".to_string()));
    let row_id = app.active_tasks()[0].id.clone();
    app.dispatch(ViewAction::SelectTask(row_id));
    assert_eq!(app.selected_task().map(|task| task.process_id), Some(201));

    let ticket = app
        .request_action(ActionKind::ForceStart, "", now)
        .expect("running task can be force started");
    assert_eq!(ticket.process_id, 201);
}
