//! Runs [`Effect`]s against the workflow service off the event loop.

use crate::app::{AppEvent, Effect};
use crate::refresh::{describe, fetch_summary, RefreshEvent};
use stagewatch_service::{perform_action, WorkflowActionService, WorkflowService};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

pub async fn run_effect<S>(service: Arc<S>, effect: Effect) -> AppEvent
where
    S: WorkflowService + WorkflowActionService + 'static,
{
    match effect {
        Effect::FetchSummary(ticket) => {
            let result = fetch_summary(service.as_ref(), &ticket).await;
            AppEvent::Summary(RefreshEvent { ticket, result })
        }
        Effect::FetchNodes(query) => {
            let result = service
                .get_workflow_nodes(&query)
                .await
                .and_then(|response| response.into_result())
                .map_err(|err| describe(&err));
            AppEvent::Nodes { query, result }
        }
        Effect::RunAction(ticket) => {
            let result = perform_action(
                service.as_ref(),
                ticket.kind,
                ticket.process_id,
                &ticket.actor,
                &ticket.commentary,
            )
            .await
            .map_err(|err| describe(&err));
            AppEvent::Action { ticket, result }
        }
    }
}

/// One task per effect; each reports back on `tx`.
pub fn spawn_effects<S>(service: &Arc<S>, effects: Vec<Effect>, tx: &mpsc::Sender<AppEvent>)
where
    S: WorkflowService + WorkflowActionService + 'static,
{
    for effect in effects {
        let service = Arc::clone(service);
        let tx = tx.clone();
        tokio::spawn(async move {
            let event = run_effect(service, effect).await;
            if tx.send(event).await.is_err() {
                debug!("event_channel_closed");
            }
        });
    }
}
