use crate::{
    ActionKind, ApiResponse, NodesQuery, ServiceError, SummaryQuery, WorkflowActionService,
    WorkflowService,
};
use stagewatch_core::{WorkflowNode, WorkflowSummary};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAction {
    pub kind: ActionKind,
    pub process_id: i64,
    pub actor: String,
    pub commentary: Option<String>,
}

#[derive(Debug)]
enum ScriptedFailure {
    Transport(String),
    Rejected(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    summary: Option<WorkflowSummary>,
    nodes: Vec<WorkflowNode>,
    summary_failures: VecDeque<ScriptedFailure>,
    action_failures: VecDeque<String>,
    actions: Vec<RecordedAction>,
    last_summary_query: Option<SummaryQuery>,
}

/// In-process stand-in for the workflow API.
///
/// Serves whatever summary was last installed, and can be scripted to fail
/// the next fetches or actions.
#[derive(Debug, Default)]
pub struct MemoryWorkflowService {
    state: Mutex<MemoryState>,
    summary_calls: AtomicUsize,
    node_calls: AtomicUsize,
}

impl MemoryWorkflowService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(summary: WorkflowSummary) -> Self {
        let service = Self::new();
        service.set_summary(summary);
        service
    }

    pub fn set_summary(&self, summary: WorkflowSummary) {
        self.lock().summary = Some(summary);
    }

    pub fn set_nodes(&self, nodes: Vec<WorkflowNode>) {
        self.lock().nodes = nodes;
    }

    /// Next summary fetch fails at the transport level.
    pub fn fail_next_summary(&self, reason: impl Into<String>) {
        self.lock()
            .summary_failures
            .push_back(ScriptedFailure::Transport(reason.into()));
    }

    /// Next summary fetch answers `success: false`.
    pub fn reject_next_summary(&self, reason: impl Into<String>) {
        self.lock()
            .summary_failures
            .push_back(ScriptedFailure::Rejected(reason.into()));
    }

    pub fn reject_next_action(&self, reason: impl Into<String>) {
        self.lock().action_failures.push_back(reason.into());
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn node_calls(&self) -> usize {
        self.node_calls.load(Ordering::SeqCst)
    }

    pub fn actions(&self) -> Vec<RecordedAction> {
        self.lock().actions.clone()
    }

    pub fn last_summary_query(&self) -> Option<SummaryQuery> {
        self.lock().last_summary_query.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(
        &self,
        kind: ActionKind,
        process_id: i64,
        actor: &str,
        commentary: Option<&str>,
    ) -> ApiResponse<()> {
        let mut state = self.lock();
        if let Some(reason) = state.action_failures.pop_front() {
            return ApiResponse::failure(reason);
        }
        if process_id <= 0 {
            return ApiResponse::failure(format!("invalid process id {process_id}"));
        }
        state.actions.push(RecordedAction {
            kind,
            process_id,
            actor: actor.to_string(),
            commentary: commentary.map(str::to_string),
        });
        ApiResponse::done(format!("Process {process_id} {}", kind.past_tense()))
    }
}

impl WorkflowService for MemoryWorkflowService {
    async fn get_workflow_summary(
        &self,
        query: &SummaryQuery,
    ) -> Result<ApiResponse<WorkflowSummary>, ServiceError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        state.last_summary_query = Some(query.clone());
        match state.summary_failures.pop_front() {
            Some(ScriptedFailure::Transport(reason)) => Err(ServiceError::Unavailable(reason)),
            Some(ScriptedFailure::Rejected(reason)) => Ok(ApiResponse::failure(reason)),
            None => Ok(match &state.summary {
                Some(summary) => ApiResponse::ok(summary.clone()),
                None => ApiResponse::failure(format!(
                    "no workflow summary for {} / {} on {}",
                    query.app_id,
                    query.config_id,
                    query.api_date()
                )),
            }),
        }
    }

    async fn get_workflow_nodes(
        &self,
        query: &NodesQuery,
    ) -> Result<ApiResponse<Vec<WorkflowNode>>, ServiceError> {
        self.node_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        let nodes = state
            .nodes
            .iter()
            .filter(|node| node.level == query.next_level)
            .cloned()
            .collect();
        Ok(ApiResponse::ok(nodes))
    }
}

impl WorkflowActionService for MemoryWorkflowService {
    async fn approve_process(
        &self,
        process_id: i64,
        actor: &str,
        commentary: &str,
    ) -> Result<ApiResponse<()>, ServiceError> {
        Ok(self.record(ActionKind::Approve, process_id, actor, Some(commentary)))
    }

    async fn reject_process(
        &self,
        process_id: i64,
        actor: &str,
        commentary: &str,
    ) -> Result<ApiResponse<()>, ServiceError> {
        Ok(self.record(ActionKind::Reject, process_id, actor, Some(commentary)))
    }

    async fn force_start(
        &self,
        process_id: i64,
        actor: &str,
    ) -> Result<ApiResponse<()>, ServiceError> {
        Ok(self.record(ActionKind::ForceStart, process_id, actor, None))
    }

    async fn re_run(&self, process_id: i64, actor: &str) -> Result<ApiResponse<()>, ServiceError> {
        Ok(self.record(ActionKind::ReRun, process_id, actor, None))
    }
}
