//! Workflow API collaborators.
//!
//! The dashboard only ever talks to the two traits here. Implementations:
//! [`MemoryWorkflowService`] for tests and demos, [`FileWorkflowService`] for
//! JSON snapshots laid out on disk.

mod file;
mod memory;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stagewatch_core::{format_api_date, WorkflowNode, WorkflowSummary};
use std::future::Future;
use thiserror::Error;

pub use file::FileWorkflowService;
pub use memory::{MemoryWorkflowService, RecordedAction};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// `{ success, data, message?, error? }` envelope every endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Collapses the envelope: `success == false` or a missing payload become
    /// [`ServiceError::Rejected`].
    pub fn into_result(self) -> Result<T, ServiceError> {
        if !self.success {
            return Err(ServiceError::Rejected(
                self.error
                    .or(self.message)
                    .unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ServiceError::Rejected("response carried no data".to_string()))
    }
}

impl ApiResponse<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self::ok(()).with_message(message)
    }

    /// Human readable outcome for notifications.
    pub fn outcome_text(&self) -> String {
        if self.success {
            self.message.clone().unwrap_or_else(|| "done".to_string())
        } else {
            self.error
                .clone()
                .or_else(|| self.message.clone())
                .unwrap_or_else(|| "action failed".to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryQuery {
    pub date: NaiveDate,
    pub config_id: String,
    pub app_id: String,
}

impl SummaryQuery {
    pub fn api_date(&self) -> String {
        format_api_date(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodesQuery {
    pub date: NaiveDate,
    pub app_id: Option<String>,
    pub config_id: Option<String>,
    pub current_level: i64,
    pub next_level: i64,
}

impl NodesQuery {
    pub fn api_date(&self) -> String {
        format_api_date(self.date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Approve,
    Reject,
    ForceStart,
    ReRun,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Approve => "approve",
            ActionKind::Reject => "reject",
            ActionKind::ForceStart => "force_start",
            ActionKind::ReRun => "re_run",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ActionKind::Approve => "approved",
            ActionKind::Reject => "rejected",
            ActionKind::ForceStart => "force started",
            ActionKind::ReRun => "queued for re-run",
        }
    }
}

pub trait WorkflowService: Send + Sync {
    fn get_workflow_summary(
        &self,
        query: &SummaryQuery,
    ) -> impl Future<Output = Result<ApiResponse<WorkflowSummary>, ServiceError>> + Send;

    fn get_workflow_nodes(
        &self,
        query: &NodesQuery,
    ) -> impl Future<Output = Result<ApiResponse<Vec<WorkflowNode>>, ServiceError>> + Send;
}

pub trait WorkflowActionService: Send + Sync {
    fn approve_process(
        &self,
        process_id: i64,
        actor: &str,
        commentary: &str,
    ) -> impl Future<Output = Result<ApiResponse<()>, ServiceError>> + Send;

    fn reject_process(
        &self,
        process_id: i64,
        actor: &str,
        commentary: &str,
    ) -> impl Future<Output = Result<ApiResponse<()>, ServiceError>> + Send;

    fn force_start(
        &self,
        process_id: i64,
        actor: &str,
    ) -> impl Future<Output = Result<ApiResponse<()>, ServiceError>> + Send;

    fn re_run(
        &self,
        process_id: i64,
        actor: &str,
    ) -> impl Future<Output = Result<ApiResponse<()>, ServiceError>> + Send;
}

/// Dispatches an [`ActionKind`] to the matching trait method.
pub async fn perform_action<S: WorkflowActionService>(
    service: &S,
    kind: ActionKind,
    process_id: i64,
    actor: &str,
    commentary: &str,
) -> Result<ApiResponse<()>, ServiceError> {
    match kind {
        ActionKind::Approve => service.approve_process(process_id, actor, commentary).await,
        ActionKind::Reject => service.reject_process(process_id, actor, commentary).await,
        ActionKind::ForceStart => service.force_start(process_id, actor).await,
        ActionKind::ReRun => service.re_run(process_id, actor).await,
    }
}
