//! Upstream status normalization.
//!
//! Raw status strings are classified once into [`StatusClass`] and then
//! projected onto one of two taxonomies:
//!
//! * coarse ([`TaskStatus`], four states) drives task cards. Failed and
//!   rejected work is shown as `not_started` so the card reads as retryable.
//! * fine ([`DetailedStatus`], six states) drives dashboard counts, where
//!   failures and rejections must stay visible.
//!
//! The two projections disagree on purpose. Do not fold one into the other.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Completed,
    InProgress,
    Failed,
    Rejected,
    Skipped,
    Pending,
    NotStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusGranularity {
    Coarse,
    Fine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    InProgress,
    #[default]
    NotStarted,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailedStatus {
    Completed,
    InProgress,
    Failed,
    Rejected,
    Pending,
    #[default]
    NotStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedStatus {
    Coarse(TaskStatus),
    Fine(DetailedStatus),
}

pub fn classify_status(raw: &str) -> StatusClass {
    let normalized = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    match normalized.as_str() {
        "COMPLETED" | "COMPLETE" => StatusClass::Completed,
        "IN PROGRESS" | "IN_PROGRESS" | "RUNNING" | "PROCESSING" => StatusClass::InProgress,
        "FAILED" | "ERROR" => StatusClass::Failed,
        "REJECTED" => StatusClass::Rejected,
        "SKIPPED" | "SKIP" | "POST MANUAL" => StatusClass::Skipped,
        "PENDING" | "WAITING" => StatusClass::Pending,
        _ => StatusClass::NotStarted,
    }
}

pub fn map_status_with(raw: &str, granularity: StatusGranularity) -> MappedStatus {
    let class = classify_status(raw);
    match granularity {
        StatusGranularity::Coarse => MappedStatus::Coarse(class.coarse()),
        StatusGranularity::Fine => MappedStatus::Fine(class.fine()),
    }
}

/// Card-level status.
pub fn map_status(raw: &str) -> TaskStatus {
    classify_status(raw).coarse()
}

/// Count-level status.
pub fn map_status_detailed(raw: &str) -> DetailedStatus {
    classify_status(raw).fine()
}

impl StatusClass {
    pub fn coarse(self) -> TaskStatus {
        match self {
            StatusClass::Completed => TaskStatus::Completed,
            StatusClass::InProgress => TaskStatus::InProgress,
            StatusClass::Skipped => TaskStatus::Skipped,
            StatusClass::Failed
            | StatusClass::Rejected
            | StatusClass::Pending
            | StatusClass::NotStarted => TaskStatus::NotStarted,
        }
    }

    pub fn fine(self) -> DetailedStatus {
        match self {
            StatusClass::Completed => DetailedStatus::Completed,
            StatusClass::InProgress => DetailedStatus::InProgress,
            StatusClass::Failed => DetailedStatus::Failed,
            StatusClass::Rejected => DetailedStatus::Rejected,
            StatusClass::Pending => DetailedStatus::Pending,
            StatusClass::Skipped | StatusClass::NotStarted => DetailedStatus::NotStarted,
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "completed",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::NotStarted => "not_started",
            TaskStatus::Skipped => "skipped",
        }
    }

    /// Counts toward stage completion.
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Skipped)
    }
}

impl DetailedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailedStatus::Completed => "completed",
            DetailedStatus::InProgress => "in_progress",
            DetailedStatus::Failed => "failed",
            DetailedStatus::Rejected => "rejected",
            DetailedStatus::Pending => "pending",
            DetailedStatus::NotStarted => "not_started",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DetailedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub completed: usize,
    pub in_progress: usize,
    pub failed: usize,
    pub rejected: usize,
    pub pending: usize,
    pub not_started: usize,
    pub total: usize,
}

impl StatusCounts {
    pub fn tally<'a, I>(raw_statuses: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts = Self::default();
        for raw in raw_statuses {
            counts.add(map_status_detailed(raw));
        }
        counts
    }

    pub fn add(&mut self, status: DetailedStatus) {
        match status {
            DetailedStatus::Completed => self.completed += 1,
            DetailedStatus::InProgress => self.in_progress += 1,
            DetailedStatus::Failed => self.failed += 1,
            DetailedStatus::Rejected => self.rejected += 1,
            DetailedStatus::Pending => self.pending += 1,
            DetailedStatus::NotStarted => self.not_started += 1,
        }
        self.total += 1;
    }

    pub fn completion_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}
