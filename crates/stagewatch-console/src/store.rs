use chrono::{DateTime, Local};
use stagewatch_core::{Aggregation, WorkflowSummary};
use stagewatch_service::SummaryQuery;
use std::sync::Arc;

/// The summary the dashboard is currently showing, with its derived tree.
#[derive(Debug, Clone)]
pub struct SummarySnapshot {
    pub query: SummaryQuery,
    pub summary: Arc<WorkflowSummary>,
    pub aggregation: Arc<Aggregation>,
    pub fetched_at: DateTime<Local>,
}

/// Holder for the current workflow summary. Only the refresh pipeline
/// replaces it; readers clone the `Arc`s they need.
#[derive(Debug, Default)]
pub struct SummaryStore {
    current: Option<SummarySnapshot>,
    generation: u64,
}

impl SummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&SummarySnapshot> {
        self.current.as_ref()
    }

    pub fn summary(&self) -> Option<Arc<WorkflowSummary>> {
        self.current.as_ref().map(|snap| Arc::clone(&snap.summary))
    }

    pub fn aggregation(&self) -> Option<&Aggregation> {
        self.current.as_ref().map(|snap| snap.aggregation.as_ref())
    }

    /// Bumped on every replace or clear.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub(crate) fn replace(&mut self, snapshot: SummarySnapshot) {
        self.current = Some(snapshot);
        self.generation += 1;
    }

    pub(crate) fn clear(&mut self) {
        if self.current.take().is_some() {
            self.generation += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stagewatch_core::aggregate_summary;

    fn snapshot() -> SummarySnapshot {
        let summary = WorkflowSummary::default();
        SummarySnapshot {
            query: SummaryQuery {
                date: NaiveDate::from_ymd_opt(2025, 5, 19).expect("date"),
                config_id: "eod".to_string(),
                app_id: "treasury".to_string(),
            },
            aggregation: Arc::new(aggregate_summary(&summary)),
            summary: Arc::new(summary),
            fetched_at: Local::now(),
        }
    }

    #[test]
    fn readers_keep_their_snapshot_across_replace() {
        let mut store = SummaryStore::new();
        assert!(store.summary().is_none());

        store.replace(snapshot());
        let held = store.summary().expect("summary");
        store.replace(snapshot());

        assert_eq!(store.generation(), 2);
        assert_eq!(Arc::strong_count(&held), 1);
    }

    #[test]
    fn clear_only_bumps_when_something_was_held() {
        let mut store = SummaryStore::new();
        store.clear();
        assert_eq!(store.generation(), 0);
        store.replace(snapshot());
        store.clear();
        assert_eq!(store.generation(), 2);
        assert!(store.is_empty());
    }
}
