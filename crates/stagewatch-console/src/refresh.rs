//! Single-flight summary refresh.
//!
//! The gate is a plain flag checked and set on the event loop, so two
//! refresh requests can never both start. A second request while one is in
//! flight is dropped, not queued. A fetch that never completes holds the gate.

use stagewatch_core::WorkflowSummary;
use stagewatch_service::{ServiceError, SummaryQuery, WorkflowService};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Initial,
    Auto,
    Manual,
    AfterAction,
}

impl RefreshKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshKind::Initial => "initial",
            RefreshKind::Auto => "auto",
            RefreshKind::Manual => "manual",
            RefreshKind::AfterAction => "after_action",
        }
    }

    /// Silent refreshes do not announce success.
    pub fn is_silent(self) -> bool {
        matches!(self, RefreshKind::Auto | RefreshKind::AfterAction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub id: u64,
    pub kind: RefreshKind,
    pub query: SummaryQuery,
}

/// Completion message sent back to the event loop by a fetch task.
#[derive(Debug)]
pub struct RefreshEvent {
    pub ticket: RefreshTicket,
    pub result: Result<WorkflowSummary, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { tasks: usize, skipped: usize },
    Failed(String),
    /// Completion arrived after teardown or for a ticket that is not current.
    Ignored,
}

#[derive(Debug)]
pub struct RefreshGate {
    in_flight: Option<u64>,
    in_flight_query: Option<SummaryQuery>,
    next_id: u64,
    mounted: bool,
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshGate {
    pub fn new() -> Self {
        Self {
            in_flight: None,
            in_flight_query: None,
            next_id: 1,
            mounted: true,
        }
    }

    pub fn try_begin(&mut self, kind: RefreshKind, query: SummaryQuery) -> Option<RefreshTicket> {
        if !self.mounted {
            return None;
        }
        if let Some(id) = self.in_flight {
            debug!(
                "refresh_dropped_in_flight: kind={} in_flight={id}",
                kind.as_str()
            );
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.in_flight = Some(id);
        self.in_flight_query = Some(query.clone());
        Some(RefreshTicket { id, kind, query })
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Target of the fetch currently holding the gate.
    pub fn in_flight_query(&self) -> Option<&SummaryQuery> {
        self.in_flight_query.as_ref()
    }

    /// Releases the gate for `ticket`. Returns whether the result should be
    /// applied.
    pub fn finish(&mut self, ticket: &RefreshTicket) -> bool {
        if self.in_flight != Some(ticket.id) {
            return false;
        }
        self.in_flight = None;
        self.in_flight_query = None;
        self.mounted
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

/// Runs the fetch for `ticket`, collapsing transport errors and
/// `success == false` envelopes into one message.
pub async fn fetch_summary<S: WorkflowService>(
    service: &S,
    ticket: &RefreshTicket,
) -> Result<WorkflowSummary, String> {
    service
        .get_workflow_summary(&ticket.query)
        .await
        .and_then(|response| response.into_result())
        .map_err(|err| describe(&err))
}

pub(crate) fn describe(err: &ServiceError) -> String {
    match err {
        ServiceError::Rejected(reason) => reason.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stagewatch_service::MemoryWorkflowService;

    fn query() -> SummaryQuery {
        SummaryQuery {
            date: NaiveDate::from_ymd_opt(2025, 5, 19).expect("date"),
            config_id: "eod".to_string(),
            app_id: "treasury".to_string(),
        }
    }

    #[test]
    fn second_begin_is_dropped_while_in_flight() {
        let mut gate = RefreshGate::new();
        let first = gate.try_begin(RefreshKind::Manual, query()).expect("first");
        assert!(gate.try_begin(RefreshKind::Auto, query()).is_none());
        assert!(gate.is_refreshing());

        assert_eq!(gate.in_flight_query(), Some(&query()));
        assert!(gate.finish(&first));
        assert!(!gate.is_refreshing());
        assert!(gate.in_flight_query().is_none());
        let second = gate.try_begin(RefreshKind::Auto, query()).expect("second");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn stale_ticket_does_not_release_the_gate() {
        let mut gate = RefreshGate::new();
        let first = gate.try_begin(RefreshKind::Manual, query()).expect("first");
        assert!(gate.finish(&first));
        let current = gate.try_begin(RefreshKind::Manual, query()).expect("current");

        assert!(!gate.finish(&first));
        assert!(gate.is_refreshing());
        assert!(gate.finish(&current));
    }

    #[test]
    fn unmounted_gate_ignores_completions_and_refuses_new_work() {
        let mut gate = RefreshGate::new();
        let ticket = gate.try_begin(RefreshKind::Auto, query()).expect("ticket");
        gate.unmount();
        assert!(!gate.finish(&ticket));
        assert!(gate.try_begin(RefreshKind::Manual, query()).is_none());
    }

    #[tokio::test]
    async fn fetch_collapses_rejections_to_their_reason() {
        let service = MemoryWorkflowService::new();
        service.reject_next_summary("cutoff not reached");
        let ticket = RefreshTicket {
            id: 1,
            kind: RefreshKind::Manual,
            query: query(),
        };
        assert_eq!(
            fetch_summary(&service, &ticket).await,
            Err("cutoff not reached".to_string())
        );

        service.fail_next_summary("connection reset");
        let err = fetch_summary(&service, &ticket).await.expect_err("transport");
        assert!(err.contains("connection reset"));
    }
}
