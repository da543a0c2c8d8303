use crate::{
    ActionKind, ApiResponse, NodesQuery, ServiceError, SummaryQuery, WorkflowActionService,
    WorkflowService,
};
use chrono::Utc;
use fs2::FileExt;
use serde::Serialize;
use stagewatch_core::{WorkflowNode, WorkflowSummary};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SUMMARY_FILE: &str = "summary.json";
const NODES_FILE: &str = "nodes.json";
const ACTIONS_FILE: &str = "actions.jsonl";

/// Serves workflow snapshots from a data directory:
///
/// ```text
/// <root>/nodes.json
/// <root>/<app_id>/<config_id>/<YYYY-MM-DD>/summary.json
/// <root>/actions.jsonl
/// ```
///
/// Actions are appended to the journal under an exclusive file lock.
#[derive(Debug, Clone)]
pub struct FileWorkflowService {
    root: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JournalEntry<'a> {
    ts: String,
    action: ActionKind,
    process_id: i64,
    actor: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    commentary: Option<&'a str>,
}

impl FileWorkflowService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn summary_path(&self, query: &SummaryQuery) -> PathBuf {
        self.root
            .join(sanitize_component(&query.app_id))
            .join(sanitize_component(&query.config_id))
            .join(query.date.format("%Y-%m-%d").to_string())
            .join(SUMMARY_FILE)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.root.join(ACTIONS_FILE)
    }

    async fn append_journal(
        &self,
        kind: ActionKind,
        process_id: i64,
        actor: &str,
        commentary: Option<&str>,
    ) -> Result<ApiResponse<()>, ServiceError> {
        if process_id <= 0 {
            return Ok(ApiResponse::failure(format!(
                "invalid process id {process_id}"
            )));
        }
        let entry = JournalEntry {
            ts: Utc::now().to_rfc3339(),
            action: kind,
            process_id,
            actor,
            commentary: commentary.filter(|text| !text.trim().is_empty()),
        };
        let line = serde_json::to_string(&entry)?;

        let root = self.root.clone();
        let path = self.journal_path();
        off_runtime(move || append_line(&root, &path, &line)).await?;

        debug!(
            "action_journaled: action={} process_id={process_id}",
            kind.as_str()
        );
        Ok(ApiResponse::done(format!(
            "Process {process_id} {}",
            kind.past_tense()
        )))
    }
}

impl WorkflowService for FileWorkflowService {
    async fn get_workflow_summary(
        &self,
        query: &SummaryQuery,
    ) -> Result<ApiResponse<WorkflowSummary>, ServiceError> {
        let path = self.summary_path(query);
        match off_runtime(move || read_summary(&path)).await? {
            Some(summary) => Ok(ApiResponse::ok(summary)),
            None => Ok(ApiResponse::failure(format!(
                "no workflow summary for {} / {} on {}",
                query.app_id,
                query.config_id,
                query.api_date()
            ))),
        }
    }

    async fn get_workflow_nodes(
        &self,
        query: &NodesQuery,
    ) -> Result<ApiResponse<Vec<WorkflowNode>>, ServiceError> {
        let path = self.root.join(NODES_FILE);
        let nodes = off_runtime(move || read_nodes(&path)).await?;
        let filtered = nodes
            .into_iter()
            .filter(|node| node.level == query.next_level)
            .filter(|node| match (&query.app_id, &node.parent_id) {
                (Some(app_id), Some(parent)) if query.current_level > 0 => parent == app_id,
                _ => true,
            })
            .collect();
        Ok(ApiResponse::ok(filtered))
    }
}

impl WorkflowActionService for FileWorkflowService {
    async fn approve_process(
        &self,
        process_id: i64,
        actor: &str,
        commentary: &str,
    ) -> Result<ApiResponse<()>, ServiceError> {
        self.append_journal(ActionKind::Approve, process_id, actor, Some(commentary))
            .await
    }

    async fn reject_process(
        &self,
        process_id: i64,
        actor: &str,
        commentary: &str,
    ) -> Result<ApiResponse<()>, ServiceError> {
        self.append_journal(ActionKind::Reject, process_id, actor, Some(commentary))
            .await
    }

    async fn force_start(
        &self,
        process_id: i64,
        actor: &str,
    ) -> Result<ApiResponse<()>, ServiceError> {
        self.append_journal(ActionKind::ForceStart, process_id, actor, None)
            .await
    }

    async fn re_run(&self, process_id: i64, actor: &str) -> Result<ApiResponse<()>, ServiceError> {
        self.append_journal(ActionKind::ReRun, process_id, actor, None)
            .await
    }
}

/// Runs file work on the blocking pool so a slow disk or a contended journal
/// lock never parks a runtime worker.
async fn off_runtime<T, F>(work: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ServiceError::Unavailable(format!("file worker failed: {err}")))?
}

/// `None` when no snapshot exists for the query.
fn read_summary(path: &Path) -> Result<Option<WorkflowSummary>, ServiceError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let summary = serde_json::from_str(&content).map_err(|err| {
        warn!("summary_decode_error: path={} err={err}", path.display());
        ServiceError::from(err)
    })?;
    Ok(Some(summary))
}

fn read_nodes(path: &Path) -> Result<Vec<WorkflowNode>, ServiceError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

fn append_line(root: &Path, path: &Path, line: &str) -> Result<(), ServiceError> {
    fs::create_dir_all(root)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;
    let written = writeln!(file, "{line}").and_then(|_| file.flush());
    if let Err(err) = file.unlock() {
        warn!("journal_unlock_failed: path={} err={err}", path.display());
    }
    written?;
    Ok(())
}

fn sanitize_component(input: &str) -> String {
    let cleaned: String = input
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn query() -> SummaryQuery {
        SummaryQuery {
            date: NaiveDate::from_ymd_opt(2025, 5, 19).expect("date"),
            config_id: "eod".to_string(),
            app_id: "treasury".to_string(),
        }
    }

    #[tokio::test]
    async fn reads_summary_snapshot_from_dated_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = FileWorkflowService::new(dir.path());
        let path = service.summary_path(&query());
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(
            &path,
            json!({
                "processRecords": [
                    {"processId": 1, "stageId": 1, "status": "RUNNING"},
                    null
                ]
            })
            .to_string(),
        )
        .expect("write summary");

        let response = service.get_workflow_summary(&query()).await.expect("fetch");
        let summary = response.into_result().expect("summary");
        assert_eq!(summary.process_records.len(), 1);
        assert!(path.ends_with("treasury/eod/2025-05-19/summary.json"));
    }

    #[tokio::test]
    async fn missing_snapshot_is_an_api_failure_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = FileWorkflowService::new(dir.path());
        let response = service.get_workflow_summary(&query()).await.expect("fetch");
        assert!(!response.success);
        assert!(response
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("19 May 2025"));
    }

    #[tokio::test]
    async fn corrupt_snapshot_surfaces_decode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = FileWorkflowService::new(dir.path());
        let path = service.summary_path(&query());
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "{not json").expect("write");

        assert!(matches!(
            service.get_workflow_summary(&query()).await,
            Err(ServiceError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn nodes_are_filtered_by_level_and_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(NODES_FILE),
            json!([
                {"id": "treasury", "name": "Treasury", "level": 1},
                {"id": "eod", "name": "End of day", "level": 2, "parentId": "treasury"},
                {"id": "sod", "name": "Start of day", "level": 2, "parentId": "risk"}
            ])
            .to_string(),
        )
        .expect("write nodes");
        let service = FileWorkflowService::new(dir.path());

        let apps = service
            .get_workflow_nodes(&NodesQuery {
                date: query().date,
                app_id: None,
                config_id: None,
                current_level: 0,
                next_level: 1,
            })
            .await
            .expect("apps")
            .into_result()
            .expect("nodes");
        assert_eq!(apps.len(), 1);

        let configs = service
            .get_workflow_nodes(&NodesQuery {
                date: query().date,
                app_id: Some("treasury".to_string()),
                config_id: None,
                current_level: 1,
                next_level: 2,
            })
            .await
            .expect("configs")
            .into_result()
            .expect("nodes");
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id, "eod");
    }

    #[tokio::test]
    async fn actions_append_to_journal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = FileWorkflowService::new(dir.path());

        let approved = service
            .approve_process(77, "ops", "checked")
            .await
            .expect("approve");
        assert!(approved.success);
        service.re_run(78, "ops").await.expect("re-run");
        let invalid = service.force_start(-1, "ops").await.expect("force");
        assert!(!invalid.success);

        let journal = fs::read_to_string(service.journal_path()).expect("journal");
        let lines: Vec<Value> = journal
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["action"], "approve");
        assert_eq!(lines[0]["processId"], 77);
        assert_eq!(lines[0]["commentary"], "checked");
        assert_eq!(lines[1]["action"], "re_run");
        assert!(lines[1].get("commentary").is_none());
    }

    #[tokio::test]
    async fn contended_journal_lock_leaves_the_runtime_free() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = FileWorkflowService::new(dir.path());
        let holder = OpenOptions::new()
            .create(true)
            .append(true)
            .open(service.journal_path())
            .expect("open journal");
        holder.lock_exclusive().expect("hold lock");

        let writer = service.clone();
        let pending = tokio::spawn(async move { writer.force_start(9, "ops").await });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!pending.is_finished());

        holder.unlock().expect("release lock");
        let response = pending.await.expect("join").expect("force start");
        assert!(response.success);
        let journal = fs::read_to_string(service.journal_path()).expect("journal");
        assert_eq!(journal.lines().count(), 1);
    }

    #[test]
    fn path_components_are_sanitized() {
        assert_eq!(sanitize_component("../etc"), ".._etc");
        assert_eq!(sanitize_component(".."), "_");
        assert_eq!(sanitize_component("eod run"), "eod_run");
    }
}
