//! Flat process rows -> ordered stage/task tree.

use crate::model::{
    FileRecord, ProcessRecord, Stage, Task, TaskActors, TaskDependency, TaskFlags, TaskMessage,
    TaskTiming, WorkflowSummary,
};
use crate::status::{map_status, StatusCounts, TaskStatus};
use std::collections::HashMap;

pub const FALLBACK_STAGE_ID: &str = "workflow-processes";
pub const FALLBACK_STAGE_NAME: &str = "Workflow Processes";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub stages: Vec<Stage>,
    pub tasks_by_stage: HashMap<String, Vec<Task>>,
    pub overall_percent: u8,
    /// Rows left out because they carried no stage id.
    pub skipped: usize,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.id == stage_id)
    }

    pub fn tasks(&self, stage_id: &str) -> &[Task] {
        self.tasks_by_stage
            .get(stage_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every task, in stage order then task order.
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.stages
            .iter()
            .flat_map(move |stage| self.tasks(&stage.id).iter())
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.all_tasks().find(|task| task.id == task_id)
    }

    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::tally(self.all_tasks().map(|task| task.raw_status.as_str()))
    }
}

struct StageBucket {
    id: String,
    name: String,
    tasks: Vec<Task>,
    attempts: HashMap<String, u32>,
}

impl StageBucket {
    fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            tasks: Vec::new(),
            attempts: HashMap::new(),
        }
    }

    /// `claimed` maps every task id handed out so far to its stage. A key
    /// another stage already owns is qualified as `<stage>/<key>`.
    fn push(
        &mut self,
        record: &ProcessRecord,
        index: usize,
        claimed: &mut HashMap<String, String>,
    ) {
        let key = bucket_key(record, index);
        let attempt = {
            let slot = self.attempts.entry(key.clone()).or_insert(0);
            *slot += 1;
            *slot
        };
        let mut id = if attempt == 1 {
            key
        } else {
            format!("{key}#{attempt}")
        };
        while claimed.get(&id).is_some_and(|owner| *owner != self.id) {
            id = format!("{}/{id}", self.id);
        }
        claimed.insert(id.clone(), self.id.clone());
        self.tasks
            .push(task_from_record(record, id, &self.id, index, attempt));
    }

    fn finish(self, sort: bool) -> (Stage, Vec<Task>) {
        let mut tasks = self.tasks;
        if sort {
            tasks.sort_by_key(|task| task.sequence);
        }
        let stage = Stage {
            completion_percent: completion_percent(&tasks),
            task_ids: tasks.iter().map(|task| task.id.clone()).collect(),
            id: self.id,
            name: self.name,
        };
        (stage, tasks)
    }
}

/// Groups records by stage (first-seen order) and orders each stage's tasks by
/// global sequence. Task ids are unique across the whole aggregation. Never
/// fails: rows without a stage id are counted in [`Aggregation::skipped`],
/// unless no row has one, in which case everything lands in a single fallback
/// stage in input order.
pub fn aggregate(records: &[ProcessRecord]) -> Aggregation {
    let mut buckets: Vec<StageBucket> = Vec::new();
    let mut bucket_index: HashMap<String, usize> = HashMap::new();
    let mut claimed: HashMap<String, String> = HashMap::new();
    let mut skipped = 0;

    for (index, record) in records.iter().enumerate() {
        let Some(stage_id) = record.stage_id.clone() else {
            skipped += 1;
            continue;
        };
        let slot = match bucket_index.get(&stage_id) {
            Some(slot) => *slot,
            None => {
                let name = stage_display_name(record, &stage_id);
                buckets.push(StageBucket::new(stage_id.clone(), name));
                bucket_index.insert(stage_id, buckets.len() - 1);
                buckets.len() - 1
            }
        };
        buckets[slot].push(record, index, &mut claimed);
    }

    if buckets.is_empty() && !records.is_empty() {
        let mut fallback =
            StageBucket::new(FALLBACK_STAGE_ID.to_string(), FALLBACK_STAGE_NAME.to_string());
        for (index, record) in records.iter().enumerate() {
            fallback.push(record, index, &mut claimed);
        }
        return build(vec![fallback], false, 0);
    }

    build(buckets, true, skipped)
}

/// [`aggregate`] plus the per-task detail that lives in the other summary
/// arrays: files, dependencies and commentary.
pub fn aggregate_summary(summary: &WorkflowSummary) -> Aggregation {
    let mut aggregation = aggregate(&summary.process_records);

    let mut by_substage: HashMap<&str, (&str, TaskStatus)> = HashMap::new();
    for record in &summary.process_records {
        if let Some(id) = record.substage_id.as_deref() {
            let name = if record.substage_name.is_empty() {
                id
            } else {
                record.substage_name.as_str()
            };
            by_substage.insert(id, (name, map_status(&record.status)));
        }
    }

    for tasks in aggregation.tasks_by_stage.values_mut() {
        for task in tasks.iter_mut() {
            let files: Vec<FileRecord> = summary
                .file_records
                .iter()
                .filter(|file| file_belongs_to(file, task.process_id, task.substage_id.as_deref()))
                .cloned()
                .collect();
            task.files = files;

            let mut deps: Vec<TaskDependency> = Vec::new();
            for reference in task.record.dependency_refs() {
                let (name, status) = by_substage
                    .get(reference.as_str())
                    .map(|(name, status)| (name.to_string(), *status))
                    .unwrap_or_else(|| (reference.clone(), TaskStatus::NotStarted));
                push_dependency(
                    &mut deps,
                    TaskDependency {
                        name,
                        status,
                        reference,
                    },
                );
            }
            for dep in summary
                .dependency_records
                .iter()
                .filter(|dep| dep.process_id != 0 && dep.process_id == task.process_id)
            {
                let reference = dep
                    .depends_on_id
                    .clone()
                    .unwrap_or_else(|| dep.depends_on_name.clone());
                if reference.is_empty() {
                    continue;
                }
                let name = if dep.depends_on_name.is_empty() {
                    reference.clone()
                } else {
                    dep.depends_on_name.clone()
                };
                push_dependency(
                    &mut deps,
                    TaskDependency {
                        name,
                        status: map_status(&dep.status),
                        reference,
                    },
                );
            }
            task.dependencies = deps;

            if let Some(text) = task.record.commentary.clone() {
                task.messages.push(TaskMessage {
                    author: task.actors.updated_by.clone(),
                    text,
                    at: task.timing.updated_at.clone(),
                });
            }
        }
    }

    aggregation
}

fn build(buckets: Vec<StageBucket>, sort: bool, skipped: usize) -> Aggregation {
    let mut stages = Vec::with_capacity(buckets.len());
    let mut tasks_by_stage = HashMap::with_capacity(buckets.len());
    let mut done = 0usize;
    let mut total = 0usize;

    for bucket in buckets {
        let (stage, tasks) = bucket.finish(sort);
        done += tasks.iter().filter(|task| task.status.is_done()).count();
        total += tasks.len();
        tasks_by_stage.insert(stage.id.clone(), tasks);
        stages.push(stage);
    }

    Aggregation {
        stages,
        tasks_by_stage,
        overall_percent: percent_of(done, total),
        skipped,
    }
}

fn bucket_key(record: &ProcessRecord, index: usize) -> String {
    if let Some(id) = &record.substage_id {
        return id.clone();
    }
    match record.substage_seq {
        Some(seq) => format!("seq-{seq}"),
        None => format!("row-{index}"),
    }
}

fn global_sequence(record: &ProcessRecord, index: usize) -> i64 {
    record
        .process_seq
        .or(record.substage_seq)
        .unwrap_or(index as i64)
}

fn stage_display_name(record: &ProcessRecord, stage_id: &str) -> String {
    if record.stage_name.is_empty() {
        format!("Stage {stage_id}")
    } else {
        record.stage_name.clone()
    }
}

fn task_from_record(
    record: &ProcessRecord,
    id: String,
    stage_id: &str,
    index: usize,
    attempt: u32,
) -> Task {
    let status = map_status(&record.status);
    let progress = if status == TaskStatus::Completed && record.percentage == 0 {
        100
    } else {
        record.percentage
    };
    Task {
        id,
        name: record.display_name(),
        stage_id: stage_id.to_string(),
        substage_id: record.substage_id.clone(),
        status,
        raw_status: record.status.clone(),
        progress,
        process_id: record.process_id,
        sequence: global_sequence(record, index),
        attempt,
        timing: TaskTiming {
            duration: record.duration.clone(),
            started_at: record.started_at.clone(),
            updated_at: record.updated_at.clone(),
            completed_at: record.completed_at.clone(),
        },
        actors: TaskActors {
            updated_by: record.updated_by.clone(),
            completed_by: record.completed_by.clone(),
            locked_by: record.locked_by.clone(),
            attested_by: record.attested_by.clone(),
        },
        flags: TaskFlags {
            auto: record.auto,
            adhoc: record.adhoc,
            requires_upload: record.requires_upload,
            requires_approval: record.requires_approval,
            locked: record.locked,
            attested: record.attested,
        },
        files: Vec::new(),
        messages: Vec::new(),
        dependencies: Vec::new(),
        record: record.clone(),
    }
}

fn file_belongs_to(file: &FileRecord, process_id: i64, substage_id: Option<&str>) -> bool {
    if file.process_id != 0 {
        return file.process_id == process_id;
    }
    match (file.substage_id.as_deref(), substage_id) {
        (Some(file_sub), Some(task_sub)) => file_sub == task_sub,
        _ => false,
    }
}

fn push_dependency(deps: &mut Vec<TaskDependency>, dep: TaskDependency) {
    if deps.iter().any(|existing| existing.reference == dep.reference) {
        return;
    }
    deps.push(dep);
}

fn completion_percent(tasks: &[Task]) -> u8 {
    let done = tasks.iter().filter(|task| task.status.is_done()).count();
    percent_of(done, tasks.len())
}

fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        0
    } else {
        ((done * 100) / total) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DependencyRecord;

    fn record(stage: Option<&str>, substage: Option<&str>, seq: Option<i64>) -> ProcessRecord {
        ProcessRecord {
            process_id: 0,
            stage_id: stage.map(str::to_string),
            stage_name: stage.map(|s| format!("Stage {s}")).unwrap_or_default(),
            substage_id: substage.map(str::to_string),
            substage_seq: seq,
            status: "NOT STARTED".to_string(),
            ..ProcessRecord::default()
        }
    }

    #[test]
    fn orders_tasks_by_sequence_within_stage() {
        let mut running = record(Some("1"), Some("10"), Some(2));
        running.stage_name = "A".to_string();
        running.status = "RUNNING".to_string();
        let mut done = record(Some("1"), Some("9"), Some(1));
        done.stage_name = "A".to_string();
        done.status = "COMPLETED".to_string();

        let agg = aggregate(&[running, done]);

        assert_eq!(agg.stages.len(), 1);
        assert_eq!(agg.stages[0].name, "A");
        let tasks = agg.tasks("1");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].sequence, 1);
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert_eq!(tasks[1].sequence, 2);
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
        assert_eq!(agg.stages[0].task_ids, vec!["9", "10"]);
        assert_eq!(agg.stages[0].completion_percent, 50);
    }

    #[test]
    fn stages_keep_first_seen_order() {
        let agg = aggregate(&[
            record(Some("7"), Some("a"), Some(1)),
            record(Some("2"), Some("b"), Some(1)),
            record(Some("7"), Some("c"), Some(2)),
        ]);
        let ids: Vec<&str> = agg.stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "2"]);
        assert_eq!(agg.tasks("7").len(), 2);
    }

    #[test]
    fn missing_stage_ids_fall_back_to_one_unsorted_stage() {
        let agg = aggregate(&[
            record(None, Some("c"), Some(3)),
            record(None, Some("a"), Some(1)),
            record(None, Some("b"), Some(2)),
        ]);
        assert_eq!(agg.stages.len(), 1);
        assert_eq!(agg.stages[0].id, FALLBACK_STAGE_ID);
        assert_eq!(agg.stages[0].name, FALLBACK_STAGE_NAME);
        assert_eq!(agg.stages[0].task_ids, vec!["c", "a", "b"]);
        assert_eq!(agg.skipped, 0);
    }

    #[test]
    fn stageless_rows_in_staged_input_are_skipped() {
        let agg = aggregate(&[
            record(Some("1"), Some("a"), Some(1)),
            record(None, Some("b"), Some(2)),
        ]);
        assert_eq!(agg.skipped, 1);
        assert_eq!(agg.all_tasks().count(), 1);
    }

    #[test]
    fn empty_input_yields_no_stages() {
        let agg = aggregate(&[]);
        assert!(agg.is_empty());
        assert_eq!(agg.overall_percent, 0);
    }

    #[test]
    fn retries_share_a_bucket_with_unique_ids() {
        let mut first = record(Some("1"), Some("5"), Some(1));
        first.status = "FAILED".to_string();
        let mut retry = record(Some("1"), Some("5"), Some(4));
        retry.status = "COMPLETED".to_string();

        let agg = aggregate(&[first, retry]);
        let tasks = agg.tasks("1");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "5");
        assert_eq!(tasks[0].attempt, 1);
        assert_eq!(tasks[1].id, "5#2");
        assert_eq!(tasks[1].attempt, 2);
    }

    #[test]
    fn sequence_prefers_cross_stage_order_then_substage_then_index() {
        let mut explicit = record(Some("1"), Some("a"), Some(1));
        explicit.process_seq = Some(50);
        let substage_only = record(Some("1"), Some("b"), Some(20));
        let neither = record(Some("1"), Some("c"), None);

        let agg = aggregate(&[explicit, substage_only, neither]);
        let order: Vec<(&str, i64)> = agg
            .tasks("1")
            .iter()
            .map(|t| (t.id.as_str(), t.sequence))
            .collect();
        assert_eq!(order, vec![("c", 2), ("b", 20), ("a", 50)]);
    }

    #[test]
    fn synthetic_keys_cover_rows_without_substage_id() {
        let agg = aggregate(&[
            record(Some("1"), None, Some(3)),
            record(Some("1"), None, None),
        ]);
        let ids: Vec<&str> = agg.tasks("1").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["row-1", "seq-3"]);
    }

    #[test]
    fn keys_shared_by_two_stages_get_distinct_ids() {
        let mut load = record(Some("1"), None, Some(1));
        load.process_id = 101;
        load.status = "COMPLETED".to_string();
        let mut publish = record(Some("2"), None, Some(1));
        publish.process_id = 201;
        publish.status = "RUNNING".to_string();
        let mut shared = record(Some("2"), Some("10"), Some(2));
        shared.process_id = 202;
        let mut owner = record(Some("1"), Some("10"), Some(3));
        owner.process_id = 102;

        let agg = aggregate(&[load, owner, publish, shared]);

        assert_eq!(agg.stages[0].task_ids, vec!["seq-1", "10"]);
        assert_eq!(agg.stages[1].task_ids, vec!["2/seq-1", "2/10"]);
        for stage in &agg.stages {
            for task in agg.tasks(&stage.id) {
                let found = agg.find_task(&task.id).expect("task by id");
                assert_eq!(found.process_id, task.process_id);
            }
        }

        let tasks: Vec<Task> = agg.all_tasks().cloned().collect();
        let index = crate::deps::DependencyIndex::build(&tasks);
        for task in &tasks {
            assert_eq!(index.resolve(&task.id), Some(task));
        }
    }

    #[test]
    fn tasks_are_a_permutation_of_well_formed_rows() {
        let rows: Vec<ProcessRecord> = (0..12)
            .map(|i| {
                let stage = if i % 5 == 4 { None } else { Some((i % 3).to_string()) };
                let substage = format!("s{i}");
                let mut row = record(stage.as_deref(), Some(substage.as_str()), Some(12 - i));
                row.process_id = 100 + i;
                row
            })
            .collect();

        let agg = aggregate(&rows);

        let mut seen: Vec<i64> = agg.all_tasks().map(|t| t.process_id).collect();
        seen.sort_unstable();
        let mut expected: Vec<i64> = rows
            .iter()
            .filter(|r| r.stage_id.is_some())
            .map(|r| r.process_id)
            .collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);
        for stage in &agg.stages {
            let seqs: Vec<i64> = agg.tasks(&stage.id).iter().map(|t| t.sequence).collect();
            let mut sorted = seqs.clone();
            sorted.sort_unstable();
            assert_eq!(seqs, sorted, "stage {} out of order", stage.id);
        }
    }

    #[test]
    fn completed_rows_without_percentage_read_as_full() {
        let mut row = record(Some("1"), Some("a"), Some(1));
        row.status = "COMPLETE".to_string();
        let agg = aggregate(&[row]);
        assert_eq!(agg.tasks("1")[0].progress, 100);
        assert_eq!(agg.overall_percent, 100);
    }

    #[test]
    fn summary_attaches_files_dependencies_and_messages() {
        let mut upstream = record(Some("1"), Some("10"), Some(1));
        upstream.process_id = 501;
        upstream.substage_name = "Extract".to_string();
        upstream.status = "COMPLETED".to_string();

        let mut downstream = record(Some("1"), Some("11"), Some(2));
        downstream.process_id = 502;
        downstream.depends_on = Some("10".to_string());
        downstream.commentary = Some("waiting on feed".to_string());
        downstream.updated_by = Some("ops".to_string());

        let summary = WorkflowSummary {
            process_records: vec![upstream, downstream],
            file_records: vec![
                FileRecord {
                    process_id: 502,
                    file_name: "positions.csv".to_string(),
                    direction: "input".to_string(),
                    ..FileRecord::default()
                },
                FileRecord {
                    process_id: 999,
                    file_name: "other.csv".to_string(),
                    ..FileRecord::default()
                },
            ],
            dependency_records: vec![DependencyRecord {
                process_id: 502,
                depends_on_id: Some("ext-feed".to_string()),
                depends_on_name: "Vendor feed".to_string(),
                status: "FAILED".to_string(),
            }],
            parameter_records: Vec::new(),
        };

        let agg = aggregate_summary(&summary);
        let task = agg.find_task("11").expect("downstream task");

        assert_eq!(task.files.len(), 1);
        assert_eq!(task.files[0].file_name, "positions.csv");
        assert_eq!(task.dependencies.len(), 2);
        assert_eq!(task.dependencies[0].name, "Extract");
        assert_eq!(task.dependencies[0].status, TaskStatus::Completed);
        assert_eq!(task.dependencies[0].reference, "10");
        assert_eq!(task.dependencies[1].name, "Vendor feed");
        assert_eq!(task.dependencies[1].status, TaskStatus::NotStarted);
        assert_eq!(task.messages.len(), 1);
        assert_eq!(task.messages[0].author.as_deref(), Some("ops"));
    }
}
