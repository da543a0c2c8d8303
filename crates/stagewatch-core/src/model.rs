use crate::coerce;
use crate::status::TaskStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One row per workflow process instance, as delivered by the workflow API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    #[serde(default, deserialize_with = "coerce::i64_or_default")]
    pub process_id: i64,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub stage_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub stage_name: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub substage_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub substage_seq: Option<i64>,
    /// Cross-stage ordering, when the API provides one.
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub process_seq: Option<i64>,
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub substage_name: String,
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub status: String,
    #[serde(default, deserialize_with = "coerce::percent")]
    pub percentage: u8,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub started_at: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub completed_at: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub updated_by: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub completed_by: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub locked_by: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub attested_by: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub commentary: Option<String>,
    /// Sub-stage id(s) this process waits on; comma separated when several.
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub depends_on: Option<String>,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub auto: bool,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub adhoc: bool,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub requires_upload: bool,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub requires_approval: bool,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub locked: bool,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub attested: bool,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl ProcessRecord {
    pub fn display_name(&self) -> String {
        if !self.substage_name.is_empty() {
            return self.substage_name.clone();
        }
        match &self.substage_id {
            Some(id) => format!("Sub-stage {id}"),
            None => format!("Process {}", self.process_id),
        }
    }

    pub fn dependency_refs(&self) -> Vec<String> {
        self.depends_on
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(default, deserialize_with = "coerce::i64_or_default")]
    pub process_id: i64,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub substage_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub file_name: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub path: Option<String>,
    /// `input`, `output`, or whatever the upstream calls it.
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub direction: String,
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub size_bytes: Option<i64>,
    #[serde(default, deserialize_with = "coerce::opt_i64")]
    pub row_count: Option<i64>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub uploaded_by: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDirection {
    Input,
    Output,
    Other,
}

impl FileRecord {
    pub fn direction(&self) -> FileDirection {
        match self.direction.trim().to_ascii_lowercase().as_str() {
            "input" | "in" | "source" => FileDirection::Input,
            "output" | "out" | "result" => FileDirection::Output,
            _ => FileDirection::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRecord {
    #[serde(default, deserialize_with = "coerce::i64_or_default")]
    pub process_id: i64,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub depends_on_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub depends_on_name: String,
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRecord {
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub value: String,
    #[serde(default, rename = "type", deserialize_with = "coerce::string_or_default")]
    pub param_type: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub updated_by: Option<String>,
}

/// Snapshot returned per (date, application, config). Replaced wholesale on
/// every refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    #[serde(default, deserialize_with = "coerce::lenient_vec")]
    pub process_records: Vec<ProcessRecord>,
    #[serde(default, deserialize_with = "coerce::lenient_vec")]
    pub file_records: Vec<FileRecord>,
    #[serde(default, deserialize_with = "coerce::lenient_vec")]
    pub dependency_records: Vec<DependencyRecord>,
    #[serde(default, deserialize_with = "coerce::lenient_vec")]
    pub parameter_records: Vec<ParameterRecord>,
}

/// A node of the application hierarchy (application, config, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::i64_or_default")]
    pub level: i64,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub config_id: Option<String>,
    #[serde(default, deserialize_with = "coerce::string_or_default")]
    pub status: String,
    #[serde(default, deserialize_with = "coerce::i64_or_default")]
    pub completed: i64,
    #[serde(default, deserialize_with = "coerce::i64_or_default")]
    pub in_progress: i64,
    #[serde(default, deserialize_with = "coerce::i64_or_default")]
    pub failed: i64,
    #[serde(default, deserialize_with = "coerce::i64_or_default")]
    pub total: i64,
}

impl WorkflowNode {
    pub fn completion_percent(&self) -> u8 {
        if self.total <= 0 {
            return 0;
        }
        ((self.completed.clamp(0, self.total) * 100) / self.total) as u8
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub task_ids: Vec<String>,
    pub completion_percent: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskTiming {
    pub duration: Option<String>,
    pub started_at: Option<String>,
    pub updated_at: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskActors {
    pub updated_by: Option<String>,
    pub completed_by: Option<String>,
    pub locked_by: Option<String>,
    pub attested_by: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskFlags {
    pub auto: bool,
    pub adhoc: bool,
    pub requires_upload: bool,
    pub requires_approval: bool,
    pub locked: bool,
    pub attested: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskMessage {
    pub author: Option<String>,
    pub text: String,
    pub at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskDependency {
    pub name: String,
    pub status: TaskStatus,
    /// Key understood by the dependency index (sub-stage id, process id or
    /// display name).
    pub reference: String,
}

/// A derived sub-stage task.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub stage_id: String,
    pub substage_id: Option<String>,
    pub status: TaskStatus,
    pub raw_status: String,
    pub progress: u8,
    pub process_id: i64,
    pub sequence: i64,
    /// 1 for the first record of a sub-stage, 2+ for retries.
    pub attempt: u32,
    pub timing: TaskTiming,
    pub actors: TaskActors,
    pub flags: TaskFlags,
    pub files: Vec<FileRecord>,
    pub messages: Vec<TaskMessage>,
    pub dependencies: Vec<TaskDependency>,
    pub record: ProcessRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn process_record_tolerates_loose_types() {
        let record: ProcessRecord = serde_json::from_value(json!({
            "processId": "1201",
            "stageId": 3,
            "stageName": "Load",
            "substageId": 30,
            "substageSeq": "2",
            "status": "RUNNING",
            "percentage": "55.4",
            "requiresApproval": "y",
            "adhoc": "N",
            "vendorField": "kept"
        }))
        .expect("record");

        assert_eq!(record.process_id, 1201);
        assert_eq!(record.stage_id.as_deref(), Some("3"));
        assert_eq!(record.substage_id.as_deref(), Some("30"));
        assert_eq!(record.substage_seq, Some(2));
        assert_eq!(record.percentage, 55);
        assert!(record.requires_approval);
        assert!(!record.adhoc);
        assert_eq!(record.extra.get("vendorField"), Some(&json!("kept")));
    }

    #[test]
    fn summary_drops_null_and_malformed_rows() {
        let summary: WorkflowSummary = serde_json::from_value(json!({
            "processRecords": [
                {"processId": 1, "stageId": 1},
                null,
                "garbage",
                {"processId": 2, "stageId": 1}
            ],
            "fileRecords": null
        }))
        .expect("summary");

        assert_eq!(summary.process_records.len(), 2);
        assert!(summary.file_records.is_empty());
    }

    #[test]
    fn dependency_refs_split_on_commas() {
        let record = ProcessRecord {
            depends_on: Some("10, 11,,12".to_string()),
            ..ProcessRecord::default()
        };
        assert_eq!(record.dependency_refs(), vec!["10", "11", "12"]);
    }

    #[test]
    fn display_name_falls_back_to_ids() {
        let mut record = ProcessRecord {
            process_id: 9,
            ..ProcessRecord::default()
        };
        assert_eq!(record.display_name(), "Process 9");
        record.substage_id = Some("4".to_string());
        assert_eq!(record.display_name(), "Sub-stage 4");
        record.substage_name = "Reconcile".to_string();
        assert_eq!(record.display_name(), "Reconcile");
    }
}
