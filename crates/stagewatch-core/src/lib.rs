pub mod aggregate;
pub mod coerce;
pub mod dates;
pub mod deps;
pub mod model;
pub mod status;

use thiserror::Error;

pub use aggregate::{aggregate, aggregate_summary, Aggregation};
pub use dates::{format_api_date, parse_api_date};
pub use deps::DependencyIndex;
pub use model::{
    DependencyRecord, FileDirection, FileRecord, ParameterRecord, ProcessRecord, Stage, Task,
    TaskActors, TaskDependency, TaskFlags, TaskMessage, TaskTiming, WorkflowNode,
    WorkflowSummary,
};
pub use status::{
    classify_status, map_status, map_status_detailed, map_status_with, DetailedStatus,
    MappedStatus, StatusClass, StatusCounts, StatusGranularity, TaskStatus,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid business date: {0}")]
    InvalidDate(String),
}
