//! JSON bundles for handing tasks between components or across processes.
//!
//! A bundle always carries whole tasks (all stored fields together) inside a
//! versioned envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Task;

pub const BUNDLE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Malformed task bundle: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported task bundle version {found}")]
    UnsupportedVersion { found: u32 },
}

#[derive(Serialize)]
struct TaskBundleRef<'a> {
    version: u32,
    task: &'a Task,
}

#[derive(Serialize)]
struct TaskListBundleRef<'a> {
    version: u32,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
struct TaskBundle {
    version: u32,
    task: Task,
}

#[derive(Deserialize)]
struct TaskListBundle {
    version: u32,
    tasks: Vec<Task>,
}

fn check_version(found: u32) -> Result<(), TransferError> {
    if found == BUNDLE_VERSION {
        Ok(())
    } else {
        Err(TransferError::UnsupportedVersion { found })
    }
}

pub fn encode_task(task: &Task) -> Result<String, TransferError> {
    Ok(serde_json::to_string(&TaskBundleRef { version: BUNDLE_VERSION, task })?)
}

pub fn decode_task(bundle: &str) -> Result<Task, TransferError> {
    let bundle: TaskBundle = serde_json::from_str(bundle)?;
    check_version(bundle.version)?;
    Ok(bundle.task)
}

/// Pretty-printed so exported files stay readable
pub fn encode_tasks(tasks: &[Task]) -> Result<String, TransferError> {
    Ok(serde_json::to_string_pretty(&TaskListBundleRef { version: BUNDLE_VERSION, tasks })?)
}

/// Accepts a list bundle or a single-task bundle
pub fn decode_tasks(bundle: &str) -> Result<Vec<Task>, TransferError> {
    let value: serde_json::Value = serde_json::from_str(bundle)?;
    if value.get("task").is_some() {
        let bundle: TaskBundle = serde_json::from_value(value)?;
        check_version(bundle.version)?;
        return Ok(vec![bundle.task]);
    }
    let bundle: TaskListBundle = serde_json::from_value(value)?;
    check_version(bundle.version)?;
    Ok(bundle.tasks)
}
