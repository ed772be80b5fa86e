use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::format::DateFormat;

/// Id carried by a task that storage has not assigned an id to yet
pub const UNASSIGNED_ID: i64 = 0;

/// One to-do item.
///
/// A `Task` is a value: equality compares the five stored fields, and every
/// "change" produces a new `Task` that keeps the same `id`. Storage assigns
/// the id on insert; until then it is [`UNASSIGNED_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    name: String,
    #[serde(default)]
    important: bool,
    #[serde(default)]
    completed: bool,
    created: i64, // milliseconds since the Unix epoch
    #[serde(default)]
    id: i64,
}

impl Task {
    /// New unsaved task created now
    pub fn new(name: impl Into<String>) -> Self {
        Self::new_with_clock(name, &SystemClock)
    }

    /// New unsaved task whose creation time comes from `clock`
    pub fn new_with_clock<C: Clock + ?Sized>(name: impl Into<String>, clock: &C) -> Self {
        Self {
            name: name.into(),
            important: false,
            completed: false,
            created: clock.now_millis(),
            id: UNASSIGNED_ID,
        }
    }

    /// Rebuild a task from all of its stored fields (e.g. a database row)
    pub fn from_parts(name: impl Into<String>, important: bool, completed: bool, created: i64, id: i64) -> Self {
        Self {
            name: name.into(),
            important,
            completed,
            created,
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_important(&self) -> bool {
        self.important
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Creation time in milliseconds since the Unix epoch
    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether storage has assigned this task an id
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self }
    }

    pub fn with_important(self, important: bool) -> Self {
        Self { important, ..self }
    }

    pub fn with_completed(self, completed: bool) -> Self {
        Self { completed, ..self }
    }

    pub fn with_id(self, id: i64) -> Self {
        Self { id, ..self }
    }

    pub fn toggled_completed(&self) -> Self {
        self.clone().with_completed(!self.completed)
    }

    pub fn toggled_important(&self) -> Self {
        self.clone().with_important(!self.important)
    }

    /// Creation time rendered with the default format, computed on every call
    pub fn created_date_formatted(&self) -> String {
        self.created_date_formatted_with(&DateFormat::default())
    }

    pub fn created_date_formatted_with(&self, format: &DateFormat) -> String {
        format.format_millis(self.created)
    }
}
