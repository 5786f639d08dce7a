//! Task model for the `Flowboard` board.
//!
//! Defines the task entity, its column/priority vocabulary, the draft and
//! patch shapes used by create/update calls, and field validation. All types
//! serialize as camelCase JSON, matching the REST store's on-disk records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

/// Prefix marking a client-only placeholder id awaiting server confirmation.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Unique identifier for a task.
///
/// Server-assigned ids are UUID v7 strings (time-ordered). Between an
/// optimistic insert and the server's confirmation the client uses a
/// [`TEMP_ID_PREFIX`]ed placeholder id, which never survives a settled
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Creates a client-only placeholder id for an optimistic insert.
    #[must_use]
    pub fn temporary() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", Uuid::now_v7()))
    }

    /// Wraps an existing id string.
    #[must_use]
    pub const fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is a client-only placeholder id.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One of the four fixed workflow stages a task can occupy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskColumn {
    /// Not yet started.
    #[default]
    Backlog,
    /// Actively being worked on.
    InProgress,
    /// Awaiting review.
    UnderReview,
    /// Done.
    Completed,
}

impl TaskColumn {
    /// All columns in board order.
    pub const ALL: [Self; 4] = [
        Self::Backlog,
        Self::InProgress,
        Self::UnderReview,
        Self::Completed,
    ];

    /// The wire value for this column (kebab-case, as stored).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in-progress",
            Self::UnderReview => "under-review",
            Self::Completed => "completed",
        }
    }

    /// Human-readable column title.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::InProgress => "In Progress",
            Self::UnderReview => "Under Review",
            Self::Completed => "Completed",
        }
    }

    /// Accent color hex code used when rendering this column.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Backlog => "#6B7280",
            Self::InProgress => "#F59E0B",
            Self::UnderReview => "#8B5CF6",
            Self::Completed => "#10B981",
        }
    }
}

impl std::fmt::Display for TaskColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskColumn {
    type Err = ParseColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Self::Backlog),
            "in-progress" => Ok(Self::InProgress),
            "under-review" => Ok(Self::UnderReview),
            "completed" => Ok(Self::Completed),
            other => Err(ParseColumnError(other.to_string())),
        }
    }
}

/// Error returned when parsing an unknown column name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown column {0:?} (expected backlog, in-progress, under-review, or completed)")]
pub struct ParseColumnError(pub String);

/// Task urgency level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal urgency (the default).
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// The wire value for this priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Human-readable priority title.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Badge color hex code for this priority.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#10B981",
            Self::Medium => "#F59E0B",
            Self::High => "#EF4444",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

/// Error returned when parsing an unknown priority name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority {0:?} (expected low, medium, or high)")]
pub struct ParsePriorityError(pub String);

/// A color tag offered by the board's tag picker.
///
/// The task record stores the tag id as a plain string; this catalog only
/// constrains what pickers offer and how tags render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorOption {
    /// Tag identifier stored on the task (e.g. `"blue"`).
    pub id: &'static str,
    /// Hex color value for rendering.
    pub value: &'static str,
}

/// The color tags the board offers.
pub const COLORS: [ColorOption; 7] = [
    ColorOption { id: "red", value: "#EF4444" },
    ColorOption { id: "orange", value: "#F97316" },
    ColorOption { id: "yellow", value: "#EAB308" },
    ColorOption { id: "green", value: "#22C55E" },
    ColorOption { id: "blue", value: "#3B82F6" },
    ColorOption { id: "purple", value: "#A855F7" },
    ColorOption { id: "pink", value: "#EC4899" },
];

/// Person a task is assigned to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// One unit of work on the board.
///
/// `position` is a per-column floating-point sort key: tasks in a column are
/// ordered by ascending position, and the value carries no meaning across
/// columns. See [`crate::position`] for how keys are allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Short summary, non-empty, at most [`MAX_TITLE_LENGTH`] characters.
    pub title: String,
    /// Longer text, at most [`MAX_DESCRIPTION_LENGTH`] characters.
    pub description: String,
    /// The column this task currently occupies.
    pub column: TaskColumn,
    /// Urgency level; absent on the wire means [`Priority::Medium`].
    #[serde(default)]
    pub priority: Priority,
    /// Who the task is assigned to, if anyone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Assignee>,
    /// Free-text effort estimate (e.g. `"2h"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<String>,
    /// Due date string (e.g. `"2024-03-15"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Color tag id (see [`COLORS`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Per-column fractional sort key.
    pub position: f64,
    /// When the task was created (server-assigned).
    pub created_at: DateTime<Utc>,
    /// When the task was last modified (server-refreshed on update).
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a full task from a draft plus the server-assigned parts.
    #[must_use]
    pub fn from_draft(draft: TaskDraft, id: TaskId, position: f64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            column: draft.column,
            priority: draft.priority,
            assignee: draft.assignee,
            time_estimate: draft.time_estimate,
            due_date: draft.due_date,
            color: draft.color,
            position,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields submitted when creating a task.
///
/// The id, position, and timestamps are assigned elsewhere: the client
/// proposes a position from its allocator and the server assigns the id and
/// timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    /// Short summary, non-empty, at most [`MAX_TITLE_LENGTH`] characters.
    pub title: String,
    /// Longer text, non-empty, at most [`MAX_DESCRIPTION_LENGTH`] characters.
    pub description: String,
    /// Target column.
    pub column: TaskColumn,
    /// Urgency level.
    #[serde(default)]
    pub priority: Priority,
    /// Optional assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Assignee>,
    /// Optional effort estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<String>,
    /// Optional due date string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Optional color tag id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TaskDraft {
    /// Validates the draft before any optimistic mutation or network call.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] or
    /// [`ValidationError::EmptyDescription`] for blank required fields, and
    /// [`ValidationError::TitleTooLong`] or
    /// [`ValidationError::DescriptionTooLong`] when a field exceeds its
    /// character limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let title_len = self.title.chars().count();
        if title_len > MAX_TITLE_LENGTH {
            return Err(ValidationError::TitleTooLong {
                len: title_len,
                max: MAX_TITLE_LENGTH,
            });
        }
        if self.description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let description_len = self.description.chars().count();
        if description_len > MAX_DESCRIPTION_LENGTH {
            return Err(ValidationError::DescriptionTooLong {
                len: description_len,
                max: MAX_DESCRIPTION_LENGTH,
            });
        }
        Ok(())
    }
}

/// Partial task update: only the set fields are touched.
///
/// Serializes with unset fields omitted, so a PATCH body carries exactly the
/// fields being changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<TaskColumn>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Assignee>,
    /// New effort estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<String>,
    /// New due date string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// New color tag id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New position sort key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
}

impl TaskPatch {
    /// Returns true if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.column.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.time_estimate.is_none()
            && self.due_date.is_none()
            && self.color.is_none()
            && self.position.is_none()
    }

    /// Shallow-merges the set fields into `task`. Timestamps are untouched;
    /// refreshing `updated_at` is the store's job.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(column) = self.column {
            task.column = column;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignee) = &self.assignee {
            task.assignee = Some(assignee.clone());
        }
        if let Some(time_estimate) = &self.time_estimate {
            task.time_estimate = Some(time_estimate.clone());
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = Some(due_date.clone());
        }
        if let Some(color) = &self.color {
            task.color = Some(color.clone());
        }
        if let Some(position) = self.position {
            task.position = position;
        }
    }

    /// Validates the set fields.
    ///
    /// # Errors
    ///
    /// Same failures as [`TaskDraft::validate`], applied only to the fields
    /// that are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            if title.is_empty() {
                return Err(ValidationError::EmptyTitle);
            }
            let len = title.chars().count();
            if len > MAX_TITLE_LENGTH {
                return Err(ValidationError::TitleTooLong {
                    len,
                    max: MAX_TITLE_LENGTH,
                });
            }
        }
        if let Some(description) = &self.description {
            if description.is_empty() {
                return Err(ValidationError::EmptyDescription);
            }
            let len = description.chars().count();
            if len > MAX_DESCRIPTION_LENGTH {
                return Err(ValidationError::DescriptionTooLong {
                    len,
                    max: MAX_DESCRIPTION_LENGTH,
                });
            }
        }
        Ok(())
    }
}

/// Error returned when task fields fail validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title is empty.
    #[error("title is required")]
    EmptyTitle,
    /// Title exceeds the maximum allowed length.
    #[error("title too long ({len} characters, max {max})")]
    TitleTooLong {
        /// Actual length in characters.
        len: usize,
        /// Maximum allowed length in characters.
        max: usize,
    },
    /// Description is empty.
    #[error("description is required")]
    EmptyDescription,
    /// Description exceeds the maximum allowed length.
    #[error("description too long ({len} characters, max {max})")]
    DescriptionTooLong {
        /// Actual length in characters.
        len: usize,
        /// Maximum allowed length in characters.
        max: usize,
    },
}
