use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const CATEGORIES: [&str; 2] = ["Technical Task", "User Story"];

// Board column a task lives in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    ToDo,
    InProgress,
    AwaitFeedback,
    Done,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::ToDo,
        Status::InProgress,
        Status::AwaitFeedback,
        Status::Done,
    ];

    pub fn index(self) -> usize {
        match self {
            Status::ToDo => 0,
            Status::InProgress => 1,
            Status::AwaitFeedback => 2,
            Status::Done => 3,
        }
    }

    /// Column at `index`, clamped to the last column.
    pub fn from_index(index: usize) -> Status {
        Status::ALL[index.min(Status::ALL.len() - 1)]
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::ToDo => "To do",
            Status::InProgress => "In progress",
            Status::AwaitFeedback => "Await feedback",
            Status::Done => "Done",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::ToDo => "to-do",
            Status::InProgress => "in-progress",
            Status::AwaitFeedback => "await-feedback",
            Status::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Urgent, Priority::Medium, Priority::Low];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    #[serde(default)]
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(content: impl Into<String>) -> Self {
        Subtask {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            completed: false,
        }
    }
}

// Files are stored inline as base64; the client only lists them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub base64: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub attachments: BTreeMap<String, Attachment>,
    #[serde(default)]
    pub timestamp: i64,
}

impl Task {
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Contact {
    pub fn initials(&self) -> String {
        initials(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub color: String,
}

/// First letter of the first and last word, ignoring a trailing "(You)".
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name
        .split_whitespace()
        .filter(|w| !w.starts_with('('))
        .collect();
    let first = words.first().and_then(|w| w.chars().next());
    let last = if words.len() > 1 {
        words.last().and_then(|w| w.chars().next())
    } else {
        None
    };
    first
        .into_iter()
        .chain(last)
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_uses_kebab_case_on_the_wire() {
        assert_eq!(json!(Status::AwaitFeedback), json!("await-feedback"));
        let status: Status = serde_json::from_value(json!("to-do")).unwrap();
        assert_eq!(status, Status::ToDo);
    }

    #[test]
    fn test_task_tolerates_missing_collections() {
        let task: Task = serde_json::from_value(json!({
            "id": "-Nx1",
            "title": "Write docs",
            "status": "in-progress",
            "priority": "urgent",
            "dueDate": "2025-03-01",
            "timestamp": 1700000000000i64
        }))
        .unwrap();
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.priority, Priority::Urgent);
        assert!(task.assigned_to.is_empty());
        assert!(task.subtasks.is_empty());
        assert!(task.attachments.is_empty());
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 3, 1));
    }

    #[test]
    fn test_task_serializes_camel_case_fields() {
        let task = Task {
            id: "t1".into(),
            title: "Plan".into(),
            description: String::new(),
            category: CATEGORIES[1].into(),
            status: Status::Done,
            due_date: None,
            priority: Priority::Low,
            assigned_to: vec!["c1".into()],
            subtasks: Vec::new(),
            attachments: BTreeMap::new(),
            timestamp: 5,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["assignedTo"], json!(["c1"]));
        assert_eq!(value["status"], json!("done"));
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Anna Maria Müller"), "AM");
        assert_eq!(initials("sofia"), "S");
        assert_eq!(initials("Max Power (You)"), "MP");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_status_from_index_clamps() {
        assert_eq!(Status::from_index(0), Status::ToDo);
        assert_eq!(Status::from_index(3), Status::Done);
        assert_eq!(Status::from_index(42), Status::Done);
    }
}
