use crate::drag::{column_at, contains, Point};
use crate::models::{Contact, Priority, Status, Task};
use ratatui::layout::Rect;

const EXCERPT_LEN: usize = 40;

#[derive(Clone, Debug, PartialEq)]
pub struct Avatar {
    pub initials: String,
    pub color: String,
}

// What a card on the board shows
#[derive(Clone, Debug, PartialEq)]
pub struct CardView {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub priority: Priority,
    pub status: Status,
    pub assignees: Vec<Avatar>,
    pub subtasks_done: usize,
    pub subtasks_total: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnView {
    pub status: Status,
    pub cards: Vec<CardView>,
}

impl ColumnView {
    pub fn empty_label(&self) -> String {
        format!("No tasks {}", self.status.label())
    }
}

pub fn matches_query(task: &Task, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty()
        || task.title.to_lowercase().contains(&query)
        || task.description.to_lowercase().contains(&query)
}

pub fn excerpt(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

pub fn card_view(task: &Task, contacts: &[Contact]) -> CardView {
    let assignees = task
        .assigned_to
        .iter()
        .filter_map(|id| contacts.iter().find(|c| &c.id == id))
        .map(|c| Avatar {
            initials: c.initials(),
            color: c.color.clone(),
        })
        .collect();

    CardView {
        id: task.id.clone(),
        title: task.title.clone(),
        excerpt: excerpt(&task.description, EXCERPT_LEN),
        category: task.category.clone(),
        priority: task.priority,
        status: task.status,
        assignees,
        subtasks_done: task.completed_subtasks(),
        subtasks_total: task.subtasks.len(),
    }
}

/// The four columns of the board, filtered by `query` and oldest first.
pub fn board_view(tasks: &[Task], contacts: &[Contact], query: &str) -> Vec<ColumnView> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|t| matches_query(t, query)).collect();
    visible.sort_by_key(|t| t.timestamp);

    Status::ALL
        .iter()
        .map(|status| ColumnView {
            status: *status,
            cards: visible
                .iter()
                .filter(|t| t.status == *status)
                .map(|t| card_view(t, contacts))
                .collect(),
        })
        .collect()
}

/// Screen positions from the last drawn frame, used to resolve pointer events.
#[derive(Clone, Debug, Default)]
pub struct BoardGeometry {
    pub viewport: Rect,
    pub columns: Vec<(Status, Rect)>,
    pub cards: Vec<(String, Status, Rect)>,
    /// Height of the whole board, which exceeds the viewport in the stacked layout.
    pub content_height: u16,
}

impl BoardGeometry {
    pub fn column_at(&self, point: Point) -> Option<Status> {
        column_at(&self.columns, point)
    }

    pub fn card_at(&self, point: Point) -> Option<(&str, Status)> {
        self.cards
            .iter()
            .find(|(_, _, area)| contains(*area, point))
            .map(|(id, status, _)| (id.as_str(), *status))
    }

    pub fn max_scroll(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport.height)
    }
}
