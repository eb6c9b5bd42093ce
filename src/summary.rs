use crate::models::{Priority, Status, Task};
use chrono::NaiveDate;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub to_do: usize,
    pub in_progress: usize,
    pub await_feedback: usize,
    pub done: usize,
    pub urgent: usize,
    /// Earliest due date among urgent tasks that are not done yet.
    pub next_deadline: Option<NaiveDate>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.to_do + self.in_progress + self.await_feedback + self.done
    }
}

pub fn summarize(tasks: &[Task]) -> Summary {
    let mut summary = Summary::default();
    for task in tasks {
        match task.status {
            Status::ToDo => summary.to_do += 1,
            Status::InProgress => summary.in_progress += 1,
            Status::AwaitFeedback => summary.await_feedback += 1,
            Status::Done => summary.done += 1,
        }
        if task.priority == Priority::Urgent && task.status != Status::Done {
            summary.urgent += 1;
            if let Some(due) = task.due_date {
                summary.next_deadline = Some(summary.next_deadline.map_or(due, |d| d.min(due)));
            }
        }
    }
    summary
}

pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}
