use crate::api::{DataStore, CONTACTS, TASKS};
use crate::error::Result;
use crate::models::{now_millis, Contact, Priority, Status, Subtask, Task};
use crate::repository::CONTACT_COLORS;
use chrono::{Duration, Local};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const DEMO_CONTACTS: [(&str, &str, &str); 5] = [
    ("Anton Mayer", "anton@gmail.com", "+49 1111 111 11 1"),
    ("Anja Schulz", "schulz@hotmail.com", "+49 2222 222 22 2"),
    ("Benedikt Ziegler", "benedikt@gmail.com", "+49 3333 333 33 3"),
    ("David Eisenberg", "davidberg@gmail.com", "+49 4444 444 44 4"),
    ("Eva Fischer", "eva@gmail.com", "+49 5555 555 55 5"),
];

pub fn demo_contacts() -> Vec<Contact> {
    DEMO_CONTACTS
        .iter()
        .enumerate()
        .map(|(i, (name, email, phone))| Contact {
            id: format!("contact-{}", i + 1),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            color: CONTACT_COLORS[i % CONTACT_COLORS.len()].to_string(),
            image: None,
        })
        .collect()
}

pub fn demo_tasks() -> Vec<Task> {
    let today = Local::now().date_naive();
    let start = now_millis();
    let specs = [
        (
            "Kochwelt Page & Recipe Recommender",
            "Build start page with recipe recommendation.",
            "User Story",
            Status::InProgress,
            Priority::Medium,
            7,
            vec!["contact-1", "contact-2"],
            vec!["Implement recipe recommendation", "Start page layout"],
        ),
        (
            "HTML Base Template Creation",
            "Create reusable HTML base templates.",
            "Technical Task",
            Status::AwaitFeedback,
            Priority::Low,
            14,
            vec!["contact-3"],
            Vec::new(),
        ),
        (
            "Daily Kochwelt Recipe",
            "Implement daily recipe and portion calculator.",
            "User Story",
            Status::AwaitFeedback,
            Priority::Medium,
            10,
            vec!["contact-4", "contact-5"],
            Vec::new(),
        ),
        (
            "CSS Architecture Planning",
            "Define CSS naming conventions and structure.",
            "Technical Task",
            Status::Done,
            Priority::Urgent,
            3,
            vec!["contact-2", "contact-3"],
            vec!["Establish CSS Methodology", "Setup Base Styles"],
        ),
        (
            "Contact Form & Imprint",
            "Create a contact form and imprint page.",
            "User Story",
            Status::ToDo,
            Priority::Urgent,
            5,
            vec!["contact-1"],
            vec!["Contact form", "Imprint page"],
        ),
    ];

    let count = specs.len() as i64;
    specs
        .into_iter()
        .enumerate()
        .map(
            |(i, (title, description, category, status, priority, due_in, assigned, subtasks))| {
                let mut subtasks: Vec<Subtask> = subtasks.into_iter().map(Subtask::new).collect();
                if status == Status::Done {
                    subtasks.iter_mut().for_each(|s| s.completed = true);
                }
                Task {
                    id: format!("task-{}", i + 1),
                    title: title.to_string(),
                    description: description.to_string(),
                    category: category.to_string(),
                    status,
                    due_date: Some(today + Duration::days(due_in)),
                    priority,
                    assigned_to: assigned.into_iter().map(String::from).collect(),
                    subtasks,
                    attachments: BTreeMap::new(),
                    timestamp: start - (count - i as i64) * 60_000,
                }
            },
        )
        .collect()
}

/// Keyed by id, the shape the store uses for a collection.
fn keyed<T: serde::Serialize>(items: &[T], id: impl Fn(&T) -> &str) -> Result<Value> {
    let mut map = Map::new();
    for item in items {
        map.insert(id(item).to_string(), serde_json::to_value(item)?);
    }
    Ok(Value::Object(map))
}

/// Overwrites the task and contact collections with demo data.
pub async fn reset_demo_data(store: &dyn DataStore) -> Result<(Vec<Task>, Vec<Contact>)> {
    let contacts = demo_contacts();
    let tasks = demo_tasks();
    store
        .put_data(CONTACTS, keyed(&contacts, |c| c.id.as_str())?)
        .await?;
    store.put_data(TASKS, keyed(&tasks, |t| t.id.as_str())?).await?;
    log::info!("Reset store to {} demo tasks", tasks.len());
    Ok((tasks, contacts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_tasks_reference_demo_contacts() {
        let contacts = demo_contacts();
        for task in demo_tasks() {
            for id in &task.assigned_to {
                assert!(contacts.iter().any(|c| &c.id == id), "unknown contact {}", id);
            }
        }
    }

    #[test]
    fn test_demo_timestamps_are_in_the_past_and_ordered() {
        let now = now_millis();
        let tasks = demo_tasks();
        assert!(tasks.iter().all(|t| t.timestamp < now));
        assert!(tasks.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_keyed_collection() {
        let value = keyed(&demo_contacts(), |c| c.id.as_str()).unwrap();
        assert_eq!(value["contact-1"]["name"], "Anton Mayer");
        assert_eq!(value.as_object().unwrap().len(), 5);
    }
}
