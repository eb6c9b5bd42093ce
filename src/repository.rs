use crate::api::{DataStore, CONTACTS, TASKS, USERS};
use crate::error::Result;
use crate::models::{now_millis, Contact, Priority, Status, Subtask, Task, User};
use crate::session::SessionUser;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const CONTACT_COLORS: [&str; 15] = [
    "#FF7A00", "#FF5EB3", "#6E52FF", "#9327FF", "#00BEE8", "#1FD7C1", "#FF745E", "#FFA35E",
    "#FC71FF", "#FFC701", "#0038FF", "#C3FF2B", "#FFE62B", "#FF4646", "#FFBB2B",
];

pub const YOU_SUFFIX: &str = " (You)";

/// Everything needed to create or fully edit a task.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub assigned_to: Vec<String>,
    pub subtasks: Vec<Subtask>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Decodes store entries, skipping the ones that don't fit `T`.
fn decode<T: DeserializeOwned>(path: &str, values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(err) => {
                log::warn!("Skipping malformed entry in {}: {}", path, err);
                None
            }
        })
        .collect()
}

/// In-memory copy of the remote collections. Every edit is applied here and
/// pushed to the store on its own.
#[derive(Debug, Default)]
pub struct Workspace {
    pub tasks: Vec<Task>,
    pub contacts: Vec<Contact>,
    pub users: Vec<User>,
}

impl Workspace {
    pub async fn load(&mut self, store: &dyn DataStore) -> Result<()> {
        self.tasks = decode(TASKS, store.get_data(TASKS).await?);
        self.contacts = decode(CONTACTS, store.get_data(CONTACTS).await?);
        log::info!(
            "Loaded {} tasks and {} contacts",
            self.tasks.len(),
            self.contacts.len()
        );
        Ok(())
    }

    pub async fn load_users(&mut self, store: &dyn DataStore) -> Result<()> {
        self.users = decode(USERS, store.get_data(USERS).await?);
        Ok(())
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn contact(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub async fn create_task(&mut self, store: &dyn DataStore, draft: TaskDraft) -> Result<Option<String>> {
        let task = Task {
            id: String::new(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            status: draft.status,
            due_date: draft.due_date,
            priority: draft.priority,
            assigned_to: draft.assigned_to,
            subtasks: draft.subtasks,
            attachments: BTreeMap::new(),
            timestamp: now_millis(),
        };
        let mut item = serde_json::to_value(&task)?;
        if let Value::Object(map) = &mut item {
            map.remove("id");
        }

        let Some(created) = store.add_data(TASKS, item).await? else {
            return Ok(None);
        };
        let task: Task = serde_json::from_value(created)?;
        let id = task.id.clone();
        log::info!("Created task {} ({})", task.title, id);
        self.tasks.push(task);
        Ok(Some(id))
    }

    /// Replaces the editable fields of a task. Unknown ids are ignored.
    pub async fn update_task(&mut self, store: &dyn DataStore, id: &str, draft: TaskDraft) -> Result<()> {
        let Some(task) = self.task_mut(id) else {
            return Ok(());
        };
        task.title = draft.title;
        task.description = draft.description;
        task.category = draft.category;
        task.status = draft.status;
        task.due_date = draft.due_date;
        task.priority = draft.priority;
        task.assigned_to = draft.assigned_to;
        task.subtasks = draft.subtasks;
        task.timestamp = now_millis();

        let patch = json!({
            "title": task.title,
            "description": task.description,
            "category": task.category,
            "status": task.status,
            "dueDate": task.due_date,
            "priority": task.priority,
            "assignedTo": task.assigned_to,
            "subtasks": task.subtasks,
            "timestamp": task.timestamp,
        });
        store.update_data(TASKS, id, patch).await
    }

    pub async fn delete_task(&mut self, store: &dyn DataStore, id: &str) -> Result<()> {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            return Ok(());
        };
        self.tasks.remove(index);
        store.delete_data(TASKS, id).await
    }

    pub async fn toggle_subtask(&mut self, store: &dyn DataStore, task_id: &str, index: usize) -> Result<()> {
        let Some(task) = self.task_mut(task_id) else {
            return Ok(());
        };
        let Some(subtask) = task.subtasks.get_mut(index) else {
            return Ok(());
        };
        subtask.completed = !subtask.completed;
        let patch = json!({ "subtasks": task.subtasks });
        store.update_data(TASKS, task_id, patch).await
    }

    /// Moves a task to another column and persists `{status, timestamp}`.
    ///
    /// The local change is visible immediately. When the store rejects it the
    /// previous status and timestamp are restored and the error is returned.
    /// Returns false when the task is unknown or already in `to`.
    pub async fn move_task(&mut self, store: &dyn DataStore, id: &str, to: Status) -> Result<bool> {
        let Some(task) = self.task_mut(id) else {
            return Ok(false);
        };
        if task.status == to {
            return Ok(false);
        }
        let previous = (task.status, task.timestamp);
        task.status = to;
        task.timestamp = now_millis();
        let patch = json!({ "status": task.status, "timestamp": task.timestamp });

        match store.update_data(TASKS, id, patch).await {
            Ok(()) => {
                log::info!("Moved task {} from {} to {}", id, previous.0, to);
                Ok(true)
            }
            Err(err) => {
                if let Some(task) = self.task_mut(id) {
                    task.status = previous.0;
                    task.timestamp = previous.1;
                }
                Err(err)
            }
        }
    }

    pub fn next_contact_color(&self) -> &'static str {
        CONTACT_COLORS[self.contacts.len() % CONTACT_COLORS.len()]
    }

    pub async fn add_contact(&mut self, store: &dyn DataStore, draft: ContactDraft) -> Result<Option<String>> {
        let item = json!({
            "name": draft.name.trim(),
            "email": draft.email.trim(),
            "phone": draft.phone.trim(),
            "color": self.next_contact_color(),
        });
        let Some(created) = store.add_data(CONTACTS, item).await? else {
            return Ok(None);
        };
        let contact: Contact = serde_json::from_value(created)?;
        let id = contact.id.clone();
        self.contacts.push(contact);
        Ok(Some(id))
    }

    pub async fn update_contact(&mut self, store: &dyn DataStore, id: &str, draft: ContactDraft) -> Result<()> {
        let Some(contact) = self.contacts.iter_mut().find(|c| c.id == id) else {
            return Ok(());
        };
        contact.name = draft.name.trim().to_string();
        contact.email = draft.email.trim().to_string();
        contact.phone = draft.phone.trim().to_string();
        let patch = json!({
            "name": contact.name,
            "email": contact.email,
            "phone": contact.phone,
        });
        store.update_data(CONTACTS, id, patch).await
    }

    /// Deletes a contact and unassigns it from every task, one write per task.
    pub async fn delete_contact(&mut self, store: &dyn DataStore, id: &str) -> Result<()> {
        let Some(index) = self.contacts.iter().position(|c| c.id == id) else {
            return Ok(());
        };
        self.contacts.remove(index);
        store.delete_data(CONTACTS, id).await?;

        let mut affected = Vec::new();
        for task in self.tasks.iter_mut() {
            if task.assigned_to.iter().any(|a| a == id) {
                task.assigned_to.retain(|a| a != id);
                affected.push((task.id.clone(), json!({ "assignedTo": task.assigned_to })));
            }
        }
        for (task_id, patch) in affected {
            store.update_data(TASKS, &task_id, patch).await?;
        }
        Ok(())
    }

    /// Contacts as shown to `user`: their own entry carries a "(You)" suffix
    /// and is added when the contact list doesn't know them yet.
    pub fn contacts_with_self(&self, user: Option<&SessionUser>) -> Vec<Contact> {
        let mut contacts = self.contacts.clone();
        let Some(me) = user.filter(|u| !u.guest) else {
            return contacts;
        };
        let mut found = false;
        for contact in contacts.iter_mut() {
            if contact.email.eq_ignore_ascii_case(&me.email) {
                contact.name.push_str(YOU_SUFFIX);
                found = true;
            }
        }
        if !found {
            contacts.insert(
                0,
                Contact {
                    id: me.id.clone(),
                    name: format!("{}{}", me.name, YOU_SUFFIX),
                    email: me.email.clone(),
                    phone: String::new(),
                    color: me.color.clone(),
                    image: None,
                },
            );
        }
        contacts
    }
}

/// Contacts sorted by name and grouped under their uppercase first letter.
pub fn contact_groups(contacts: &[Contact]) -> Vec<(char, Vec<&Contact>)> {
    let mut sorted: Vec<&Contact> = contacts.iter().collect();
    sorted.sort_by_key(|c| c.name.to_lowercase());

    let mut groups: Vec<(char, Vec<&Contact>)> = Vec::new();
    for contact in sorted {
        let letter = contact
            .name
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('#');
        match groups.last_mut() {
            Some((current, members)) if *current == letter => members.push(contact),
            _ => groups.push((letter, vec![contact])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, name: &str, email: &str) -> Contact {
        Contact {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            color: String::new(),
            image: None,
        }
    }

    #[test]
    fn test_contact_groups() {
        let contacts = vec![
            contact("1", "benedikt Ziegler", ""),
            contact("2", "Anton Mayer", ""),
            contact("3", "Anja Schulz", ""),
        ];
        let groups = contact_groups(&contacts);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, 'A');
        assert_eq!(groups[0].1[0].name, "Anja Schulz");
        assert_eq!(groups[1].0, 'B');
    }

    #[test]
    fn test_self_is_marked_or_added() {
        let workspace = Workspace {
            contacts: vec![contact("1", "Anton Mayer", "anton@mayer.de")],
            ..Workspace::default()
        };
        let me = SessionUser {
            id: "u1".into(),
            name: "Anton Mayer".into(),
            email: "Anton@Mayer.de".into(),
            color: String::new(),
            guest: false,
        };
        let contacts = workspace.contacts_with_self(Some(&me));
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Anton Mayer (You)");

        let stranger = SessionUser {
            email: "eva@fischer.de".into(),
            name: "Eva Fischer".into(),
            ..me
        };
        let contacts = workspace.contacts_with_self(Some(&stranger));
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Eva Fischer (You)");
        assert_eq!(contacts[0].id, "u1");

        assert_eq!(workspace.contacts_with_self(None).len(), 1);
        let guest = SessionUser::guest();
        assert_eq!(workspace.contacts_with_self(Some(&guest)).len(), 1);
    }

    #[test]
    fn test_contact_colors_cycle() {
        let mut workspace = Workspace::default();
        assert_eq!(workspace.next_contact_color(), CONTACT_COLORS[0]);
        for i in 0..CONTACT_COLORS.len() {
            workspace.contacts.push(contact(&i.to_string(), "A B", ""));
        }
        assert_eq!(workspace.next_contact_color(), CONTACT_COLORS[0]);
    }
}
