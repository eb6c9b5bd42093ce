//! Form state shared by the login, sign-up, task and contact dialogs.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Text,
    Secret,
    Toggle(bool),
    /// Single choice dropdown.
    Choice { options: Vec<String>, selected: usize },
    /// Multi choice dropdown; `options` holds `(value, label)` pairs.
    MultiSelect {
        options: Vec<(String, String)>,
        selected: BTreeSet<usize>,
        cursor: usize,
        open: bool,
    },
    /// Free text entries collected one by one (e.g. subtasks).
    List(Vec<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub key: &'static str,
    pub label: String,
    pub value: String,
    pub kind: FieldKind,
    pub error: Option<String>,
}

impl Field {
    pub fn text(key: &'static str, label: &str) -> Self {
        Field {
            key,
            label: label.to_string(),
            value: String::new(),
            kind: FieldKind::Text,
            error: None,
        }
    }

    pub fn secret(key: &'static str, label: &str) -> Self {
        Field {
            kind: FieldKind::Secret,
            ..Field::text(key, label)
        }
    }

    pub fn toggle(key: &'static str, label: &str, on: bool) -> Self {
        Field {
            kind: FieldKind::Toggle(on),
            ..Field::text(key, label)
        }
    }

    pub fn choice(key: &'static str, label: &str, options: Vec<String>, selected: usize) -> Self {
        Field {
            kind: FieldKind::Choice { options, selected },
            ..Field::text(key, label)
        }
    }

    pub fn multi_select(
        key: &'static str,
        label: &str,
        options: Vec<(String, String)>,
        selected: &[String],
    ) -> Self {
        let selected = options
            .iter()
            .enumerate()
            .filter(|(_, (value, _))| selected.contains(value))
            .map(|(i, _)| i)
            .collect();
        Field {
            kind: FieldKind::MultiSelect {
                options,
                selected,
                cursor: 0,
                open: false,
            },
            ..Field::text(key, label)
        }
    }

    pub fn list(key: &'static str, label: &str, items: Vec<String>) -> Self {
        Field {
            kind: FieldKind::List(items),
            ..Field::text(key, label)
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn is_open_dropdown(&self) -> bool {
        matches!(self.kind, FieldKind::MultiSelect { open: true, .. })
    }

    /// What the field shows when it is not being edited.
    pub fn display(&self) -> String {
        match &self.kind {
            FieldKind::Text => self.value.clone(),
            FieldKind::Secret => "•".repeat(self.value.chars().count()),
            FieldKind::Toggle(on) => (if *on { "[x]" } else { "[ ]" }).to_string(),
            FieldKind::Choice { options, selected } => options
                .get(*selected)
                .map(|o| format!("< {} >", o))
                .unwrap_or_default(),
            FieldKind::MultiSelect { options, selected, .. } => {
                let labels: Vec<&str> = selected
                    .iter()
                    .filter_map(|i| options.get(*i))
                    .map(|(_, label)| label.as_str())
                    .collect();
                if labels.is_empty() {
                    "Select contacts to assign".to_string()
                } else {
                    labels.join(", ")
                }
            }
            FieldKind::List(items) => {
                if self.value.is_empty() {
                    format!("{} item(s)", items.len())
                } else {
                    self.value.clone()
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormInput {
    Submit,
    Cancel,
    Edited,
    Ignored,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Form {
    pub title: String,
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    pub fn new(title: &str, fields: Vec<Field>) -> Self {
        Form {
            title: title.to_string(),
            fields,
            focus: 0,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.key == key)
    }

    pub fn value(&self, key: &str) -> &str {
        self.field(key).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, key: &str, value: &str) {
        if let Some(field) = self.field_mut(key) {
            field.value = value.to_string();
        }
    }

    pub fn toggled(&self, key: &str) -> bool {
        matches!(self.field(key).map(|f| &f.kind), Some(FieldKind::Toggle(true)))
    }

    pub fn choice(&self, key: &str) -> Option<&str> {
        match self.field(key).map(|f| &f.kind) {
            Some(FieldKind::Choice { options, selected }) => options.get(*selected).map(String::as_str),
            _ => None,
        }
    }

    pub fn selected_values(&self, key: &str) -> Vec<String> {
        match self.field(key).map(|f| &f.kind) {
            Some(FieldKind::MultiSelect { options, selected, .. }) => selected
                .iter()
                .filter_map(|i| options.get(*i))
                .map(|(value, _)| value.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn items(&self, key: &str) -> Vec<String> {
        match self.field(key).map(|f| &f.kind) {
            Some(FieldKind::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    pub fn set_error(&mut self, key: &str, message: impl Into<String>) {
        if let Some(field) = self.field_mut(key) {
            field.error = Some(message.into());
        }
    }

    pub fn clear_errors(&mut self) {
        for field in self.fields.iter_mut() {
            field.error = None;
        }
    }

    pub fn has_errors(&self) -> bool {
        self.fields.iter().any(|f| f.error.is_some())
    }

    pub fn focused(&self) -> Option<&Field> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_previous(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormInput {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return FormInput::Ignored;
        };

        // An open dropdown owns the keyboard until it is closed.
        if field.is_open_dropdown() {
            if let FieldKind::MultiSelect {
                options,
                selected,
                cursor,
                open,
            } = &mut field.kind
            {
                match key.code {
                    KeyCode::Up => *cursor = cursor.saturating_sub(1),
                    KeyCode::Down => {
                        if *cursor + 1 < options.len() {
                            *cursor += 1;
                        }
                    }
                    KeyCode::Char(' ') => {
                        if !selected.remove(&*cursor) {
                            selected.insert(*cursor);
                        }
                    }
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => *open = false,
                    _ => return FormInput::Ignored,
                }
            }
            return FormInput::Edited;
        }

        match key.code {
            KeyCode::Esc => return FormInput::Cancel,
            KeyCode::Tab => {
                self.focus_next();
                return FormInput::Edited;
            }
            KeyCode::BackTab => {
                self.focus_previous();
                return FormInput::Edited;
            }
            _ => {}
        }

        match (&mut field.kind, key.code) {
            (FieldKind::Toggle(on), KeyCode::Char(' ')) => *on = !*on,
            (FieldKind::Choice { options, selected }, KeyCode::Left) => {
                *selected = (*selected + options.len().max(1) - 1) % options.len().max(1);
            }
            (FieldKind::Choice { options, selected }, KeyCode::Right | KeyCode::Char(' ')) => {
                *selected = (*selected + 1) % options.len().max(1);
            }
            (FieldKind::MultiSelect { open, .. }, KeyCode::Char(' ') | KeyCode::Down) => *open = true,
            (FieldKind::List(items), KeyCode::Enter) if !field.value.trim().is_empty() => {
                items.push(field.value.trim().to_string());
                field.value.clear();
            }
            (FieldKind::List(items), KeyCode::Delete) => {
                items.pop();
            }
            (_, KeyCode::Enter) => return FormInput::Submit,
            (FieldKind::Text | FieldKind::Secret | FieldKind::List(_), KeyCode::Char(c))
                if !key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                field.value.push(c);
            }
            (FieldKind::Text | FieldKind::Secret | FieldKind::List(_), KeyCode::Backspace) => {
                field.value.pop();
            }
            _ => return FormInput::Ignored,
        }
        field.error = None;
        FormInput::Edited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut Form, text: &str) {
        for c in text.chars() {
            form.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_typing_and_focus_cycle() {
        let mut form = Form::new(
            "Log in",
            vec![Field::text("email", "Email"), Field::secret("password", "Password")],
        );
        type_text(&mut form, "anna@example.com");
        form.handle_key(press(KeyCode::Tab));
        type_text(&mut form, "Pw1");
        form.handle_key(press(KeyCode::Backspace));
        assert_eq!(form.value("email"), "anna@example.com");
        assert_eq!(form.value("password"), "Pw");
        assert_eq!(form.fields[1].display(), "••");

        form.handle_key(press(KeyCode::Tab));
        assert_eq!(form.focus, 0);
        form.handle_key(press(KeyCode::BackTab));
        assert_eq!(form.focus, 1);
        assert_eq!(form.handle_key(press(KeyCode::Enter)), FormInput::Submit);
        assert_eq!(form.handle_key(press(KeyCode::Esc)), FormInput::Cancel);
    }

    #[test]
    fn test_editing_clears_field_error() {
        let mut form = Form::new("Contact", vec![Field::text("name", "Name")]);
        form.set_error("name", "Please enter first and last name.");
        assert!(form.has_errors());
        type_text(&mut form, "A");
        assert!(!form.has_errors());
    }

    #[test]
    fn test_choice_wraps_around() {
        let options = vec!["Urgent".to_string(), "Medium".to_string(), "Low".to_string()];
        let mut form = Form::new("Task", vec![Field::choice("priority", "Priority", options, 1)]);
        form.handle_key(press(KeyCode::Right));
        form.handle_key(press(KeyCode::Right));
        assert_eq!(form.choice("priority"), Some("Urgent"));
        form.handle_key(press(KeyCode::Left));
        assert_eq!(form.choice("priority"), Some("Low"));
    }

    #[test]
    fn test_multi_select_dropdown() {
        let options = vec![
            ("c1".to_string(), "Anton Mayer".to_string()),
            ("c2".to_string(), "Eva Fischer".to_string()),
        ];
        let mut form = Form::new(
            "Task",
            vec![Field::multi_select("assigned", "Assigned to", options, &["c2".to_string()])],
        );
        assert_eq!(form.selected_values("assigned"), vec!["c2".to_string()]);

        form.handle_key(press(KeyCode::Char(' ')));
        assert!(form.fields[0].is_open_dropdown());
        form.handle_key(press(KeyCode::Char(' ')));
        form.handle_key(press(KeyCode::Down));
        form.handle_key(press(KeyCode::Char(' ')));
        // Enter closes the dropdown instead of submitting.
        assert_eq!(form.handle_key(press(KeyCode::Enter)), FormInput::Edited);
        assert!(!form.fields[0].is_open_dropdown());
        assert_eq!(form.selected_values("assigned"), vec!["c1".to_string()]);
        assert_eq!(form.fields[0].display(), "Anton Mayer");
    }

    #[test]
    fn test_list_collects_entries() {
        let mut form = Form::new("Task", vec![Field::list("subtasks", "Subtasks", Vec::new())]);
        type_text(&mut form, "Write tests");
        assert_eq!(form.handle_key(press(KeyCode::Enter)), FormInput::Edited);
        type_text(&mut form, "Ship");
        form.handle_key(press(KeyCode::Enter));
        assert_eq!(form.items("subtasks"), vec!["Write tests".to_string(), "Ship".to_string()]);
        form.handle_key(press(KeyCode::Delete));
        assert_eq!(form.items("subtasks").len(), 1);
        assert_eq!(form.handle_key(press(KeyCode::Enter)), FormInput::Submit);
    }

    #[test]
    fn test_toggle() {
        let mut form = Form::new("Log in", vec![Field::toggle("remember", "Remember me", false)]);
        form.handle_key(press(KeyCode::Char(' ')));
        assert!(form.toggled("remember"));
    }
}
