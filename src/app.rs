use crate::api::DataStore;
use crate::board::{board_view, BoardGeometry, ColumnView};
use crate::config::{PointerMode, UiConfig};
use crate::drag::{edge_scroll, BoardLayout, DragController, DragOutcome, Modality, Point};
use crate::error::Error;
use crate::form::{Field, Form, FormInput};
use crate::models::{Contact, Priority, Status, Subtask, Task, CATEGORIES};
use crate::repository::{contact_groups, ContactDraft, TaskDraft, Workspace};
use crate::seed;
use crate::session::{self, SessionStore, SessionUser, SignUp};
use crate::summary::greeting;
use crate::validation::{
    validate_due_date, validate_email, validate_name, validate_password,
    validate_password_confirmation, validate_phone, validate_required, ValidationError,
};
use chrono::{Local, NaiveDate, Timelike};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SPLASH: Duration = Duration::from_millis(1200);
const NO_CATEGORY: &str = "Select task category";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Login,
    SignUp,
    Summary,
    Board,
    Contacts,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeleteTarget {
    Task(String),
    Contact(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    None,
    TaskDetail {
        id: String,
        cursor: usize,
    },
    TaskForm {
        form: Form,
        editing: Option<String>,
        status: Status,
    },
    ContactForm {
        form: Form,
        editing: Option<String>,
    },
    ConfirmDelete(DeleteTarget),
    ConfirmReset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub until: Instant,
}

// A press on a card that has not moved yet
#[derive(Clone, Debug)]
struct PendingPress {
    task_id: String,
    status: Status,
}

type FieldErrors = Vec<(&'static str, ValidationError)>;

pub struct App {
    store: Arc<dyn DataStore>,
    session: SessionStore,
    pub ui: UiConfig,
    pub user: Option<SessionUser>,
    pub workspace: Workspace,
    pub screen: Screen,
    pub overlay: Overlay,
    pub login_form: Form,
    pub signup_form: Form,
    pub drag: DragController,
    /// Focused card as (column, row)
    pub focus: (usize, usize),
    pub search: String,
    pub searching: bool,
    pub geometry: BoardGeometry,
    pub board_scroll: u16,
    pub column_scroll: [usize; 4],
    /// Scroll the board so the focused card (or the column picked during a
    /// keyboard drag) stays on screen. Wheel scrolling turns it off.
    pub follow_focus: bool,
    pub contact_cursor: usize,
    pub toast: Option<Toast>,
    pub splash_until: Option<Instant>,
    pub viewport_width: u16,
    pending_press: Option<PendingPress>,
}

pub fn login_form() -> Form {
    Form::new(
        "Log in",
        vec![
            Field::text("email", "Email"),
            Field::secret("password", "Password"),
            Field::toggle("remember", "Remember me", false),
        ],
    )
}

pub fn signup_form() -> Form {
    Form::new(
        "Sign up",
        vec![
            Field::text("name", "Name"),
            Field::text("email", "Email"),
            Field::secret("password", "Password"),
            Field::secret("confirm", "Confirm Password"),
            Field::toggle("privacy", "I accept the Privacy policy", false),
        ],
    )
}

pub fn task_form(contacts: &[Contact], task: Option<&Task>) -> Form {
    let mut categories = vec![NO_CATEGORY.to_string()];
    categories.extend(CATEGORIES.iter().map(|c| c.to_string()));
    let category = task
        .and_then(|t| categories.iter().position(|c| *c == t.category))
        .unwrap_or(0);

    let priorities: Vec<String> = Priority::ALL.iter().map(|p| p.label().to_string()).collect();
    let priority = task.map(|t| t.priority).unwrap_or_default();
    let priority = Priority::ALL.iter().position(|p| *p == priority).unwrap_or(1);

    let people: Vec<(String, String)> = contacts
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect();
    let assigned = task.map(|t| t.assigned_to.clone()).unwrap_or_default();
    let subtasks = task
        .map(|t| t.subtasks.iter().map(|s| s.content.clone()).collect())
        .unwrap_or_default();

    let title = if task.is_some() { "Edit Task" } else { "Add Task" };
    Form::new(
        title,
        vec![
            Field::text("title", "Title").with_value(task.map(|t| t.title.as_str()).unwrap_or("")),
            Field::text("description", "Description")
                .with_value(task.map(|t| t.description.as_str()).unwrap_or("")),
            Field::text("due", "Due date (YYYY-MM-DD)").with_value(
                task.and_then(|t| t.due_date)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            Field::choice("priority", "Prio", priorities, priority),
            Field::choice("category", "Category", categories, category),
            Field::multi_select("assigned", "Assigned to", people, &assigned),
            Field::list("subtasks", "Subtasks", subtasks),
        ],
    )
}

/// Reads a task form. Editing keeps completion state of unchanged subtasks
/// and may keep a due date that has passed in the meantime.
pub fn task_draft(
    form: &Form,
    status: Status,
    existing: Option<&Task>,
    today: NaiveDate,
) -> Result<TaskDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = form.value("title").trim().to_string();
    if let Err(err) = validate_required(&title) {
        errors.push(("title", err));
    }
    let due_date = match validate_due_date(form.value("due"), today, existing.is_some()) {
        Ok(date) => Some(date),
        Err(err) => {
            errors.push(("due", err));
            None
        }
    };
    let category = form
        .choice("category")
        .filter(|c| *c != NO_CATEGORY)
        .unwrap_or("")
        .to_string();
    if let Err(err) = validate_required(&category) {
        errors.push(("category", err));
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let priority = form
        .choice("priority")
        .and_then(|label| Priority::ALL.into_iter().find(|p| p.label() == label))
        .unwrap_or_default();
    let subtasks = form
        .items("subtasks")
        .into_iter()
        .map(|content| {
            existing
                .and_then(|t| t.subtasks.iter().find(|s| s.content == content))
                .cloned()
                .unwrap_or_else(|| Subtask::new(content))
        })
        .collect();

    Ok(TaskDraft {
        title,
        description: form.value("description").trim().to_string(),
        category,
        status,
        due_date,
        priority,
        assigned_to: form.selected_values("assigned"),
        subtasks,
    })
}

pub fn contact_form(contact: Option<&Contact>) -> Form {
    let title = if contact.is_some() { "Edit contact" } else { "Add contact" };
    Form::new(
        title,
        vec![
            Field::text("name", "Name").with_value(contact.map(|c| c.name.as_str()).unwrap_or("")),
            Field::text("email", "Email").with_value(contact.map(|c| c.email.as_str()).unwrap_or("")),
            Field::text("phone", "Phone").with_value(contact.map(|c| c.phone.as_str()).unwrap_or("")),
        ],
    )
}

pub fn contact_draft(form: &Form) -> Result<ContactDraft, FieldErrors> {
    let checks = [
        ("name", validate_name(form.value("name"))),
        ("email", validate_email(form.value("email"))),
        ("phone", validate_phone(form.value("phone"))),
    ];
    let errors: FieldErrors = checks
        .into_iter()
        .filter_map(|(key, result)| result.err().map(|err| (key, err)))
        .collect();
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(ContactDraft {
        name: form.value("name").trim().to_string(),
        email: form.value("email").trim().to_string(),
        phone: form.value("phone").trim().to_string(),
    })
}

pub fn sign_up_input(form: &Form) -> Result<SignUp, FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Err(err) = validate_name(form.value("name")) {
        errors.push(("name", err));
    }
    if let Err(err) = validate_email(form.value("email")) {
        errors.push(("email", err));
    }
    if let Err(err) = validate_password(form.value("password")) {
        errors.push(("password", err));
    }
    if let Err(err) = validate_password_confirmation(form.value("password"), form.value("confirm")) {
        errors.push(("confirm", err));
    }
    if !form.toggled("privacy") {
        errors.push(("privacy", ValidationError::PrivacyPolicy));
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(SignUp {
        name: form.value("name").trim().to_string(),
        email: form.value("email").trim().to_string(),
        password: form.value("password").to_string(),
    })
}

fn show_errors(form: &mut Form, errors: FieldErrors) {
    form.clear_errors();
    for (key, err) in errors {
        form.set_error(key, err.to_string());
    }
}

impl App {
    pub fn new(store: Arc<dyn DataStore>, session: SessionStore, ui: UiConfig) -> App {
        let mut flags = session.flags();
        let splash_until = if flags.login_animation_played {
            None
        } else {
            flags.login_animation_played = true;
            if let Err(err) = session.save_flags(&flags) {
                log::warn!("Could not save session flags: {}", err);
            }
            Some(Instant::now() + SPLASH)
        };

        App {
            store,
            session,
            drag: DragController::new(ui.long_press()),
            ui,
            user: None,
            workspace: Workspace::default(),
            screen: Screen::Login,
            overlay: Overlay::None,
            login_form: login_form(),
            signup_form: signup_form(),
            focus: (0, 0),
            search: String::new(),
            searching: false,
            geometry: BoardGeometry::default(),
            board_scroll: 0,
            column_scroll: [0; 4],
            follow_focus: true,
            contact_cursor: 0,
            toast: None,
            splash_until,
            viewport_width: 120,
            pending_press: None,
        }
    }

    pub fn layout(&self) -> BoardLayout {
        if self.viewport_width < self.ui.stacked_below_width {
            BoardLayout::Stacked
        } else {
            BoardLayout::Horizontal
        }
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.workspace.contacts_with_self(self.user.as_ref())
    }

    /// Contacts in the order the contact list shows them.
    pub fn contact_list(&self) -> Vec<Contact> {
        let contacts = self.contacts();
        contact_groups(&contacts)
            .into_iter()
            .flat_map(|(_, members)| members.into_iter().cloned())
            .collect()
    }

    pub fn view(&self) -> Vec<ColumnView> {
        board_view(&self.workspace.tasks, &self.contacts(), &self.search)
    }

    pub fn focused_card(&self) -> Option<(String, Status)> {
        let view = self.view();
        let column = view.get(self.focus.0)?;
        let card = column.cards.get(self.focus.1)?;
        Some((card.id.clone(), column.status))
    }

    fn clamp_focus(&mut self) {
        let view = self.view();
        let column = self.focus.0.min(Status::ALL.len() - 1);
        let len = view.get(column).map(|c| c.cards.len()).unwrap_or(0);
        self.focus = (column, self.focus.1.min(len.saturating_sub(1)));
        self.follow_focus = true;
    }

    fn focus_task(&mut self, task_id: &str) {
        for (column, view) in self.view().iter().enumerate() {
            if let Some(row) = view.cards.iter().position(|c| c.id == task_id) {
                self.focus = (column, row);
                self.follow_focus = true;
                return;
            }
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            kind: ToastKind::Info,
            until: Instant::now() + self.ui.toast_duration(),
        });
    }

    fn report(&mut self, context: &str, err: &Error) {
        log::error!("{}: {}", context, err);
        self.toast = Some(Toast {
            message: format!("{}: {}", context, err),
            kind: ToastKind::Error,
            until: Instant::now() + self.ui.toast_duration(),
        });
    }

    pub fn tick(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| now >= t.until) {
            self.toast = None;
        }
        if self.splash_until.is_some_and(|until| now >= until) {
            self.splash_until = None;
        }
        if self.drag.poll_long_press(now) {
            self.pending_press = None;
        }
    }

    /// Picks up a session left by an earlier run.
    pub async fn restore_session(&mut self) {
        if let Some(user) = self.session.load_current_user() {
            log::info!("Restoring session for {}", user.name);
            self.enter(user).await;
        }
    }

    pub async fn sign_in(&mut self, user: SessionUser, remember: bool) {
        if let Err(err) = self.session.save_current_user(&user, remember) {
            self.report("Could not save the session", &err);
        }
        self.enter(user).await;
    }

    async fn enter(&mut self, user: SessionUser) {
        self.user = Some(user);
        self.reload().await;
        self.screen = Screen::Summary;
        self.greet();
    }

    fn greet(&mut self) {
        let mut flags = self.session.flags();
        if flags.greeting {
            return;
        }
        let name = self.user.as_ref().map(|u| u.name.clone()).unwrap_or_default();
        let salutation = greeting(Local::now().hour());
        if name.is_empty() {
            self.notify(format!("{}!", salutation));
        } else {
            self.notify(format!("{}, {}", salutation, name));
        }
        flags.greeting = true;
        if let Err(err) = self.session.save_flags(&flags) {
            log::warn!("Could not save session flags: {}", err);
        }
    }

    pub async fn reload(&mut self) {
        if let Err(err) = self.workspace.load(self.store.as_ref()).await {
            self.report("Could not load the board", &err);
        }
        self.clamp_focus();
    }

    pub fn logout(&mut self) {
        if let Err(err) = self.session.logout() {
            log::warn!("Could not clear the session: {}", err);
        }
        self.drag.cancel();
        self.user = None;
        self.workspace = Workspace::default();
        self.overlay = Overlay::None;
        self.login_form = login_form();
        self.screen = Screen::Login;
    }

    /// Forgets session scoped state when the program exits.
    pub fn end_session(&self) {
        if let Err(err) = self.session.end_session() {
            log::warn!("Could not end the session: {}", err);
        }
    }

    fn open_detail(&mut self, task_id: String) {
        if self.workspace.task(&task_id).is_some() {
            self.overlay = Overlay::TaskDetail {
                id: task_id,
                cursor: 0,
            };
        }
    }

    fn open_task_form(&mut self, editing: Option<String>, status: Status) {
        let contacts = self.contacts();
        let task = editing.as_deref().and_then(|id| self.workspace.task(id));
        let status = task.map(|t| t.status).unwrap_or(status);
        let form = task_form(&contacts, task);
        self.overlay = Overlay::TaskForm {
            form,
            editing,
            status,
        };
    }

    fn open_contact_form(&mut self, editing: Option<Contact>) {
        self.overlay = Overlay::ContactForm {
            form: contact_form(editing.as_ref()),
            editing: editing.map(|c| c.id),
        };
    }

    /// Returns true when the application should quit.
    pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        if self.splash_until.take().is_some() {
            return false;
        }
        if self.overlay != Overlay::None {
            self.handle_overlay_key(key).await;
            return false;
        }
        match self.screen {
            Screen::Login => self.handle_login_key(key).await,
            Screen::SignUp => self.handle_signup_key(key).await,
            Screen::Summary => return self.handle_summary_key(key).await,
            Screen::Board => return self.handle_board_key(key).await,
            Screen::Contacts => return self.handle_contacts_key(key),
        }
        false
    }

    async fn handle_login_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('g') => self.sign_in(SessionUser::guest(), false).await,
                KeyCode::Char('n') => {
                    self.signup_form = signup_form();
                    self.screen = Screen::SignUp;
                }
                _ => {}
            }
            return;
        }
        if self.login_form.handle_key(key) == FormInput::Submit {
            self.submit_login().await;
        }
    }

    async fn submit_login(&mut self) {
        self.login_form.clear_errors();
        let email = self.login_form.value("email").trim().to_string();
        let password = self.login_form.value("password").to_string();
        if let Err(err) = validate_email(&email) {
            self.login_form.set_error("email", err.to_string());
            return;
        }
        if let Err(err) = validate_required(&password) {
            self.login_form.set_error("password", err.to_string());
            return;
        }
        if let Err(err) = self.workspace.load_users(self.store.as_ref()).await {
            self.report("Could not reach the server", &err);
            return;
        }
        let user = match session::login(&self.workspace.users, &email, &password) {
            Ok(user) => SessionUser::from(user),
            Err(err) => {
                self.login_form.set_error("password", err.to_string());
                return;
            }
        };
        let remember = self.login_form.toggled("remember");
        log::info!("{} logged in", user.email);
        self.login_form = login_form();
        self.sign_in(user, remember).await;
    }

    async fn handle_signup_key(&mut self, key: KeyEvent) {
        match self.signup_form.handle_key(key) {
            FormInput::Cancel => self.screen = Screen::Login,
            FormInput::Submit => self.submit_signup().await,
            _ => {}
        }
    }

    async fn submit_signup(&mut self) {
        let input = match sign_up_input(&self.signup_form) {
            Ok(input) => input,
            Err(errors) => {
                show_errors(&mut self.signup_form, errors);
                return;
            }
        };
        let store = Arc::clone(&self.store);
        let loaded = match self.workspace.load(store.as_ref()).await {
            Ok(()) => self.workspace.load_users(store.as_ref()).await,
            Err(err) => Err(err),
        };
        if let Err(err) = loaded {
            self.report("Could not reach the server", &err);
            return;
        }
        match session::sign_up(store.as_ref(), &mut self.workspace, input).await {
            Ok(user) => {
                self.login_form = login_form();
                self.login_form.set_value("email", &user.email);
                self.screen = Screen::Login;
                self.notify("You signed up successfully");
            }
            Err(Error::EmailTaken) => {
                self.signup_form
                    .set_error("email", Error::EmailTaken.to_string());
            }
            Err(err) => self.report("Sign up failed", &err),
        }
    }

    async fn handle_summary_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('b') | KeyCode::Enter => self.screen = Screen::Board,
            KeyCode::Char('c') => self.screen = Screen::Contacts,
            KeyCode::Char('r') => self.reload().await,
            KeyCode::Char('R') => self.overlay = Overlay::ConfirmReset,
            KeyCode::Char('L') => self.logout(),
            _ => {}
        }
        false
    }

    async fn handle_board_key(&mut self, key: KeyEvent) -> bool {
        self.follow_focus = true;
        let focused = self.focused_card();
        let layout = self.layout();

        // A gesture in progress owns the keyboard, even over the search box.
        if !self.searching || !self.drag.is_idle() {
            let outcome = self.drag.handle_key(
                key.code,
                focused.as_ref().map(|(id, status)| (id.as_str(), *status)),
                layout,
            );
            if let Some(outcome) = outcome {
                self.apply_drag_outcome(outcome).await;
                return false;
            }
        }

        if self.searching {
            match key.code {
                KeyCode::Esc => {
                    self.search.clear();
                    self.searching = false;
                }
                KeyCode::Enter => self.searching = false,
                KeyCode::Backspace => {
                    self.search.pop();
                }
                KeyCode::Char(c) => self.search.push(c),
                _ => {}
            }
            self.clamp_focus();
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Esc => {
                self.search.clear();
                self.clamp_focus();
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.focus.0 = self.focus.0.saturating_sub(1);
                self.clamp_focus();
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.focus.0 = (self.focus.0 + 1).min(Status::ALL.len() - 1);
                self.clamp_focus();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.focus.1 = self.focus.1.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.focus.1 += 1;
                self.clamp_focus();
            }
            KeyCode::Enter => {
                if let Some((id, _)) = focused {
                    self.open_detail(id);
                }
            }
            KeyCode::Char('a') => self.open_task_form(None, Status::from_index(self.focus.0)),
            KeyCode::Char('e') => {
                if let Some((id, status)) = focused {
                    self.open_task_form(Some(id), status);
                }
            }
            KeyCode::Char('d') => {
                if let Some((id, _)) = focused {
                    self.overlay = Overlay::ConfirmDelete(DeleteTarget::Task(id));
                }
            }
            KeyCode::Char('s') => self.screen = Screen::Summary,
            KeyCode::Char('c') => self.screen = Screen::Contacts,
            KeyCode::Char('r') => self.reload().await,
            KeyCode::Char('L') => self.logout(),
            _ => {}
        }
        false
    }

    fn handle_contacts_key(&mut self, key: KeyEvent) -> bool {
        let contacts = self.contact_list();
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.contact_cursor = self.contact_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.contact_cursor + 1 < contacts.len() {
                    self.contact_cursor += 1;
                }
            }
            KeyCode::Char('a') => self.open_contact_form(None),
            KeyCode::Char('e') => {
                if let Some(contact) = contacts.get(self.contact_cursor) {
                    self.open_contact_form(Some(contact.clone()));
                }
            }
            KeyCode::Char('d') => {
                if let Some(contact) = contacts.get(self.contact_cursor) {
                    self.overlay = Overlay::ConfirmDelete(DeleteTarget::Contact(contact.id.clone()));
                }
            }
            KeyCode::Char('b') => self.screen = Screen::Board,
            KeyCode::Char('s') => self.screen = Screen::Summary,
            KeyCode::Char('L') => self.logout(),
            _ => {}
        }
        false
    }

    async fn handle_overlay_key(&mut self, key: KeyEvent) {
        match self.overlay.clone() {
            Overlay::None => {}
            Overlay::TaskDetail { id, cursor } => self.handle_detail_key(key, id, cursor).await,
            Overlay::TaskForm { .. } => {
                let input = match &mut self.overlay {
                    Overlay::TaskForm { form, .. } => form.handle_key(key),
                    _ => return,
                };
                match input {
                    FormInput::Submit => self.submit_task_form().await,
                    FormInput::Cancel => self.overlay = Overlay::None,
                    _ => {}
                }
            }
            Overlay::ContactForm { .. } => {
                let input = match &mut self.overlay {
                    Overlay::ContactForm { form, .. } => form.handle_key(key),
                    _ => return,
                };
                match input {
                    FormInput::Submit => self.submit_contact_form().await,
                    FormInput::Cancel => self.overlay = Overlay::None,
                    _ => {}
                }
            }
            Overlay::ConfirmDelete(target) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.overlay = Overlay::None;
                    self.delete(target).await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.overlay = Overlay::None,
                _ => {}
            },
            Overlay::ConfirmReset => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.overlay = Overlay::None;
                    self.reset_demo_data().await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.overlay = Overlay::None,
                _ => {}
            },
        }
    }

    async fn handle_detail_key(&mut self, key: KeyEvent, id: String, cursor: usize) {
        let Some(subtask_count) = self.workspace.task(&id).map(|t| t.subtasks.len()) else {
            self.overlay = Overlay::None;
            return;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.overlay = Overlay::None,
            KeyCode::Up | KeyCode::Char('k') => {
                self.overlay = Overlay::TaskDetail {
                    id,
                    cursor: cursor.saturating_sub(1),
                };
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.overlay = Overlay::TaskDetail {
                    id,
                    cursor: (cursor + 1).min(subtask_count.saturating_sub(1)),
                };
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Err(err) = self
                    .workspace
                    .toggle_subtask(self.store.as_ref(), &id, cursor)
                    .await
                {
                    self.report("Could not update the subtask", &err);
                }
            }
            KeyCode::Char('e') => self.open_task_form(Some(id), Status::ToDo),
            KeyCode::Char('d') => self.overlay = Overlay::ConfirmDelete(DeleteTarget::Task(id)),
            _ => {}
        }
    }

    async fn submit_task_form(&mut self) {
        let Overlay::TaskForm {
            mut form,
            editing,
            status,
        } = std::mem::replace(&mut self.overlay, Overlay::None)
        else {
            return;
        };

        let today = Local::now().date_naive();
        let existing = editing.as_deref().and_then(|id| self.workspace.task(id));
        let draft = match task_draft(&form, status, existing, today) {
            Ok(draft) => draft,
            Err(errors) => {
                show_errors(&mut form, errors);
                self.overlay = Overlay::TaskForm {
                    form,
                    editing,
                    status,
                };
                return;
            }
        };

        let store = self.store.as_ref();
        let result = match &editing {
            Some(id) => self
                .workspace
                .update_task(store, id, draft)
                .await
                .map(|()| Some(id.clone())),
            None => self.workspace.create_task(store, draft).await,
        };
        match result {
            Ok(Some(id)) => {
                if editing.is_some() {
                    self.notify("Task updated");
                    self.overlay = Overlay::TaskDetail { id, cursor: 0 };
                } else {
                    self.notify("Task added to board");
                    self.focus_task(&id);
                }
            }
            Ok(None) => self.report("Could not add the task", &Error::MissingId("tasks".into())),
            Err(err) => self.report("Could not save the task", &err),
        }
    }

    async fn submit_contact_form(&mut self) {
        let Overlay::ContactForm { mut form, editing } =
            std::mem::replace(&mut self.overlay, Overlay::None)
        else {
            return;
        };
        let draft = match contact_draft(&form) {
            Ok(draft) => draft,
            Err(errors) => {
                show_errors(&mut form, errors);
                self.overlay = Overlay::ContactForm { form, editing };
                return;
            }
        };

        let store = self.store.as_ref();
        let result = match &editing {
            Some(id) => self.workspace.update_contact(store, id, draft).await,
            None => self.workspace.add_contact(store, draft).await.map(|_| ()),
        };
        match result {
            Ok(()) if editing.is_some() => self.notify("Contact updated"),
            Ok(()) => self.notify("Contact successfully created"),
            Err(err) => self.report("Could not save the contact", &err),
        }
    }

    async fn delete(&mut self, target: DeleteTarget) {
        let store = self.store.as_ref();
        let result = match &target {
            DeleteTarget::Task(id) => self.workspace.delete_task(store, id).await,
            DeleteTarget::Contact(id) => self.workspace.delete_contact(store, id).await,
        };
        match result {
            Ok(()) => {
                self.clamp_focus();
                let count = self.contact_list().len();
                self.contact_cursor = self.contact_cursor.min(count.saturating_sub(1));
                self.notify(match target {
                    DeleteTarget::Task(_) => "Task deleted",
                    DeleteTarget::Contact(_) => "Contact deleted",
                });
            }
            Err(err) => self.report("Could not delete", &err),
        }
    }

    async fn reset_demo_data(&mut self) {
        match seed::reset_demo_data(self.store.as_ref()).await {
            Ok((tasks, contacts)) => {
                self.workspace.tasks = tasks;
                self.workspace.contacts = contacts;
                self.clamp_focus();
                self.notify("Demo data restored");
            }
            Err(err) => self.report("Could not reset the data", &err),
        }
    }

    async fn apply_drag_outcome(&mut self, outcome: DragOutcome) {
        match outcome {
            DragOutcome::Move { task_id, to, .. } => {
                match self
                    .workspace
                    .move_task(self.store.as_ref(), &task_id, to)
                    .await
                {
                    Ok(true) => self.focus_task(&task_id),
                    Ok(false) => {}
                    Err(err) => self.report("Could not move the task", &err),
                }
            }
            DragOutcome::Tap(task_id) => self.open_detail(task_id),
            DragOutcome::Cancelled | DragOutcome::Pending => {}
        }
    }

    pub async fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Board || self.overlay != Overlay::None {
            return;
        }
        let point = Point::new(mouse.column, mouse.row);
        let keyboard_drag = self
            .drag
            .session()
            .is_some_and(|s| s.modality == Modality::Keyboard);
        match mouse.kind {
            MouseEventKind::ScrollDown => self.scroll_at(point, 1),
            MouseEventKind::ScrollUp => self.scroll_at(point, -1),
            // Only Space drops a card picked up from the keyboard.
            _ if keyboard_drag => {}
            kind => match self.ui.pointer {
                PointerMode::Mouse => self.handle_mouse_drag(kind, point).await,
                PointerMode::Touch => self.handle_touch(kind, point, Instant::now()).await,
            },
        }
    }

    async fn handle_mouse_drag(&mut self, kind: MouseEventKind, point: Point) {
        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.pending_press = self.geometry.card_at(point).map(|(id, status)| PendingPress {
                    task_id: id.to_string(),
                    status,
                });
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(press) = self.pending_press.take() {
                    self.drag.drag_start(&press.task_id, press.status);
                }
                if self.drag.session().is_some() {
                    self.drag_pointer_moved(point);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(press) = self.pending_press.take() {
                    self.open_detail(press.task_id);
                    return;
                }
                if self.drag.session().is_some() {
                    let outcome = match self.geometry.column_at(point) {
                        Some(column) => self.drag.drop_on(column),
                        None => self.drag.drag_end(),
                    };
                    self.apply_drag_outcome(outcome).await;
                }
            }
            _ => {}
        }
    }

    async fn handle_touch(&mut self, kind: MouseEventKind, point: Point, now: Instant) {
        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some((id, status)) = self.geometry.card_at(point) {
                    self.drag.touch_start(id, status, point, now);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let was_dragging = self.drag.session().is_some();
                self.drag.touch_move(point, now, &self.geometry.columns);
                if was_dragging || self.drag.session().is_some() {
                    self.drag_pointer_moved(point);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let outcome = self.drag.touch_end(point, now, &self.geometry.columns);
                self.apply_drag_outcome(outcome).await;
            }
            _ => {}
        }
    }

    /// Follows the pointer during a drag: hover tracking plus auto-scrolling.
    fn drag_pointer_moved(&mut self, point: Point) {
        let before = self.drag.session().and_then(|s| s.hovered);
        self.drag.pointer_moved(point, &self.geometry.columns);
        let after = self.drag.session().and_then(|s| s.hovered);
        if let Some(column) = after.filter(|c| Some(*c) != before) {
            // Scrolled to the end so the drop placeholder is in view.
            self.column_scroll[column.index()] = usize::MAX;
        }
        let step = edge_scroll(point.y, self.geometry.viewport);
        self.scroll_board(step);
    }

    fn scroll_board(&mut self, step: i32) {
        let max = i32::from(self.geometry.max_scroll());
        let next = (i32::from(self.board_scroll) + step).clamp(0, max);
        self.board_scroll = next as u16;
    }

    fn scroll_at(&mut self, point: Point, step: i32) {
        self.follow_focus = false;
        match self.layout() {
            BoardLayout::Stacked => self.scroll_board(step),
            BoardLayout::Horizontal => {
                if let Some(column) = self.geometry.column_at(point) {
                    let offset = &mut self.column_scroll[column.index()];
                    *offset = if step < 0 {
                        offset.saturating_sub(1)
                    } else {
                        offset.saturating_add(1)
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn existing_task() -> Task {
        let mut done = Subtask::new("Draft");
        done.completed = true;
        Task {
            id: "t1".into(),
            title: "Old".into(),
            description: String::new(),
            category: "User Story".into(),
            status: Status::AwaitFeedback,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            priority: Priority::Urgent,
            assigned_to: vec!["c1".into()],
            subtasks: vec![done],
            attachments: BTreeMap::new(),
            timestamp: 1,
        }
    }

    #[test]
    fn test_empty_task_form_reports_required_fields() {
        let form = task_form(&[], None);
        let errors = task_draft(&form, Status::ToDo, None, today()).unwrap_err();
        let keys: Vec<&str> = errors.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, ["title", "due", "category"]);
    }

    #[test]
    fn test_task_form_round_trips_existing_task() {
        let task = existing_task();
        let mut form = task_form(&[], Some(&task));
        assert_eq!(form.value("due"), "2025-01-01");
        assert_eq!(form.choice("priority"), Some("Urgent"));
        assert_eq!(form.choice("category"), Some("User Story"));

        form.set_value("title", "New title");
        let draft = task_draft(&form, task.status, Some(&task), today()).unwrap();
        assert_eq!(draft.title, "New title");
        assert_eq!(draft.status, Status::AwaitFeedback);
        // Past due date is fine when editing, subtask keeps its state.
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert!(draft.subtasks[0].completed);
        assert_eq!(draft.subtasks[0].id, task.subtasks[0].id);
    }

    #[test]
    fn test_contact_draft_validation() {
        let mut form = contact_form(None);
        form.set_value("name", "Eva");
        form.set_value("email", "eva@fischer.de");
        form.set_value("phone", "+49 30 1234567");
        let errors = contact_draft(&form).unwrap_err();
        assert_eq!(errors, vec![("name", ValidationError::Name)]);

        form.set_value("name", "Eva Fischer");
        assert_eq!(contact_draft(&form).unwrap().name, "Eva Fischer");
    }

    #[test]
    fn test_sign_up_requires_privacy_acceptance() {
        let mut form = signup_form();
        form.set_value("name", "Eva Fischer");
        form.set_value("email", "eva@fischer.de");
        form.set_value("password", "Secret123");
        form.set_value("confirm", "Secret123");
        let errors = sign_up_input(&form).unwrap_err();
        assert_eq!(errors, vec![("privacy", ValidationError::PrivacyPolicy)]);
    }
}
