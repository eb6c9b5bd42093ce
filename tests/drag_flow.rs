mod common;

use common::{new_app, press, MemoryStore};
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use join_board::api::TASKS;
use join_board::app::{App, Overlay, Screen, ToastKind};
use join_board::config::{PointerMode, UiConfig};
use join_board::models::{now_millis, Status};
use join_board::session::SessionUser;
use join_board::ui::draw;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

// "Contact Form & Imprint" is the only task in To do.
const TODO_TASK: &str = "task-5";

async fn board(store: &Arc<MemoryStore>, ui: UiConfig) -> App {
    let mut app = new_app(store.clone(), ui);
    app.sign_in(SessionUser::guest(), false).await;
    app.handle_key(press(KeyCode::Char('b'))).await;
    assert_eq!(app.screen, Screen::Board);
    assert_eq!(app.focused_card(), Some((TODO_TASK.to_string(), Status::ToDo)));
    app
}

fn render(app: &mut App) {
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    terminal.draw(|f| draw(f, app)).unwrap();
}

fn card_rect(app: &App, id: &str) -> Rect {
    app.geometry
        .cards
        .iter()
        .find(|(card, _, _)| card == id)
        .map(|(_, _, rect)| *rect)
        .unwrap()
}

fn column_rect(app: &App, status: Status) -> Rect {
    app.geometry
        .columns
        .iter()
        .find(|(s, _)| *s == status)
        .map(|(_, rect)| *rect)
        .unwrap()
}

fn mouse(kind: MouseEventKind, rect: Rect) -> MouseEvent {
    MouseEvent {
        kind,
        column: rect.x + rect.width / 2,
        row: rect.y + rect.height / 2,
        modifiers: KeyModifiers::NONE,
    }
}

fn status_of(app: &App, id: &str) -> Status {
    app.workspace.task(id).unwrap().status
}

#[tokio::test]
async fn test_keyboard_drag_persists_status_and_timestamp() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, UiConfig::default()).await;
    let seeded = app.workspace.task(TODO_TASK).unwrap().timestamp;

    app.handle_key(press(KeyCode::Char(' '))).await;
    assert_eq!(app.drag.selected_column(), Some(0));
    for _ in 0..3 {
        app.handle_key(press(KeyCode::Right)).await;
    }
    // Clamped at the last column.
    app.handle_key(press(KeyCode::Right)).await;
    assert_eq!(app.drag.selected_column(), Some(3));
    let before_drop = now_millis();
    app.handle_key(press(KeyCode::Char(' '))).await;

    assert!(app.drag.is_idle());
    assert_eq!(status_of(&app, TODO_TASK), Status::Done);
    let updates = store.updates();
    assert_eq!(updates.len(), 1);
    let (path, id, patch) = &updates[0];
    assert_eq!(path, TASKS);
    assert_eq!(id, TODO_TASK);
    assert_eq!(patch["status"], "done");
    let timestamp = patch["timestamp"].as_i64().unwrap();
    assert!(timestamp >= before_drop);
    assert!(timestamp > seeded);
    assert_eq!(app.workspace.task(TODO_TASK).unwrap().timestamp, timestamp);
    assert_eq!(patch.as_object().unwrap().len(), 2);
    // Focus follows the moved card.
    assert_eq!(app.focused_card(), Some((TODO_TASK.to_string(), Status::Done)));
}

#[tokio::test]
async fn test_drop_on_origin_or_escape_writes_nothing() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, UiConfig::default()).await;

    app.handle_key(press(KeyCode::Char(' '))).await;
    app.handle_key(press(KeyCode::Char(' '))).await;
    assert!(app.drag.is_idle());

    app.handle_key(press(KeyCode::Char(' '))).await;
    app.handle_key(press(KeyCode::Right)).await;
    app.handle_key(press(KeyCode::Esc)).await;
    assert!(app.drag.is_idle());

    assert!(store.updates().is_empty());
    assert_eq!(status_of(&app, TODO_TASK), Status::ToDo);
    assert_eq!(app.screen, Screen::Board);
}

#[tokio::test]
async fn test_keys_do_not_escape_an_active_drag() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, UiConfig::default()).await;

    app.handle_key(press(KeyCode::Char(' '))).await;
    assert!(!app.handle_key(press(KeyCode::Char('q'))).await);
    app.handle_key(press(KeyCode::Tab)).await;
    app.handle_key(press(KeyCode::Char('s'))).await;
    assert_eq!(app.screen, Screen::Board);
    assert!(app.drag.session().is_some());
}

#[tokio::test]
async fn test_pointer_release_does_not_drop_keyboard_drag() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, UiConfig::default()).await;
    render(&mut app);
    let target = column_rect(&app, Status::Done);

    app.handle_key(press(KeyCode::Char(' '))).await;
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), target)).await;
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), target)).await;
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), target)).await;

    assert!(app.drag.session().is_some());
    assert_eq!(app.drag.selected_column(), Some(0));
    assert_eq!(status_of(&app, TODO_TASK), Status::ToDo);
    assert!(store.updates().is_empty());

    app.handle_key(press(KeyCode::Esc)).await;
    assert!(app.drag.is_idle());
}

#[tokio::test]
async fn test_touch_events_do_not_drop_keyboard_drag() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, touch_ui()).await;
    render(&mut app);
    let target = column_rect(&app, Status::Done);

    app.handle_key(press(KeyCode::Char(' '))).await;
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), target)).await;
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), target)).await;

    assert_eq!(app.drag.shadow_column(), None);
    assert!(app.drag.session().is_some());
    assert!(store.updates().is_empty());
}

#[tokio::test]
async fn test_escape_while_searching_cancels_pointer_drag() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, UiConfig::default()).await;
    render(&mut app);
    let card = card_rect(&app, TODO_TASK);
    let target = column_rect(&app, Status::Done);

    app.handle_key(press(KeyCode::Char('/'))).await;
    app.handle_key(press(KeyCode::Char('c'))).await;
    assert!(app.searching);
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), card)).await;
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), target)).await;
    assert!(app.drag.session().is_some());

    app.handle_key(press(KeyCode::Esc)).await;
    assert!(app.drag.is_idle());
    // The search box is left alone.
    assert!(app.searching);
    assert_eq!(app.search, "c");

    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), target)).await;
    assert!(store.updates().is_empty());
    assert_eq!(status_of(&app, TODO_TASK), Status::ToDo);
}

#[tokio::test]
async fn test_failed_move_rolls_back() {
    let store = MemoryStore::with_demo_data();
    store.fail_updates.store(true, Ordering::SeqCst);
    let mut app = board(&store, UiConfig::default()).await;
    let before = app.workspace.task(TODO_TASK).unwrap().timestamp;

    app.handle_key(press(KeyCode::Char(' '))).await;
    app.handle_key(press(KeyCode::Right)).await;
    app.handle_key(press(KeyCode::Char(' '))).await;

    assert_eq!(store.updates().len(), 1);
    let task = app.workspace.task(TODO_TASK).unwrap();
    assert_eq!(task.status, Status::ToDo);
    assert_eq!(task.timestamp, before);
    assert_eq!(app.toast.as_ref().map(|t| t.kind), Some(ToastKind::Error));
}

#[tokio::test]
async fn test_mouse_drag_between_columns() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, UiConfig::default()).await;
    render(&mut app);

    let card = card_rect(&app, TODO_TASK);
    let target = column_rect(&app, Status::AwaitFeedback);
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), card)).await;
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), target)).await;
    assert_eq!(app.drag.shadow_column(), Some(Status::AwaitFeedback));
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), target)).await;

    assert_eq!(status_of(&app, TODO_TASK), Status::AwaitFeedback);
    let updates = store.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].2["status"], "await-feedback");
}

#[tokio::test]
async fn test_mouse_release_outside_columns_cancels() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, UiConfig::default()).await;
    render(&mut app);

    let card = card_rect(&app, TODO_TASK);
    let outside = Rect::new(0, 0, 1, 1);
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), card)).await;
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), outside)).await;
    assert_eq!(app.drag.shadow_column(), None);
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), outside)).await;

    assert!(app.drag.is_idle());
    assert!(store.updates().is_empty());
}

#[tokio::test]
async fn test_click_opens_task_details() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, UiConfig::default()).await;
    render(&mut app);

    let card = card_rect(&app, TODO_TASK);
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), card)).await;
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), card)).await;

    assert_eq!(
        app.overlay,
        Overlay::TaskDetail {
            id: TODO_TASK.to_string(),
            cursor: 0
        }
    );
    assert!(store.updates().is_empty());
}

fn touch_ui() -> UiConfig {
    UiConfig {
        pointer: PointerMode::Touch,
        long_press_ms: 100,
        ..UiConfig::default()
    }
}

#[tokio::test]
async fn test_touch_tap_opens_details() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, touch_ui()).await;
    render(&mut app);

    let card = card_rect(&app, TODO_TASK);
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), card)).await;
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), card)).await;

    assert!(matches!(app.overlay, Overlay::TaskDetail { .. }));
    assert!(store.updates().is_empty());
}

#[tokio::test]
async fn test_touch_move_before_long_press_does_not_drag() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, touch_ui()).await;
    render(&mut app);

    let card = card_rect(&app, TODO_TASK);
    let target = column_rect(&app, Status::Done);
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), card)).await;
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), target)).await;
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), target)).await;

    assert!(app.drag.is_idle());
    assert_eq!(status_of(&app, TODO_TASK), Status::ToDo);
    assert!(store.updates().is_empty());
}

#[tokio::test]
async fn test_touch_long_press_then_drag() {
    let store = MemoryStore::with_demo_data();
    let mut app = board(&store, touch_ui()).await;
    render(&mut app);

    let card = card_rect(&app, TODO_TASK);
    let target = column_rect(&app, Status::InProgress);
    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), card)).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    app.tick(std::time::Instant::now());
    assert!(app.drag.session().is_some());

    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), target)).await;
    assert!(app.drag.ghost().is_some());
    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), target)).await;

    assert_eq!(status_of(&app, TODO_TASK), Status::InProgress);
    assert_eq!(store.updates().len(), 1);
}
