//! Drag-and-drop task reassignment.
//!
//! A [`DragController`] owns the only gesture that can be in flight. Mouse,
//! touch and keyboard input all drive the same [`Gesture`] and produce a
//! [`DragOutcome`] once the gesture ends; applying and persisting the move is
//! left to the caller.

use crate::models::Status;
use crossterm::event::KeyCode;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

pub const LONG_PRESS: Duration = Duration::from_millis(500);

/// Rows at the top and bottom of the board that trigger page scrolling.
pub const EDGE_ZONE: u16 = 3;
const SCROLL_PER_ROW: i32 = 1;
const MAX_SCROLL_STEP: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub fn new(x: u16, y: u16) -> Self {
        Point { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modality {
    Mouse,
    Touch,
    Keyboard,
}

/// Which arrow keys walk between columns during a keyboard drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardLayout {
    Horizontal,
    Stacked,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub task_id: String,
    pub origin: Status,
    pub hovered: Option<Status>,
    pub modality: Modality,
    /// Where the floating copy of the card is drawn (touch only).
    pub ghost: Option<Point>,
}

#[derive(Clone, Debug, PartialEq)]
enum Gesture {
    Idle,
    Armed {
        task_id: String,
        origin: Status,
        start: Point,
        since: Instant,
    },
    Dragging(DragSession),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// The gesture is still running or nothing happened.
    Pending,
    /// A touch released before the long press fired.
    Tap(String),
    Move {
        task_id: String,
        from: Status,
        to: Status,
    },
    Cancelled,
}

pub struct DragController {
    gesture: Gesture,
    long_press: Duration,
}

impl Default for DragController {
    fn default() -> Self {
        DragController::new(LONG_PRESS)
    }
}

impl DragController {
    pub fn new(long_press: Duration) -> Self {
        DragController {
            gesture: Gesture::Idle,
            long_press,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.gesture, Gesture::Armed { .. })
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.gesture {
            Gesture::Dragging(session) => Some(session),
            _ => None,
        }
    }

    pub fn dragged_task(&self) -> Option<&str> {
        self.session().map(|s| s.task_id.as_str())
    }

    /// Column that should show the drop placeholder. The origin column never does.
    pub fn shadow_column(&self) -> Option<Status> {
        self.session()
            .and_then(|s| s.hovered.filter(|hovered| *hovered != s.origin))
    }

    /// Column picked for a keyboard drop.
    pub fn selected_column(&self) -> Option<usize> {
        self.session()
            .filter(|s| s.modality == Modality::Keyboard)
            .map(|s| s.hovered.unwrap_or(s.origin).index())
    }

    pub fn ghost(&self) -> Option<Point> {
        self.session().and_then(|s| s.ghost)
    }

    fn begin(&mut self, task_id: &str, origin: Status, modality: Modality) -> bool {
        if !self.is_idle() {
            return false;
        }
        log::debug!("Dragging task {} from {} ({:?})", task_id, origin, modality);
        self.gesture = Gesture::Dragging(DragSession {
            task_id: task_id.to_string(),
            origin,
            hovered: None,
            modality,
            ghost: None,
        });
        true
    }

    /// Ends the gesture, dropping on `target` when there is one.
    fn finish(&mut self, target: Option<Status>) -> DragOutcome {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Dragging(session) => match target {
                Some(to) if to != session.origin => DragOutcome::Move {
                    task_id: session.task_id,
                    from: session.origin,
                    to,
                },
                _ => DragOutcome::Cancelled,
            },
            Gesture::Armed { .. } => DragOutcome::Cancelled,
            Gesture::Idle => DragOutcome::Pending,
        }
    }

    /// Drops everything without producing a move.
    pub fn cancel(&mut self) -> DragOutcome {
        if self.is_idle() {
            return DragOutcome::Pending;
        }
        log::debug!("Drag cancelled");
        self.finish(None)
    }

    // Mouse

    pub fn drag_start(&mut self, task_id: &str, origin: Status) -> bool {
        self.begin(task_id, origin, Modality::Mouse)
    }

    pub fn drag_enter(&mut self, column: Status) {
        if let Gesture::Dragging(session) = &mut self.gesture {
            session.hovered = Some(column);
        }
    }

    /// Clears the hovered column only once `point` is really outside `area`,
    /// so passing over the cards inside a column does not flicker.
    pub fn drag_leave(&mut self, column: Status, area: Rect, point: Point) {
        if let Gesture::Dragging(session) = &mut self.gesture {
            if session.hovered == Some(column) && !contains(area, point) {
                session.hovered = None;
            }
        }
    }

    pub fn drop_on(&mut self, column: Status) -> DragOutcome {
        match self.gesture {
            Gesture::Dragging(_) => self.finish(Some(column)),
            _ => DragOutcome::Pending,
        }
    }

    /// Drag released outside every column.
    pub fn drag_end(&mut self) -> DragOutcome {
        self.cancel()
    }

    /// Tracks the pointer across columns, turning movement into enter/leave.
    pub fn pointer_moved(&mut self, point: Point, columns: &[(Status, Rect)]) {
        let previous = match &self.gesture {
            Gesture::Dragging(session) => session.hovered,
            _ => return,
        };
        let current = column_at(columns, point);
        if previous == current {
            return;
        }
        if let Some(prev) = previous {
            if let Some((_, area)) = columns.iter().find(|(status, _)| *status == prev) {
                self.drag_leave(prev, *area, point);
            }
        }
        if let Some(next) = current {
            self.drag_enter(next);
        }
    }

    // Touch

    pub fn touch_start(&mut self, task_id: &str, origin: Status, point: Point, now: Instant) {
        if !self.is_idle() {
            return;
        }
        self.gesture = Gesture::Armed {
            task_id: task_id.to_string(),
            origin,
            start: point,
            since: now,
        };
    }

    /// Turns an armed press into a drag once it has been held long enough.
    /// Returns true on the tick the drag starts.
    pub fn poll_long_press(&mut self, now: Instant) -> bool {
        let (task_id, origin, start) = match &self.gesture {
            Gesture::Armed {
                task_id,
                origin,
                start,
                since,
            } if now.duration_since(*since) >= self.long_press => {
                (task_id.clone(), *origin, *start)
            }
            _ => return false,
        };
        log::debug!("Long press on task {}", task_id);
        self.gesture = Gesture::Dragging(DragSession {
            task_id,
            origin,
            hovered: None,
            modality: Modality::Touch,
            ghost: Some(start),
        });
        true
    }

    pub fn touch_move(&mut self, point: Point, now: Instant, columns: &[(Status, Rect)]) {
        self.poll_long_press(now);
        if self.is_armed() {
            // Moved before the long press fired: the user is scrolling.
            self.gesture = Gesture::Idle;
            return;
        }
        match &mut self.gesture {
            Gesture::Dragging(session) if session.modality == Modality::Touch => {
                session.ghost = Some(point);
            }
            _ => return,
        }
        self.pointer_moved(point, columns);
    }

    pub fn touch_end(&mut self, point: Point, now: Instant, columns: &[(Status, Rect)]) -> DragOutcome {
        let tap = match &self.gesture {
            Gesture::Armed { task_id, since, .. } if now.duration_since(*since) < self.long_press => {
                Some(task_id.clone())
            }
            _ => None,
        };
        if let Some(task_id) = tap {
            self.gesture = Gesture::Idle;
            return DragOutcome::Tap(task_id);
        }

        self.poll_long_press(now);
        let touch_drag = self
            .session()
            .is_some_and(|s| s.modality == Modality::Touch);
        if touch_drag {
            self.finish(column_at(columns, point))
        } else {
            DragOutcome::Pending
        }
    }

    // Keyboard

    /// Routes a key press during a drag. `None` means the key was not used and
    /// normal navigation should handle it.
    pub fn handle_key(
        &mut self,
        code: KeyCode,
        focused: Option<(&str, Status)>,
        layout: BoardLayout,
    ) -> Option<DragOutcome> {
        if self.is_idle() {
            return match (code, focused) {
                (KeyCode::Char(' '), Some((task_id, origin))) => {
                    self.begin(task_id, origin, Modality::Keyboard);
                    if let Gesture::Dragging(session) = &mut self.gesture {
                        session.hovered = Some(origin);
                    }
                    Some(DragOutcome::Pending)
                }
                _ => None,
            };
        }

        if code == KeyCode::Esc {
            return Some(self.cancel());
        }

        let keyboard_drag = self
            .session()
            .is_some_and(|s| s.modality == Modality::Keyboard);
        if !keyboard_drag {
            // Pointer drags only listen for Escape; everything else is swallowed.
            return Some(DragOutcome::Pending);
        }

        let step: isize = match (code, layout) {
            (KeyCode::Left, BoardLayout::Horizontal) | (KeyCode::Up, BoardLayout::Stacked) => -1,
            (KeyCode::Right, BoardLayout::Horizontal) | (KeyCode::Down, BoardLayout::Stacked) => 1,
            (KeyCode::Char(' '), _) => {
                let target = self.session().map(|s| s.hovered.unwrap_or(s.origin));
                return Some(self.finish(target));
            }
            _ => 0,
        };

        if step != 0 {
            if let Gesture::Dragging(session) = &mut self.gesture {
                let current = session.hovered.unwrap_or(session.origin).index() as isize;
                let last = Status::ALL.len() as isize - 1;
                let next = (current + step).clamp(0, last) as usize;
                session.hovered = Some(Status::from_index(next));
            }
        }
        // Tab, BackTab and any other key stay with the drag.
        Some(DragOutcome::Pending)
    }
}

pub fn contains(area: Rect, point: Point) -> bool {
    point.x >= area.x && point.x < area.right() && point.y >= area.y && point.y < area.bottom()
}

pub fn column_at(columns: &[(Status, Rect)], point: Point) -> Option<Status> {
    columns
        .iter()
        .find(|(_, area)| contains(*area, point))
        .map(|(status, _)| *status)
}

/// Rows to scroll the page by when the pointer is near the top or bottom of
/// `viewport`. Negative scrolls up. The step grows the deeper the pointer is
/// in the edge zone and is capped.
pub fn edge_scroll(pointer_y: u16, viewport: Rect) -> i32 {
    if viewport.height == 0 {
        return 0;
    }
    let zone = EDGE_ZONE.min(viewport.height / 2);
    let top_edge = viewport.y + zone;
    let bottom_edge = viewport.bottom().saturating_sub(zone);

    let depth = if pointer_y < top_edge {
        -(i32::from(top_edge) - i32::from(pointer_y.max(viewport.y)))
    } else if pointer_y >= bottom_edge {
        i32::from(pointer_y.min(viewport.bottom().saturating_sub(1))) - i32::from(bottom_edge) + 1
    } else {
        0
    };
    (depth * SCROLL_PER_ROW).clamp(-MAX_SCROLL_STEP, MAX_SCROLL_STEP)
}
