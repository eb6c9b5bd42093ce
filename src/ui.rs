use crate::app::{App, DeleteTarget, Overlay, Screen, ToastKind};
use crate::board::{BoardGeometry, CardView, ColumnView};
use crate::drag::{BoardLayout, Modality};
use crate::form::{FieldKind, Form};
use crate::models::{initials, Priority, Task};
use crate::summary::{greeting, summarize};
use chrono::{Local, Timelike};
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::str::FromStr;
use std::time::Instant;

const CARD_HEIGHT: u16 = 5;
const GHOST_WIDTH: u16 = 28;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    centered_rect_absolute(r.width * percent_x / 100, r.height * percent_y / 100, r)
}

fn hex_color(hex: &str) -> Color {
    Color::from_str(hex).unwrap_or(Color::Gray)
}

fn category_style(category: &str) -> Style {
    let bg = match category {
        "User Story" => Color::Rgb(0, 56, 255),
        "Technical Task" => Color::Rgb(31, 215, 193),
        _ => Color::DarkGray,
    };
    Style::default().bg(bg).fg(Color::White)
}

fn priority_span(priority: Priority) -> Span<'static> {
    match priority {
        Priority::Urgent => Span::styled("▲▲", Style::default().fg(Color::Red)),
        Priority::Medium => Span::styled("==", Style::default().fg(Color::Yellow)),
        Priority::Low => Span::styled("▼▼", Style::default().fg(Color::Green)),
    }
}

fn legend(keys: &[(&str, &str)]) -> Text<'static> {
    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, action)| {
            [
                Span::styled(format!(" {} ", key), Style::default().fg(Color::Red)),
                Span::raw(format!(": {} ", action)),
            ]
        })
        .collect();
    Text::from(Line::from(spans))
}

fn get_legend(app: &App) -> Text<'static> {
    match &app.overlay {
        Overlay::TaskDetail { .. } => {
            return legend(&[
                ("j/k", "Subtask"),
                ("Space", "Toggle Subtask"),
                ("e", "Edit"),
                ("d", "Delete"),
                ("Esc", "Close"),
            ])
        }
        Overlay::TaskForm { .. } | Overlay::ContactForm { .. } => {
            return legend(&[
                ("Tab", "Next Field"),
                ("Space", "Toggle/Open"),
                ("←/→", "Choose"),
                ("Enter", "Submit"),
                ("Esc", "Cancel"),
            ])
        }
        Overlay::ConfirmDelete(_) | Overlay::ConfirmReset => {
            return legend(&[("y", "Yes"), ("n", "No")])
        }
        Overlay::None => {}
    }
    if app.drag.session().is_some() {
        return legend(&[("←/→/↑/↓", "Choose Column"), ("Space", "Drop"), ("Esc", "Cancel")]);
    }
    match app.screen {
        Screen::Login => legend(&[
            ("Tab", "Next Field"),
            ("Enter", "Log in"),
            ("Ctrl+G", "Guest Log in"),
            ("Ctrl+N", "Sign up"),
            ("Ctrl+C", "Quit"),
        ]),
        Screen::SignUp => legend(&[("Tab", "Next Field"), ("Enter", "Sign up"), ("Esc", "Back")]),
        Screen::Summary => legend(&[
            ("q", "Quit"),
            ("b", "Board"),
            ("c", "Contacts"),
            ("r", "Reload"),
            ("R", "Reset Demo Data"),
            ("L", "Log out"),
        ]),
        Screen::Board if app.searching => legend(&[("Enter", "Done"), ("Esc", "Clear Search")]),
        Screen::Board => legend(&[
            ("q", "Quit"),
            ("h/j/k/l", "Move"),
            ("Space", "Pick Up"),
            ("Enter", "Details"),
            ("a", "Add Task"),
            ("e", "Edit"),
            ("d", "Delete"),
            ("/", "Search"),
            ("s", "Summary"),
            ("c", "Contacts"),
        ]),
        Screen::Contacts => legend(&[
            ("q", "Quit"),
            ("j/k", "Select"),
            ("a", "Add Contact"),
            ("e", "Edit"),
            ("d", "Delete"),
            ("b", "Board"),
            ("s", "Summary"),
        ]),
    }
}

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = app.ui.tick_rate();
    loop {
        terminal.draw(|f| draw(f, app))?;

        // Handle input
        if event::poll(tick_rate)? {
            match event::read()? {
                CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key).await {
                        return Ok(());
                    }
                }
                CEvent::Mouse(mouse) => app.handle_mouse(mouse).await,
                _ => {}
            }
        }
        app.tick(Instant::now());
    }
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();
    app.viewport_width = size.width;

    if app.splash_until.is_some() {
        render_splash(f, size);
        return;
    }

    // Split the main layout into header, body and footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(size);

    render_header(f, app, chunks[0]);
    let body_chunk = chunks[1];
    match app.screen {
        Screen::Login => render_form(f, &app.login_form, centered_rect_absolute(50, 14, body_chunk)),
        Screen::SignUp => render_form(f, &app.signup_form, centered_rect_absolute(50, 19, body_chunk)),
        Screen::Summary => render_summary(f, app, body_chunk),
        Screen::Board => render_board(f, app, body_chunk),
        Screen::Contacts => render_contacts(f, app, body_chunk),
    }

    match &app.overlay {
        Overlay::None => {}
        Overlay::TaskDetail { id, cursor } => {
            if let Some(task) = app.workspace.task(id) {
                render_detail(f, app, task, *cursor, centered_rect(70, 80, body_chunk));
            }
        }
        Overlay::TaskForm { form, .. } => render_form(f, form, centered_rect(70, 90, body_chunk)),
        Overlay::ContactForm { form, .. } => {
            render_form(f, form, centered_rect_absolute(50, 12, body_chunk))
        }
        Overlay::ConfirmDelete(target) => {
            let what = match target {
                DeleteTarget::Task(_) => "this task",
                DeleteTarget::Contact(_) => "this contact",
            };
            render_confirm(f, &format!("Delete {}? (y/n)", what), body_chunk);
        }
        Overlay::ConfirmReset => render_confirm(
            f,
            "Replace all tasks and contacts with demo data? (y/n)",
            body_chunk,
        ),
    }

    if let Some(toast) = &app.toast {
        render_toast(f, &toast.message, toast.kind, body_chunk);
    }

    // Render the legend in the footer
    let legend = Paragraph::new(get_legend(app))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(legend, chunks[2]);
}

fn render_splash(f: &mut Frame, size: Rect) {
    let area = centered_rect_absolute(20, 5, size);
    let logo = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "J O I N",
            Style::default()
                .fg(Color::Rgb(42, 54, 71))
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_type(BorderType::Thick));
    f.render_widget(logo, area);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        " Join ",
        Style::default().fg(Color::White).bg(Color::Rgb(42, 54, 71)).add_modifier(Modifier::BOLD),
    )];
    if app.user.is_some() {
        for (screen, label) in [
            (Screen::Summary, "Summary"),
            (Screen::Board, "Board"),
            (Screen::Contacts, "Contacts"),
        ] {
            let style = if app.screen == screen {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!("  {}", label), style));
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);

    if let Some(user) = &app.user {
        let badge = Paragraph::new(Span::styled(
            format!(" {} ", initials(&user.name)),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Right);
        f.render_widget(badge, area);
    }
}

fn render_summary(f: &mut Frame, app: &App, area: Rect) {
    let summary = summarize(&app.workspace.tasks);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(5), Constraint::Length(5)].as_ref())
        .split(chunks[0]);
    let halves = |r: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
            .split(r)
    };

    let tile = |value: String, label: &str| {
        Paragraph::new(vec![
            Line::from(Span::styled(value, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(label.to_string()),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
    };

    let top = halves(rows[0]);
    f.render_widget(tile(summary.to_do.to_string(), "To-do"), top[0]);
    f.render_widget(tile(summary.done.to_string(), "Done"), top[1]);

    let deadline = summary
        .next_deadline
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| "No upcoming deadline".to_string());
    let urgent = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(summary.urgent.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  Urgent"),
        ]),
        Line::from(vec![
            Span::styled(deadline, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  Upcoming Deadline"),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(urgent, rows[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(33),
                Constraint::Percentage(34),
                Constraint::Percentage(33),
            ]
            .as_ref(),
        )
        .split(rows[2]);
    f.render_widget(tile(summary.total().to_string(), "Tasks in Board"), bottom[0]);
    f.render_widget(tile(summary.in_progress.to_string(), "Tasks in Progress"), bottom[1]);
    f.render_widget(tile(summary.await_feedback.to_string(), "Awaiting Feedback"), bottom[2]);

    let name = app
        .user
        .as_ref()
        .filter(|u| !u.guest)
        .map(|u| u.name.clone())
        .unwrap_or_default();
    let salutation = greeting(Local::now().hour());
    let mut lines = vec![Line::from(""), Line::from(format!("{},", salutation))];
    if !name.is_empty() {
        lines.push(Line::from(Span::styled(
            name,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
    }
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Summary")),
        chunks[1],
    );
}

/// Offset of a `len` long window that keeps `start..end` visible, moving as
/// little as possible from `offset`.
fn scroll_into_view(offset: usize, start: usize, end: usize, len: usize) -> usize {
    if start < offset {
        start
    } else if end > offset + len {
        end.saturating_sub(len)
    } else {
        offset
    }
}

fn column_height(column: &ColumnView, shadow: bool) -> u16 {
    let items = column.cards.len() + usize::from(shadow);
    2 + items.max(1) as u16 * CARD_HEIGHT
}

fn render_board(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)].as_ref())
        .split(area);

    let search_style = if app.searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let search = if app.search.is_empty() && !app.searching {
        "Find Task (/)".to_string()
    } else {
        format!("Find Task: {}{}", app.search, if app.searching { "_" } else { "" })
    };
    f.render_widget(Paragraph::new(Span::styled(search, search_style)), chunks[0]);

    let viewport = chunks[1];
    let view = app.view();
    let shadow = app.drag.shadow_column();
    let mut geometry = BoardGeometry {
        viewport,
        ..BoardGeometry::default()
    };
    // Pointer drags scroll on their own.
    let follow = app.follow_focus
        && app
            .drag
            .session()
            .map_or(true, |s| s.modality == Modality::Keyboard);

    match app.layout() {
        BoardLayout::Horizontal => {
            let areas = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 4); 4].as_ref())
                .split(viewport);
            for (column, &column_area) in view.iter().zip(areas.iter()) {
                let index = column.status.index();
                let visible = (column_area.height.saturating_sub(2) / CARD_HEIGHT) as usize;
                let items = column.cards.len() + usize::from(shadow == Some(column.status));
                let mut offset = app.column_scroll[index];
                if follow && index == app.focus.0 && visible > 0 {
                    offset = scroll_into_view(offset, app.focus.1, app.focus.1 + 1, visible);
                }
                let offset = offset.min(items.saturating_sub(visible));
                app.column_scroll[index] = offset;
                render_column(f, app, column, column_area, offset, &mut geometry);
            }
            geometry.content_height = viewport.height;
            app.board_scroll = 0;
        }
        BoardLayout::Stacked => {
            let heights: Vec<u16> = view
                .iter()
                .map(|c| column_height(c, shadow == Some(c.status)))
                .collect();
            geometry.content_height = heights.iter().sum();
            if follow {
                let tops: Vec<usize> = heights
                    .iter()
                    .scan(0usize, |acc, h| {
                        let top = *acc;
                        *acc += usize::from(*h);
                        Some(top)
                    })
                    .collect();
                let span = usize::from(viewport.height);
                let target = match app.drag.selected_column() {
                    Some(selected) => {
                        let top = tops[selected];
                        Some((top, top + usize::from(heights[selected]).min(span)))
                    }
                    None => view.get(app.focus.0).map(|column| {
                        let top = tops[app.focus.0];
                        if column.cards.is_empty() {
                            (top, top + usize::from(heights[app.focus.0]).min(span))
                        } else {
                            // The focused card plus the border rows around it.
                            let start = top + app.focus.1 * usize::from(CARD_HEIGHT);
                            (start, start + usize::from(CARD_HEIGHT) + 2)
                        }
                    }),
                };
                if let Some((start, end)) = target {
                    let offset = scroll_into_view(usize::from(app.board_scroll), start, end, span);
                    app.board_scroll = u16::try_from(offset).unwrap_or(u16::MAX);
                }
            }
            app.board_scroll = app.board_scroll.min(geometry.max_scroll());

            let mut top = i32::from(viewport.y) - i32::from(app.board_scroll);
            for (column, height) in view.iter().zip(heights) {
                let full_top = top;
                top += i32::from(height);
                let visible_top = full_top.max(i32::from(viewport.y));
                let visible_bottom = top.min(i32::from(viewport.bottom()));
                if visible_bottom <= visible_top {
                    continue;
                }
                let column_area = Rect::new(
                    viewport.x,
                    visible_top as u16,
                    viewport.width,
                    (visible_bottom - visible_top) as u16,
                );
                let cut = (visible_top - full_top) as usize;
                let skip = cut.div_ceil(CARD_HEIGHT as usize);
                render_column(f, app, column, column_area, skip, &mut geometry);
            }
        }
    }

    if let Some(ghost) = app.drag.ghost() {
        let title = app
            .drag
            .dragged_task()
            .and_then(|id| app.workspace.task(id))
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let width = GHOST_WIDTH.min(area.width);
        let x = ghost.x.min(area.right().saturating_sub(width));
        let y = ghost.y.min(area.bottom().saturating_sub(3));
        let rect = Rect::new(x, y, width, 3.min(area.height));
        f.render_widget(Clear, rect);
        f.render_widget(
            Paragraph::new(title).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            rect,
        );
    }

    app.geometry = geometry;
}

fn render_column(
    f: &mut Frame,
    app: &App,
    column: &ColumnView,
    area: Rect,
    skip: usize,
    geometry: &mut BoardGeometry,
) {
    let shadow = app.drag.shadow_column() == Some(column.status);
    let selected = app.drag.selected_column() == Some(column.status.index());
    let border_style = if shadow || selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {} ({}) ", column.status.label(), column.cards.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);
    geometry.columns.push((column.status, area));

    if column.cards.is_empty() && !shadow {
        let empty = Paragraph::new(column.empty_label())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Plain));
        let rect = Rect::new(inner.x, inner.y, inner.width, CARD_HEIGHT.min(inner.height));
        f.render_widget(empty, rect);
        return;
    }

    let dragged = app.drag.dragged_task();
    let mut y = inner.y;
    for (row, card) in column.cards.iter().enumerate().skip(skip) {
        if y + CARD_HEIGHT > inner.bottom() {
            return;
        }
        let rect = Rect::new(inner.x, y, inner.width, CARD_HEIGHT);
        let focused = app.focus == (column.status.index(), row);
        render_card(f, card, rect, focused, dragged == Some(card.id.as_str()));
        geometry.cards.push((card.id.clone(), column.status, rect));
        y += CARD_HEIGHT;
    }

    if shadow && y + CARD_HEIGHT <= inner.bottom() {
        let placeholder = Paragraph::new("Drop here")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(placeholder, Rect::new(inner.x, y, inner.width, CARD_HEIGHT));
    }
}

fn render_card(f: &mut Frame, card: &CardView, area: Rect, focused: bool, dragged: bool) {
    let border_style = if dragged {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::DIM)
    } else if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if dragged { BorderType::Double } else { BorderType::Rounded })
        .border_style(border_style);

    let mut people: Vec<Span> = card
        .assignees
        .iter()
        .map(|a| Span::styled(format!("{} ", a.initials), Style::default().fg(hex_color(&a.color))))
        .collect();
    if card.subtasks_total > 0 {
        people.push(Span::raw(format!(
            " {}/{} Subtasks",
            card.subtasks_done, card.subtasks_total
        )));
    }

    let mut text_style = Style::default();
    if dragged {
        text_style = text_style.add_modifier(Modifier::ITALIC | Modifier::DIM);
    }
    let lines = vec![
        Line::from(vec![
            Span::styled(format!(" {} ", card.category), category_style(&card.category)),
            Span::raw(" "),
            priority_span(card.priority),
        ]),
        Line::from(vec![
            Span::styled(card.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!(" {}", card.excerpt), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(people),
    ];
    f.render_widget(Paragraph::new(lines).style(text_style).block(block), area);
}

fn render_detail(f: &mut Frame, app: &App, task: &Task, cursor: usize, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(format!(" {} ", task.category), category_style(&task.category))),
        Line::from(""),
        Line::from(Span::styled(task.title.clone(), bold.fg(Color::Cyan))),
        Line::from(task.description.clone()),
        Line::from(""),
    ];

    let due = task
        .due_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "No due date".to_string());
    lines.push(Line::from(vec![Span::styled("Due date: ", bold), Span::raw(due)]));
    lines.push(Line::from(vec![
        Span::styled("Priority: ", bold),
        Span::raw(format!("{} ", task.priority.label())),
        priority_span(task.priority),
    ]));

    lines.push(Line::from(Span::styled("Assigned To:", bold)));
    let contacts = app.contacts();
    let assigned: Vec<_> = task
        .assigned_to
        .iter()
        .filter_map(|id| contacts.iter().find(|c| &c.id == id))
        .collect();
    if assigned.is_empty() {
        lines.push(Line::from("  Nobody assigned"));
    }
    for contact in assigned {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {} ", contact.initials()),
                Style::default().fg(hex_color(&contact.color)).add_modifier(Modifier::BOLD),
            ),
            Span::raw(contact.name.clone()),
        ]));
    }

    lines.push(Line::from(Span::styled("Subtasks:", bold)));
    if task.subtasks.is_empty() {
        lines.push(Line::from("  No subtasks"));
    }
    for (i, subtask) in task.subtasks.iter().enumerate() {
        let mark = if subtask.completed { "[x]" } else { "[ ]" };
        let style = if i == cursor {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!("  {} {}", mark, subtask.content), style)));
    }

    if !task.attachments.is_empty() {
        lines.push(Line::from(Span::styled("Attachments:", bold)));
        for attachment in task.attachments.values() {
            lines.push(Line::from(format!(
                "  {} ({} KB)",
                attachment.name,
                attachment.size.div_ceil(1024)
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Task Details"))
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn render_contacts(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let contacts = app.contact_list();
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0;
    let mut letter = None;
    for (i, contact) in contacts.iter().enumerate() {
        let first = contact.name.chars().next().map(|c| c.to_ascii_uppercase());
        if first != letter {
            letter = first;
            lines.push(Line::from(Span::styled(
                first.map(String::from).unwrap_or_default(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }
        if i == app.contact_cursor {
            selected_line = lines.len();
        }
        let style = if i == app.contact_cursor {
            Style::default().fg(Color::White).bg(Color::Rgb(42, 54, 71))
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {} ", contact.initials()),
                Style::default().fg(hex_color(&contact.color)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(contact.name.clone(), style),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from("No contacts yet"));
    }
    let visible = chunks[0].height.saturating_sub(2) as usize;
    let scroll = selected_line.saturating_sub(visible.saturating_sub(1)) as u16;
    f.render_widget(
        Paragraph::new(lines)
            .scroll((scroll, 0))
            .block(Block::default().borders(Borders::ALL).title("Contacts")),
        chunks[0],
    );

    let detail_block = Block::default().borders(Borders::ALL).title("Contact Information");
    match contacts.get(app.contact_cursor) {
        Some(contact) => {
            let bold = Style::default().add_modifier(Modifier::BOLD);
            let lines = vec![
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", contact.initials()),
                        Style::default().bg(hex_color(&contact.color)).fg(Color::White),
                    ),
                    Span::raw(" "),
                    Span::styled(contact.name.clone(), bold),
                ]),
                Line::from(""),
                Line::from(Span::styled("Email", bold)),
                Line::from(Span::styled(contact.email.clone(), Style::default().fg(Color::Cyan))),
                Line::from(""),
                Line::from(Span::styled("Phone", bold)),
                Line::from(contact.phone.clone()),
            ];
            f.render_widget(
                Paragraph::new(lines).block(detail_block).wrap(Wrap { trim: true }),
                chunks[1],
            );
        }
        None => f.render_widget(Paragraph::new("").block(detail_block), chunks[1]),
    }
}

fn render_form(f: &mut Frame, form: &Form, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    let mut focus_line = 0;
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        if focused {
            focus_line = lines.len();
        }
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(field.label.clone(), label_style)));

        let cursor = if focused && matches!(field.kind, FieldKind::Text | FieldKind::Secret | FieldKind::List(_)) {
            "_"
        } else {
            ""
        };
        lines.push(Line::from(format!("  {}{}", field.display(), cursor)));

        match &field.kind {
            FieldKind::MultiSelect {
                options,
                selected,
                cursor,
                open: true,
            } => {
                for (j, (_, label)) in options.iter().enumerate() {
                    let mark = if selected.contains(&j) { "[x]" } else { "[ ]" };
                    let style = if j == *cursor {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default()
                    };
                    lines.push(Line::from(Span::styled(format!("    {} {}", mark, label), style)));
                }
            }
            FieldKind::List(items) => {
                for item in items {
                    lines.push(Line::from(format!("    • {}", item)));
                }
            }
            _ => {}
        }

        match &field.error {
            Some(error) => lines.push(Line::from(Span::styled(
                format!("  {}", error),
                Style::default().fg(Color::Red),
            ))),
            None => lines.push(Line::from("")),
        }
    }

    let visible = area.height.saturating_sub(2) as usize;
    let scroll = (focus_line + 3).saturating_sub(visible) as u16;
    let paragraph = Paragraph::new(lines)
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title(form.title.clone())
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        )
        .style(Style::default().fg(Color::White));
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn render_confirm(f: &mut Frame, message: &str, area: Rect) {
    let width = (message.chars().count() as u16 + 4).min(area.width);
    let popup_area = centered_rect_absolute(width, 3, area);
    let popup = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).style(Style::default().fg(Color::Yellow)));
    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

fn render_toast(f: &mut Frame, message: &str, kind: ToastKind, area: Rect) {
    let width = (message.chars().count() as u16 + 4).min(area.width);
    let rect = Rect::new(
        area.right().saturating_sub(width),
        area.bottom().saturating_sub(3),
        width,
        3.min(area.height),
    );
    let color = match kind {
        ToastKind::Info => Color::Green,
        ToastKind::Error => Color::Red,
    };
    let toast = Paragraph::new(message.to_string())
        .block(Block::default().borders(Borders::ALL).style(Style::default().fg(color)));
    f.render_widget(Clear, rect);
    f.render_widget(toast, rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DataStore;
    use crate::config::UiConfig;
    use crate::error::Result;
    use crate::models::Status;
    use crate::session::SessionStore;
    use async_trait::async_trait;
    use ratatui::backend::TestBackend;
    use serde_json::Value;
    use std::sync::Arc;

    struct NoStore;

    #[async_trait]
    impl DataStore for NoStore {
        async fn get_data(&self, _path: &str) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
        async fn add_data(&self, _path: &str, item: Value) -> Result<Option<Value>> {
            Ok(Some(item))
        }
        async fn update_data(&self, _path: &str, _id: &str, _patch: Value) -> Result<()> {
            Ok(())
        }
        async fn delete_data(&self, _path: &str, _id: &str) -> Result<()> {
            Ok(())
        }
        async fn put_data(&self, _path: &str, _item: Value) -> Result<()> {
            Ok(())
        }
    }

    fn board_app(width: u16) -> App {
        let dir = std::env::temp_dir().join(format!("join-ui-{}", uuid::Uuid::new_v4()));
        let session = SessionStore::open(&dir).unwrap();
        let mut app = App::new(Arc::new(NoStore), session, UiConfig::default());
        app.splash_until = None;
        app.workspace.tasks = crate::seed::demo_tasks();
        app.workspace.contacts = crate::seed::demo_contacts();
        app.screen = Screen::Board;
        app.viewport_width = width;
        app
    }

    #[test]
    fn test_draw_records_board_geometry() {
        let mut app = board_app(120);
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        assert_eq!(app.geometry.columns.len(), 4);
        assert_eq!(app.geometry.cards.len(), 5);
        let (id, status, rect) = &app.geometry.cards[0];
        let center = crate::drag::Point::new(rect.x + 2, rect.y + 2);
        assert_eq!(app.geometry.card_at(center), Some((id.as_str(), *status)));
    }

    #[test]
    fn test_narrow_terminal_stacks_columns() {
        let mut app = board_app(60);
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        assert!(app.geometry.content_height > app.geometry.viewport.height);
        let first = app.geometry.columns[0];
        assert_eq!(first.0, Status::ToDo);
        assert_eq!(first.1.width, 60);
    }

    #[test]
    fn test_scroll_into_view_moves_the_least() {
        assert_eq!(scroll_into_view(0, 2, 3, 6), 0);
        assert_eq!(scroll_into_view(0, 11, 12, 6), 6);
        assert_eq!(scroll_into_view(6, 3, 4, 6), 3);
        assert_eq!(scroll_into_view(46, 50, 57, 16), 46);
    }
}
