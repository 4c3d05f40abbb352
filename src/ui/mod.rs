pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState};

/// Draw the whole screen for `app`.
pub fn render(f: &mut Frame, app: &AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let body = if app.show_keybinds {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(root[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(root[1])
    };

    render_header(f, root[0], app);

    if let Some(err) = &app.load_error {
        components::render_load_error(f, body[0], app, err);
    } else {
        users::render_users_table(f, body[0], app);
    }
    if app.show_keybinds && body.len() > 1 {
        components::render_keybinds_panel(f, body[1], app);
    }

    users::render_pager_footer(f, root[2], app);
    components::render_status_bar(f, root[3], app);

    if app.modal.is_some() {
        render_modal(f, f.area(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let prompt = match app.input_mode {
        InputMode::Search => format!("Search: {}_", app.search_term),
        _ if !app.search_term.is_empty() => format!("Search: {}", app.search_term),
        _ => "Press / to search".to_string(),
    };
    let chips = app.filters.summary();
    let chips = if chips.is_empty() {
        String::new()
    } else {
        format!("  filters:[{}]", chips.join(","))
    };
    let sort = format!(
        "  sort: {} {}",
        app.filters.sort_by.label(),
        app.filters.sort_order.arrow()
    );
    let loading = if app.loading { "  loading..." } else { "" };
    let p = Paragraph::new(format!("{prompt}{chips}{sort}{loading}"))
        .block(
            Block::default()
                .title("User Management Dashboard")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, area);
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(state) = &app.modal else { return };
    match state {
        ModalState::UserForm(form) => users::render_user_form(f, area, app, form),
        ModalState::FilterMenu(form) => users::render_filter_form(f, area, app, form),
        ModalState::DeleteConfirm { label, yes, .. } => {
            users::render_delete_confirm(f, area, app, label, *yes)
        }
        ModalState::Help { scroll } => components::render_help_modal(f, area, app, *scroll),
    }
}
