use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::{AppState, FilterForm, FormMode, FormStatus, UserForm};
use crate::error::Field;
use crate::pager::paginate;
use crate::query::SortField;

use super::components::centered_rect;

const COLUMNS: [(SortField, &str); 4] = [
    (SortField::Id, "ID"),
    (SortField::FirstName, "NAME"),
    (SortField::Email, "EMAIL"),
    (SortField::Department, "DEPARTMENT"),
];

/// Table of the current page with the sorted column marked.
pub fn render_users_table(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Users")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));

    let rows_on_page = app.page_items();
    if rows_on_page.is_empty() {
        let msg = if app.loading {
            "Loading users..."
        } else if app.store.is_empty() {
            "No users yet. Press n to create one."
        } else {
            "No users match the current search and filters. Press c to clear."
        };
        let p = Paragraph::new(msg)
            .style(Style::default().fg(app.theme.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let rows = rows_on_page.iter().enumerate().map(|(i, u)| {
        let style = if i == app.selected_row {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(vec![
            Cell::from(u.id.to_string()),
            Cell::from(u.full_name()),
            Cell::from(u.email.clone()),
            Cell::from(u.department.to_string()),
        ])
        .style(style)
    });

    let header = Row::new(COLUMNS.iter().map(|(field, title)| {
        // last name sorts under the name column too
        let active = app.filters.sort_by == *field
            || (*field == SortField::FirstName && app.filters.sort_by == SortField::LastName);
        if active {
            format!("{title} {}", app.filters.sort_order.arrow())
        } else {
            (*title).to_string()
        }
    }))
    .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(30),
        Constraint::Percentage(40),
        Constraint::Percentage(20),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}

/// "Showing X to Y of Z results" plus the page position.
pub fn render_pager_footer(f: &mut Frame, area: Rect, app: &AppState) {
    let visible = app.visible();
    let page = paginate(&visible, app.items_per_page.get(), app.current_page);
    let range = match page.display_range() {
        Some((from, to)) => format!("Showing {from} to {to} of {} results", page.total_items),
        None => "No results".to_string(),
    };
    let msg = format!(
        " {range}  |  Page {} of {}  |  Rows per page: {}",
        app.current_page, page.total_pages, app.items_per_page
    );
    let p = Paragraph::new(msg).style(Style::default().fg(app.theme.muted));
    f.render_widget(p, area);
}

fn marker(selected: bool) -> &'static str {
    if selected { "▶" } else { " " }
}

/// Create/edit form with inline validation messages.
pub fn render_user_form(f: &mut Frame, area: Rect, app: &AppState, form: &UserForm) {
    let rect = centered_rect(64, 16, area);
    let title = match form.mode {
        FormMode::Create => "Create New User".to_string(),
        FormMode::Edit(id) => format!("Edit User #{id}"),
    };
    let error_style = Style::default().fg(app.theme.error);

    let mut lines: Vec<Line> = Vec::new();
    if form.status == FormStatus::Loading {
        lines.push(Line::raw("Loading user..."));
    } else {
        for (idx, field) in Field::ALL.iter().enumerate() {
            let value = match field {
                Field::FirstName => form.input.first_name.clone(),
                Field::LastName => form.input.last_name.clone(),
                Field::Email => form.input.email.clone(),
                Field::Department => match form.input.department {
                    Some(d) => format!("< {d} >"),
                    None => "< Select a department >".to_string(),
                },
            };
            lines.push(Line::from(vec![
                Span::raw(format!("{} {:<11}", marker(form.focus == idx), format!("{}:", field.label()))),
                Span::styled(value, Style::default().fg(app.theme.text)),
            ]));
            match form.errors.get(*field) {
                Some(msg) => lines.push(Line::from(Span::styled(format!("    {msg}"), error_style))),
                None => lines.push(Line::raw("")),
            }
        }
        let submit = match (form.status, form.mode) {
            (FormStatus::Submitting, _) => "Saving...",
            (_, FormMode::Create) => "[ Create User ]",
            (_, FormMode::Edit(_)) => "[ Update User ]",
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{} ", marker(form.focus == UserForm::SUBMIT))),
            Span::styled(submit, Style::default().add_modifier(Modifier::BOLD)),
        ]));
        if let Some(err) = &form.server_error {
            lines.push(Line::from(Span::styled(err.clone(), error_style)));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Tab/Shift+Tab: move  Left/Right: department  Enter: next/submit  Esc: cancel",
        Style::default().fg(app.theme.muted),
    )));

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Filter and sort dialog.
pub fn render_filter_form(f: &mut Frame, area: Rect, app: &AppState, form: &FilterForm) {
    let rect = centered_rect(56, 14, area);
    let d = &form.draft;
    let department = d.department.map_or("All".to_string(), |d| d.to_string());
    let rows = [
        format!("First name:  {}", d.first_name),
        format!("Last name:   {}", d.last_name),
        format!("Email:       {}", d.email),
        format!("Department:  < {department} >"),
        format!("Sort by:     < {} >", d.sort_by.label()),
        format!("Order:       < {} {} >", d.sort_order.as_str(), d.sort_order.arrow()),
        "[ Apply ]".to_string(),
        "[ Reset ]".to_string(),
    ];
    let mut lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            let style = if idx == form.focus {
                Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text)
            };
            Line::from(Span::styled(format!("{} {text}", marker(idx == form.focus)), style))
        })
        .collect();
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Tab: move  Left/Right: change  Enter: select  Esc: cancel",
        Style::default().fg(app.theme.muted),
    )));

    let p = Paragraph::new(lines).block(
        Block::default()
            .title("Filter & Sort")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Yes/No gate before deleting `label`.
pub fn render_delete_confirm(f: &mut Frame, area: Rect, app: &AppState, label: &str, yes: bool) {
    let rect = centered_rect(50, 7, area);
    let yes_btn = if yes { "[Yes]" } else { " Yes " };
    let no_btn = if yes { " No " } else { "[No]" };
    let body = format!("Delete user '{label}'?\nThis cannot be undone.\n\n  {yes_btn}    {no_btn}");
    let p = Paragraph::new(body).block(
        Block::default()
            .title("Confirm delete")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
