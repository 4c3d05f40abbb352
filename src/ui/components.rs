//! Shared UI components (status bar, side panel, modal helpers).

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{AppState, InputMode, NotificationKind};

/// Render the bottom status bar: mode, head counts, and the latest notification.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let stats = app.store.stats();
    let depts = stats
        .per_department
        .iter()
        .map(|(d, n)| format!("{d}:{n}"))
        .collect::<Vec<_>>()
        .join(" ");
    let pending = if app.in_flight > 0 {
        format!("  pending:{}", app.in_flight)
    } else {
        String::new()
    };
    let mut spans = vec![Span::raw(format!(
        "mode: {mode}  users:{}  {depts}{pending}",
        stats.total
    ))];
    if let Some(n) = &app.notification {
        let color = match n.kind {
            NotificationKind::Success => app.theme.success,
            NotificationKind::Error => app.theme.error,
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            n.message.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    let p = Paragraph::new(Line::from(spans)).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Shown in place of the table when the last list fetch failed.
pub fn render_load_error(f: &mut Frame, area: Rect, app: &AppState, error: &str) {
    let lines = vec![
        Line::from(Span::styled(
            "Could not load users",
            Style::default().fg(app.theme.error).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(error.to_string()),
        Line::raw(""),
        Line::from(Span::styled(
            "Press r to retry",
            Style::default().fg(app.theme.muted),
        )),
    ];
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Users")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.error)),
    );
    f.render_widget(p, area);
}

/// Right-side panel listing the bindings from the active keymap.
pub fn render_keybinds_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Keybindings")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let bindings = app.keymap.keys_by_action();
    let col1_w = bindings
        .iter()
        .map(|(a, _)| a.label().len())
        .max()
        .unwrap_or(0)
        .min((inner.width as usize).saturating_sub(8));

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        "Table view:",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (action, keys) in &bindings {
        let label: String = action.label().chars().take(col1_w).collect();
        lines.push(Line::from(vec![
            Span::raw(format!("  {label:>col1_w$} │ ")),
            Span::styled(keys.join(", "), Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Dialogs:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (label, value) in [
        ("Move", "Tab, Shift+Tab"),
        ("Change", "Left, Right"),
        ("Confirm", "Enter"),
        ("Cancel", "Esc"),
    ] {
        lines.push(Line::from(vec![
            Span::raw(format!("  {label:>col1_w$} │ ")),
            Span::styled(value, Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(block, area);
    f.render_widget(p, inner);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Scrollable help listing the default bindings.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 72u16.min(area.width.saturating_sub(4)).max(50);
    let height = 22u16.min(area.height.saturating_sub(4)).max(12);
    let rect = centered_rect(width, height, area);

    let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::ITALIC));
    let heading = |t: &'static str| Line::from(Span::styled(t, Style::default().add_modifier(Modifier::BOLD)));
    let lines: Vec<Line> = vec![
        heading("Browsing"),
        Line::from(vec![Span::raw("Move selection: "), key("Up/Down, j/k")]),
        Line::from(vec![Span::raw("Change page: "), key("Left/Right, h/l, Home/End")]),
        Line::from(vec![
            Span::raw("Search: "),
            key("/"),
            Span::raw(" then type; results update as you type. Esc clears"),
        ]),
        Line::from(vec![Span::raw("Filter and sort dialog: "), key("f")]),
        Line::from(vec![Span::raw("Sort column / order: "), key("s"), Span::raw(" / "), key("o")]),
        Line::from(vec![Span::raw("Rows per page (10/25/50/100): "), key("p")]),
        Line::from(vec![Span::raw("Clear search and filters: "), key("c")]),
        Line::from(vec![Span::raw("Reload from server: "), key("r")]),
        Line::raw(""),
        heading("Editing"),
        Line::from(vec![Span::raw("New user: "), key("n")]),
        Line::from(vec![Span::raw("Edit selected: "), key("Enter, e")]),
        Line::from(vec![Span::raw("Delete selected: "), key("Delete, d")]),
        Line::from(vec![
            Span::raw("In forms: "),
            key("Tab"),
            Span::raw(" moves, "),
            key("Enter"),
            Span::raw(" on the button submits"),
        ]),
        Line::raw(""),
        Line::from(vec![Span::raw("Keybindings panel: "), key("K")]),
        Line::from(vec![Span::raw("Quit: "), key("q")]),
        Line::from(vec![Span::raw("Close help: "), key("Esc / Enter")]),
    ];

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
