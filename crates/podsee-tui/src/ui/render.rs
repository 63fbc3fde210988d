use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use podsee_core::content::MAX_COMMENT_LENGTH;

use crate::app::{App, AppState, ComposeTarget, Tab};

use super::styles;
use super::tabs::{admin, discussion, results, search};

const LOGO: [&str; 3] = [
    "   ┌─┐┌─┐┌┬┐┌─┐┌─┐┌─┐",
    "   ├─┘│ │ ││└─┐├┤ ├┤ ",
    "   ┴  └─┘─┴┘└─┘└─┘└─┘",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(2), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::EnteringLocation => render_location_overlay(frame, app),
        AppState::EnteringUsername => render_username_overlay(frame, app),
        AppState::Composing => render_compose_overlay(frame, app),
        AppState::AdminLogin => render_admin_login_overlay(frame, app),
        AppState::ConfirmingDelete => render_confirm_overlay(
            frame,
            "Delete this comment permanently?",
            "to delete",
        ),
        AppState::ConfirmingQuit => {
            render_confirm_overlay(frame, "Are you sure you want to quit?", "to quit")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  podsee · tuition centres near you";
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.chars().count() + help_hint.len() + 4),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [Tab::Search, Tab::Results, Tab::Discussion, Tab::Admin];

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(
            format!("[{}] {}", i + 1, tab.title()),
            styles::tab_style(app.current_tab == *tab),
        ));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Search => search::render(frame, app, area),
        Tab::Results => results::render(frame, app, area),
        Tab::Discussion => discussion::render(frame, app, area),
        Tab::Admin => admin::render(frame, app, area),
    }
}

/// Key hints for the status bar, per tab.
fn shortcuts(app: &App) -> &'static str {
    match app.current_tab {
        Tab::Search => "[Enter] select | [Tab] level/subject | [q]uit",
        Tab::Results => "[l]ocation | [g]ps | [c]lear | [Enter] discuss | [q]uit",
        Tab::Discussion => "[n]ew | [r]eply | [v]iew replies | [m]ore | [u]sername | [q]uit",
        Tab::Admin if app.admin.is_unlocked() => "[h]ide | [x] delete | [r]eload | [L]ock | [q]uit",
        Tab::Admin => "[Enter] unlock | [q]uit",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} centres loaded ", app.catalog.len()),
    };
    let right_text = format!(" {} ", shortcuts(app));

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect()
}

fn overlay_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default())
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(56, 26, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(Span::styled(
        format!("         version {}", env!("CARGO_PKG_VERSION")),
        styles::muted_style(),
    )));
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-4", "Switch tabs"),
        help_line("←/→", "Previous/next tab"),
        help_line("↑/↓", "Move selection"),
        help_line("PgUp/PgDn", "Scroll a page"),
        help_line("Tab", "Switch column"),
        help_line("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Results", styles::highlight_style())),
        help_line("l", "Enter an address or postal code"),
        help_line("g", "Use current location"),
        help_line("c", "Clear location"),
        Line::from(""),
        Line::from(Span::styled(" Discussion", styles::highlight_style())),
        help_line("n / r", "New comment / reply to selected"),
        help_line("v / m", "All replies / more comments"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    frame.render_widget(Paragraph::new(lines).block(overlay_block(" Help ")), area);
}

/// A one-line text field with a trailing cursor.
fn input_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {}", label), styles::muted_style()),
        Span::styled(format!("{}▌", value), styles::input_style()),
    ])
}

fn error_line(error: &Option<String>) -> Option<Line<'static>> {
    error
        .as_ref()
        .map(|e| Line::from(Span::styled(format!(" {}", e), styles::error_style())))
}

fn render_location_overlay(frame: &mut Frame, app: &App) {
    let height = 8 + app.predictions.len() as u16;
    let area = centered_rect_fixed(64, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        input_line("Address or postal code: ", &app.location_input),
        Line::from(""),
    ];

    for (i, prediction) in app.predictions.iter().enumerate() {
        let style = if app.prediction_selection == Some(i) {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(Span::styled(
            format!("   {}", prediction.description),
            style,
        )));
    }
    if let Some(line) = error_line(&app.location_error) {
        lines.push(line);
    }
    lines.push(Line::from(Span::styled(
        " [↑/↓] suggestions  [Enter] search  [Esc] cancel",
        styles::muted_style(),
    )));

    frame.render_widget(
        Paragraph::new(lines).block(overlay_block(" Set your location ")),
        area,
    );
}

fn render_username_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 9, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(
            " Pick a name to show with your comments.",
            styles::muted_style(),
        )),
        Line::from(""),
        input_line("Username: ", &app.username_input),
        Line::from(""),
    ];
    if let Some(line) = error_line(&app.username_error) {
        lines.push(line);
    }
    lines.push(Line::from(Span::styled(
        " [Enter] save  [Esc] cancel",
        styles::muted_style(),
    )));

    frame.render_widget(
        Paragraph::new(lines).block(overlay_block(" Username ")),
        area,
    );
}

fn render_compose_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(70, 14, frame.area());
    frame.render_widget(Clear, area);

    let title = match app.compose_target {
        ComposeTarget::Comment => " New comment ",
        ComposeTarget::Reply { .. } => " Reply ",
    };

    let count = app.compose_input.chars().count();
    let count_style = if count > MAX_COMMENT_LENGTH {
        styles::error_style()
    } else {
        styles::muted_style()
    };

    let mut lines = vec![
        Line::from(Span::styled(format!("{}▌", app.compose_input), styles::input_style())),
        Line::from(""),
        Line::from(Span::styled(format!("{}/{}", count, MAX_COMMENT_LENGTH), count_style)),
    ];
    if let Some(line) = error_line(&app.compose_error) {
        lines.push(line);
    }
    let action = if app.posting { "posting..." } else { "[Enter] post  [Esc] cancel" };
    lines.push(Line::from(Span::styled(action, styles::muted_style())));

    frame.render_widget(
        Paragraph::new(lines)
            .block(overlay_block(title))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_admin_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.admin_error.is_some() { 10 } else { 9 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let masked = "*".repeat(app.admin_password_input.chars().count().min(24));
    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(input_line("Password: ", &masked));
    lines.push(Line::from(""));
    if let Some(line) = error_line(&app.admin_error) {
        lines.push(line);
    }

    frame.render_widget(
        Paragraph::new(lines).block(overlay_block(" Admin ")),
        area,
    );
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, action: &'static str) {
    let area = centered_rect_fixed(46, 9, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" {}, ", action), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    frame.render_widget(Paragraph::new(lines).block(overlay_block("")), area);
}
