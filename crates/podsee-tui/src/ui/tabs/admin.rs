use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use podsee_core::utils::truncate_string;

use crate::app::App;
use crate::ui::styles;

/// Moderation timestamps, e.g. "Mar 01, 2026 09:30".
const ADMIN_DATE_FORMAT: &str = "%b %d, %Y %H:%M";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if !app.admin.is_unlocked() {
        render_locked(frame, app, area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_comment_table(frame, app, columns[0]);
    render_comment_detail(frame, app, columns[1]);
}

fn render_locked(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Admin ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let message = if app.admin.is_configured() {
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to unlock comment moderation.", styles::muted_style()),
        ])
    } else {
        Line::from(Span::styled(" Admin secret not configured", styles::error_style()))
    };

    frame.render_widget(Paragraph::new(message).block(block), area);
}

fn render_comment_table(frame: &mut Frame, app: &App, area: Rect) {
    let text_width = (area.width as usize).saturating_sub(36).max(10);

    let items: Vec<ListItem> = app
        .admin_comments
        .iter()
        .enumerate()
        .map(|(i, comment)| {
            let kind = if comment.is_reply() { "↳" } else { " " };
            let text_style = if comment.hidden {
                styles::hidden_style()
            } else {
                styles::list_item_style()
            };
            let line = Line::from(vec![
                Span::styled(format!("{:<8}", comment.centre_id), styles::muted_style()),
                Span::raw(format!("{} ", kind)),
                Span::styled(
                    format!("{:<14}", truncate_string(&comment.username, 14)),
                    styles::author_style(),
                ),
                Span::styled(truncate_string(&comment.text, text_width), text_style),
            ]);

            let style = if i == app.admin_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let hidden = app.admin_comments.iter().filter(|c| c.hidden).count();
    let title = if app.admin_loading {
        " All comments (loading...) ".to_string()
    } else {
        format!(" All comments ({}, {} hidden) ", app.admin_comments.len(), hidden)
    };

    let mut block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    if let Some(ref error) = app.admin_error {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {} ", error),
            styles::error_style(),
        )));
    }

    let mut state = ListState::default();
    state.select(Some(app.admin_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_comment_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let Some(comment) = app.selected_admin_comment() else {
        frame.render_widget(block, area);
        return;
    };

    let field = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<9}", label), styles::highlight_style()),
            Span::raw(value),
        ])
    };

    let status = if comment.hidden {
        Span::styled("Hidden", styles::error_style())
    } else {
        Span::styled("Visible", styles::title_style())
    };

    let mut lines = vec![
        field("Centre", comment.centre_id.clone()),
        field("User", comment.username.clone()),
        field("Posted", comment.created_at.format(ADMIN_DATE_FORMAT).to_string()),
        Line::from(vec![Span::styled(format!("{:<9}", "Status"), styles::highlight_style()), status]),
    ];
    if let Some(ref parent) = comment.parent_comment_id {
        lines.push(field("Reply to", parent.clone()));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(comment.text.clone()));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[h]", styles::help_key_style()),
        Span::styled(
            if comment.hidden { " unhide  " } else { " hide  " },
            styles::muted_style(),
        ),
        Span::styled("[x]", styles::help_key_style()),
        Span::styled(" delete  ", styles::muted_style()),
        Span::styled("[r]", styles::help_key_style()),
        Span::styled(" reload", styles::muted_style()),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(block.title(" Comment ").title_style(styles::title_style()))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
