use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use podsee_core::utils::format::format_relative;
use podsee_core::Comment;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref centre) = app.discussion_centre else {
        let block = Block::default()
            .title(" Discussion ")
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        let hint = Paragraph::new(Span::styled(
            " Select a centre on the Results tab and press Enter.",
            styles::muted_style(),
        ))
        .block(block);
        frame.render_widget(hint, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(5)])
        .split(area);

    let posting_as = match app.username {
        Some(ref name) => Span::styled(format!("posting as {}", name), styles::muted_style()),
        None => Span::styled("no username set", styles::muted_style()),
    };
    let header = Line::from(vec![
        Span::styled(format!(" {} ", centre.name), styles::title_style()),
        Span::raw(" "),
        posting_as,
    ]);
    frame.render_widget(Paragraph::new(header), rows[0]);

    render_comments(frame, app, rows[1]);
}

fn comment_lines(comment: &Comment, indent: &str, now: chrono::DateTime<Utc>) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::raw(indent.to_string()),
            Span::styled(comment.username.clone(), styles::author_style()),
            Span::styled(
                format!("  {}", format_relative(comment.created_at, now)),
                styles::muted_style(),
            ),
        ]),
        Line::from(format!("{}{}", indent, comment.text)),
    ]
}

fn render_comments(frame: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();

    let mut items: Vec<ListItem> = app
        .comments
        .iter()
        .enumerate()
        .map(|(i, comment)| {
            let mut lines = comment_lines(comment, " ", now);

            let replies = app.replies_for(&comment.comment_id);
            for reply in replies {
                lines.extend(comment_lines(reply, "     ↳ ", now));
            }

            let remaining = (comment.reply_count() as usize).saturating_sub(replies.len());
            if remaining > 0 {
                let noun = if remaining == 1 { "reply" } else { "replies" };
                lines.push(Line::from(Span::styled(
                    format!("     [v] view {} more {}", remaining, noun),
                    styles::muted_style(),
                )));
            }
            lines.push(Line::from(""));

            let style = if i == app.comment_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Text::from(lines)).style(style)
        })
        .collect();

    if app.comments_has_more {
        items.push(ListItem::new(Span::styled(
            " [m] load more comments",
            styles::muted_style(),
        )));
    }

    let title = if app.comments_loading {
        " Comments (loading...) ".to_string()
    } else {
        format!(" Comments ({}) ", app.comments.len())
    };

    let mut block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    if let Some(ref error) = app.comments_error {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {} ", error),
            styles::error_style(),
        )));
    }

    if items.is_empty() && !app.comments_loading {
        let paragraph = Paragraph::new(Span::styled(
            " No comments yet. Press [n] to start the discussion.",
            styles::muted_style(),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let mut state = ListState::default();
    state.select(Some(app.comment_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}
