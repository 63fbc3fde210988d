use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_prompt(frame, app, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    render_levels(frame, app, columns[0]);
    render_subjects(frame, app, columns[1]);
}

fn render_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let line = match (&app.selected_level, app.catalog.is_empty()) {
        (_, true) => Line::from(Span::styled(
            " No centres loaded. Check the dataset directory.",
            styles::error_style(),
        )),
        (None, false) => Line::from(vec![
            Span::styled(" Step 1: ", styles::highlight_style()),
            Span::raw("choose your child's level"),
        ]),
        (Some(level), false) => Line::from(vec![
            Span::styled(" Step 2: ", styles::highlight_style()),
            Span::raw(format!("choose a subject at {}, then press Enter", level)),
        ]),
    };

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_levels(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .levels
        .iter()
        .enumerate()
        .map(|(i, level)| {
            let chosen = app.selected_level.as_deref() == Some(level.as_str());
            let marker = if chosen { "● " } else { "  " };
            let style = if i == app.level_selection && app.focus == Focus::List {
                styles::selected_style()
            } else if chosen {
                styles::highlight_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(format!("{}{}", marker, level)).style(style)
        })
        .collect();

    let focused = app.focus == Focus::List;
    let block = Block::default()
        .title(" Level ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let mut state = ListState::default();
    state.select(Some(app.level_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_subjects(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let block = Block::default()
        .title(" Subject ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if app.selected_level.is_none() {
        let hint = Paragraph::new(Line::from(Span::styled(
            " Select a level first",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = app
        .subjects
        .iter()
        .enumerate()
        .map(|(i, subject)| {
            let style = if i == app.subject_selection && focused {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(format!("  {}", subject)).style(style)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.subject_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}
