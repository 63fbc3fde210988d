use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use podsee_core::utils::{format_distance, truncate_string};

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_location_bar(frame, app, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    render_centre_list(frame, app, columns[0]);
    render_centre_detail(frame, app, columns[1]);
}

fn render_location_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(" Location: ", styles::highlight_style())];

    if app.locating {
        spans.push(Span::styled("locating...", styles::muted_style()));
    } else if let Some(ref location) = app.user_location {
        spans.push(Span::raw(location.label()));
        if app.resolving_distances {
            spans.push(Span::styled(
                format!(
                    "  (measuring distances {}/{})",
                    app.distances.len(),
                    app.results.len()
                ),
                styles::muted_style(),
            ));
        }
    } else {
        spans.push(Span::styled("not set", styles::muted_style()));
    }

    if let Some(ref error) = app.location_error {
        spans.push(Span::styled(format!("  {}", error), styles::error_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_centre_list(frame: &mut Frame, app: &App, area: Rect) {
    let sorted = app.sorted_results();
    let name_width = (area.width as usize).saturating_sub(20).max(10);

    let items: Vec<ListItem> = sorted
        .iter()
        .enumerate()
        .map(|(i, centre)| {
            let distance = app
                .distance_for(centre)
                .map(format_distance)
                .unwrap_or_default();
            let line = Line::from(vec![
                Span::raw(format!(
                    "{:<width$}",
                    truncate_string(&centre.name, name_width),
                    width = name_width
                )),
                Span::styled(format!(" {}", distance), styles::muted_style()),
            ]);

            let style = if i == app.results_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = match (&app.selected_level, &app.selected_subject) {
        (Some(level), Some(subject)) => {
            format!(" {} {} ({}) ", level, subject, app.results.len())
        }
        _ => " Results ".to_string(),
    };

    let focused = app.focus == Focus::List;
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if items.is_empty() {
        let message = if app.selected_subject.is_some() {
            " No centres match this level and subject."
        } else {
            " Pick a level and subject on the Search tab."
        };
        let paragraph = Paragraph::new(Span::styled(message, styles::muted_style())).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let mut state = ListState::default();
    state.select(Some(app.results_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_centre_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let Some(centre) = app.selected_centre() else {
        frame.render_widget(block, area);
        return;
    };

    let block = block
        .title(format!(" {} ", centre.name))
        .title_style(styles::title_style());

    let field = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<10}", label), styles::highlight_style()),
            Span::raw(value),
        ])
    };

    let mut lines = Vec::new();
    if let Some(km) = app.distance_for(centre) {
        lines.push(field("Distance", format_distance(km)));
    }
    if let Some(address) = centre.address_trimmed() {
        lines.push(field("Address", address.to_string()));
    }
    if let Some(postal) = centre.postal_code_trimmed() {
        lines.push(field("Postal", format!("Singapore {}", postal)));
    }
    if let Some(contact) = centre.contact_display() {
        lines.push(field("Contact", contact));
    }
    if let Some(ref website) = centre.website_url {
        if !website.trim().is_empty() {
            lines.push(field("Website", website.trim().to_string()));
        }
    }

    let subjects = app.selected_centre_subjects();
    if !subjects.is_empty() {
        lines.push(Line::from(""));
        let level = app.selected_level.as_deref().unwrap_or_default();
        lines.push(Line::from(Span::styled(
            format!("Subjects at {}", level),
            styles::title_style(),
        )));
        lines.push(Line::from(format!("  {}", subjects.join(", "))));
    }

    if let Some(note) = app.selected_centre_note() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Notes", styles::title_style())));
        lines.push(Line::from(format!("  {}", note)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[Enter]", styles::help_key_style()),
        Span::styled(" open discussion", styles::muted_style()),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
