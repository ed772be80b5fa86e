use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

use crate::database::TaskQuery;
use crate::models::Task;

/// One list row: completion marker, importance marker, name
pub fn task_line(task: &Task, max_width: usize) -> Line<'static> {
    let status_indicator = if task.is_completed() { "✓" } else { "○" };
    let important_indicator = if task.is_important() { "!" } else { " " };

    let prefix_len = 4;
    let mut name = task.name().to_string();
    let available = max_width.saturating_sub(prefix_len);
    if name.chars().count() > available {
        name = name.chars().take(available.saturating_sub(3)).collect::<String>() + "...";
    }

    let name_style = if task.is_completed() {
        Style::default().add_modifier(Modifier::CROSSED_OUT | Modifier::DIM)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{} ", status_indicator)),
        Span::styled(format!("{} ", important_indicator), Style::default().fg(Color::Red)),
        Span::styled(name, name_style),
    ])
}

pub fn render_task_list(
    f: &mut Frame,
    area: Rect,
    tasks: &[Task],
    total_count: usize,
    query: &TaskQuery,
    list_state: &mut ListState,
) {
    // 2 for borders, 2 for padding
    let max_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = tasks.iter().map(|task| ListItem::new(task_line(task, max_width))).collect();

    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    let mut title = format!("Tasks ({} of {}) by {}", tasks.len(), total_count, query.sort_order.label());
    if query.hide_completed {
        title.push_str(", done hidden");
    }

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, list_area, list_state);

    let visible_items = list_area.height.saturating_sub(2) as usize;
    if tasks.len() > visible_items && scrollbar_area.width > 0 && list_area.height > 2 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );
        let mut scrollbar_state = ScrollbarState::new(tasks.len())
            .viewport_content_length(visible_items)
            .position(list_state.selected().unwrap_or(0));
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn rows_show_status_and_importance() {
        let open = Task::from_parts("Buy milk", false, false, 0, 1);
        let done_important = Task::from_parts("Pay rent", true, true, 0, 2);
        assert_eq!(text(&task_line(&open, 40)), "○   Buy milk");
        assert_eq!(text(&task_line(&done_important, 40)), "✓ ! Pay rent");
    }

    #[test]
    fn long_names_are_truncated() {
        let task = Task::from_parts("a very long task name indeed", false, false, 0, 1);
        let line = text(&task_line(&task, 14));
        assert_eq!(line, "○   a very ...");
    }
}
