use ratatui::layout::{Position, Rect};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::database::TaskQuery;
use crate::tui::app::Mode;

/// Title and text for the one-line input box
pub fn input_contents(mode: Mode, input: &str, query: &TaskQuery) -> (&'static str, String) {
    match mode {
        Mode::Create => ("New task", input.to_string()),
        Mode::Rename => ("Rename task", input.to_string()),
        Mode::Search => ("Search", input.to_string()),
        _ if !query.search.is_empty() => ("Filter", format!("name contains \"{}\"", query.search)),
        _ => ("Filter", "none".to_string()),
    }
}

pub fn render_input_bar(f: &mut Frame, area: Rect, mode: Mode, input: &str, query: &TaskQuery) {
    let (title, text) = input_contents(mode, input, query);
    let editing = matches!(mode, Mode::Create | Mode::Rename | Mode::Search);

    // Keep the end of long input visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let char_count = text.chars().count();
    let visible: String = if editing && char_count >= inner_width {
        text.chars().skip(char_count + 1 - inner_width).collect()
    } else {
        text
    };

    if editing {
        let cursor_x = area.x + 1 + visible.chars().count() as u16;
        f.set_cursor_position(Position::new(cursor_x.min(area.x + area.width.saturating_sub(2)), area.y + 1));
    }

    let paragraph = Paragraph::new(visible).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_typed_text_while_editing() {
        let query = TaskQuery::default();
        assert_eq!(input_contents(Mode::Create, "Buy", &query), ("New task", "Buy".to_string()));
        assert_eq!(input_contents(Mode::Rename, "X", &query), ("Rename task", "X".to_string()));
    }

    #[test]
    fn shows_active_filter_otherwise() {
        let mut query = TaskQuery::default();
        assert_eq!(input_contents(Mode::View, "", &query), ("Filter", "none".to_string()));
        query.search = "milk".to_string();
        assert_eq!(
            input_contents(Mode::View, "", &query),
            ("Filter", "name contains \"milk\"".to_string())
        );
    }
}
