use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

/// Join as many hints as fit in `max_width`, ending with an ellipsis when some are dropped
pub fn fit_hints(key_hints: &[String], max_width: usize) -> String {
    let mut hints_text = String::new();
    for (i, hint) in key_hints.iter().enumerate() {
        let current_len = hints_text.chars().count();
        let would_be_len = if i == 0 {
            hint.chars().count()
        } else {
            current_len + SEPARATOR.chars().count() + hint.chars().count()
        };

        if would_be_len > max_width {
            let keep = max_width.saturating_sub(ELLIPSIS.len());
            if i == 0 {
                hints_text = hint.chars().take(keep).collect();
            } else if current_len > keep {
                hints_text = hints_text.chars().take(keep).collect();
            }
            hints_text.push_str(ELLIPSIS);
            break;
        }

        if i > 0 {
            hints_text.push_str(SEPARATOR);
        }
        hints_text.push_str(hint);
    }
    hints_text
}

pub fn render_status_bar(f: &mut Frame, area: Rect, message: Option<&String>, key_hints: &[String]) {
    let max_width = area.width as usize;

    let (content, style) = match message {
        Some(msg) => {
            let mut content = msg.clone();
            if content.chars().count() > max_width {
                content = content.chars().take(max_width.saturating_sub(3)).collect::<String>() + ELLIPSIS;
            }
            (content, Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
        }
        None => (fit_hints(key_hints, max_width), Style::default()),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}
