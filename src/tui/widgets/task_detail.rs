use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::format::DateFormat;
use crate::models::Task;

/// Label/value pairs shown for the selected task
pub fn detail_lines(task: &Task, date_format: &DateFormat) -> Vec<(&'static str, String)> {
    let yes_no = |flag: bool| (if flag { "yes" } else { "no" }).to_string();
    vec![
        ("Name", task.name().to_string()),
        ("Important", yes_no(task.is_important())),
        ("Completed", yes_no(task.is_completed())),
        ("Created", task.created_date_formatted_with(date_format)),
        ("ID", task.id().to_string()),
    ]
}

pub fn render_task_detail(f: &mut Frame, area: Rect, task: Option<&Task>, date_format: &DateFormat) {
    let block = Block::default().borders(Borders::ALL).title("Details");

    let Some(task) = task else {
        let paragraph = Paragraph::new("No task selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let label_style = Style::default().add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = detail_lines(task, date_format)
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{}: ", label), label_style),
                Span::raw(value),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TimeZoneSetting;

    #[test]
    fn details_include_formatted_creation_date() {
        let task = Task::from_parts("Buy milk", true, false, 1_704_467_045_000, 3);
        let format = DateFormat::new("%Y-%m-%d", TimeZoneSetting::Utc).unwrap();
        let lines = detail_lines(&task, &format);

        assert_eq!(lines[0], ("Name", "Buy milk".to_string()));
        assert_eq!(lines[1], ("Important", "yes".to_string()));
        assert_eq!(lines[2], ("Completed", "no".to_string()));
        assert_eq!(lines[3], ("Created", "2024-01-05".to_string()));
        assert_eq!(lines[4], ("ID", "3".to_string()));
    }
}
