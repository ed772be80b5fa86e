use ratatui::layout::Alignment;
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::tui::app::Mode;
use crate::tui::widgets::{
    confirm_delete::render_confirm_delete,
    input_bar::render_input_bar,
    status_bar::render_status_bar,
    task_detail::render_task_detail,
    task_list::render_task_list,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("To-Do")
        .title_alignment(Alignment::Center);
    f.render_widget(outer_block, f.area());

    render_task_list(f, layout.list_area, &app.tasks, app.total_count, &app.query, &mut app.list_state);

    if layout.detail_area.width > 0 {
        let selected = app.list_state.selected().and_then(|i| app.tasks.get(i));
        render_task_detail(f, layout.detail_area, selected, &app.date_format);
    }

    render_input_bar(f, layout.input_area, app.mode, &app.input, &app.query);

    match app.mode {
        Mode::ConfirmDelete => {
            if let Some(task) = app.selected_task() {
                let message = format!("Delete \"{}\"?", task.name());
                render_confirm_delete(f, f.area(), &message);
            }
        }
        Mode::ConfirmDeleteCompleted => {
            render_confirm_delete(f, f.area(), "Delete all completed tasks?");
        }
        _ => {}
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status_message.as_ref(), &key_hints);
}

fn get_key_hints(app: &App) -> Vec<String> {
    let keys = &app.config.key_bindings;
    let hint = |binding: &str, label: &str| format!("{}: {}", format_key_binding_for_display(binding), label);

    match app.mode {
        Mode::Create | Mode::Rename => vec![
            "Enter: Save".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::Search => vec![
            "Enter: Keep filter".to_string(),
            "Esc: Clear search".to_string(),
        ],
        Mode::ConfirmDelete | Mode::ConfirmDeleteCompleted => vec![
            "y/Enter: Delete".to_string(),
            "n/Esc: Cancel".to_string(),
        ],
        Mode::View => vec![
            hint(&keys.quit, "Quit"),
            hint(&keys.new, "New"),
            hint(&keys.toggle_completed, "Done"),
            hint(&keys.toggle_important, "Important"),
            hint(&keys.rename, "Rename"),
            hint(&keys.delete, "Delete"),
            hint(&keys.undo, "Undo"),
            hint(&keys.search, "Search"),
            hint(&keys.cycle_sort, "Sort"),
            hint(&keys.toggle_hide_completed, "Hide done"),
            hint(&keys.delete_completed, "Delete done"),
        ],
    }
}
