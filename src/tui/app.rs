use ratatui::widgets::ListState;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::KeyBindings;
use crate::database::{DatabaseError, TaskQuery};
use crate::format::DateFormat;
use crate::models::Task;
use crate::tui::error::TuiError;
use crate::utils::{parse_key_binding, ParsedKeyBinding};
use crate::{Config, Database};

const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Create,
    Rename,
    Search,
    ConfirmDelete,
    ConfirmDeleteCompleted,
}

/// Key bindings from the config, parsed once at startup
#[derive(Debug, Clone)]
pub struct Bindings {
    pub quit: ParsedKeyBinding,
    pub new: ParsedKeyBinding,
    pub rename: ParsedKeyBinding,
    pub delete: ParsedKeyBinding,
    pub delete_completed: ParsedKeyBinding,
    pub undo: ParsedKeyBinding,
    pub toggle_completed: ParsedKeyBinding,
    pub toggle_important: ParsedKeyBinding,
    pub toggle_hide_completed: ParsedKeyBinding,
    pub cycle_sort: ParsedKeyBinding,
    pub search: ParsedKeyBinding,
    pub list_up: ParsedKeyBinding,
    pub list_down: ParsedKeyBinding,
}

impl Bindings {
    pub fn parse(keys: &KeyBindings) -> Result<Self, TuiError> {
        let parse = |binding: &str| parse_key_binding(binding).map_err(TuiError::KeyBindingError);
        Ok(Self {
            quit: parse(&keys.quit)?,
            new: parse(&keys.new)?,
            rename: parse(&keys.rename)?,
            delete: parse(&keys.delete)?,
            delete_completed: parse(&keys.delete_completed)?,
            undo: parse(&keys.undo)?,
            toggle_completed: parse(&keys.toggle_completed)?,
            toggle_important: parse(&keys.toggle_important)?,
            toggle_hide_completed: parse(&keys.toggle_hide_completed)?,
            cycle_sort: parse(&keys.cycle_sort)?,
            search: parse(&keys.search)?,
            list_up: parse(&keys.list_up)?,
            list_down: parse(&keys.list_down)?,
        })
    }
}

pub struct App {
    pub config: Config,
    /// Where list preferences are saved when they change; `None` keeps them in memory
    config_path: Option<PathBuf>,
    pub db: Database,
    pub date_format: DateFormat,
    pub bindings: Bindings,
    clock: Box<dyn Clock>,
    pub tasks: Vec<Task>,
    pub total_count: usize,
    pub list_state: ListState,
    pub query: TaskQuery,
    pub mode: Mode,
    pub input: String,
    pub last_deleted: Option<Task>,
    pub status_message: Option<String>,
    status_message_time: Option<Instant>,
}

impl App {
    pub fn new(config: Config, config_path: Option<PathBuf>, db: Database) -> Result<Self, TuiError> {
        let date_format = config.date_format()?;
        let bindings = Bindings::parse(&config.key_bindings)?;
        let query = config.default_query();

        let mut app = Self {
            config,
            config_path,
            db,
            date_format,
            bindings,
            clock: Box::new(SystemClock),
            tasks: Vec::new(),
            total_count: 0,
            list_state: ListState::default(),
            query,
            mode: Mode::View,
            input: String::new(),
            last_deleted: None,
            status_message: None,
            status_message_time: None,
        };
        app.reload_tasks()?;
        Ok(app)
    }

    /// Use a different time source for newly created tasks
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Re-run the current query, keeping the selection on the same task when it is still listed
    pub fn reload_tasks(&mut self) -> Result<(), TuiError> {
        let selected_id = self.selected_task().map(Task::id);
        self.tasks = self.db.get_tasks(&self.query)?;
        self.total_count = self.db.count_tasks()?;

        let index = selected_id
            .and_then(|id| self.tasks.iter().position(|t| t.id() == id))
            .or_else(|| {
                let previous = self.list_state.selected().unwrap_or(0);
                (!self.tasks.is_empty()).then(|| previous.min(self.tasks.len() - 1))
            });
        self.list_state.select(index);
        Ok(())
    }

    fn select_id(&mut self, id: i64) {
        if let Some(index) = self.tasks.iter().position(|t| t.id() == id) {
            self.list_state.select(Some(index));
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.list_state.selected().and_then(|i| self.tasks.get(i))
    }

    pub fn select_next(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) if i + 1 < self.tasks.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let previous = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.list_state.select(Some(previous));
    }

    pub fn start_create(&mut self) {
        self.mode = Mode::Create;
        self.input.clear();
    }

    pub fn start_rename(&mut self) {
        if let Some(name) = self.selected_task().map(|t| t.name().to_string()) {
            self.input = name;
            self.mode = Mode::Rename;
        }
    }

    pub fn start_search(&mut self) {
        self.input = self.query.search.clone();
        self.mode = Mode::Search;
    }

    pub fn push_input_char(&mut self, c: char) -> Result<(), TuiError> {
        self.input.push(c);
        self.sync_search()
    }

    pub fn pop_input_char(&mut self) -> Result<(), TuiError> {
        self.input.pop();
        self.sync_search()
    }

    /// Search filters the list as the user types
    fn sync_search(&mut self) -> Result<(), TuiError> {
        if self.mode == Mode::Search {
            self.query.search = self.input.clone();
            self.reload_tasks()?;
        }
        Ok(())
    }

    /// Leave input or confirmation without applying it.
    /// Cancelling a search also clears it.
    pub fn cancel(&mut self) -> Result<(), TuiError> {
        if self.mode == Mode::Search && !self.query.search.is_empty() {
            self.query.search.clear();
            self.reload_tasks()?;
        }
        self.input.clear();
        self.mode = Mode::View;
        Ok(())
    }

    /// Apply the text typed in Create, Rename or Search mode
    pub fn submit_input(&mut self) -> Result<(), TuiError> {
        match self.mode {
            Mode::Create => {
                let name = self.input.trim();
                if name.is_empty() {
                    self.set_status_message("Task name cannot be empty".to_string());
                    return Ok(());
                }
                let task = Task::new_with_clock(name, self.clock.as_ref());
                let stored = self.db.insert_task(&task)?;
                debug!(id = stored.id(), "created task from tui");
                self.reload_tasks()?;
                self.select_id(stored.id());
                self.set_status_message(format!("Task added: {}", stored.name()));
            }
            Mode::Rename => {
                let name = self.input.trim().to_string();
                if name.is_empty() {
                    self.set_status_message("Task name cannot be empty".to_string());
                    return Ok(());
                }
                if let Some(task) = self.selected_task().cloned() {
                    let renamed = task.with_name(name);
                    self.db.update_task(&renamed)?;
                    self.reload_tasks()?;
                    self.set_status_message("Task renamed".to_string());
                }
            }
            Mode::Search => {}
            _ => return Ok(()),
        }
        self.input.clear();
        self.mode = Mode::View;
        Ok(())
    }

    pub fn toggle_completed(&mut self) -> Result<(), TuiError> {
        if let Some(task) = self.selected_task() {
            let updated = task.toggled_completed();
            self.db.update_task(&updated)?;
            self.reload_tasks()?;
        }
        Ok(())
    }

    pub fn toggle_important(&mut self) -> Result<(), TuiError> {
        if let Some(task) = self.selected_task() {
            let updated = task.toggled_important();
            self.db.update_task(&updated)?;
            self.reload_tasks()?;
        }
        Ok(())
    }

    pub fn request_delete(&mut self) {
        if self.selected_task().is_some() {
            self.mode = Mode::ConfirmDelete;
        }
    }

    pub fn request_delete_completed(&mut self) {
        if self.tasks.iter().any(Task::is_completed) || self.query.hide_completed {
            self.mode = Mode::ConfirmDeleteCompleted;
        } else {
            self.set_status_message("No completed tasks".to_string());
        }
    }

    /// Carry out whichever delete is awaiting confirmation
    pub fn confirm(&mut self) -> Result<(), TuiError> {
        match self.mode {
            Mode::ConfirmDelete => {
                if let Some(task) = self.selected_task().cloned() {
                    self.db.delete_task(task.id())?;
                    self.set_status_message(format!("Task deleted: {} (undo available)", task.name()));
                    self.last_deleted = Some(task);
                    self.reload_tasks()?;
                }
            }
            Mode::ConfirmDeleteCompleted => {
                let removed = self.db.delete_completed_tasks()?;
                self.last_deleted = None;
                self.reload_tasks()?;
                self.set_status_message(format!("Deleted {} completed task(s)", removed));
            }
            _ => return Ok(()),
        }
        self.mode = Mode::View;
        Ok(())
    }

    /// Put the most recently deleted task back under its old ID
    pub fn undo_delete(&mut self) -> Result<(), TuiError> {
        let Some(task) = self.last_deleted.take() else {
            self.set_status_message("Nothing to undo".to_string());
            return Ok(());
        };
        let restored = self.db.insert_task(&task)?;
        self.reload_tasks()?;
        self.select_id(restored.id());
        self.set_status_message(format!("Restored: {}", restored.name()));
        Ok(())
    }

    pub fn toggle_hide_completed(&mut self) -> Result<(), TuiError> {
        self.query.hide_completed = !self.query.hide_completed;
        self.config.hide_completed = self.query.hide_completed;
        self.reload_tasks()?;
        self.persist_preferences();
        let state = if self.query.hide_completed { "hidden" } else { "shown" };
        self.set_status_message(format!("Completed tasks {}", state));
        Ok(())
    }

    pub fn cycle_sort_order(&mut self) -> Result<(), TuiError> {
        self.query.sort_order = self.query.sort_order.next();
        self.config.sort_order = self.query.sort_order;
        self.reload_tasks()?;
        self.persist_preferences();
        self.set_status_message(format!("Sorted by {}", self.query.sort_order.label()));
        Ok(())
    }

    /// Save list preferences; a failed save is logged and reported, never fatal
    fn persist_preferences(&mut self) {
        let Some(path) = self.config_path.clone() else {
            return;
        };
        if let Err(e) = self.config.save_to_path(&path) {
            warn!(path = %path.display(), error = %e, "failed to save list preferences");
            self.set_status_message(format!("Could not save preferences: {}", e));
        }
    }

    /// Show a failed action in the status bar instead of leaving the TUI.
    /// A task that vanished (e.g. deleted from the CLI) triggers a reload.
    pub fn report_error(&mut self, action: &str, error: TuiError) {
        warn!(action, error = %error, "tui action failed");
        self.mode = Mode::View;
        self.input.clear();
        if matches!(error, TuiError::DatabaseError(DatabaseError::NotFound(_))) {
            if let Err(e) = self.reload_tasks() {
                warn!(error = %e, "failed to reload tasks");
            }
        }
        self.set_status_message(format!("Failed to {}: {}", action, error));
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
        self.status_message_time = None;
    }

    /// Check if status message should be auto-cleared
    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::SortOrder;

    fn app_with(names: &[&str]) -> App {
        let db = Database::open_in_memory().unwrap();
        for (i, name) in names.iter().enumerate() {
            db.insert_task(&Task::new_with_clock(*name, &FixedClock(i as i64))).unwrap();
        }
        App::new(Config::default(), None, db).unwrap().with_clock(FixedClock(1_000))
    }

    fn listed(app: &App) -> Vec<&str> {
        app.tasks.iter().map(Task::name).collect()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.push_input_char(c).unwrap();
        }
    }

    #[test]
    fn loads_tasks_and_selects_first() {
        let app = app_with(&["b", "a"]);
        assert_eq!(listed(&app), vec!["a", "b"]);
        assert_eq!(app.selected_task().map(Task::name), Some("a"));
        assert_eq!(app.total_count, 2);
    }

    #[test]
    fn create_inserts_with_injected_clock() {
        let mut app = app_with(&[]);
        app.start_create();
        type_text(&mut app, "  Buy milk ");
        app.submit_input().unwrap();

        assert_eq!(app.mode, Mode::View);
        let task = app.selected_task().unwrap();
        assert_eq!(task.name(), "Buy milk");
        assert_eq!(task.created(), 1_000);
        assert!(task.is_persisted());
    }

    #[test]
    fn empty_name_is_not_created() {
        let mut app = app_with(&[]);
        app.start_create();
        type_text(&mut app, "   ");
        app.submit_input().unwrap();

        assert_eq!(app.mode, Mode::Create);
        assert!(app.tasks.is_empty());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn rename_keeps_id_and_created() {
        let mut app = app_with(&["Draft"]);
        let before = app.selected_task().cloned().unwrap();
        app.start_rename();
        assert_eq!(app.input, "Draft");
        app.pop_input_char().unwrap();
        app.push_input_char('s').unwrap();
        app.submit_input().unwrap();

        let after = app.selected_task().unwrap();
        assert_eq!(after.name(), "Drafs");
        assert_eq!(after.id(), before.id());
        assert_eq!(after.created(), before.created());
    }

    #[test]
    fn toggles_update_the_store() {
        let mut app = app_with(&["a", "b"]);
        app.select_next();
        app.toggle_important().unwrap();

        // important tasks move to the top and stay selected
        assert_eq!(listed(&app), vec!["b", "a"]);
        assert!(app.selected_task().unwrap().is_important());

        app.toggle_completed().unwrap();
        let id = app.selected_task().unwrap().id();
        assert!(app.db.get_task(id).unwrap().is_completed());
    }

    #[test]
    fn delete_needs_confirmation_and_can_be_undone() {
        let mut app = app_with(&["keep", "remove"]);
        app.select_next();
        let removed = app.selected_task().cloned().unwrap();

        app.request_delete();
        assert_eq!(app.mode, Mode::ConfirmDelete);
        app.confirm().unwrap();
        assert_eq!(listed(&app), vec!["keep"]);

        app.undo_delete().unwrap();
        assert_eq!(app.db.get_task(removed.id()).unwrap(), removed);
        assert_eq!(app.selected_task(), Some(&removed));
        assert!(app.last_deleted.is_none());
    }

    #[test]
    fn cancel_leaves_tasks_alone() {
        let mut app = app_with(&["keep"]);
        app.request_delete();
        app.cancel().unwrap();
        assert_eq!(app.mode, Mode::View);
        assert_eq!(app.total_count, 1);
    }

    #[test]
    fn delete_completed_clears_done_tasks() {
        let mut app = app_with(&["a", "b"]);
        app.toggle_completed().unwrap();
        app.request_delete_completed();
        assert_eq!(app.mode, Mode::ConfirmDeleteCompleted);
        app.confirm().unwrap();
        assert_eq!(listed(&app), vec!["b"]);
    }

    #[test]
    fn search_filters_while_typing_and_cancel_clears() {
        let mut app = app_with(&["Buy milk", "Walk dog"]);
        app.start_search();
        type_text(&mut app, "dog");
        assert_eq!(listed(&app), vec!["Walk dog"]);

        app.cancel().unwrap();
        assert_eq!(listed(&app), vec!["Buy milk", "Walk dog"]);
    }

    #[test]
    fn list_preferences_change_query_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let db = Database::open_in_memory().unwrap();
        db.insert_task(&Task::new_with_clock("b", &FixedClock(1)).with_completed(true)).unwrap();
        db.insert_task(&Task::new_with_clock("a", &FixedClock(2))).unwrap();
        let mut app = App::new(Config::default(), Some(path.clone()), db).unwrap();

        app.toggle_hide_completed().unwrap();
        assert_eq!(listed(&app), vec!["a"]);
        app.cycle_sort_order().unwrap();
        assert_eq!(app.query.sort_order, SortOrder::ByDateCreated);

        let saved = Config::load_from_path(&path, crate::utils::Profile::Dev).unwrap();
        assert!(saved.hide_completed);
        assert_eq!(saved.sort_order, SortOrder::ByDateCreated);
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut app = app_with(&["a", "b"]);
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
        app.select_next();
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(1));
    }
}
