use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::database::{Database, DatabaseError, SortOrder, TaskQuery};
use crate::format::DateFormat;
use crate::models::{Task, UNASSIGNED_ID};
use crate::transfer::{self, TransferError};

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "A to-do list with important and completed tasks")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Name,
    Date,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortOrder::ByName,
            SortArg::Date => SortOrder::ByDateCreated,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Add a new task
    Add {
        /// Task name
        name: String,
        /// Mark the task as important
        #[arg(long)]
        important: bool,
    },
    /// List tasks, important ones first
    List {
        /// Only tasks whose name contains this text
        #[arg(long)]
        search: Option<String>,
        /// Sort order (defaults to the configured one)
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Hide completed tasks
        #[arg(long, conflicts_with = "show_completed")]
        hide_completed: bool,
        /// Show completed tasks even if the config hides them
        #[arg(long)]
        show_completed: bool,
    },
    /// Show every field of a task
    Show {
        id: i64,
    },
    /// Give a task a new name
    Rename {
        id: i64,
        name: String,
    },
    /// Mark a task as completed
    Complete {
        id: i64,
        /// Mark it as not completed instead
        #[arg(long)]
        undo: bool,
    },
    /// Mark a task as important
    Important {
        id: i64,
        /// Remove the important flag instead
        #[arg(long)]
        unset: bool,
    },
    /// Delete a task
    Delete {
        id: i64,
    },
    /// Delete every completed task
    DeleteCompleted,
    /// Write tasks as a JSON bundle
    Export {
        /// Export only this task
        #[arg(long)]
        id: Option<i64>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add the tasks from a JSON bundle (they get new IDs)
    Import {
        file: PathBuf,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Transfer error: {0}")]
    TransferError(#[from] TransferError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One line per task: completion box, importance marker, id, name, creation date
pub fn format_task_row(task: &Task, date_format: &DateFormat) -> String {
    format!(
        "[{}] {} {:>4}  {}  ({})",
        if task.is_completed() { "x" } else { " " },
        if task.is_important() { "!" } else { " " },
        task.id(),
        task.name(),
        task.created_date_formatted_with(date_format)
    )
}

/// Handle the add command
pub fn handle_add<W: Write>(name: String, important: bool, db: &Database, out: &mut W) -> Result<(), CliError> {
    let task = Task::new(name).with_important(important);
    let stored = db.insert_task(&task)?;
    info!(id = stored.id(), "task added from cli");
    writeln!(out, "Task created successfully (ID: {})", stored.id())?;
    Ok(())
}

/// Handle the list command
pub fn handle_list<W: Write>(
    query: &TaskQuery,
    date_format: &DateFormat,
    db: &Database,
    out: &mut W,
) -> Result<(), CliError> {
    let tasks = db.get_tasks(query)?;
    if tasks.is_empty() {
        writeln!(out, "No tasks")?;
        return Ok(());
    }
    for task in &tasks {
        writeln!(out, "{}", format_task_row(task, date_format))?;
    }
    Ok(())
}

/// Handle the show command
pub fn handle_show<W: Write>(id: i64, date_format: &DateFormat, db: &Database, out: &mut W) -> Result<(), CliError> {
    let task = db.get_task(id)?;
    writeln!(out, "ID:        {}", task.id())?;
    writeln!(out, "Name:      {}", task.name())?;
    writeln!(out, "Important: {}", if task.is_important() { "yes" } else { "no" })?;
    writeln!(out, "Completed: {}", if task.is_completed() { "yes" } else { "no" })?;
    writeln!(out, "Created:   {}", task.created_date_formatted_with(date_format))?;
    Ok(())
}

/// Store a changed copy of a task, keeping its ID
fn replace_task<W, F>(id: i64, db: &Database, out: &mut W, change: F) -> Result<Task, CliError>
where
    W: Write,
    F: FnOnce(Task) -> Task,
{
    let updated = change(db.get_task(id)?);
    db.update_task(&updated)?;
    writeln!(out, "Task updated (ID: {})", id)?;
    Ok(updated)
}

pub fn handle_rename<W: Write>(id: i64, name: String, db: &Database, out: &mut W) -> Result<(), CliError> {
    replace_task(id, db, out, |task| task.with_name(name))?;
    Ok(())
}

pub fn handle_complete<W: Write>(id: i64, undo: bool, db: &Database, out: &mut W) -> Result<(), CliError> {
    replace_task(id, db, out, |task| task.with_completed(!undo))?;
    Ok(())
}

pub fn handle_important<W: Write>(id: i64, unset: bool, db: &Database, out: &mut W) -> Result<(), CliError> {
    replace_task(id, db, out, |task| task.with_important(!unset))?;
    Ok(())
}

pub fn handle_delete<W: Write>(id: i64, db: &Database, out: &mut W) -> Result<(), CliError> {
    db.delete_task(id)?;
    info!(id, "task deleted from cli");
    writeln!(out, "Task deleted (ID: {})", id)?;
    Ok(())
}

pub fn handle_delete_completed<W: Write>(db: &Database, out: &mut W) -> Result<(), CliError> {
    let removed = db.delete_completed_tasks()?;
    writeln!(out, "Deleted {} completed task(s)", removed)?;
    Ok(())
}

/// Handle the export command
pub fn handle_export<W: Write>(
    id: Option<i64>,
    output: Option<&Path>,
    db: &Database,
    out: &mut W,
) -> Result<(), CliError> {
    let (bundle, count) = match id {
        Some(id) => (transfer::encode_task(&db.get_task(id)?)?, 1),
        None => {
            let tasks = db.get_all_tasks()?;
            (transfer::encode_tasks(&tasks)?, tasks.len())
        }
    };

    match output {
        Some(path) => {
            fs::write(path, bundle)?;
            writeln!(out, "Exported {} task(s) to {}", count, path.display())?;
        }
        None => writeln!(out, "{}", bundle)?,
    }
    Ok(())
}

/// Handle the import command
pub fn handle_import<W: Write>(file: &Path, db: &Database, out: &mut W) -> Result<(), CliError> {
    let contents = fs::read_to_string(file)?;
    let tasks = transfer::decode_tasks(&contents)?;

    let fresh: Vec<Task> = tasks.into_iter().map(|task| task.with_id(UNASSIGNED_ID)).collect();
    let count = db.insert_tasks(&fresh)?.len();
    info!(count = count, path = %file.display(), "imported tasks");
    writeln!(out, "Imported {} task(s)", count)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TimeZoneSetting;

    fn utc_dates() -> DateFormat {
        DateFormat::new("%Y-%m-%d", TimeZoneSetting::Utc).unwrap()
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["todo", "--dev", "add", "Buy milk", "--important"]).unwrap();
        assert!(cli.dev);
        assert!(matches!(
            cli.command,
            Some(Commands::Add { ref name, important: true }) if name == "Buy milk"
        ));

        let cli = Cli::try_parse_from(["todo", "list", "--sort", "date", "--hide-completed"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::List { sort: Some(SortArg::Date), hide_completed: true, .. })
        ));

        assert!(Cli::try_parse_from(["todo", "list", "--hide-completed", "--show-completed"]).is_err());
        assert!(Cli::try_parse_from(["todo"]).unwrap().command.is_none());
    }

    #[test]
    fn rows_mark_completed_and_important() {
        let task = Task::from_parts("Pay rent", true, true, 1_704_467_045_000, 12);
        assert_eq!(format_task_row(&task, &utc_dates()), "[x] !   12  Pay rent  (2024-01-05)");
    }

    #[test]
    fn add_then_list() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        handle_add("Buy milk".to_string(), true, &db, &mut out).unwrap();
        assert_eq!(output(out), "Task created successfully (ID: 1)\n");

        let mut out = Vec::new();
        handle_list(&TaskQuery::default(), &utc_dates(), &db, &mut out).unwrap();
        assert!(output(out).starts_with("[ ] !    1  Buy milk  ("));
    }

    #[test]
    fn list_reports_empty_store() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        handle_list(&TaskQuery::default(), &utc_dates(), &db, &mut out).unwrap();
        assert_eq!(output(out), "No tasks\n");
    }

    #[test]
    fn updates_keep_id_and_created() {
        let db = Database::open_in_memory().unwrap();
        let stored = db.insert_task(&Task::from_parts("Draft", false, false, 5, 0)).unwrap();
        let mut out = Vec::new();

        handle_rename(stored.id(), "Final".to_string(), &db, &mut out).unwrap();
        handle_complete(stored.id(), false, &db, &mut out).unwrap();
        handle_important(stored.id(), false, &db, &mut out).unwrap();
        assert_eq!(db.get_task(stored.id()).unwrap(), Task::from_parts("Final", true, true, 5, stored.id()));

        handle_complete(stored.id(), true, &db, &mut out).unwrap();
        handle_important(stored.id(), true, &db, &mut out).unwrap();
        assert_eq!(db.get_task(stored.id()).unwrap(), Task::from_parts("Final", false, false, 5, stored.id()));
    }

    #[test]
    fn missing_ids_are_errors() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            handle_show(3, &utc_dates(), &db, &mut out),
            Err(CliError::DatabaseError(DatabaseError::NotFound(3)))
        ));
        assert!(handle_delete(3, &db, &mut out).is_err());
        assert!(handle_complete(3, false, &db, &mut out).is_err());
    }

    #[test]
    fn show_prints_all_fields() {
        let db = Database::open_in_memory().unwrap();
        let stored = db.insert_task(&Task::from_parts("Walk dog", false, true, 1_704_467_045_000, 0)).unwrap();
        let mut out = Vec::new();
        handle_show(stored.id(), &utc_dates(), &db, &mut out).unwrap();
        assert_eq!(
            output(out),
            "ID:        1\nName:      Walk dog\nImportant: no\nCompleted: yes\nCreated:   2024-01-05\n"
        );
    }

    #[test]
    fn export_then_import_copies_tasks_with_new_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let source = Database::open_in_memory().unwrap();
        source.insert_task(&Task::from_parts("a", true, false, 1, 0)).unwrap();
        source.insert_task(&Task::from_parts("b", false, true, 2, 0)).unwrap();

        let mut out = Vec::new();
        handle_export(None, Some(&path), &source, &mut out).unwrap();
        assert!(output(out).starts_with("Exported 2 task(s)"));

        let target = Database::open_in_memory().unwrap();
        target.insert_task(&Task::from_parts("existing", false, false, 0, 0)).unwrap();
        let mut out = Vec::new();
        handle_import(&path, &target, &mut out).unwrap();
        assert_eq!(output(out), "Imported 2 task(s)\n");

        let imported = target.get_all_tasks().unwrap();
        assert_eq!(imported.len(), 3);
        assert_eq!(imported[1], Task::from_parts("a", true, false, 1, 2));
        assert_eq!(imported[2], Task::from_parts("b", false, true, 2, 3));
    }

    #[test]
    fn export_single_task_to_stdout() {
        let db = Database::open_in_memory().unwrap();
        let stored = db.insert_task(&Task::from_parts("a", false, false, 1, 0)).unwrap();
        let mut out = Vec::new();
        handle_export(Some(stored.id()), None, &db, &mut out).unwrap();

        let printed = output(out);
        assert_eq!(transfer::decode_task(printed.trim()).unwrap(), stored);
    }
}
