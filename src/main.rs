use clap::Parser;
use color_eyre::Result;
use std::io;
use todolist::{
    Config, Database, Profile,
    cli::{self, Cli, Commands},
    logging, utils,
};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    // Logs go to a file; stdout belongs to command output and the TUI
    let _log_guard = utils::get_data_dir(profile).and_then(|dir| logging::init(&dir));

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::get_config_path(profile)?,
    };
    let config = Config::load_from_path(&config_path, profile)?;
    let date_format = config.date_format()?;

    let db = Database::new(config.get_database_path())?;
    tracing::info!(profile = profile.app_name(), "starting");

    let mut out = io::stdout().lock();

    // Dispatch to appropriate command handler
    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            drop(out);
            let app = todolist::tui::App::new(config, Some(config_path), db)?;
            todolist::tui::run_event_loop(app)?;
        }
        Commands::Add { name, important } => {
            cli::handle_add(name, important, &db, &mut out)?;
        }
        Commands::List { search, sort, hide_completed, show_completed } => {
            let mut query = config.default_query();
            if let Some(search) = search {
                query.search = search;
            }
            if let Some(sort) = sort {
                query.sort_order = sort.into();
            }
            if hide_completed {
                query.hide_completed = true;
            } else if show_completed {
                query.hide_completed = false;
            }
            cli::handle_list(&query, &date_format, &db, &mut out)?;
        }
        Commands::Show { id } => {
            cli::handle_show(id, &date_format, &db, &mut out)?;
        }
        Commands::Rename { id, name } => {
            cli::handle_rename(id, name, &db, &mut out)?;
        }
        Commands::Complete { id, undo } => {
            cli::handle_complete(id, undo, &db, &mut out)?;
        }
        Commands::Important { id, unset } => {
            cli::handle_important(id, unset, &db, &mut out)?;
        }
        Commands::Delete { id } => {
            cli::handle_delete(id, &db, &mut out)?;
        }
        Commands::DeleteCompleted => {
            cli::handle_delete_completed(&db, &mut out)?;
        }
        Commands::Export { id, output } => {
            cli::handle_export(id, output.as_deref(), &db, &mut out)?;
        }
        Commands::Import { file } => {
            cli::handle_import(&file, &db, &mut out)?;
        }
    }

    Ok(())
}
