pub mod cli;
pub mod clock;
pub mod config;
pub mod database;
pub mod format;
pub mod logging;
pub mod models;
pub mod schema;
pub mod text;
pub mod transfer;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use models::Task;
pub use utils::Profile;
