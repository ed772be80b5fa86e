use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    Dev,
    #[default]
    Prod,
}

impl Profile {
    pub fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "todolist-dev",
            Profile::Prod => "todolist",
        }
    }
}

/// Get the configuration directory path
/// If profile is Dev, uses "todolist-dev" instead of "todolist"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "todolist", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path (database and log file)
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "todolist", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parsed key binding information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedKeyBinding {
    pub key_code: KeyCode,
    pub requires_ctrl: bool,
}

impl ParsedKeyBinding {
    /// Whether a key press triggers this binding
    pub fn matches(&self, key_event: &KeyEvent) -> bool {
        if self.key_code != key_event.code {
            return false;
        }
        self.requires_ctrl == has_primary_modifier(key_event.modifiers)
    }
}

/// Check if a key event has the primary modifier (Ctrl on Windows/Linux, Option/Alt on macOS)
pub fn has_primary_modifier(modifiers: KeyModifiers) -> bool {
    #[cfg(target_os = "macos")]
    {
        modifiers.contains(KeyModifiers::CONTROL) || modifiers.contains(KeyModifiers::ALT)
    }

    #[cfg(not(target_os = "macos"))]
    {
        modifiers.contains(KeyModifiers::CONTROL)
    }
}

/// Format a key binding string for display, showing the platform-appropriate modifier
/// On macOS, "Ctrl+" is shown as "Opt+"
pub fn format_key_binding_for_display(key_binding: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        key_binding.replace("Ctrl+", "Opt+")
    }

    #[cfg(not(target_os = "macos"))]
    {
        key_binding.to_string()
    }
}

/// Parse a key binding string from config into a ParsedKeyBinding
/// Supports: single keys ("q", "n"), special keys ("Enter", "Space", "Up"),
/// and the Ctrl modifier ("Ctrl+d")
pub fn parse_key_binding(key_str: &str) -> Result<ParsedKeyBinding, String> {
    let key_str = key_str.trim();

    if let Some(key_part) = key_str.strip_prefix("Ctrl+") {
        return Ok(ParsedKeyBinding {
            key_code: parse_key_code(key_part)?,
            requires_ctrl: true,
        });
    }

    Ok(ParsedKeyBinding {
        key_code: parse_key_code(key_str)?,
        requires_ctrl: false,
    })
}

/// Parse a key code from a string (without modifiers)
fn parse_key_code(key_str: &str) -> Result<KeyCode, String> {
    match key_str {
        "Enter" => Ok(KeyCode::Enter),
        "Esc" | "Escape" => Ok(KeyCode::Esc),
        "Backspace" => Ok(KeyCode::Backspace),
        "Tab" => Ok(KeyCode::Tab),
        "Space" | " " => Ok(KeyCode::Char(' ')),
        "Left" => Ok(KeyCode::Left),
        "Right" => Ok(KeyCode::Right),
        "Up" => Ok(KeyCode::Up),
        "Down" => Ok(KeyCode::Down),
        "Home" => Ok(KeyCode::Home),
        "End" => Ok(KeyCode::End),
        "PageUp" => Ok(KeyCode::PageUp),
        "PageDown" => Ok(KeyCode::PageDown),
        "Delete" => Ok(KeyCode::Delete),
        _ => {
            if let Some(number) = key_str.strip_prefix('F') {
                if let Ok(n @ 1..=12) = number.parse::<u8>() {
                    return Ok(KeyCode::F(n));
                }
            }
            let mut chars = key_str.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(KeyCode::Char(c)),
                _ => Err(format!("Unknown key binding: {}", key_str)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_special_and_ctrl_keys() {
        assert_eq!(
            parse_key_binding("q").unwrap(),
            ParsedKeyBinding { key_code: KeyCode::Char('q'), requires_ctrl: false }
        );
        assert_eq!(parse_key_binding("Space").unwrap().key_code, KeyCode::Char(' '));
        assert_eq!(parse_key_binding("F1").unwrap().key_code, KeyCode::F(1));
        assert_eq!(
            parse_key_binding("Ctrl+d").unwrap(),
            ParsedKeyBinding { key_code: KeyCode::Char('d'), requires_ctrl: true }
        );
        assert!(parse_key_binding("Hyper+x").is_err());
        assert!(parse_key_binding("F13").is_err());
    }

    #[test]
    fn binding_matches_key_events() {
        let binding = parse_key_binding("Ctrl+d").unwrap();
        assert!(binding.matches(&KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL)));
        assert!(!binding.matches(&KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE)));

        let plain = parse_key_binding("d").unwrap();
        assert!(plain.matches(&KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE)));
        assert!(!plain.matches(&KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn expands_home_prefix_only() {
        assert_eq!(expand_path("/tmp/tasks.db"), PathBuf::from("/tmp/tasks.db"));
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            assert_eq!(expand_path("~/tasks.db"), home.join("tasks.db"));
        }
    }

    #[test]
    fn profiles_use_separate_app_names() {
        assert_ne!(Profile::Dev.app_name(), Profile::Prod.app_name());
    }
}
