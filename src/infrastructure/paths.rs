//! Path manipulation utilities for Zellij sandbox environment.
//!
//! The host filesystem is mounted under `/host` inside the plugin sandbox.
//! These helpers translate between user-facing paths and sandbox paths.

use std::path::PathBuf;

/// File name of the persisted view state inside [`get_data_dir`].
pub const VIEW_STATE_FILE: &str = "view_state.json";

/// Returns the data directory for report viewer storage.
///
/// The directory is located at `/host/.local/share/zellij/reportlens` in the
/// Zellij sandbox. `/host` points to the cwd of the last focused terminal, or
/// the folder where Zellij was started, which is usually the home directory.
///
/// # Examples
///
/// ```
/// use reportlens::infrastructure::get_data_dir;
///
/// let data_dir = get_data_dir();
/// assert_eq!(data_dir.to_str().unwrap(), "/host/.local/share/zellij/reportlens");
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    PathBuf::from("/host/.local/share/zellij").join("reportlens")
}

/// Path of the JSON file holding persisted filters, sort, and expansion flags.
#[must_use]
pub fn view_state_path() -> PathBuf {
    get_data_dir().join(VIEW_STATE_FILE)
}

/// Expands tilde paths to use the `/host` prefix for Zellij sandbox.
///
/// # Examples
///
/// ```
/// use reportlens::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("~/logs/blog_report.json"), "/host/logs/blog_report.json");
/// assert_eq!(expand_tilde("~"), "/host");
/// assert_eq!(expand_tilde("/absolute/path"), "/absolute/path");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        path.replacen('~', "/host", 1)
    } else if path == "~" {
        "/host".to_string()
    } else {
        path.to_string()
    }
}

/// Replaces the `/host` prefix with `~` for display in the header.
///
/// # Examples
///
/// ```
/// use reportlens::infrastructure::display_path;
///
/// assert_eq!(display_path("/host/logs/blog_report.json"), "~/logs/blog_report.json");
/// assert_eq!(display_path("/host"), "~");
/// assert_eq!(display_path("/hostile/report.json"), "/hostile/report.json");
/// ```
#[must_use]
pub fn display_path(path: &str) -> String {
    match path.strip_prefix("/host") {
        Some("") => "~".to_string(),
        Some(rest) if rest.starts_with('/') => format!("~{rest}"),
        _ => path.to_string(),
    }
}
