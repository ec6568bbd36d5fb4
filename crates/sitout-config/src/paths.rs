use std::path::PathBuf;

/// XDG app name used for config paths.
pub const APP_NAME: &str = "sitout";

/// User config directory (`~/.config/sitout` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}
