use directories::ProjectDirs;
use std::{
    env,
    path::PathBuf,
};

lazy_static::lazy_static! {
    /// Prefix of every environment variable the exporter reads.
    pub(crate) static ref PROJECT_NAME: String = "INSTAGRAM_EXPORTER".to_string();
    /// `INSTAGRAM_EXPORTER_DATA`: where the session is stored.
    static ref DATA_FOLDER: Option<PathBuf> = folder_override("DATA");
    /// `INSTAGRAM_EXPORTER_CONFIG`: where `config.yaml` is looked up.
    static ref CONFIG_FOLDER: Option<PathBuf> = folder_override("CONFIG");
}

fn folder_override(suffix: &str) -> Option<PathBuf> {
    env::var_os(format!("{}_{suffix}", *PROJECT_NAME))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// The env override, else the platform's local data directory, else `./.data`.
pub fn get_data_dir() -> PathBuf {
    DATA_FOLDER
        .clone()
        .or_else(|| project_directory().map(|dirs| dirs.data_local_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from(".").join(".data"))
}

/// The env override, else the platform's local config directory, else `./.config`.
pub fn get_config_dir() -> PathBuf {
    CONFIG_FOLDER
        .clone()
        .or_else(|| project_directory().map(|dirs| dirs.config_local_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from(".").join(".config"))
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "maxcleme", "instagram-exporter")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_override_reads_prefixed_variable() {
        env::set_var("INSTAGRAM_EXPORTER_OVERRIDE_SET", "/srv/exporter");
        env::set_var("INSTAGRAM_EXPORTER_OVERRIDE_EMPTY", "");

        assert_eq!(folder_override("OVERRIDE_SET"), Some(PathBuf::from("/srv/exporter")));
        assert_eq!(folder_override("OVERRIDE_EMPTY"), None);
        assert_eq!(folder_override("OVERRIDE_UNSET"), None);
    }
}
