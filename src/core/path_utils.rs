/*
 * Locates the per-user directories the application writes to: the local
 * configuration directory holding view preferences, and the log file inside it.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

const LOG_FILE_NAME: &str = "appview.log";

/*
 * Retrieves the application's local configuration directory, creating it when it
 * does not exist yet. Returns `None` if the platform offers no suitable location
 * or the directory cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving config dir for '{app_name}'");
    let proj_dirs = ProjectDirs::from("", "", app_name)?;
    let config_path = proj_dirs.config_local_dir();
    if !config_path.exists() {
        if let Err(e) = fs::create_dir_all(config_path) {
            log::error!("PathUtils: Failed to create config directory {config_path:?}: {e}");
            return None;
        }
        log::debug!("PathUtils: Created config directory {config_path:?}");
    }
    Some(config_path.to_path_buf())
}

/* Path of the log file, inside the local configuration directory. */
pub fn get_log_file_path(app_name: &str) -> Option<PathBuf> {
    get_base_app_config_local_dir(app_name).map(|dir| dir.join(LOG_FILE_NAME))
}
