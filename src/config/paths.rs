//!
//! Platform-native path resolution for Transcript Guard configuration.
//!
//! - Linux/Unix: XDG Base Directory Specification (~/.config)
//! - macOS: Application Support directories (~/Library/...)
//! - Windows: Known Folder system (%APPDATA%)
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::error::{GuardError, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/* --- constants ------------------------------------------------------------------------------- */

/// Application name for directory resolution
const APP_NAME: &str = "transcript-guard";
/// Organization qualifier for directory resolution
const ORGANIZATION: &str = "com";
/// Organization name for directory resolution
const ORG_NAME: &str = "SkyCorp";
/// Configuration file name inside each config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/* --- public functions ------------------------------------------------------------------------ */

/// Get the user configuration directory
///
/// - Linux: ~/.config/transcript-guard/
/// - macOS: ~/Library/Application Support/transcript-guard/
/// - Windows: %APPDATA%/transcript-guard/
///
/// The directory is not created; nothing in the service writes configuration.
pub fn user_config_dir() -> Result<PathBuf> {
    Ok(get_project_dirs()?.config_dir().to_path_buf())
}

/// Get the system-wide configuration directory
///
/// - Linux: /etc/transcript-guard/
/// - macOS: /Library/Preferences/transcript-guard/
/// - Windows: %PROGRAMDATA%/transcript-guard/
pub fn system_config_dir() -> Result<PathBuf> {
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Ok(PathBuf::from("/etc").join(APP_NAME))
    }

    #[cfg(target_os = "macos")]
    {
        Ok(PathBuf::from("/Library/Preferences").join(APP_NAME))
    }

    #[cfg(windows)]
    {
        std::env::var("PROGRAMDATA").map(|path| PathBuf::from(path).join(APP_NAME)).map_err(|_| {
            GuardError::Config("PROGRAMDATA environment variable not found".to_string())
        })
    }
}

/// Path of the user configuration file
pub fn user_config_file() -> Result<PathBuf> {
    Ok(user_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Path of the system configuration file
pub fn system_config_file() -> Result<PathBuf> {
    Ok(system_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Expand `~` and environment variables in file paths
///
/// # Arguments
/// * `path` - Path string that may contain ~ or $VARS
///
/// # Returns
/// * `Ok(PathBuf)` - Expanded path
/// * `Err(GuardError)` - Home directory unknown or variable undefined
pub fn expand_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path_str = path.as_ref().to_string_lossy();

    if !path_str.starts_with('~') && !path_str.contains('$') {
        return Ok(path.as_ref().to_path_buf());
    }

    let expanded = shellexpand::full(&path_str).map_err(|e| {
        GuardError::Config(format!("Failed to expand path '{}': {}", path_str, e))
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Check that a configuration file exists, is a regular file, and is readable
pub fn validate_config_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(GuardError::Config(format!(
            "Configuration file '{}' does not exist",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(GuardError::Config(format!(
            "Configuration path '{}' exists but is not a regular file",
            path.display()
        )));
    }

    std::fs::File::open(path).map_err(|e| {
        GuardError::Config(format!(
            "Configuration file '{}' exists but cannot be read: {}\n\
             You can fix this with: chmod 644 '{}'",
            path.display(),
            e,
            path.display()
        ))
    })?;

    Ok(())
}

/// Configuration file paths in precedence order (highest first)
pub fn config_file_paths() -> Vec<PathBuf> {
    [user_config_file(), system_config_file()].into_iter().filter_map(Result::ok).collect()
}

/* --- private functions ----------------------------------------------------------------------- */

fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from(ORGANIZATION, ORG_NAME, APP_NAME).ok_or_else(|| {
        GuardError::Config(
            "Unable to determine user directories. \
             Please ensure your user account has a valid home directory."
                .to_string(),
        )
    })
}

/* --- tests ----------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_user_config_file_path() {
        let config_file = user_config_file().expect("Should get config file path");
        assert_eq!(config_file.file_name().unwrap(), CONFIG_FILE_NAME);
    }

    #[test]
    fn test_tilde_expansion() {
        let expanded = expand_path("~/test/path").expect("Should expand tilde");
        assert!(!expanded.to_string_lossy().contains('~'), "Tilde should be expanded");

        let absolute = expand_path("/absolute/path").expect("Should handle absolute path");
        assert_eq!(absolute, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TRANSCRIPT_GUARD_TEST_DIR", Some("/srv/guard"), || {
            let expanded = expand_path("$TRANSCRIPT_GUARD_TEST_DIR/config.toml").unwrap();
            assert_eq!(expanded, PathBuf::from("/srv/guard/config.toml"));
        });
    }

    #[test]
    fn test_validate_config_file() {
        assert!(validate_config_file("/non/existent/file.toml").is_err());

        let temp_dir = TempDir::new().unwrap();
        assert!(validate_config_file(temp_dir.path()).is_err(), "Directories are rejected");

        let temp_file = temp_dir.path().join("test.toml");
        fs::write(&temp_file, "test content").unwrap();
        assert!(validate_config_file(&temp_file).is_ok());
    }

    #[test]
    fn test_config_file_paths_order() {
        let paths = config_file_paths();
        assert!(!paths.is_empty(), "Should return at least one config path");

        #[cfg(all(unix, not(target_os = "macos")))]
        assert_eq!(paths.last().unwrap(), &PathBuf::from("/etc/transcript-guard/config.toml"));
    }
}
