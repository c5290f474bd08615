use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use calltree_core::dashboard::StatusPreset;
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "calltree";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_PAGE_SIZE: u32 = 1000;
pub const MAX_PAGE_SIZE: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub refresh_interval_secs: u64,
    pub page_size: u32,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Preselect departments with replies when no filter flag is given.
    pub default_department_filter: bool,
    pub default_preset: StatusPreset,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            dashboard: DashboardConfig {
                default_department_filter: true,
                default_preset: StatusPreset::All,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid refresh_interval_secs value: {0} (expected 1..=3600)")]
    InvalidRefreshInterval(u64),
    #[error("invalid page_size value: {0} (expected 1..=10000)")]
    InvalidPageSize(u32),
    #[error("invalid dashboard.default_preset value: {0}")]
    InvalidPreset(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    refresh_interval_secs: Option<u64>,
    page_size: Option<u32>,
    dashboard: Option<DashboardFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DashboardFile {
    default_department_filter: Option<bool>,
    default_preset: Option<String>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = custom {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfigPath(path));
        }
        return Ok(path);
    }

    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => {
            let path = PathBuf::from(dir);
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            path
        }
        None => dirs::home_dir()
            .ok_or(ConfigError::MissingHomeDir)?
            .join(".config"),
    };
    Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(interval) = parsed.refresh_interval_secs {
        if interval == 0 || interval > MAX_REFRESH_INTERVAL_SECS {
            return Err(ConfigError::InvalidRefreshInterval(interval));
        }
        config.refresh_interval_secs = interval;
    }

    if let Some(page_size) = parsed.page_size {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize(page_size));
        }
        config.page_size = page_size;
    }

    if let Some(dashboard) = parsed.dashboard {
        if let Some(enabled) = dashboard.default_department_filter {
            config.dashboard.default_department_filter = enabled;
        }
        if let Some(preset) = dashboard.default_preset {
            config.dashboard.default_preset =
                StatusPreset::parse(&preset).map_err(|_| ConfigError::InvalidPreset(preset))?;
        }
    }

    Ok(config)
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
