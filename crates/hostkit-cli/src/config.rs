//! Host configuration – reads/writes `~/.hostkit/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use hostkit_hal::settings::{HW_MAINKEYS_PROPERTY, MemorySettingsStore, NAVIGATION_BAR_SHOW};
use hostkit_kernel::{DEFAULT_CONTROL_SERVICE, DEFAULT_UI_PROCESS};
use hostkit_types::DisplayMetrics;
use tracing::warn;

/// Default-display metrics reported to the screen classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,
    #[serde(default = "default_density_dpi")]
    pub density_dpi: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width_px: default_width_px(),
            height_px: default_height_px(),
            density_dpi: default_density_dpi(),
        }
    }
}

impl From<&DisplayConfig> for DisplayMetrics {
    fn from(d: &DisplayConfig) -> Self {
        DisplayMetrics::new(d.width_px, d.height_px, d.density_dpi)
    }
}

/// Persisted host configuration stored in `~/.hostkit/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Process targeted by `hostkit restart` with no name.
    #[serde(default = "default_ui_process")]
    pub ui_process: String,

    /// Name the control service is looked up under.
    #[serde(default = "default_control_service")]
    pub control_service: String,

    /// Directory holding `<service>.sock` control sockets.
    #[serde(default = "default_service_socket_dir")]
    pub service_socket_dir: PathBuf,

    /// Read/write timeout for one remote call, in milliseconds.
    #[serde(default = "default_service_timeout_ms")]
    pub service_timeout_ms: u64,

    /// Property consulted as the navigation bar platform override.
    #[serde(default = "default_override_property")]
    pub override_property: String,

    /// Prefix of the environment variables properties are read from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub property_env_prefix: String,

    /// User the "current user" resolves to.
    #[serde(default)]
    pub current_user: u32,

    #[serde(default)]
    pub display: DisplayConfig,

    /// Raw `navigation_bar_show` value per user id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub navigation_bar_show: BTreeMap<String, i32>,
}

fn default_ui_process() -> String {
    DEFAULT_UI_PROCESS.to_string()
}
fn default_control_service() -> String {
    DEFAULT_CONTROL_SERVICE.to_string()
}
fn default_service_socket_dir() -> PathBuf {
    PathBuf::from("/run/hostkit")
}
fn default_service_timeout_ms() -> u64 {
    2000
}
fn default_override_property() -> String {
    HW_MAINKEYS_PROPERTY.to_string()
}
fn default_width_px() -> u32 {
    1080
}
fn default_height_px() -> u32 {
    1920
}
fn default_density_dpi() -> u32 {
    420
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ui_process: default_ui_process(),
            control_service: default_control_service(),
            service_socket_dir: default_service_socket_dir(),
            service_timeout_ms: default_service_timeout_ms(),
            override_property: default_override_property(),
            property_env_prefix: String::new(),
            current_user: 0,
            display: DisplayConfig::default(),
            navigation_bar_show: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn service_timeout(&self) -> Duration {
        Duration::from_millis(self.service_timeout_ms)
    }

    /// Build a settings store seeded from `[navigation_bar_show]`.
    ///
    /// Entries whose key is not a user id are skipped with a warning.
    pub fn settings_store(&self) -> MemorySettingsStore {
        let store = MemorySettingsStore::new().with_current_user(self.current_user);
        for (user, raw) in self.navigation_bar_entries() {
            store.put(user, NAVIGATION_BAR_SHOW, raw);
        }
        store
    }

    /// `[navigation_bar_show]` entries with parsed user ids.
    pub fn navigation_bar_entries(&self) -> Vec<(u32, i32)> {
        self.navigation_bar_show
            .iter()
            .filter_map(|(user, raw)| match user.parse::<u32>() {
                Ok(id) => Some((id, *raw)),
                Err(_) => {
                    warn!(key = %user, "ignoring navigation_bar_show entry: not a user id");
                    None
                }
            })
            .collect()
    }
}

/// Return the path to `~/.hostkit/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".hostkit").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config, falling back to defaults (with environment overrides
/// applied) when the file does not exist.
pub fn load_or_default() -> Result<Config, String> {
    match load()? {
        Some(cfg) => Ok(cfg),
        None => {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            Ok(cfg)
        }
    }
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `HOSTKIT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `HOSTKIT_UI_PROCESS` | `ui_process` |
/// | `HOSTKIT_CONTROL_SERVICE` | `control_service` |
/// | `HOSTKIT_SOCKET_DIR` | `service_socket_dir` |
/// | `HOSTKIT_CURRENT_USER` | `current_user` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("HOSTKIT_UI_PROCESS") {
        cfg.ui_process = v;
    }
    if let Ok(v) = std::env::var("HOSTKIT_CONTROL_SERVICE") {
        cfg.control_service = v;
    }
    if let Ok(v) = std::env::var("HOSTKIT_SOCKET_DIR") {
        cfg.service_socket_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("HOSTKIT_CURRENT_USER")
        && let Ok(user) = v.parse::<u32>()
    {
        cfg.current_user = user;
    }
}

/// Save the config to disk, creating `~/.hostkit/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
