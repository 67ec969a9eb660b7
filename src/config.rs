//! Host configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! is a valid configuration. Resolution order:
//!
//! 1. Explicit path (from the `--config` CLI flag)
//! 2. `KERNEL_HOST_CONFIG` environment variable
//! 3. `<config dir>/kernel-host/config.json`, if it exists
//! 4. Built-in defaults

use crate::error::{Error, IoError, Result};
use crate::io::read_file;
use crate::markup::{ColorTable, LinkTable, MarkupParser};
use crate::memory::{DEFAULT_SCAN_LIMIT, DEFAULT_SLOT_CAPACITY, MemoryView};
use crate::render::HexGeometry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "KERNEL_HOST_CONFIG";

/// Directory under the platform config dir.
const CONFIG_DIR_NAME: &str = "kernel-host";

/// File name inside [`CONFIG_DIR_NAME`].
const CONFIG_FILE_NAME: &str = "config.json";

/// Periods of the scheduler's activities, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Module heartbeat plus frame and dump redraw.
    pub heartbeat_ms: u64,
    /// Frequent stat sampling.
    pub stats_ms: u64,
    /// Battery sampling.
    pub battery_ms: u64,
    /// Clock redraw.
    pub clock_ms: u64,
    /// Uptime push.
    pub uptime_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            heartbeat_ms: 50,
            stats_ms: 1000,
            battery_ms: 10_000,
            clock_ms: 1000,
            uptime_ms: 1000,
        }
    }
}

impl TimerConfig {
    /// Heartbeat period.
    #[must_use]
    pub const fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    /// Stat sampling period.
    #[must_use]
    pub const fn stats(&self) -> Duration {
        Duration::from_millis(self.stats_ms)
    }

    /// Battery sampling period.
    #[must_use]
    pub const fn battery(&self) -> Duration {
        Duration::from_millis(self.battery_ms)
    }

    /// Clock period.
    #[must_use]
    pub const fn clock(&self) -> Duration {
        Duration::from_millis(self.clock_ms)
    }

    /// Uptime period.
    #[must_use]
    pub const fn uptime(&self) -> Duration {
        Duration::from_millis(self.uptime_ms)
    }

    fn validate(&self) -> Result<()> {
        let periods = [
            ("heartbeat_ms", self.heartbeat_ms),
            ("stats_ms", self.stats_ms),
            ("battery_ms", self.battery_ms),
            ("clock_ms", self.clock_ms),
            ("uptime_ms", self.uptime_ms),
        ];
        match periods.iter().find(|(_, ms)| *ms == 0) {
            Some((name, _)) => Err(Error::Config {
                message: format!("timers.{name} must be greater than zero"),
            }),
            None => Ok(()),
        }
    }
}

/// Screen size reported to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Complete host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Scheduler periods.
    pub timers: TimerConfig,
    /// Memory dump panel geometry.
    pub hexdump: HexGeometry,
    /// Input slot capacity in bytes, terminator included.
    pub slot_capacity: usize,
    /// Maximum bytes scanned for a C-string terminator.
    pub scan_limit: usize,
    /// Prompt identity, shown before the working directory.
    pub identity: String,
    /// Command run once boot completes. `null` disables it.
    pub boot_command: Option<String>,
    /// Screen size pushed to the module.
    pub viewport: Viewport,
    /// Terminal locale pushed to the module. Taken from `LANG` when unset.
    pub locale: Option<String>,
    /// File rewritten with the full page on every clock tick.
    pub snapshot: Option<PathBuf>,
    /// Link id table.
    pub links: LinkTable,
    /// Color code table.
    pub colors: ColorTable,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            timers: TimerConfig::default(),
            hexdump: HexGeometry::default(),
            slot_capacity: DEFAULT_SLOT_CAPACITY,
            scan_limit: DEFAULT_SCAN_LIMIT,
            identity: "billie-bytes@portfolio".to_string(),
            boot_command: Some("cat intro.txt".to_string()),
            viewport: Viewport::default(),
            locale: None,
            snapshot: None,
            links: LinkTable::default(),
            colors: ColorTable::default(),
        }
    }
}

impl HostConfig {
    /// Resolves and loads the configuration.
    ///
    /// An explicit path or `KERNEL_HOST_CONFIG` must name an existing
    /// file; the default location is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file is missing or any file found does
    /// not parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Self::from_file(Path::new(&path));
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Loads the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or
    /// holds a zero timer period.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }
        let text = read_file(path)?;
        let config = Self::from_json(&text).map_err(|e| Error::Config {
            message: format!("{}: {e}", path.display()),
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the JSON does not parse or a timer
    /// period is zero.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.timers.validate()?;
        Ok(config)
    }

    /// Returns the default config file location.
    ///
    /// Returns `None` if the platform config directory cannot be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Builds the memory view for these limits.
    #[must_use]
    pub const fn memory_view(&self) -> MemoryView {
        MemoryView::new(self.scan_limit, self.slot_capacity)
    }

    /// Builds the markup parser for these tables.
    #[must_use]
    pub fn markup_parser(&self) -> MarkupParser {
        MarkupParser::new(self.links.clone(), self.colors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.timers.heartbeat(), Duration::from_millis(50));
        assert_eq!(config.timers.battery(), Duration::from_secs(10));
        assert_eq!(config.slot_capacity, 4096);
        assert_eq!(config.scan_limit, 65536);
        assert_eq!(config.boot_command.as_deref(), Some("cat intro.txt"));
        assert_eq!(config.hexdump.header_px, 30);
    }

    #[test]
    fn test_empty_object_is_defaults() {
        assert_eq!(HostConfig::from_json("{}").unwrap(), HostConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = HostConfig::from_json(
            r#"{"timers": {"heartbeat_ms": 16}, "identity": "me@box", "boot_command": null}"#,
        )
        .unwrap();
        assert_eq!(config.timers.heartbeat_ms, 16);
        assert_eq!(config.timers.stats_ms, 1000);
        assert_eq!(config.identity, "me@box");
        assert!(config.boot_command.is_none());
    }

    #[test]
    fn test_zero_period_rejected() {
        let err = HostConfig::from_json(r#"{"timers": {"clock_ms": 0}}"#).unwrap_err();
        assert!(err.to_string().contains("clock_ms"));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = HostConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"viewport": {{"width": 800}}}}"#).unwrap();
        file.flush().unwrap();

        let config = HostConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.viewport.width, 800);
        assert_eq!(config.viewport.height, 1080);
    }

    #[test]
    fn test_explicit_missing_path() {
        let err = HostConfig::load(Some(Path::new("/nonexistent/kernel-host.json"))).unwrap_err();
        assert!(matches!(err, Error::Io(IoError::FileNotFound { .. })));
    }

    #[test]
    fn test_custom_tables_reach_parser() {
        let config = HostConfig::from_json(r#"{"colors": {"91": "crimson"}}"#).unwrap();
        assert_eq!(
            config.markup_parser().parse("\x1b[91mx"),
            r#"<span style="color: crimson">x</span>"#
        );
        // replacing the table drops the defaults
        assert_eq!(config.markup_parser().parse("\x1b[31mx"), "x");
    }
}
