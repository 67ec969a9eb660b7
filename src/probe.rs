//! Host-observable metrics pushed into the module.
//!
//! Every reading is optional. A metric the host cannot read is skipped by
//! the scheduler for that round and tried again on the next one.

use crate::config::{HostConfig, Viewport};
use std::path::{Path, PathBuf};

/// Source of host metrics.
pub trait HostProbe {
    /// Screen width and height in pixels.
    fn viewport(&self) -> Option<(u32, u32)>;

    /// Logical core count.
    fn cores(&self) -> Option<u32>;

    /// Installed memory in GiB.
    fn ram_gib(&self) -> Option<u32>;

    /// Terminal locale, e.g. `en-US`.
    fn locale(&self) -> Option<String>;

    /// Host memory currently in use, in bytes.
    fn memory_usage(&self) -> Option<u64>;

    /// Battery charge, 0 to 100.
    fn battery_percent(&self) -> Option<u32>;
}

/// Probe backed by the running system.
///
/// Reads `/proc` and `/sys` on Linux. On other platforms the file-backed
/// metrics are simply unavailable.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    viewport: Viewport,
    locale: Option<String>,
    proc_root: PathBuf,
    power_supply: PathBuf,
}

/// Page size assumed when converting `statm` pages to bytes.
const PAGE_SIZE: u64 = 4096;

impl SystemProbe {
    /// Creates a probe using the configured viewport and locale.
    #[must_use]
    pub fn new(config: &HostConfig) -> Self {
        Self {
            viewport: config.viewport,
            locale: config.locale.clone(),
            proc_root: PathBuf::from("/proc"),
            power_supply: PathBuf::from("/sys/class/power_supply"),
        }
    }

    /// Reads `/proc`-style files from another root.
    #[must_use]
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    /// Reads power supplies from another directory.
    #[must_use]
    pub fn with_power_supply_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.power_supply = dir.into();
        self
    }

    fn read(path: &Path) -> Option<String> {
        std::fs::read_to_string(path)
            .inspect_err(|e| tracing::trace!(path = %path.display(), error = %e, "metric unavailable"))
            .ok()
    }
}

impl HostProbe for SystemProbe {
    fn viewport(&self) -> Option<(u32, u32)> {
        Some((self.viewport.width, self.viewport.height))
    }

    fn cores(&self) -> Option<u32> {
        std::thread::available_parallelism()
            .ok()
            .and_then(|n| u32::try_from(n.get()).ok())
    }

    fn ram_gib(&self) -> Option<u32> {
        Self::read(&self.proc_root.join("meminfo")).and_then(|text| parse_meminfo_gib(&text))
    }

    fn locale(&self) -> Option<String> {
        self.locale.clone().or_else(|| {
            std::env::var("LANG")
                .ok()
                .and_then(|lang| locale_from_lang(&lang))
        })
    }

    fn memory_usage(&self) -> Option<u64> {
        Self::read(&self.proc_root.join("self").join("statm")).and_then(|text| parse_statm(&text))
    }

    fn battery_percent(&self) -> Option<u32> {
        let mut batteries: Vec<PathBuf> = std::fs::read_dir(&self.power_supply)
            .ok()?
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("BAT"))
            .map(|entry| entry.path())
            .collect();
        batteries.sort();
        batteries.iter().find_map(|dir| {
            Self::read(&dir.join("capacity"))
                .and_then(|text| text.trim().parse::<u32>().ok())
                .map(|percent| percent.min(100))
        })
    }
}

/// Resident set size in bytes from `/proc/self/statm`.
fn parse_statm(text: &str) -> Option<u64> {
    let resident: u64 = text.split_whitespace().nth(1)?.parse().ok()?;
    resident.checked_mul(PAGE_SIZE)
}

/// `MemTotal` from `/proc/meminfo`, rounded to the nearest GiB.
fn parse_meminfo_gib(text: &str) -> Option<u32> {
    const KIB_PER_GIB: u64 = 1024 * 1024;
    let kib: u64 = text
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))?
        .split_whitespace()
        .next()?
        .parse()
        .ok()?;
    u32::try_from((kib + KIB_PER_GIB / 2) / KIB_PER_GIB).ok()
}

/// Turns `en_US.UTF-8` into `en-US`.
fn locale_from_lang(lang: &str) -> Option<String> {
    let base = lang.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

/// Probe returning fixed values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticProbe {
    /// Screen size.
    pub viewport: Option<(u32, u32)>,
    /// Core count.
    pub cores: Option<u32>,
    /// Memory in GiB.
    pub ram_gib: Option<u32>,
    /// Locale.
    pub locale: Option<String>,
    /// Memory usage in bytes.
    pub memory_usage: Option<u64>,
    /// Battery percentage.
    pub battery_percent: Option<u32>,
}

impl HostProbe for StaticProbe {
    fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    fn cores(&self) -> Option<u32> {
        self.cores
    }

    fn ram_gib(&self) -> Option<u32> {
        self.ram_gib
    }

    fn locale(&self) -> Option<String> {
        self.locale.clone()
    }

    fn memory_usage(&self) -> Option<u64> {
        self.memory_usage
    }

    fn battery_percent(&self) -> Option<u32> {
        self.battery_percent
    }
}
