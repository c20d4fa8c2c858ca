use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::EstimateConfig;
use crate::probe::FileSystem;
use crate::shell::CommandShell;

/// The fixed set of cleanup categories. Declaration order is the canonical
/// execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CleanupTarget {
    TempFiles,
    RecycleBin,
    BrowserCache,
    WindowsTemp,
    Prefetch,
    Thumbnails,
    Dns,
    Logs,
}

impl CleanupTarget {
    pub const ALL: [CleanupTarget; 8] = [
        CleanupTarget::TempFiles,
        CleanupTarget::RecycleBin,
        CleanupTarget::BrowserCache,
        CleanupTarget::WindowsTemp,
        CleanupTarget::Prefetch,
        CleanupTarget::Thumbnails,
        CleanupTarget::Dns,
        CleanupTarget::Logs,
    ];

    /// Machine-readable name (e.g. "windows-temp").
    pub fn name(self) -> &'static str {
        match self {
            Self::TempFiles => "temp-files",
            Self::RecycleBin => "recycle-bin",
            Self::BrowserCache => "browser-cache",
            Self::WindowsTemp => "windows-temp",
            Self::Prefetch => "prefetch",
            Self::Thumbnails => "thumbnails",
            Self::Dns => "dns",
            Self::Logs => "logs",
        }
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::TempFiles => "Temporary Files",
            Self::RecycleBin => "Recycle Bin",
            Self::BrowserCache => "Browser Cache",
            Self::WindowsTemp => "Windows Temp",
            Self::Prefetch => "Prefetch Files",
            Self::Thumbnails => "Thumbnail Cache",
            Self::Dns => "DNS Cache",
            Self::Logs => "System Logs",
        }
    }
}

impl fmt::Display for CleanupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How authoritative a reported size is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    Measured,
    /// A fixed heuristic, not a measurement.
    Estimated,
    /// The target has no meaningful size (e.g. the DNS cache).
    NotSized,
}

/// The size one probe reported for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSize {
    pub bytes: u64,
    pub kind: SizeKind,
    /// False when the probe degraded (missing path, access denied, timeout).
    pub available: bool,
    pub note: Option<String>,
}

impl TargetSize {
    pub fn measured(bytes: u64) -> Self {
        Self {
            bytes,
            kind: SizeKind::Measured,
            available: true,
            note: None,
        }
    }

    pub fn estimated(bytes: u64) -> Self {
        Self {
            bytes,
            kind: SizeKind::Estimated,
            available: true,
            note: None,
        }
    }

    pub fn not_sized() -> Self {
        Self {
            bytes: 0,
            kind: SizeKind::NotSized,
            available: true,
            note: None,
        }
    }

    pub fn unavailable(note: impl Into<String>) -> Self {
        Self {
            bytes: 0,
            kind: SizeKind::Measured,
            available: false,
            note: Some(note.into()),
        }
    }
}

/// Resolved directories the targets operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub temp_dir: PathBuf,
    pub windows_dir: PathBuf,
    pub cache_dir: Option<PathBuf>,
}

impl Locations {
    pub fn windows_temp(&self) -> PathBuf {
        self.windows_dir.join("Temp")
    }

    pub fn prefetch(&self) -> PathBuf {
        self.windows_dir.join("Prefetch")
    }

    pub fn logs(&self) -> PathBuf {
        self.windows_dir.join("Logs")
    }

    pub fn explorer_cache(&self) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|c| c.join("Microsoft").join("Windows").join("Explorer"))
    }

    /// Chrome, Firefox and Edge cache directories.
    pub fn browser_caches(&self) -> Vec<PathBuf> {
        let Some(cache) = &self.cache_dir else {
            return Vec::new();
        };
        vec![
            cache.join("Google").join("Chrome"),
            cache.join("Mozilla").join("Firefox"),
            cache.join("Microsoft").join("Edge"),
        ]
    }
}

/// Everything a cleaner may touch while probing or cleaning.
pub struct Host<'a> {
    pub shell: &'a dyn CommandShell,
    pub fs: &'a dyn FileSystem,
    pub locations: &'a Locations,
    pub estimates: &'a EstimateConfig,
    pub command_timeout: Duration,
}

/// A file whose deletion failed and may be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Work left over after an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outstanding {
    Files(Vec<PendingFile>),
    /// A command whose output did not confirm success.
    Command,
}

/// The outcome of one cleaning attempt for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attempt {
    pub deleted: u64,
    pub freed_bytes: u64,
    pub outstanding: Option<Outstanding>,
    pub skipped: Option<String>,
    pub advisory: Option<String>,
}

impl Attempt {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn needs_retry(&self) -> bool {
        self.skipped.is_none() && self.outstanding.is_some()
    }

    /// Fold another attempt's counts into this one.
    pub fn absorb(&mut self, other: Attempt) {
        self.deleted += other.deleted;
        self.freed_bytes += other.freed_bytes;
        if let Some(Outstanding::Files(more)) = other.outstanding {
            match &mut self.outstanding {
                Some(Outstanding::Files(files)) => files.extend(more),
                _ => self.outstanding = Some(Outstanding::Files(more)),
            }
        } else if other.outstanding.is_some() {
            self.outstanding = other.outstanding;
        }
        if self.advisory.is_none() {
            self.advisory = other.advisory;
        }
    }

    pub fn into_result(self, target: CleanupTarget, retried: bool) -> StepResult {
        let status = if let Some(reason) = self.skipped {
            StepStatus::Skipped(reason)
        } else {
            match &self.outstanding {
                None => StepStatus::Success,
                Some(Outstanding::Files(files)) => StepStatus::PartialFailure(
                    self.advisory
                        .unwrap_or_else(|| format!("{} item(s) could not be deleted", files.len())),
                ),
                Some(Outstanding::Command) => StepStatus::PartialFailure(
                    self.advisory
                        .unwrap_or_else(|| "command did not confirm success".to_string()),
                ),
            }
        };
        StepResult {
            target,
            deleted: self.deleted,
            freed_bytes: self.freed_bytes,
            retried,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    PartialFailure(String),
    Skipped(String),
}

/// Per-target outcome of a cleanup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub target: CleanupTarget,
    pub deleted: u64,
    pub freed_bytes: u64,
    pub retried: bool,
    pub status: StepStatus,
}

/// The trait every cleanup target implements.
pub trait Cleaner: Send + Sync {
    fn target(&self) -> CleanupTarget;

    /// Measure or estimate what would be reclaimed. Never deletes anything.
    fn probe(&self, host: &Host<'_>) -> TargetSize;

    /// First cleaning attempt.
    fn clean(&self, host: &Host<'_>) -> Attempt;

    /// Second and last attempt, given what the first one left behind.
    fn retry(&self, host: &Host<'_>, previous: Attempt) -> Attempt {
        crate::categories::retry_files(host, previous)
    }
}
