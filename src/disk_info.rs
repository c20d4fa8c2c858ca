use std::path::{Path, PathBuf};

use sysinfo::Disks;

/// Space on one mounted volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    pub mount: PathBuf,
    pub total: u64,
    pub available: u64,
    pub used: u64,
}

impl DiskInfo {
    pub fn usage_percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.used as f32 / self.total as f32
    }
}

/// Every volume sysinfo can see.
pub fn list_disks() -> Vec<DiskInfo> {
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            let available = disk.available_space();
            DiskInfo {
                mount: disk.mount_point().to_path_buf(),
                total,
                available,
                used: total.saturating_sub(available),
            }
        })
        .collect()
}

/// The volume holding `path`: the one with the longest mount point that
/// prefixes it.
pub fn containing<'a>(disks: &'a [DiskInfo], path: &Path) -> Option<&'a DiskInfo> {
    disks
        .iter()
        .filter(|d| path.starts_with(&d.mount))
        .max_by_key(|d| d.mount.as_os_str().len())
}

/// The system volume, located through the Windows directory.
pub fn system_disk(windows_dir: &Path) -> Option<DiskInfo> {
    let disks = list_disks();
    containing(&disks, windows_dir)
        .or_else(|| disks.first())
        .cloned()
}
