use crate::categories::{clean_dir, measure_dir, FileFilter};
use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, TargetSize};

const THUMBCACHE: FileFilter = FileFilter::PrefixSuffix("thumbcache_", ".db");

/// Explorer's `thumbcache_*.db` files.
pub struct Thumbnails;

impl Cleaner for Thumbnails {
    fn target(&self) -> CleanupTarget {
        CleanupTarget::Thumbnails
    }

    fn probe(&self, host: &Host<'_>) -> TargetSize {
        match host.locations.explorer_cache() {
            Some(dir) => measure_dir(host, &dir, THUMBCACHE),
            None => TargetSize::unavailable("no local cache directory"),
        }
    }

    fn clean(&self, host: &Host<'_>) -> Attempt {
        match host.locations.explorer_cache() {
            Some(dir) => clean_dir(host, &dir, THUMBCACHE),
            None => Attempt::skipped("no local cache directory"),
        }
    }
}
