use crate::categories::{clean_dir, measure_dir, FileFilter};
use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, TargetSize};

const PREFETCH: FileFilter = FileFilter::Extension("pf");

/// `*.pf` files of `<windows>\Prefetch`.
pub struct Prefetch;

impl Cleaner for Prefetch {
    fn target(&self) -> CleanupTarget {
        CleanupTarget::Prefetch
    }

    fn probe(&self, host: &Host<'_>) -> TargetSize {
        measure_dir(host, &host.locations.prefetch(), PREFETCH)
    }

    fn clean(&self, host: &Host<'_>) -> Attempt {
        clean_dir(host, &host.locations.prefetch(), PREFETCH)
    }
}
