use crate::categories::{clean_dir, measure_dir, FileFilter};
use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, TargetSize};

/// Immediate files of the user's temp directory.
pub struct TempFiles;

impl Cleaner for TempFiles {
    fn target(&self) -> CleanupTarget {
        CleanupTarget::TempFiles
    }

    fn probe(&self, host: &Host<'_>) -> TargetSize {
        measure_dir(host, &host.locations.temp_dir, FileFilter::Any)
    }

    fn clean(&self, host: &Host<'_>) -> Attempt {
        clean_dir(host, &host.locations.temp_dir, FileFilter::Any)
    }
}
