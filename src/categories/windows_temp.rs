use crate::categories::{clean_dir, measure_dir, FileFilter};
use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, TargetSize};

/// Immediate files of `<windows>\Temp`.
pub struct WindowsTemp;

impl Cleaner for WindowsTemp {
    fn target(&self) -> CleanupTarget {
        CleanupTarget::WindowsTemp
    }

    fn probe(&self, host: &Host<'_>) -> TargetSize {
        measure_dir(host, &host.locations.windows_temp(), FileFilter::Any)
    }

    fn clean(&self, host: &Host<'_>) -> Attempt {
        clean_dir(host, &host.locations.windows_temp(), FileFilter::Any)
    }
}
