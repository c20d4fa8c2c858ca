use tracing::debug;

use crate::categories::{delete_all, measure_dir, FileFilter};
use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, PendingFile, TargetSize};

/// Files inside each immediate subdirectory of `<windows>\Logs`. The
/// subdirectories themselves, and anything deeper, are left alone.
pub struct Logs;

impl Cleaner for Logs {
    fn target(&self) -> CleanupTarget {
        CleanupTarget::Logs
    }

    fn probe(&self, host: &Host<'_>) -> TargetSize {
        let root = host.locations.logs();
        match host.fs.list_immediate_dirs(&root) {
            Ok(dirs) => TargetSize::measured(
                dirs.iter()
                    .map(|d| measure_dir(host, d, FileFilter::Any).bytes)
                    .sum(),
            ),
            Err(e) => TargetSize::unavailable(format!("{}: {e}", root.display())),
        }
    }

    fn clean(&self, host: &Host<'_>) -> Attempt {
        let root = host.locations.logs();
        let dirs = match host.fs.list_immediate_dirs(&root) {
            Ok(dirs) => dirs,
            Err(e) => {
                debug!(dir = %root.display(), error = %e, "nothing to clean");
                return Attempt::skipped(format!("{} is unavailable", root.display()));
            }
        };

        let mut pending = Vec::new();
        for dir in &dirs {
            match host.fs.list_immediate_files(dir) {
                Ok(files) => pending.extend(files.into_iter().map(|f| PendingFile {
                    path: f.path,
                    size_bytes: f.size_bytes,
                })),
                Err(e) => debug!(dir = %dir.display(), error = %e, "log folder unreadable"),
            }
        }
        delete_all(host, pending)
    }
}
