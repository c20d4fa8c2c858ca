mod browser_cache;
mod dns;
mod logs;
mod prefetch;
mod recycle_bin;
mod temp_files;
mod thumbnails;
mod windows_temp;

use std::path::Path;

use tracing::debug;

use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, Outstanding, PendingFile, TargetSize};

/// One cleaner per target, in canonical order.
pub fn all_cleaners() -> Vec<Box<dyn Cleaner>> {
    vec![
        Box::new(temp_files::TempFiles),
        Box::new(recycle_bin::RecycleBin),
        Box::new(browser_cache::BrowserCache),
        Box::new(windows_temp::WindowsTemp),
        Box::new(prefetch::Prefetch),
        Box::new(thumbnails::Thumbnails),
        Box::new(dns::Dns),
        Box::new(logs::Logs),
    ]
}

pub fn find_cleaner(cleaners: &[Box<dyn Cleaner>], target: CleanupTarget) -> Option<&dyn Cleaner> {
    cleaners
        .iter()
        .find(|c| c.target() == target)
        .map(|c| c.as_ref())
}

/// Which immediate files of a directory belong to a target.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FileFilter {
    Any,
    Extension(&'static str),
    PrefixSuffix(&'static str, &'static str),
}

impl FileFilter {
    pub(crate) fn matches(self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        match self {
            Self::Any => true,
            Self::Extension(ext) => Path::new(&lower)
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case(ext)),
            Self::PrefixSuffix(prefix, suffix) => {
                lower.starts_with(prefix) && lower.ends_with(suffix)
            }
        }
    }
}

/// Sum of readable-and-writable immediate files matching `filter`.
pub(crate) fn measure_dir(host: &Host<'_>, dir: &Path, filter: FileFilter) -> TargetSize {
    match host.fs.list_immediate_files(dir) {
        Ok(files) => TargetSize::measured(
            files
                .iter()
                .filter(|f| f.readable && f.writable && filter.matches(&f.name))
                .map(|f| f.size_bytes)
                .sum(),
        ),
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "probe unavailable");
            TargetSize::unavailable(format!("{}: {e}", dir.display()))
        }
    }
}

/// Delete every immediate file of `dir` matching `filter`.
pub(crate) fn clean_dir(host: &Host<'_>, dir: &Path, filter: FileFilter) -> Attempt {
    let files = match host.fs.list_immediate_files(dir) {
        Ok(files) => files,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "nothing to clean");
            return Attempt::skipped(format!("{} is unavailable", dir.display()));
        }
    };

    delete_all(
        host,
        files
            .into_iter()
            .filter(|f| filter.matches(&f.name))
            .map(|f| PendingFile {
                path: f.path,
                size_bytes: f.size_bytes,
            }),
    )
}

pub(crate) fn delete_all(host: &Host<'_>, files: impl IntoIterator<Item = PendingFile>) -> Attempt {
    let mut attempt = Attempt::default();
    let mut failed = Vec::new();
    for file in files {
        if host.fs.delete_file(&file.path) {
            attempt.deleted += 1;
            attempt.freed_bytes += file.size_bytes;
        } else {
            failed.push(file);
        }
    }
    if !failed.is_empty() {
        attempt.outstanding = Some(Outstanding::Files(failed));
    }
    attempt
}

/// Retry only the files the previous attempt failed to delete.
pub(crate) fn retry_files(host: &Host<'_>, previous: Attempt) -> Attempt {
    let Attempt {
        deleted,
        freed_bytes,
        outstanding,
        skipped,
        advisory,
    } = previous;

    let pending = match outstanding {
        Some(Outstanding::Files(files)) => files,
        other => {
            return Attempt {
                deleted,
                freed_bytes,
                outstanding: other,
                skipped,
                advisory,
            }
        }
    };

    let mut next = delete_all(host, pending);
    next.deleted += deleted;
    next.freed_bytes += freed_bytes;
    next.skipped = skipped;
    next.advisory = advisory;
    next
}

/// Run a command and check its output for a confirmation keyword.
pub(crate) fn run_confirmed(
    host: &Host<'_>,
    program: &str,
    args: &[&str],
    confirmation: &str,
    advisory: &str,
) -> Attempt {
    let output = host.shell.run(program, args, host.command_timeout);
    if output.to_ascii_lowercase().contains(confirmation) {
        Attempt::default()
    } else {
        Attempt {
            outstanding: Some(Outstanding::Command),
            advisory: Some(advisory.to_string()),
            ..Attempt::default()
        }
    }
}
