use crate::categories::{clean_dir, FileFilter};
use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, TargetSize};

/// Immediate files of the Chrome, Firefox and Edge cache directories.
///
/// The size is a fixed estimate: browser caches are deep trees and only
/// their top level is ever touched.
pub struct BrowserCache;

impl Cleaner for BrowserCache {
    fn target(&self) -> CleanupTarget {
        CleanupTarget::BrowserCache
    }

    fn probe(&self, host: &Host<'_>) -> TargetSize {
        TargetSize::estimated(host.estimates.browser_cache_bytes)
    }

    fn clean(&self, host: &Host<'_>) -> Attempt {
        let mut total: Option<Attempt> = None;
        for dir in host.locations.browser_caches() {
            let attempt = clean_dir(host, &dir, FileFilter::Any);
            if attempt.skipped.is_some() {
                continue;
            }
            match &mut total {
                Some(t) => t.absorb(attempt),
                None => total = Some(attempt),
            }
        }
        total.unwrap_or_else(|| Attempt::skipped("no browser cache directories found"))
    }
}
