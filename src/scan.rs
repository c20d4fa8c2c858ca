use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::categories::find_cleaner;
use crate::cleaner::{Cleaner, CleanupTarget, Host, SizeKind, TargetSize};

/// Size of every cleanup target as of one scan pass. Immutable; the next
/// scan replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    sizes: BTreeMap<CleanupTarget, TargetSize>,
}

impl ScanReport {
    pub fn get(&self, target: CleanupTarget) -> &TargetSize {
        &self.sizes[&target]
    }

    /// Entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CleanupTarget, &TargetSize)> {
        self.sizes.iter().map(|(t, s)| (*t, s))
    }

    /// Measured plus estimated bytes.
    pub fn total_bytes(&self) -> u64 {
        self.sizes.values().map(|s| s.bytes).sum()
    }

    /// Bytes backed by an actual measurement.
    pub fn measured_bytes(&self) -> u64 {
        self.sizes
            .values()
            .filter(|s| s.kind == SizeKind::Measured)
            .map(|s| s.bytes)
            .sum()
    }

    pub fn unavailable(&self) -> Vec<CleanupTarget> {
        self.iter()
            .filter(|(_, s)| !s.available)
            .map(|(t, _)| t)
            .collect()
    }
}

/// Probe every target once. Probe failures degrade to an unavailable entry;
/// the report always covers all targets.
pub fn scan(host: &Host<'_>, cleaners: &[Box<dyn Cleaner>]) -> ScanReport {
    info!("scan started");
    let mut sizes = BTreeMap::new();
    for target in CleanupTarget::ALL {
        let size = match find_cleaner(cleaners, target) {
            Some(cleaner) => cleaner.probe(host),
            None => TargetSize::unavailable("no probe registered"),
        };
        debug!(category = target.name(), bytes = size.bytes, available = size.available, "probed");
        sizes.insert(target, size);
    }
    let report = ScanReport { sizes };
    info!(
        total_bytes = report.total_bytes(),
        measured_bytes = report.measured_bytes(),
        unavailable = report.unavailable().len(),
        "scan finished"
    );
    report
}
