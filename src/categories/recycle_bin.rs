use crate::categories::run_confirmed;
use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, TargetSize};

const EMPTY_BIN: &str =
    "Clear-RecycleBin -Force -ErrorAction SilentlyContinue; Write-Output 'Recycle bin cleared'";

/// Empties the recycle bin through PowerShell. Without elevation the OS may
/// refuse silently, which surfaces as a partial failure.
pub struct RecycleBin;

impl Cleaner for RecycleBin {
    fn target(&self) -> CleanupTarget {
        CleanupTarget::RecycleBin
    }

    fn probe(&self, host: &Host<'_>) -> TargetSize {
        TargetSize::estimated(host.estimates.recycle_bin_bytes)
    }

    fn clean(&self, host: &Host<'_>) -> Attempt {
        run_confirmed(
            host,
            "powershell",
            &["-Command", EMPTY_BIN],
            "cleared",
            "Recycle bin may require administrator rights",
        )
    }

    fn retry(&self, host: &Host<'_>, _previous: Attempt) -> Attempt {
        self.clean(host)
    }
}
