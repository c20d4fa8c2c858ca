use crate::cleaner::{SizeKind, TargetSize};

/// Format byte count as human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1_024 {
        format!("{:.2} KB", bytes as f64 / 1_024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Display text for a scanned size. Estimates carry a `~` prefix.
pub fn size_label(size: &TargetSize) -> String {
    if !size.available {
        return "unavailable".to_string();
    }
    match size.kind {
        SizeKind::Measured => format_size(size.bytes),
        SizeKind::Estimated => format!("~{}", format_size(size.bytes)),
        SizeKind::NotSized => "-".to_string(),
    }
}
