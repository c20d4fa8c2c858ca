use crate::categories::run_confirmed;
use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, TargetSize};

/// Flushes the resolver cache with `ipconfig /flushdns`.
pub struct Dns;

impl Cleaner for Dns {
    fn target(&self) -> CleanupTarget {
        CleanupTarget::Dns
    }

    fn probe(&self, _host: &Host<'_>) -> TargetSize {
        TargetSize::not_sized()
    }

    fn clean(&self, host: &Host<'_>) -> Attempt {
        run_confirmed(
            host,
            "ipconfig",
            &["/flushdns"],
            "successfully",
            "DNS flush may require administrator rights",
        )
    }

    fn retry(&self, host: &Host<'_>, _previous: Attempt) -> Attempt {
        self.clean(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::SizeKind;
    use crate::testing::{FakeFs, FakeShell, TestHost};

    #[test]
    fn flush_is_confirmed_by_ipconfig_output() {
        let shell = FakeShell::default();
        shell.respond(
            "ipconfig /flushdns",
            "Windows IP Configuration\r\n\r\nSuccessfully flushed the DNS Resolver Cache.\r\n",
        );
        let test = TestHost::new(shell.clone(), FakeFs::default());

        assert_eq!(Dns.probe(&test.host()).kind, SizeKind::NotSized);
        assert!(!Dns.clean(&test.host()).needs_retry());
        assert_eq!(shell.count("ipconfig /flushdns"), 1);
    }
}
