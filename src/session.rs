//! The core session: owns scan, cleanup and device state and advances it
//! from typed inputs and its own timer queue. Observers only ever see
//! `CoreEvent`s.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::categories::all_cleaners;
use crate::cleaner::{Cleaner, CleanupTarget, Host, Locations, StepResult, StepStatus};
use crate::config::{Config, EstimateConfig, TimingConfig};
use crate::device::commands::{self, ToggleAction};
use crate::device::poller::Poller;
use crate::device::toggle::{ToggleController, ToggleOutcome};
use crate::device::{ChannelView, DeviceChannel, DeviceState};
use crate::pipeline::{
    CleanupPlan, Pipeline, PipelineState, Rejection, Selection, StartOutcome, StepOutcome, Summary,
};
use crate::probe::FileSystem;
use crate::scan::{scan, ScanReport};
use crate::scheduler::TimerQueue;
use crate::shell::CommandShell;
use crate::utils;

/// Requests from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Scan,
    SetSelected(CleanupTarget, bool),
    SelectAll,
    DeselectAll,
    Clean,
    Toggle(DeviceChannel),
    Shutdown,
}

/// State changes published to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    PipelineChanged(PipelineState),
    ScanCompleted(ScanReport),
    SelectionChanged(Selection),
    CleanStarted(CleanupPlan),
    Progress(u8),
    StepFinished(StepResult),
    CleanFinished(Summary),
    NothingSelected,
    Rejected(Rejection),
    DevicesChanged(Vec<ChannelView>),
    Toggled(ToggleOutcome),
    /// A line for the activity log.
    Log(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    FinishScan,
    Step,
    Retry,
    CompletionHold,
    PollTick,
    Settle(DeviceChannel),
}

struct Backends {
    shell: Box<dyn CommandShell>,
    fs: Box<dyn FileSystem>,
    cleaners: Vec<Box<dyn Cleaner>>,
    locations: Locations,
    estimates: EstimateConfig,
    command_timeout: Duration,
}

impl Backends {
    fn host(&self) -> Host<'_> {
        Host {
            shell: self.shell.as_ref(),
            fs: self.fs.as_ref(),
            locations: &self.locations,
            estimates: &self.estimates,
            command_timeout: self.command_timeout,
        }
    }
}

pub struct Session {
    timing: TimingConfig,
    backends: Backends,
    pipeline: Pipeline,
    report: Option<ScanReport>,
    selection: Selection,
    poller: Poller,
    toggles: ToggleController,
    timers: TimerQueue<Timer>,
    outbox: Vec<CoreEvent>,
    started: bool,
}

impl Session {
    pub fn new(config: &Config, shell: Box<dyn CommandShell>, fs: Box<dyn FileSystem>) -> Self {
        Self {
            timing: config.timing.clone(),
            backends: Backends {
                shell,
                fs,
                cleaners: all_cleaners(),
                locations: config.locations(),
                estimates: config.estimates.clone(),
                command_timeout: config.timing.command_timeout(),
            },
            pipeline: Pipeline::new(),
            report: None,
            selection: Selection::default(),
            poller: Poller::new(),
            toggles: ToggleController::new(),
            timers: TimerQueue::new(),
            outbox: Vec::new(),
            started: false,
        }
    }

    /// Schedule the first device poll. Idempotent.
    pub fn start(&mut self, now: Instant) {
        if !self.started {
            self.started = true;
            self.timers.schedule(now, Timer::PollTick);
        }
    }

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline.state()
    }

    pub fn report(&self) -> Option<&ScanReport> {
        self.report.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn device_state(&self, channel: DeviceChannel) -> DeviceState {
        self.poller.displayed(channel, |c| self.toggles.is_pending(c))
    }

    pub fn channel_views(&self) -> Vec<ChannelView> {
        self.poller.render(|c| self.toggles.is_pending(c))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    pub fn take_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn emit(&mut self, event: CoreEvent) {
        self.outbox.push(event);
    }

    fn log(&mut self, line: impl Into<String>) {
        self.outbox.push(CoreEvent::Log(line.into()));
    }

    /// Apply one input. Returns false once the session should stop.
    pub fn handle(&mut self, input: Input, now: Instant) -> bool {
        debug!(?input, "input");
        match input {
            Input::Scan => self.request_scan(now),
            Input::SetSelected(target, selected) => {
                if self.selection_locked() {
                    return true;
                }
                self.selection.set(target, selected);
                self.emit(CoreEvent::SelectionChanged(self.selection.clone()));
            }
            Input::SelectAll => {
                if self.selection_locked() {
                    return true;
                }
                self.selection = Selection::all();
                self.emit(CoreEvent::SelectionChanged(self.selection.clone()));
                self.log("All cleanup options selected");
            }
            Input::DeselectAll => {
                if self.selection_locked() {
                    return true;
                }
                self.selection.clear();
                self.emit(CoreEvent::SelectionChanged(self.selection.clone()));
                self.log("All cleanup options deselected");
            }
            Input::Clean => self.request_clean(now),
            Input::Toggle(channel) => {
                self.request_toggle(channel, now);
            }
            Input::Shutdown => {
                info!("session shutting down");
                return false;
            }
        }
        true
    }

    fn selection_locked(&self) -> bool {
        let state = self.pipeline.state();
        if state.selection_enabled() {
            false
        } else {
            debug!(?state, "selection ignored");
            true
        }
    }

    fn request_scan(&mut self, now: Instant) {
        match self.pipeline.begin_scan() {
            Ok(()) => {
                self.report = None;
                self.selection.clear();
                self.emit(CoreEvent::SelectionChanged(Selection::default()));
                self.emit(CoreEvent::PipelineChanged(PipelineState::Scanning));
                self.log("Scanning system for cleanup opportunities...");
                self.timers
                    .schedule(now + self.timing.scan_delay(), Timer::FinishScan);
            }
            Err(rejection) => {
                warn!(%rejection, "scan rejected");
                self.emit(CoreEvent::Rejected(rejection));
            }
        }
    }

    fn request_clean(&mut self, now: Instant) {
        let plan = CleanupPlan::from_selection(&self.selection);
        match self.pipeline.start(plan) {
            StartOutcome::Started(plan) => {
                self.emit(CoreEvent::PipelineChanged(PipelineState::Cleaning));
                self.emit(CoreEvent::CleanStarted(plan));
                self.emit(CoreEvent::Progress(0));
                self.log("Starting cleanup process...");
                self.timers.schedule(now, Timer::Step);
            }
            StartOutcome::NothingSelected => {
                self.emit(CoreEvent::NothingSelected);
                self.log("No cleanup options selected!");
            }
            StartOutcome::Rejected(rejection) => {
                self.emit(CoreEvent::Rejected(rejection));
            }
        }
    }

    /// Accept or reject a toggle. An accepted toggle issues its command at
    /// once and schedules a forced re-poll after the settle window.
    pub fn request_toggle(&mut self, channel: DeviceChannel, now: Instant) -> ToggleOutcome {
        let outcome = self.toggles.decide(channel, |c| {
            self.poller.displayed(c, |p| self.toggles.is_pending(p))
        });

        if let ToggleOutcome::Accepted { channel, action } = outcome {
            let settle_at = now + self.settle_window(channel);
            self.toggles.mark_pending(channel);
            self.emit(CoreEvent::DevicesChanged(self.channel_views()));

            let output = commands::apply(
                self.backends.shell.as_ref(),
                channel,
                action,
                &self.poller.last().ethernet_adapter,
                self.backends.command_timeout,
            );
            info!(%channel, ?action, output = output.trim(), "toggle command issued");
            self.log(outcome.to_string());
            if action == ToggleAction::OpenSettings {
                self.log("Please switch Bluetooth in the settings window");
            }
            self.timers.schedule(settle_at, Timer::Settle(channel));
        } else {
            info!(%channel, %outcome, "toggle rejected");
            self.log(outcome.to_string());
        }

        self.emit(CoreEvent::Toggled(outcome));
        outcome
    }

    fn settle_window(&self, channel: DeviceChannel) -> Duration {
        let ms = if channel == DeviceChannel::Ethernet {
            self.timing.ethernet_settle_ms
        } else {
            self.timing.settle_ms
        };
        Duration::from_millis(ms)
    }

    /// Fire every timer due at or before `now`, in due order.
    pub fn advance(&mut self, now: Instant) {
        while let Some((due, timer)) = self.timers.pop_due(now) {
            self.fire(timer, due, now);
        }
    }

    fn fire(&mut self, timer: Timer, due: Instant, now: Instant) {
        match timer {
            Timer::FinishScan => self.finish_scan(),
            Timer::Step => {
                let outcome = self
                    .pipeline
                    .run_step(&self.backends.host(), &self.backends.cleaners);
                self.after_step(outcome, due);
            }
            Timer::Retry => {
                let outcome = self
                    .pipeline
                    .retry_step(&self.backends.host(), &self.backends.cleaners);
                self.after_step(outcome, due);
            }
            Timer::CompletionHold => {
                self.pipeline.settle();
                self.selection.clear();
                self.emit(CoreEvent::SelectionChanged(Selection::default()));
                self.emit(CoreEvent::PipelineChanged(PipelineState::Idle));
            }
            Timer::PollTick => {
                let first = self.poller.polls() == 0;
                let changed = self
                    .poller
                    .refresh(self.backends.shell.as_ref(), self.backends.command_timeout);
                if changed || first {
                    self.emit(CoreEvent::DevicesChanged(self.channel_views()));
                }
                self.timers
                    .schedule(now + self.timing.poll_interval(), Timer::PollTick);
            }
            Timer::Settle(channel) => {
                self.poller
                    .refresh(self.backends.shell.as_ref(), self.backends.command_timeout);
                self.toggles.settle(channel);
                let state = self.device_state(channel);
                info!(%channel, %state, "toggle settled");
                self.emit(CoreEvent::DevicesChanged(self.channel_views()));
                self.log(format!("{channel}: {state}"));
            }
        }
    }

    fn finish_scan(&mut self) {
        let report = scan(&self.backends.host(), &self.backends.cleaners);
        self.pipeline.finish_scan();

        self.log("Scan Results:");
        let lines: Vec<String> = report
            .iter()
            .map(|(target, size)| format!("{target}: {}", utils::size_label(size)))
            .collect();
        for line in lines {
            self.log(line);
        }
        self.log(format!(
            "Total space that can be freed: {}",
            utils::format_size(report.total_bytes())
        ));

        self.report = Some(report.clone());
        self.emit(CoreEvent::ScanCompleted(report));
        self.emit(CoreEvent::PipelineChanged(PipelineState::ReadyToClean));
    }

    fn after_step(&mut self, outcome: StepOutcome, due: Instant) {
        match outcome {
            StepOutcome::RetryScheduled { target } => {
                self.log(format!("{target}: some items are locked, retrying..."));
                self.timers
                    .schedule(due + self.timing.retry_delay(), Timer::Retry);
            }
            StepOutcome::Recorded {
                result,
                progress,
                summary,
            } => {
                self.log(step_line(&result));
                self.emit(CoreEvent::StepFinished(result));
                self.emit(CoreEvent::Progress(progress));
                match summary {
                    Some(summary) => {
                        self.log(format!(
                            "Cleanup completed: {} items deleted, {} freed",
                            summary.deleted(),
                            utils::format_size(summary.freed_bytes())
                        ));
                        self.emit(CoreEvent::PipelineChanged(PipelineState::Completed));
                        self.emit(CoreEvent::CleanFinished(summary));
                        self.timers
                            .schedule(due + self.timing.completion_hold(), Timer::CompletionHold);
                    }
                    None => {
                        self.timers
                            .schedule(due + self.timing.step_delay(), Timer::Step);
                    }
                }
            }
            StepOutcome::Idle => {}
        }
    }
}

fn step_line(result: &StepResult) -> String {
    match &result.status {
        StepStatus::Success => format!("{}: deleted {} item(s)", result.target, result.deleted),
        StepStatus::PartialFailure(advisory) => format!(
            "{}: deleted {} item(s); {advisory}",
            result.target, result.deleted
        ),
        StepStatus::Skipped(reason) => format!("{}: skipped ({reason})", result.target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::SizeKind;
    use crate::testing::{test_config, FakeFs, FakeShell};

    const MINUTE: Duration = Duration::from_secs(60);

    fn session(shell: &FakeShell, fs: &FakeFs) -> Session {
        Session::new(&test_config(), Box::new(shell.clone()), Box::new(fs.clone()))
    }

    fn scanned(session: &mut Session, t0: Instant) -> Instant {
        session.handle(Input::Scan, t0);
        let ready = t0 + Duration::from_secs(2);
        session.advance(ready);
        assert_eq!(session.pipeline_state(), PipelineState::ReadyToClean);
        ready
    }

    fn progress_values(events: &[CoreEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                CoreEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn devices_up(shell: &FakeShell) {
        shell.respond("Get-NetAdapter -Name 'Ethernet'", "Connected");
        shell.respond("Get-NetAdapter -Name 'Wi-Fi'", "Enabled");
        shell.respond("netsh interface show interface 'Wi-Fi'", "Enabled");
        shell.respond("Get-PnpDevice -Class Bluetooth -Status", "Enabled");
        shell.respond("MS_SystemInformation", "Enabled");
    }

    #[test]
    fn scan_resets_selection_and_publishes_report() {
        let shell = FakeShell::default();
        let fs = FakeFs::default();
        fs.add_file("/t/temp", "a.tmp", 2_048);
        let mut s = session(&shell, &fs);
        let t0 = Instant::now();

        s.handle(Input::Scan, t0);
        assert_eq!(s.pipeline_state(), PipelineState::Scanning);
        assert!(s.handle(Input::SetSelected(CleanupTarget::TempFiles, true), t0));
        assert!(s.selection().is_empty());

        s.advance(t0 + Duration::from_millis(1_999));
        assert_eq!(s.pipeline_state(), PipelineState::Scanning);
        s.advance(t0 + Duration::from_secs(2));
        assert_eq!(s.pipeline_state(), PipelineState::ReadyToClean);
        assert_eq!(s.report().unwrap().get(CleanupTarget::TempFiles).bytes, 2_048);

        let events = s.take_events();
        assert!(events.iter().any(|e| matches!(e, CoreEvent::ScanCompleted(_))));
        assert!(events
            .iter()
            .any(|e| matches!(e, CoreEvent::Log(l) if l == "Temporary Files: 2.00 KB")));
        assert!(fs.delete_attempts().is_empty());
    }

    #[test]
    fn empty_selection_never_starts_cleaning() {
        let shell = FakeShell::default();
        let fs = FakeFs::default();
        let mut s = session(&shell, &fs);
        let t = scanned(&mut s, Instant::now());
        s.take_events();

        s.handle(Input::Clean, t);
        s.advance(t + MINUTE);
        let events = s.take_events();
        assert!(events.contains(&CoreEvent::NothingSelected));
        assert!(!events.contains(&CoreEvent::PipelineChanged(PipelineState::Cleaning)));
        assert_eq!(s.pipeline_state(), PipelineState::ReadyToClean);
    }

    #[test]
    fn progress_is_monotonic_and_reaches_100_last() {
        let shell = FakeShell::default();
        shell.respond("ipconfig /flushdns", "Successfully flushed the DNS Resolver Cache.");
        let fs = FakeFs::default();
        fs.add_file("/t/temp", "a.tmp", 1);
        fs.add_file("/t/win/Prefetch", "A.EXE-1.pf", 1);
        let mut s = session(&shell, &fs);
        let t = scanned(&mut s, Instant::now());

        for target in [CleanupTarget::Prefetch, CleanupTarget::Dns, CleanupTarget::TempFiles] {
            s.handle(Input::SetSelected(target, true), t);
        }
        s.take_events();
        s.handle(Input::Clean, t);
        s.advance(t + MINUTE);
        let events = s.take_events();

        let progress = progress_values(&events);
        assert_eq!(progress, vec![0, 33, 66, 100]);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));

        let last_step = events
            .iter()
            .rposition(|e| matches!(e, CoreEvent::StepFinished(_)))
            .unwrap();
        let hundred = events
            .iter()
            .position(|e| *e == CoreEvent::Progress(100))
            .unwrap();
        assert!(hundred > last_step);

        let order: Vec<CleanupTarget> = events
            .iter()
            .filter_map(|e| match e {
                CoreEvent::StepFinished(r) => Some(r.target),
                _ => None,
            })
            .collect();
        assert_eq!(
            order,
            vec![CleanupTarget::TempFiles, CleanupTarget::Prefetch, CleanupTarget::Dns]
        );
    }

    #[test]
    fn steps_wait_for_each_other() {
        let shell = FakeShell::default();
        let fs = FakeFs::default();
        fs.add_file("/t/temp", "a.tmp", 1);
        fs.add_file("/t/win/Temp", "b.tmp", 1);
        let mut s = session(&shell, &fs);
        let t = scanned(&mut s, Instant::now());
        s.handle(Input::SelectAll, t);
        s.handle(Input::SetSelected(CleanupTarget::RecycleBin, false), t);
        s.handle(Input::SetSelected(CleanupTarget::BrowserCache, false), t);
        s.handle(Input::SetSelected(CleanupTarget::Prefetch, false), t);
        s.handle(Input::SetSelected(CleanupTarget::Thumbnails, false), t);
        s.handle(Input::SetSelected(CleanupTarget::Dns, false), t);
        s.handle(Input::SetSelected(CleanupTarget::Logs, false), t);
        s.handle(Input::Clean, t);

        s.advance(t);
        assert_eq!(fs.delete_attempts().len(), 1);
        s.advance(t + Duration::from_millis(999));
        assert_eq!(fs.delete_attempts().len(), 1);
        s.advance(t + Duration::from_secs(1));
        assert_eq!(fs.delete_attempts().len(), 2);
    }

    #[test]
    fn second_clean_while_cleaning_is_rejected() {
        let shell = FakeShell::default();
        let fs = FakeFs::default();
        fs.add_file("/t/temp", "a.tmp", 1);
        fs.add_file("/t/win/Logs/CBS", "CBS.log", 1);
        let mut s = session(&shell, &fs);
        let t = scanned(&mut s, Instant::now());
        s.handle(Input::SetSelected(CleanupTarget::TempFiles, true), t);
        s.handle(Input::SetSelected(CleanupTarget::Logs, true), t);
        s.handle(Input::Clean, t);
        s.advance(t);
        assert_eq!(s.pipeline_state(), PipelineState::Cleaning);
        s.take_events();

        s.handle(Input::SelectAll, t);
        s.handle(Input::Clean, t);
        s.handle(Input::Scan, t);
        let events = s.take_events();
        assert_eq!(
            events,
            vec![
                CoreEvent::Rejected(Rejection::CleanupInProgress),
                CoreEvent::Rejected(Rejection::CleanupInProgress),
            ]
        );
        assert_eq!(
            s.pipeline.in_flight().unwrap().targets(),
            &[CleanupTarget::TempFiles, CleanupTarget::Logs]
        );

        s.advance(t + MINUTE);
        assert_eq!(s.pipeline_state(), PipelineState::Idle);
    }

    #[test]
    fn temp_succeeds_and_logs_fail_twice() {
        let shell = FakeShell::default();
        let fs = FakeFs::default();
        for i in 0..12 {
            fs.add_file("/t/temp", &format!("f{i}.tmp"), 100);
        }
        fs.add_locked_file("/t/win/Logs/CBS", "CBS.log", 10, 2);
        let mut s = session(&shell, &fs);
        let t = scanned(&mut s, Instant::now());
        s.handle(Input::SetSelected(CleanupTarget::Logs, true), t);
        s.handle(Input::SetSelected(CleanupTarget::TempFiles, true), t);
        s.take_events();

        s.handle(Input::Clean, t);
        s.advance(t + MINUTE);
        let events = s.take_events();

        let summary = events
            .iter()
            .find_map(|e| match e {
                CoreEvent::CleanFinished(summary) => Some(summary.clone()),
                _ => None,
            })
            .unwrap();
        let temp = summary.result(CleanupTarget::TempFiles).unwrap();
        assert_eq!(temp.status, StepStatus::Success);
        assert_eq!(temp.deleted, 12);
        assert!(!temp.retried);
        let logs = summary.result(CleanupTarget::Logs).unwrap();
        assert!(matches!(logs.status, StepStatus::PartialFailure(_)));
        assert!(logs.retried);

        assert_eq!(progress_values(&events).last(), Some(&100));
        assert_eq!(s.pipeline_state(), PipelineState::Idle);
        assert!(s.selection().is_empty());
        assert!(events.ends_with(&[
            CoreEvent::SelectionChanged(Selection::default()),
            CoreEvent::PipelineChanged(PipelineState::Idle),
        ]));
    }

    #[test]
    fn completion_requires_a_rescan() {
        let shell = FakeShell::default();
        let fs = FakeFs::default();
        let mut s = session(&shell, &fs);
        let t = scanned(&mut s, Instant::now());
        s.handle(Input::SetSelected(CleanupTarget::Dns, true), t);
        s.handle(Input::Clean, t);
        s.advance(t + Duration::from_millis(250));
        assert_eq!(s.pipeline_state(), PipelineState::Completed);
        s.handle(Input::Clean, t + Duration::from_millis(300));
        s.advance(t + MINUTE);
        assert_eq!(s.pipeline_state(), PipelineState::Idle);

        s.take_events();
        s.handle(Input::SetSelected(CleanupTarget::Dns, true), t + MINUTE);
        s.handle(Input::Clean, t + MINUTE);
        assert_eq!(
            s.take_events(),
            vec![CoreEvent::Rejected(Rejection::NotScanned)]
        );
    }

    #[test]
    fn dns_without_elevation_is_an_advisory_not_a_fault() {
        let shell = FakeShell::default();
        shell.respond("ipconfig /flushdns", "The requested operation requires elevation.");
        let fs = FakeFs::default();
        let mut s = session(&shell, &fs);
        let t = scanned(&mut s, Instant::now());
        s.handle(Input::SetSelected(CleanupTarget::Dns, true), t);
        s.handle(Input::Clean, t);
        s.advance(t + MINUTE);

        assert_eq!(shell.count("ipconfig /flushdns"), 2);
        let events = s.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            CoreEvent::StepFinished(StepResult { status: StepStatus::PartialFailure(m), .. })
                if m.contains("administrator")
        )));
        assert_eq!(s.pipeline_state(), PipelineState::Idle);
    }

    #[test]
    fn unreadable_windows_temp_still_runs_its_step() {
        let shell = FakeShell::default();
        let fs = FakeFs::default();
        fs.add_file("/t/win/Temp", "x.log", 500);
        fs.set_unavailable("/t/win/Temp");
        let mut s = session(&shell, &fs);
        let t = scanned(&mut s, Instant::now());

        let size = s.report().unwrap().get(CleanupTarget::WindowsTemp).clone();
        assert_eq!(size.bytes, 0);
        assert!(!size.available);
        assert_eq!(size.kind, SizeKind::Measured);

        s.handle(Input::SetSelected(CleanupTarget::WindowsTemp, true), t);
        assert!(s.selection().contains(CleanupTarget::WindowsTemp));
        s.handle(Input::Clean, t);
        s.advance(t + MINUTE);

        let events = s.take_events();
        let result = events
            .iter()
            .find_map(|e| match e {
                CoreEvent::StepFinished(r) => Some(r.clone()),
                _ => None,
            })
            .unwrap();
        assert!(matches!(result.status, StepStatus::Skipped(_)));
        assert_eq!(result.deleted, 0);
        assert_eq!(progress_values(&events).last(), Some(&100));
        assert_eq!(s.pipeline_state(), PipelineState::Idle);
    }

    #[test]
    fn radio_toggle_needs_enabled_adapter() {
        let shell = FakeShell::default();
        devices_up(&shell);
        shell.respond("Get-NetAdapter -Name 'Wi-Fi'", "Disabled");
        let fs = FakeFs::default();
        let mut s = session(&shell, &fs);
        let t0 = Instant::now();
        s.start(t0);
        s.advance(t0);
        shell.clear_calls();

        let outcome = s.request_toggle(DeviceChannel::WifiRadio, t0);
        assert_eq!(
            outcome,
            ToggleOutcome::AdapterNotEnabled {
                radio: DeviceChannel::WifiRadio,
                adapter: DeviceChannel::WifiAdapter
            }
        );
        assert!(shell.calls().is_empty());
        assert_eq!(s.device_state(DeviceChannel::WifiRadio), DeviceState::Enabled);
        assert!(s.next_deadline() > Some(t0));
    }

    #[test]
    fn toggle_is_transitioning_until_settled() {
        let shell = FakeShell::default();
        devices_up(&shell);
        let fs = FakeFs::default();
        let mut s = session(&shell, &fs);
        let t0 = Instant::now();
        s.start(t0);
        s.advance(t0);
        assert_eq!(s.device_state(DeviceChannel::WifiAdapter), DeviceState::Enabled);

        let at = t0 + Duration::from_millis(2_500);
        let outcome = s.request_toggle(DeviceChannel::WifiAdapter, at);
        assert_eq!(
            outcome,
            ToggleOutcome::Accepted {
                channel: DeviceChannel::WifiAdapter,
                action: ToggleAction::Disable
            }
        );
        assert_eq!(s.device_state(DeviceChannel::WifiAdapter), DeviceState::Transitioning);
        assert_eq!(shell.count("Disable-NetAdapter -Name 'Wi-Fi'"), 1);
        shell.respond("Get-NetAdapter -Name 'Wi-Fi'", "Disabled");

        // A regular poll inside the settle window does not end the transition.
        s.advance(t0 + Duration::from_secs(3));
        assert_eq!(s.device_state(DeviceChannel::WifiAdapter), DeviceState::Transitioning);
        let views = s.channel_views();
        assert!(!views.iter().find(|v| v.channel == DeviceChannel::WifiRadio).unwrap().actionable);

        s.advance(at + Duration::from_secs(2));
        assert_eq!(s.device_state(DeviceChannel::WifiAdapter), DeviceState::Disabled);
        assert!(s
            .take_events()
            .iter()
            .any(|e| matches!(e, CoreEvent::Log(l) if l == "WiFi Adapter: Disabled")));
    }

    #[test]
    fn settle_resolves_even_when_the_os_ignores_the_command() {
        let shell = FakeShell::default();
        devices_up(&shell);
        let fs = FakeFs::default();
        let mut s = session(&shell, &fs);
        let t0 = Instant::now();
        s.start(t0);
        s.advance(t0);

        s.request_toggle(DeviceChannel::BluetoothRadio, t0);
        assert_eq!(s.device_state(DeviceChannel::BluetoothRadio), DeviceState::Transitioning);
        assert_eq!(shell.count("ms-settings:bluetooth"), 1);

        s.advance(t0 + Duration::from_secs(2));
        assert_eq!(s.device_state(DeviceChannel::BluetoothRadio), DeviceState::Enabled);
        assert!(matches!(
            s.request_toggle(DeviceChannel::BluetoothRadio, t0 + Duration::from_secs(2)),
            ToggleOutcome::Accepted { .. }
        ));
    }

    #[test]
    fn missing_ethernet_gets_an_enable_command() {
        let shell = FakeShell::default();
        devices_up(&shell);
        shell.respond("Get-NetAdapter -Name 'Ethernet'", "Not Found");
        let fs = FakeFs::default();
        let mut s = session(&shell, &fs);
        let t0 = Instant::now();
        s.start(t0);
        s.advance(t0);
        assert_eq!(s.device_state(DeviceChannel::Ethernet), DeviceState::NotFound);
        let view = s
            .channel_views()
            .into_iter()
            .find(|v| v.channel == DeviceChannel::Ethernet)
            .unwrap();
        assert!(view.actionable);

        let outcome = s.request_toggle(DeviceChannel::Ethernet, t0);
        assert_eq!(
            outcome,
            ToggleOutcome::Accepted {
                channel: DeviceChannel::Ethernet,
                action: ToggleAction::Enable
            }
        );
        assert_eq!(shell.count("Enable-NetAdapter -Name 'Ethernet'"), 1);
        assert_eq!(s.device_state(DeviceChannel::Ethernet), DeviceState::Transitioning);

        s.advance(t0 + Duration::from_secs(3));
        assert_eq!(s.device_state(DeviceChannel::Ethernet), DeviceState::NotFound);
    }

    #[test]
    fn rapid_double_toggle_issues_one_command() {
        let shell = FakeShell::default();
        devices_up(&shell);
        let fs = FakeFs::default();
        let mut s = session(&shell, &fs);
        let t0 = Instant::now();
        s.start(t0);
        s.advance(t0);

        s.handle(Input::Toggle(DeviceChannel::Ethernet), t0);
        s.handle(Input::Toggle(DeviceChannel::Ethernet), t0 + Duration::from_millis(50));
        assert_eq!(shell.count("-NetAdapter -Name 'Ethernet' -Confirm"), 1);

        let events = s.take_events();
        assert!(events.contains(&CoreEvent::Toggled(ToggleOutcome::AlreadyPending(
            DeviceChannel::Ethernet
        ))));

        s.advance(t0 + Duration::from_secs(3));
        assert_ne!(s.device_state(DeviceChannel::Ethernet), DeviceState::Transitioning);
    }

    #[test]
    fn shutdown_stops_the_session() {
        let shell = FakeShell::default();
        let fs = FakeFs::default();
        let mut s = session(&shell, &fs);
        assert!(s.handle(Input::SelectAll, Instant::now()));
        assert!(!s.handle(Input::Shutdown, Instant::now()));
    }
}
