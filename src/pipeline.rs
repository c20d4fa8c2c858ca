//! Scan-then-clean state machine.
//!
//! The pipeline owns the phase and the in-flight plan. It never sleeps: the
//! session drives each step and retry from its timer queue and the pipeline
//! reports what should happen next.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{info, warn};

use crate::categories::find_cleaner;
use crate::cleaner::{Attempt, Cleaner, CleanupTarget, Host, StepResult, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Scanning,
    ReadyToClean,
    Cleaning,
    Completed,
}

impl PipelineState {
    /// Whether the user may change the selection in this state.
    pub fn selection_enabled(self) -> bool {
        self == Self::ReadyToClean
    }

    pub fn scan_enabled(self) -> bool {
        matches!(self, Self::Idle | Self::ReadyToClean)
    }

    pub fn clean_enabled(self) -> bool {
        self == Self::ReadyToClean
    }
}

/// Targets the user ticked. Iterates in canonical order regardless of the
/// order they were ticked in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<CleanupTarget>);

impl Selection {
    pub fn all() -> Self {
        Self(CleanupTarget::ALL.into_iter().collect())
    }

    pub fn set(&mut self, target: CleanupTarget, selected: bool) {
        if selected {
            self.0.insert(target);
        } else {
            self.0.remove(&target);
        }
    }

    pub fn contains(&self, target: CleanupTarget) -> bool {
        self.0.contains(&target)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = CleanupTarget> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<CleanupTarget> for Selection {
    fn from_iter<I: IntoIterator<Item = CleanupTarget>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The ordered unit of work handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupPlan {
    targets: Vec<CleanupTarget>,
}

impl CleanupPlan {
    pub fn from_selection(selection: &Selection) -> Self {
        Self {
            targets: selection.iter().collect(),
        }
    }

    pub fn targets(&self) -> &[CleanupTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Totals of a finished cleanup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub results: Vec<StepResult>,
}

impl Summary {
    pub fn deleted(&self) -> u64 {
        self.results.iter().map(|r| r.deleted).sum()
    }

    pub fn freed_bytes(&self) -> u64 {
        self.results.iter().map(|r| r.freed_bytes).sum()
    }

    pub fn partial_failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, StepStatus::PartialFailure(_)))
            .count()
    }

    pub fn result(&self, target: CleanupTarget) -> Option<&StepResult> {
        self.results.iter().find(|r| r.target == target)
    }
}

/// Why a scan or clean request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    CleanupInProgress,
    ScanInProgress,
    NotScanned,
    Completing,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CleanupInProgress => "a cleanup is already in progress",
            Self::ScanInProgress => "a scan is already in progress",
            Self::NotScanned => "scan the system before cleaning",
            Self::Completing => "the previous cleanup is still finishing",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(CleanupPlan),
    NothingSelected,
    Rejected(Rejection),
}

/// What the session should do after driving one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The first attempt left work behind; call `retry_step` after the
    /// retry delay.
    RetryScheduled { target: CleanupTarget },
    /// The step's result is final.
    Recorded {
        result: StepResult,
        progress: u8,
        /// Present once the last step has been recorded.
        summary: Option<Summary>,
    },
    /// Nothing was in flight.
    Idle,
}

struct Run {
    plan: CleanupPlan,
    next: usize,
    retry: Option<Attempt>,
    results: Vec<StepResult>,
}

/// The executor. Exactly one plan may be in flight.
pub struct Pipeline {
    state: PipelineState,
    run: Option<Run>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// `floor(100 * done / total)`.
pub fn progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (done.min(total) * 100 / total) as u8
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            run: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Targets of the plan in flight, if any.
    #[cfg(test)]
    pub fn in_flight(&self) -> Option<&CleanupPlan> {
        self.run.as_ref().map(|r| &r.plan)
    }

    pub fn begin_scan(&mut self) -> Result<(), Rejection> {
        match self.state {
            PipelineState::Idle | PipelineState::ReadyToClean => {
                self.state = PipelineState::Scanning;
                Ok(())
            }
            PipelineState::Scanning => Err(Rejection::ScanInProgress),
            PipelineState::Cleaning => Err(Rejection::CleanupInProgress),
            PipelineState::Completed => Err(Rejection::Completing),
        }
    }

    pub fn finish_scan(&mut self) {
        if self.state == PipelineState::Scanning {
            self.state = PipelineState::ReadyToClean;
        }
    }

    pub fn start(&mut self, plan: CleanupPlan) -> StartOutcome {
        match self.state {
            PipelineState::ReadyToClean => {}
            PipelineState::Cleaning => {
                warn!("cleanup rejected: already in progress");
                return StartOutcome::Rejected(Rejection::CleanupInProgress);
            }
            PipelineState::Scanning => return StartOutcome::Rejected(Rejection::ScanInProgress),
            PipelineState::Completed => return StartOutcome::Rejected(Rejection::Completing),
            PipelineState::Idle => return StartOutcome::Rejected(Rejection::NotScanned),
        }
        if plan.is_empty() {
            info!("cleanup not started: no targets selected");
            return StartOutcome::NothingSelected;
        }

        info!(steps = plan.len(), "cleanup started");
        self.state = PipelineState::Cleaning;
        self.run = Some(Run {
            plan: plan.clone(),
            next: 0,
            retry: None,
            results: Vec::with_capacity(plan.len()),
        });
        StartOutcome::Started(plan)
    }

    /// The target the next `run_step` will act on.
    pub fn current_target(&self) -> Option<CleanupTarget> {
        let run = self.run.as_ref()?;
        run.plan.targets.get(run.next).copied()
    }

    /// First attempt of the current step.
    pub fn run_step(&mut self, host: &Host<'_>, cleaners: &[Box<dyn Cleaner>]) -> StepOutcome {
        let Some(target) = self.current_target() else {
            return StepOutcome::Idle;
        };
        let attempt = match find_cleaner(cleaners, target) {
            Some(cleaner) => cleaner.clean(host),
            None => Attempt::skipped("no cleaner registered"),
        };

        if attempt.needs_retry() {
            info!(category = target.name(), "step failed, retrying once");
            if let Some(run) = self.run.as_mut() {
                run.retry = Some(attempt);
            }
            return StepOutcome::RetryScheduled { target };
        }
        self.record(attempt.into_result(target, false))
    }

    /// Second and final attempt of the current step.
    pub fn retry_step(&mut self, host: &Host<'_>, cleaners: &[Box<dyn Cleaner>]) -> StepOutcome {
        let Some(target) = self.current_target() else {
            return StepOutcome::Idle;
        };
        let Some(previous) = self.run.as_mut().and_then(|r| r.retry.take()) else {
            return StepOutcome::Idle;
        };
        let attempt = match find_cleaner(cleaners, target) {
            Some(cleaner) => cleaner.retry(host, previous),
            None => previous,
        };
        self.record(attempt.into_result(target, true))
    }

    fn record(&mut self, result: StepResult) -> StepOutcome {
        let Some(run) = self.run.as_mut() else {
            return StepOutcome::Idle;
        };
        match &result.status {
            StepStatus::Success => {
                info!(category = result.target.name(), deleted = result.deleted, "step succeeded");
            }
            StepStatus::PartialFailure(advisory) => {
                warn!(
                    category = result.target.name(),
                    deleted = result.deleted,
                    %advisory,
                    "step partially failed"
                );
            }
            StepStatus::Skipped(reason) => {
                info!(category = result.target.name(), %reason, "step skipped");
            }
        }

        run.results.push(result.clone());
        run.next += 1;
        let progress = progress(run.next, run.plan.len());

        let summary = if run.next >= run.plan.len() {
            let results = std::mem::take(&mut run.results);
            self.run = None;
            self.state = PipelineState::Completed;
            let summary = Summary { results };
            info!(
                deleted = summary.deleted(),
                freed_bytes = summary.freed_bytes(),
                partial_failures = summary.partial_failures(),
                "cleanup completed"
            );
            Some(summary)
        } else {
            None
        };

        StepOutcome::Recorded {
            result,
            progress,
            summary,
        }
    }

    /// Completed → Idle.
    pub fn settle(&mut self) {
        if self.state == PipelineState::Completed {
            self.state = PipelineState::Idle;
        }
    }
}
