use std::time::Duration;

use tracing::debug;

use crate::device::commands;
use crate::device::{ChannelView, DeviceChannel, DeviceSnapshot, DeviceState};
use crate::shell::CommandShell;

/// Owner of the last known device states.
#[derive(Debug, Default)]
pub struct Poller {
    last: DeviceSnapshot,
    polls: u64,
}

/// Read every channel. Issues only read-only queries.
pub fn poll(shell: &dyn CommandShell, timeout: Duration) -> DeviceSnapshot {
    let adapter = commands::ethernet_adapter_name(shell, timeout);
    let mut snapshot = DeviceSnapshot {
        ethernet_adapter: adapter,
        ..DeviceSnapshot::default()
    };
    for channel in DeviceChannel::ALL {
        let state = commands::query(shell, channel, &snapshot.ethernet_adapter, timeout);
        snapshot.set(channel, state);
    }
    debug!(?snapshot, "device poll");
    snapshot
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> &DeviceSnapshot {
        &self.last
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Poll and store the reading. Returns whether anything changed.
    pub fn refresh(&mut self, shell: &dyn CommandShell, timeout: Duration) -> bool {
        let snapshot = poll(shell, timeout);
        self.polls += 1;
        let changed = snapshot != self.last;
        self.last = snapshot;
        changed
    }

    /// The displayed state of `channel`: `Transitioning` while a toggle is
    /// pending, the polled state otherwise.
    pub fn displayed(
        &self,
        channel: DeviceChannel,
        pending: impl Fn(DeviceChannel) -> bool,
    ) -> DeviceState {
        if pending(channel) {
            DeviceState::Transitioning
        } else {
            self.last.get(channel)
        }
    }

    /// Views for every channel. A radio is inert unless its adapter shows
    /// Enabled.
    pub fn render(&self, pending: impl Fn(DeviceChannel) -> bool) -> Vec<ChannelView> {
        DeviceChannel::ALL
            .into_iter()
            .map(|channel| {
                let state = self.displayed(channel, &pending);
                let adapter_ready = channel
                    .paired_adapter()
                    .is_none_or(|adapter| {
                        self.displayed(adapter, &pending) == DeviceState::Enabled
                    });
                ChannelView {
                    channel,
                    state,
                    actionable: adapter_ready && state != DeviceState::Transitioning,
                }
            })
            .collect()
    }
}
