use std::collections::BTreeSet;
use std::fmt;

use tracing::{info, warn};

use crate::device::commands::ToggleAction;
use crate::device::{DeviceChannel, DeviceState};

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Accepted {
        channel: DeviceChannel,
        action: ToggleAction,
    },
    AlreadyPending(DeviceChannel),
    AdapterNotEnabled {
        radio: DeviceChannel,
        adapter: DeviceChannel,
    },
}

impl fmt::Display for ToggleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted {
                channel,
                action: ToggleAction::Enable,
            } => write!(f, "{channel} ENABLED"),
            Self::Accepted {
                channel,
                action: ToggleAction::Disable,
            } => write!(f, "{channel} DISABLED"),
            Self::Accepted {
                channel,
                action: ToggleAction::OpenSettings,
            } => write!(f, "Opening settings for {channel}; switch it manually"),
            Self::AlreadyPending(channel) => write!(f, "{channel}: already in progress"),
            Self::AdapterNotEnabled { adapter, .. } => {
                write!(f, "Please enable the {adapter} first")
            }
        }
    }
}

/// Per-channel `Idle → Pending → Idle` tracking.
#[derive(Debug, Default)]
pub struct ToggleController {
    pending: BTreeSet<DeviceChannel>,
}

impl ToggleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, channel: DeviceChannel) -> bool {
        self.pending.contains(&channel)
    }

    /// Decide what a toggle of `channel` should do. `displayed` is the
    /// channel state as last observed by the poller, with pending channels
    /// shown as `Transitioning`. Nothing is marked pending here.
    pub fn decide(
        &self,
        channel: DeviceChannel,
        displayed: impl Fn(DeviceChannel) -> DeviceState,
    ) -> ToggleOutcome {
        if self.is_pending(channel) {
            return ToggleOutcome::AlreadyPending(channel);
        }
        if let Some(adapter) = channel.paired_adapter() {
            if displayed(adapter) != DeviceState::Enabled {
                return ToggleOutcome::AdapterNotEnabled {
                    radio: channel,
                    adapter,
                };
            }
        }
        let action = match displayed(channel) {
            DeviceState::Transitioning => return ToggleOutcome::AlreadyPending(channel),
            _ if channel == DeviceChannel::BluetoothRadio => ToggleAction::OpenSettings,
            DeviceState::Enabled => ToggleAction::Disable,
            DeviceState::Disabled | DeviceState::Unknown | DeviceState::NotFound => {
                ToggleAction::Enable
            }
        };
        ToggleOutcome::Accepted { channel, action }
    }

    /// Idle → Pending until the settle poll.
    pub fn mark_pending(&mut self, channel: DeviceChannel) {
        info!(%channel, "toggle pending");
        self.pending.insert(channel);
    }

    /// Pending → Idle. Returns false if the channel was not pending.
    pub fn settle(&mut self, channel: DeviceChannel) -> bool {
        let was_pending = self.pending.remove(&channel);
        if !was_pending {
            warn!(%channel, "settle fired for a channel that was not pending");
        }
        was_pending
    }
}
