//! Network adapter and radio channels.

pub mod commands;
pub mod poller;
pub mod toggle;

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceChannel {
    Ethernet,
    WifiAdapter,
    WifiRadio,
    BluetoothAdapter,
    BluetoothRadio,
}

impl DeviceChannel {
    pub const ALL: [DeviceChannel; 5] = [
        DeviceChannel::Ethernet,
        DeviceChannel::WifiAdapter,
        DeviceChannel::WifiRadio,
        DeviceChannel::BluetoothAdapter,
        DeviceChannel::BluetoothRadio,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Ethernet => "Ethernet",
            Self::WifiAdapter => "WiFi Adapter",
            Self::WifiRadio => "WiFi Radio",
            Self::BluetoothAdapter => "BT Adapter",
            Self::BluetoothRadio => "BT Radio",
        }
    }

    /// The adapter a radio depends on.
    pub fn paired_adapter(self) -> Option<DeviceChannel> {
        match self {
            Self::WifiRadio => Some(Self::WifiAdapter),
            Self::BluetoothRadio => Some(Self::BluetoothAdapter),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Unknown,
    Enabled,
    Disabled,
    NotFound,
    /// A toggle was accepted and the settle poll has not run yet.
    Transitioning,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "Unknown",
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
            Self::NotFound => "Not Found",
            Self::Transitioning => "Working...",
        })
    }
}

/// One poll's reading of every channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    states: BTreeMap<DeviceChannel, DeviceState>,
    /// Name of the physical Ethernet adapter the reading was taken from.
    pub ethernet_adapter: String,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self {
            states: DeviceChannel::ALL
                .into_iter()
                .map(|c| (c, DeviceState::Unknown))
                .collect(),
            ethernet_adapter: commands::DEFAULT_ETHERNET_NAME.to_string(),
        }
    }
}

impl DeviceSnapshot {
    pub fn get(&self, channel: DeviceChannel) -> DeviceState {
        self.states
            .get(&channel)
            .copied()
            .unwrap_or(DeviceState::Unknown)
    }

    pub fn set(&mut self, channel: DeviceChannel, state: DeviceState) {
        self.states.insert(channel, state);
    }
}

/// What the UI shows for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelView {
    pub channel: DeviceChannel,
    pub state: DeviceState,
    /// Whether the control accepts a toggle right now.
    pub actionable: bool,
}
