//! PowerShell and netsh command lines, and the classifiers for their output.

use std::time::Duration;

use crate::device::{DeviceChannel, DeviceState};
use crate::shell::CommandShell;

pub const DEFAULT_ETHERNET_NAME: &str = "Ethernet";

const ETHERNET_NAME_QUERY: &str = "Get-NetAdapter -Physical | Where-Object {$_.InterfaceDescription -like '*Ethernet*' -or $_.Name -like '*Ethernet*'} | Select-Object -First 1 | Select-Object -ExpandProperty Name";

const WIFI_ADAPTER_QUERY: &str = "$adapter = Get-NetAdapter -Name 'Wi-Fi' -ErrorAction SilentlyContinue; if ($adapter) { if ($adapter.Status -eq 'Up') { 'Enabled' } else { 'Disabled' } } else { 'Not Found' }";

const WIFI_RADIO_QUERY: &str = "$interface = netsh interface show interface 'Wi-Fi'; if ($interface -like '*Enabled*') { 'Enabled' } else { 'Disabled' }";

const BLUETOOTH_ADAPTER_QUERY: &str = "$bt = Get-PnpDevice -Class Bluetooth -Status 'OK' -ErrorAction SilentlyContinue | Select-Object -First 1; if ($bt) { 'Enabled' } else { 'Disabled' }";

const BLUETOOTH_RADIO_QUERY: &str = "$radio = Get-WmiObject -Namespace 'Root\\WMI' -Class 'MS_SystemInformation' -ErrorAction SilentlyContinue; if ($radio) { 'Enabled' } else { 'Disabled' }";

const OPEN_BLUETOOTH_SETTINGS: &str = "Start-Process ms-settings:bluetooth";

fn ethernet_status_query(adapter: &str) -> String {
    format!(
        "$adapter = Get-NetAdapter -Name '{adapter}' -ErrorAction SilentlyContinue; if ($adapter) {{ if ($adapter.Status -eq 'Up') {{ 'Connected' }} else {{ 'Disabled' }} }} else {{ 'Not Found' }}"
    )
}

fn powershell(shell: &dyn CommandShell, script: &str, timeout: Duration) -> String {
    shell.run("powershell", &["-Command", script], timeout)
}

/// Map a one-word status reply onto a state. Empty or unrecognised output
/// is `Unknown`, never an error.
pub fn classify(output: &str) -> DeviceState {
    let reply = output.trim().to_ascii_lowercase();
    match reply.as_str() {
        "" | "null" => DeviceState::Unknown,
        "enabled" | "connected" | "up" => DeviceState::Enabled,
        "disabled" | "disconnected" | "down" => DeviceState::Disabled,
        "not found" => DeviceState::NotFound,
        _ => DeviceState::Unknown,
    }
}

/// Classify `netsh interface show interface` output for the Ethernet
/// adapter. Columns are admin state, connection state, type and name.
pub fn classify_netsh(output: &str, adapter: &str) -> DeviceState {
    for line in output.lines() {
        if !(line.contains(adapter)
            || line.contains("Ethernet")
            || line.contains("Local Area Connection"))
        {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.contains(&"Disabled") || words.contains(&"Disconnected") {
            return DeviceState::Disabled;
        }
        if words.contains(&"Connected") || words.contains(&"Enabled") {
            return DeviceState::Enabled;
        }
    }
    DeviceState::NotFound
}

/// Name of the physical Ethernet adapter, or "Ethernet" when none is found.
pub fn ethernet_adapter_name(shell: &dyn CommandShell, timeout: Duration) -> String {
    let name = powershell(shell, ETHERNET_NAME_QUERY, timeout);
    let name = name.trim();
    if name.is_empty() || name == "null" {
        DEFAULT_ETHERNET_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Read-only status query for one channel.
pub fn query(
    shell: &dyn CommandShell,
    channel: DeviceChannel,
    ethernet_adapter: &str,
    timeout: Duration,
) -> DeviceState {
    match channel {
        DeviceChannel::Ethernet => {
            let reply = powershell(shell, &ethernet_status_query(ethernet_adapter), timeout);
            match classify(&reply) {
                DeviceState::Unknown => {
                    let table = shell.run("netsh", &["interface", "show", "interface"], timeout);
                    classify_netsh(&table, ethernet_adapter)
                }
                state => state,
            }
        }
        DeviceChannel::WifiAdapter => classify(&powershell(shell, WIFI_ADAPTER_QUERY, timeout)),
        DeviceChannel::WifiRadio => classify(&powershell(shell, WIFI_RADIO_QUERY, timeout)),
        DeviceChannel::BluetoothAdapter => {
            classify(&powershell(shell, BLUETOOTH_ADAPTER_QUERY, timeout))
        }
        DeviceChannel::BluetoothRadio => {
            classify(&powershell(shell, BLUETOOTH_RADIO_QUERY, timeout))
        }
    }
}

/// What a toggle does to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Enable,
    Disable,
    /// The OS offers no scriptable switch; the settings page is opened and
    /// the user flips it by hand.
    OpenSettings,
}

/// Issue the state-changing command for `channel`. Returns the captured
/// output, which the OS usually leaves empty.
pub fn apply(
    shell: &dyn CommandShell,
    channel: DeviceChannel,
    action: ToggleAction,
    ethernet_adapter: &str,
    timeout: Duration,
) -> String {
    let enable = action == ToggleAction::Enable;
    match (channel, action) {
        (_, ToggleAction::OpenSettings) | (DeviceChannel::BluetoothRadio, _) => {
            powershell(shell, OPEN_BLUETOOTH_SETTINGS, timeout)
        }
        (DeviceChannel::Ethernet, _) | (DeviceChannel::WifiAdapter, _) => {
            let name = if channel == DeviceChannel::Ethernet {
                ethernet_adapter
            } else {
                "Wi-Fi"
            };
            let verb = if enable { "Enable" } else { "Disable" };
            powershell(
                shell,
                &format!("{verb}-NetAdapter -Name '{name}' -Confirm:$false"),
                timeout,
            )
        }
        (DeviceChannel::WifiRadio, _) => {
            let admin = if enable { "admin=enabled" } else { "admin=disabled" };
            shell.run(
                "netsh",
                &["interface", "set", "interface", "Wi-Fi", admin],
                timeout,
            )
        }
        (DeviceChannel::BluetoothAdapter, _) => {
            let verb = if enable { "Enable" } else { "Disable" };
            powershell(
                shell,
                &format!("Get-PnpDevice -Class Bluetooth | {verb}-PnpDevice -Confirm:$false"),
                timeout,
            )
        }
    }
}
