//! System information panel data
//!
//! One PowerShell call gathers OS, boot mode, BitLocker, IPv4, CPU and disk
//! usage and prints them as a compressed JSON object. Anything that goes wrong
//! leaves the affected fields at the placeholder.

use serde::Deserialize;
use std::process::Stdio;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use super::codepage::decode_cp850;
use super::error::{RepairError, Result};
use super::host::hidden_command;
use super::Repaint;

pub const PLACEHOLDER: &str = "-";

const POWERSHELL: &str = "powershell.exe";

/// Sets the console to CP850 so localized values survive the pipe
pub(crate) const CP850_PRELUDE: &str = "[Console]::OutputEncoding=[System.Text.Encoding]::GetEncoding(850); \
$OutputEncoding=[System.Text.Encoding]::GetEncoding(850); ";

const QUERY: &str = r#"
$ErrorActionPreference = 'SilentlyContinue'

$os = Get-CimInstance Win32_OperatingSystem
$cv = Get-ItemProperty -Path 'HKLM:\SOFTWARE\Microsoft\Windows NT\CurrentVersion'
$edition = $os.Caption -replace '^Microsoft\s+', ''
$arch = $os.OSArchitecture
if ($arch) { $arch = ($arch -replace 'bit','Bit') -replace '-', ' ' }
$disp = $cv.DisplayVersion
if (-not $disp -and $cv.ReleaseId) { $disp = $cv.ReleaseId }
if (-not $disp) { $disp = $os.Version }
if ($arch) { $osStr = "$edition - $arch ($disp)" } else { $osStr = "$edition ($disp)" }

$boot = 'Unknown'
$fw = (Get-ItemProperty -Path 'HKLM:\SYSTEM\CurrentControlSet\Control' -Name 'PEFirmwareType').PEFirmwareType
if ($fw -eq 1) { $boot = 'Legacy / BIOS' } elseif ($fw -eq 2) { $boot = 'UEFI' }
if ($boot -eq 'Unknown') {
    if (Test-Path 'HKLM:\SYSTEM\CurrentControlSet\Control\SecureBoot\State') { $boot = 'UEFI' } else { $boot = 'Legacy / BIOS' }
}
$style = (Get-Partition -DriveLetter C | Get-Disk).PartitionStyle
if ($style) { $bootStr = "$boot ($style)" } else { $bootStr = $boot }

$blStr = 'BitLocker: unknown'
if (Get-Command -Name Get-BitLockerVolume) {
    $vol = Get-BitLockerVolume -MountPoint 'C:'
    if ($vol) {
        $prot = [int]$vol.ProtectionStatus
        $protText = switch ($prot) { 0 { 'off' } 1 { 'on' } 2 { 'suspended' } default { "unknown ($prot)" } }
        if ($vol.VolumeStatus) { $blStr = "BitLocker: $protText - VolumeStatus: $($vol.VolumeStatus)" } else { $blStr = "BitLocker: $protText" }
    } else { $blStr = 'BitLocker: no volume found' }
} else { $blStr = 'BitLocker cmdlets not available' }

$ipv4 = '-'
$adapters = Get-NetIPAddress -AddressFamily IPv4 -PrefixOrigin Dhcp,Manual |
    Where-Object { $_.IPAddress -notlike '169.254.*' -and $_.IPAddress -ne '127.0.0.1' } |
    Sort-Object -Property InterfaceMetric
if ($adapters) { $ipv4 = $adapters[0].IPAddress }

$cpuName = '-'
$cpu = Get-CimInstance Win32_Processor | Select-Object -First 1
if ($cpu -and $cpu.Name) { $cpuName = $cpu.Name.Trim() }

function Format-Size([double]$bytes) {
    if ($bytes -ge 1TB) { "{0} TB" -f [math]::Round($bytes / 1TB, 0) }
    elseif ($bytes -ge 1GB) { "{0} GB" -f [math]::Round($bytes / 1GB, 0) }
    else { "{0} MB" -f [math]::Round($bytes / 1MB, 0) }
}
$diskStr = 'Not available'
$drive = Get-CimInstance Win32_LogicalDisk -Filter "DeviceID='C:'"
if ($drive -and $drive.Size) {
    $used = [double]$drive.Size - [double]$drive.FreeSpace
    $diskStr = "Disk C:\ $(Format-Size $used) used of $(Format-Size ([double]$drive.Size))"
}

[PSCustomObject]@{
    OS = $osStr; Boot = $bootStr; BitLocker = $blStr; IPv4 = $ipv4; CPU = $cpuName; Disk = $diskStr
} | ConvertTo-Json -Compress
"#;

/// Point-in-time system facts for the info panel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemInfoSnapshot {
    pub computer: String,
    pub os: String,
    pub boot: String,
    pub bitlocker: String,
    pub ipv4: String,
    pub cpu: String,
    pub disk: String,
}

impl Default for SystemInfoSnapshot {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl SystemInfoSnapshot {
    pub fn placeholder() -> Self {
        Self {
            computer: PLACEHOLDER.to_string(),
            os: PLACEHOLDER.to_string(),
            boot: PLACEHOLDER.to_string(),
            bitlocker: PLACEHOLDER.to_string(),
            ipv4: PLACEHOLDER.to_string(),
            cpu: PLACEHOLDER.to_string(),
            disk: PLACEHOLDER.to_string(),
        }
    }

    /// Label / value pairs in panel order
    pub fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("Computer:", self.computer.as_str()),
            ("Operating system:", self.os.as_str()),
            ("Boot:", self.boot.as_str()),
            ("BitLocker:", self.bitlocker.as_str()),
            ("Network IP:", self.ipv4.as_str()),
            ("System drive C:\\", self.disk.as_str()),
            ("Processor:", self.cpu.as_str()),
        ]
    }
}

#[derive(Deserialize, Default)]
struct Payload {
    #[serde(rename = "OS")]
    os: Option<String>,
    #[serde(rename = "Boot")]
    boot: Option<String>,
    #[serde(rename = "BitLocker")]
    bitlocker: Option<String>,
    #[serde(rename = "IPv4")]
    ipv4: Option<String>,
    #[serde(rename = "CPU")]
    cpu: Option<String>,
    #[serde(rename = "Disk")]
    disk: Option<String>,
}

fn field(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Parse the query output; empty or malformed input gives placeholders
pub fn parse_payload(raw: &str) -> SystemInfoSnapshot {
    let raw = raw.trim();
    let payload = if raw.is_empty() {
        Payload::default()
    } else {
        serde_json::from_str::<Payload>(raw).unwrap_or_else(|e| {
            tracing::debug!("system info payload unreadable: {}", e);
            Payload::default()
        })
    };

    SystemInfoSnapshot {
        computer: PLACEHOLDER.to_string(),
        os: field(payload.os),
        boot: field(payload.boot),
        bitlocker: field(payload.bitlocker),
        ipv4: field(payload.ipv4),
        cpu: field(payload.cpu),
        disk: field(payload.disk),
    }
}

fn run_query() -> Result<String> {
    let output = hidden_command(POWERSHELL)
        .args([
            "-NoProfile",
            "-NonInteractive",
            "-WindowStyle",
            "Hidden",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
        ])
        .arg(format!("{CP850_PRELUDE}{QUERY}"))
        .stdin(Stdio::null())
        .output()
        .map_err(|source| RepairError::Spawn {
            program: POWERSHELL.to_string(),
            source,
        })?;

    Ok(decode_cp850(&output.stdout))
}

/// The JSON object line of the query output; warnings and blank lines may surround it
fn json_line(out: &str) -> Option<&str> {
    out.lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
}

/// Gather a snapshot. Blocking; never fails.
pub fn fetch() -> SystemInfoSnapshot {
    let mut snapshot = match run_query() {
        Ok(out) => parse_payload(json_line(&out).unwrap_or_default()),
        Err(e) => {
            tracing::debug!("system info query failed: {}", e);
            SystemInfoSnapshot::placeholder()
        }
    };

    if let Some(name) = sysinfo::System::host_name().filter(|n| !n.is_empty()) {
        snapshot.computer = name;
    }
    snapshot
}

/// Run `fetch` on a worker thread and deliver the result over a channel
pub fn spawn(repaint: Repaint) -> Receiver<SystemInfoSnapshot> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let snapshot = fetch();
        tracing::info!("system info loaded (os: {})", snapshot.os);
        let _ = tx.send(snapshot);
        repaint();
    });
    rx
}
