//! Vendor firmware layer.
//!
//! The firmware families this crate knows how to drive form a closed set,
//! bound statically once after a single detection step. Operations here
//! return raw device text; parsing tabular "show" output is a concern for
//! layers above this crate.

mod detect;
mod device;

pub use detect::detect_firmware;
pub use device::CiscoDevice;

/// Firmware families with vendor-specific command surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareKind {
    /// Classic IOS switches and routers.
    Ios,

    /// IOS-XE.
    IosXe,

    /// NX-OS (Nexus).
    Nxos,

    /// Adaptive Security Appliance.
    Asa,
}

impl FirmwareKind {
    /// Vendor command to set pagination length (`0` disables paging).
    pub(crate) fn pagination_length_command(self, n: u32) -> String {
        match self {
            FirmwareKind::Asa => format!("terminal pager {n}"),
            _ => format!("terminal length {n}"),
        }
    }

    /// Vendor command to set terminal width.
    pub(crate) fn pagination_width_command(self, n: u32) -> String {
        format!("terminal width {n}")
    }
}

impl std::fmt::Display for FirmwareKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FirmwareKind::Ios => "IOS",
            FirmwareKind::IosXe => "IOS-XE",
            FirmwareKind::Nxos => "NX-OS",
            FirmwareKind::Asa => "ASA",
        };
        write!(f, "{name}")
    }
}
