//! Vendor-bound device handle.

use log::debug;

use super::{FirmwareKind, detect::detect_firmware};
use crate::error::Result;
use crate::session::Session;
use crate::transport::Channel;

/// A session bound to a detected firmware family.
///
/// Wraps a [`Session`] and dispatches the handful of operations whose
/// command surface differs across vendors. Everything else passes through
/// to the session facade.
pub struct CiscoDevice<C: Channel> {
    session: Session<C>,
    kind: FirmwareKind,
}

impl<C: Channel> CiscoDevice<C> {
    /// Detect the firmware on an open session and bind to it.
    pub async fn detect(mut session: Session<C>) -> Result<Self> {
        let kind = detect_firmware(&mut session).await?;
        debug!("bound session to {kind}");
        Ok(Self { session, kind })
    }

    /// Bind to a known firmware family, skipping detection.
    pub fn with_kind(session: Session<C>, kind: FirmwareKind) -> Self {
        Self { session, kind }
    }

    /// The detected firmware family.
    pub fn kind(&self) -> FirmwareKind {
        self.kind
    }

    /// Access the underlying session.
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Mutable access to the underlying session.
    pub fn session_mut(&mut self) -> &mut Session<C> {
        &mut self.session
    }

    /// Unwrap back into the session.
    pub fn into_session(self) -> Session<C> {
        self.session
    }

    /// Set pagination length with the vendor's command, memoized through
    /// the session. Navigates to privileged exec first when a round trip is
    /// actually needed.
    pub async fn terminal_length(&mut self, n: u32) -> Result<Vec<String>> {
        if self.session.pagination_length() == Some(n) {
            return Ok(Vec::new());
        }
        self.session.enter_privileged_exec().await?;
        let command = self.kind.pagination_length_command(n);
        self.session.set_pagination_length_with(&command, n).await
    }

    /// Set terminal width with the vendor's command, memoized through the
    /// session.
    pub async fn terminal_width(&mut self, n: u32) -> Result<Vec<String>> {
        self.session.enter_privileged_exec().await?;
        let command = self.kind.pagination_width_command(n);
        self.session.set_pagination_width_with(&command, n).await
    }

    /// Raw `show running-config` text.
    pub async fn running_config(&mut self) -> Result<String> {
        self.show_raw("show running-config").await
    }

    /// Raw `show startup-config` text.
    pub async fn startup_config(&mut self) -> Result<String> {
        self.show_raw("show startup-config").await
    }

    /// Device uptime as reported by `show version`, when present.
    pub async fn uptime(&mut self) -> Result<Option<String>> {
        self.session.enter_privileged_exec().await?;
        self.terminal_length(0).await?;
        let lines = self.session.send_command_get_output("show version").await?;

        // IOS-family firmware prefixes the uptime line with the hostname;
        // NX-OS reports a bare kernel uptime line.
        let needle = match self.kind {
            FirmwareKind::Nxos => "uptime".to_string(),
            _ => format!("{} uptime", self.session.hostname().to_lowercase()),
        };
        for line in &lines {
            if line.to_lowercase().contains(&needle) {
                let uptime = line.split_whitespace().skip(3).collect::<Vec<_>>().join(" ");
                return Ok(Some(uptime));
            }
        }
        Ok(None)
    }

    /// Save the running configuration to startup.
    pub async fn save_config(&mut self) -> Result<Vec<String>> {
        self.session.enter_privileged_exec().await?;
        match self.kind {
            FirmwareKind::Ios | FirmwareKind::IosXe => {
                // The copy command asks for a destination filename; an empty
                // line accepts the default.
                self.session
                    .send_command("copy running-config startup-config")
                    .await?;
                self.session.send_command_get_output("").await
            }
            FirmwareKind::Nxos => {
                self.session
                    .send_command_get_output("copy running-config startup-config")
                    .await
            }
            FirmwareKind::Asa => self.session.send_command_get_output("write memory").await,
        }
    }

    async fn show_raw(&mut self, command: &str) -> Result<String> {
        self.session.enter_privileged_exec().await?;
        self.terminal_length(0).await?;
        let mut lines = self.session.send_command_get_output(command).await?;
        // Drop the trailing prompt line
        lines.pop();
        Ok(lines.join("\n"))
    }
}
