//! # Ciscosh
//!
//! Async SSH session engine for Cisco IOS-family network device automation.
//!
//! The device side of one of these sessions is a human-oriented terminal:
//! no framing, no request ids, output whenever the device gets around to it.
//! Ciscosh turns that stream into discrete command/response records by
//! matching the echoed command and the trailing prompt under an idle-reset
//! timeout, and tracks the shell's privilege mode purely from the prompt
//! text so the two can never disagree.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - Prompt-delimited output synchronization with idle-reset timeouts
//! - Privilege mode derived from the prompt, never cached
//! - Enable-password escalation and configuration-mode navigation
//! - Firmware detection for IOS / IOS-XE / NX-OS / ASA
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ciscosh::SessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ciscosh::Error> {
//!     let mut session = SessionBuilder::new("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .enable_password("enable-secret")
//!         .connect()
//!         .await?;
//!
//!     session.enter_privileged_exec().await?;
//!     let output = session.send_command_get_output("show ip interface brief").await?;
//!     for line in &output {
//!         println!("{line}");
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod firmware;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use error::Error;
pub use firmware::{CiscoDevice, FirmwareKind, detect_firmware};
pub use session::{Mode, Session, SessionBuilder, SyncOptions};
pub use transport::{AuthMethod, Channel, SshChannel, SshConfig, SshTransport};

use error::Result;

/// Connect to a device with password authentication and return a session.
///
/// Shorthand for the common case; use [`SessionBuilder`] for key
/// authentication, enable secrets or timeout tuning.
pub async fn connect(
    host: &str,
    username: &str,
    password: &str,
    port: u16,
) -> Result<Session<SshChannel>> {
    SessionBuilder::new(host)
        .username(username)
        .password(password)
        .port(port)
        .connect()
        .await
}

/// Connect, detect the device's firmware and return a vendor-bound handle.
pub async fn connect_device(
    host: &str,
    username: &str,
    password: &str,
    port: u16,
) -> Result<CiscoDevice<SshChannel>> {
    SessionBuilder::new(host)
        .username(username)
        .password(password)
        .port(port)
        .connect_device()
        .await
}

#[cfg(test)]
pub(crate) mod testing;
