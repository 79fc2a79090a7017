//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management and the
//! byte-level [`Channel`] seam the session engine is built on.

pub mod config;
mod ssh;

pub use config::{AuthMethod, SshConfig};
pub use ssh::{SshChannel, SshTransport};

use std::future::Future;

use crate::error::Result;

/// Raw byte channel to a device's interactive shell.
///
/// No framing or content interpretation happens at this layer; the session
/// engine above it derives all message boundaries from prompt matching.
/// Keeping the seam this narrow lets tests drive a full session from canned
/// byte sequences.
pub trait Channel: Send {
    /// Write raw bytes to the device.
    fn send_raw(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Whether at least one byte is ready to read right now. Never blocks.
    fn recv_ready(&mut self) -> bool;

    /// Read up to `max_bytes` of pending output. Returns an empty buffer
    /// when nothing is ready; never waits for the device.
    fn recv_raw(&mut self, max_bytes: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Tear down the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
