//! Error types for ciscosh.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ciscosh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Session engine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Firmware detection errors
    #[error("Firmware error: {0}")]
    Firmware(#[from] FirmwareError),
}

/// Transport layer errors (SSH connection, authentication, shell channel).
///
/// These are fatal to the session and are never retried internally.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Connect/handshake did not finish in time
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Session engine errors (mode navigation, configuration).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Privilege escalation required an enable password and none was
    /// configured. Recoverable: supply a secret and retry.
    #[error("Device is asking for an enable password and none was provided")]
    EnablePasswordRequired,

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Firmware layer errors.
#[derive(Error, Debug)]
pub enum FirmwareError {
    /// `show version` output carried no recognizable firmware keywords
    #[error("Unable to determine firmware from 'show version' output")]
    DetectionFailed,
}

/// Result type alias using ciscosh's Error.
pub type Result<T> = std::result::Result<T, Error>;
