//! Builder for connecting sessions.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::Session;
use super::sync::SyncOptions;
use crate::error::{Result, SessionError};
use crate::firmware::CiscoDevice;
use crate::transport::{AuthMethod, SshChannel, SshConfig, SshTransport};

/// Builder for connecting to a device.
///
/// # Example
///
/// ```rust,no_run
/// use ciscosh::SessionBuilder;
///
/// # async fn example() -> Result<(), ciscosh::Error> {
/// let mut session = SessionBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .connect()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    enable_password: Option<SecretString>,
    connect_timeout: Duration,
    idle_timeout: Option<Duration>,
    terminal_width: u32,
    terminal_height: u32,
}

impl SessionBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            enable_password: None,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: None,
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Set the enable secret used for privilege escalation.
    pub fn enable_password(mut self, secret: impl Into<String>) -> Self {
        self.enable_password = Some(SecretString::from(secret.into()));
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle timeout used by output collection.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Set terminal dimensions for the PTY.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Connect, open the shell and learn the initial prompt.
    pub async fn connect(self) -> Result<Session<SshChannel>> {
        let username = self.username.ok_or_else(|| SessionError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;

        let config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            connect_timeout: self.connect_timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
        };

        let channel = SshTransport::connect(config).await?.into_shell().await?;
        let mut session = Session::open(channel, self.enable_password).await?;
        if let Some(idle_timeout) = self.idle_timeout {
            session.set_sync_options(SyncOptions {
                idle_timeout,
                ..SyncOptions::default()
            });
        }
        Ok(session)
    }

    /// Connect, then detect the firmware and bind to it.
    pub async fn connect_device(self) -> Result<CiscoDevice<SshChannel>> {
        let session = self.connect().await?;
        CiscoDevice::detect(session).await
    }
}
