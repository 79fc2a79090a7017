//! SSH transport implementation using russh.

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::FutureExt;
use log::{debug, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::ChannelMsg;
use secrecy::ExposeSecret;

use super::Channel;
use super::config::{AuthMethod, SshConfig};
use crate::error::{Result, TransportError};

/// SSH transport wrapping a russh client session.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Configuration used for this connection.
    config: SshConfig,
}

impl SshTransport {
    /// Connect to the device and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config::default());

        let mut session = tokio::time::timeout(
            config.connect_timeout,
            client::connect(
                ssh_config,
                (config.host.as_str(), config.port),
                SshHandler,
            ),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.connect_timeout))?
        .map_err(|e| match e {
            russh::Error::IO(source) => TransportError::ConnectionFailed {
                host: config.host.clone(),
                port: config.port,
                source,
            },
            other => TransportError::Ssh(other),
        })?;

        Self::authenticate(&mut session, &config).await?;

        debug!("connected to {}", config.socket_addr());
        Ok(Self { session, config })
    }

    /// Open the interactive shell (PTY + shell request) and take ownership
    /// of the connection, returning a byte-level [`Channel`].
    pub async fn into_shell(self) -> Result<SshChannel> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "vt100",
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(SshChannel {
            handle: self.session,
            channel,
            pending: VecDeque::new(),
            eof: false,
        })
    }

    /// Authenticate with the device.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(&config.username)
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(
                    path,
                    passphrase.as_ref().map(|p| p.expose_secret()),
                )
                .map_err(|e| TransportError::Key(e.to_string()))?;

                // Get the best RSA hash algorithm supported by the server
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Close the connection without opening a shell.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Byte-level shell channel over russh.
///
/// Incoming channel messages are drained opportunistically, without awaiting,
/// so [`Channel::recv_ready`] can answer instantly; the session engine's
/// polling loop depends on that.
pub struct SshChannel {
    handle: Handle<SshHandler>,
    channel: russh::Channel<Msg>,
    pending: VecDeque<u8>,
    eof: bool,
}

impl SshChannel {
    /// Drain channel messages that are already queued. `Channel::wait` is a
    /// cancel-safe mpsc recv, so an unresolved poll loses nothing.
    fn drain_ready(&mut self) {
        while let Some(msg) = self.channel.wait().now_or_never() {
            match msg {
                Some(ChannelMsg::Data { data }) => {
                    self.pending.extend(data.iter().copied());
                }
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    self.pending.extend(data.iter().copied());
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    if !self.eof {
                        debug!("shell channel reached EOF");
                    }
                    self.eof = true;
                    break;
                }
                Some(_) => {}
            }
        }
    }

    /// Whether the device has closed its side of the shell.
    pub fn is_eof(&self) -> bool {
        self.eof
    }
}

impl Channel for SshChannel {
    async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        if self.eof {
            return Err(TransportError::Disconnected.into());
        }
        self.channel
            .data(data)
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }

    fn recv_ready(&mut self) -> bool {
        if self.pending.is_empty() {
            self.drain_ready();
        }
        !self.pending.is_empty()
    }

    async fn recv_raw(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
        self.drain_ready();
        let n = max_bytes.min(self.pending.len());
        Ok(self.pending.drain(..n).collect())
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self
            .handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
        {
            warn!("disconnect failed: {}", e);
        }
        self.eof = true;
        Ok(())
    }
}

/// Client handler that accepts any host key.
///
/// Network devices in automation fleets are reached by inventory, not by
/// trust-on-first-use workflows; this matches the accept-all policy of the
/// classic CLI automation stacks.
struct SshHandler;

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}
