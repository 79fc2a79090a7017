//! Shell privilege modes and navigation between them.
//!
//! A mode is never stored anywhere; it is recomputed from the latest prompt
//! every time it is asked for, so it cannot drift out of sync with the
//! device.

use log::debug;
use secrecy::ExposeSecret;

use super::Session;
use crate::error::{Result, SessionError};
use crate::transport::Channel;

/// CLI privilege mode, derived from the trailing prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Unprivileged exec, `>` prompt.
    UserExec,

    /// Privileged exec, `#` prompt.
    PrivilegedExec,

    /// Configuration mode, `)#` prompt.
    ConfigMode,
}

impl Mode {
    /// Classify a prompt by its suffix. `)#` is checked before `#` since
    /// every configuration prompt also ends in `#`.
    pub fn classify(prompt: &str) -> Option<Mode> {
        if prompt.ends_with(")#") {
            Some(Mode::ConfigMode)
        } else if prompt.ends_with('#') {
            Some(Mode::PrivilegedExec)
        } else if prompt.ends_with('>') {
            Some(Mode::UserExec)
        } else {
            None
        }
    }
}

impl<C: Channel> Session<C> {
    /// Drive the shell into privileged exec mode from wherever it is.
    ///
    /// From configuration mode this sends `end`; from user exec it sends
    /// `enable` and, when the device answers with a secret challenge instead
    /// of a new prompt, the configured enable password. Returns whether the
    /// shell ended up in privileged exec.
    ///
    /// # Errors
    ///
    /// [`SessionError::EnablePasswordRequired`] when the device challenges
    /// and no enable password was configured. The session stays usable;
    /// supply a secret and retry.
    pub async fn enter_privileged_exec(&mut self) -> Result<bool> {
        match self.mode() {
            Some(Mode::PrivilegedExec) => Ok(true),
            Some(Mode::ConfigMode) => {
                debug!("leaving configuration mode");
                self.send_command_get_output("end").await?;
                Ok(self.is_privileged_exec())
            }
            _ => {
                debug!("escalating to privileged exec");
                let output = self.send_command_get_output("enable").await?;

                // If a prompt came straight back the device skipped the
                // challenge; otherwise it is sitting at a password prompt.
                if !output.iter().any(|line| line.contains(self.prompt())) {
                    let secret = match self.enable_password() {
                        Some(secret) => secret.expose_secret().to_owned(),
                        None => return Err(SessionError::EnablePasswordRequired.into()),
                    };
                    self.send_secret(&secret).await?;
                    self.get_output().await?;
                }
                Ok(self.is_privileged_exec())
            }
        }
    }

    /// Drive the shell into configuration mode, escalating to privileged
    /// exec first if needed.
    pub async fn enter_config_mode(&mut self) -> Result<bool> {
        self.enter_privileged_exec().await?;
        debug!("entering configuration mode");
        self.send_command_get_output("config t").await?;
        Ok(self.is_config_mode())
    }
}
