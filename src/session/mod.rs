//! Interactive device session.
//!
//! [`Session`] is the facade over the byte channel, the output synchronizer
//! and mode navigation. One session maps to one live connection; the
//! protocol is strictly half-duplex, so a session is driven by exactly one
//! task and needs no internal locking.

mod builder;
mod mode;
pub(crate) mod sync;

pub use builder::SessionBuilder;
pub use mode::Mode;
pub use sync::{DEFAULT_BUFFER_SIZE, DEFAULT_IDLE_TIMEOUT, SyncOptions};

use std::time::Duration;

use log::debug;
use secrecy::SecretString;

use crate::error::Result;
use crate::transport::Channel;
use sync::collect_response;

/// Default line terminator appended to every command.
pub const DEFAULT_COMMAND_END: &str = "\n";

/// One live interactive session with a device.
///
/// The session tracks the latest prompt the device printed; that prompt is
/// the single source of truth for the shell's privilege mode and for the
/// output synchronizer's boundary detection. Commands are counted as they
/// are sent and their responses collected in order by [`get_output`].
///
/// [`get_output`]: Session::get_output
pub struct Session<C: Channel> {
    channel: C,

    /// Learned from the first prompt: the prompt minus its terminator.
    hostname: String,

    /// The trailing prompt line of the most recent response.
    prompt: String,

    enable_password: Option<SecretString>,

    /// Last pagination values actually sent, to skip redundant round trips.
    pagination_length: Option<u32>,
    pagination_width: Option<u32>,

    /// Commands sent since the last output collection.
    pending_commands: usize,

    /// Every command ever sent on this session, in order.
    command_log: Vec<String>,

    /// Whether the most recent collection hit the idle timeout.
    last_output_timed_out: bool,

    sync: SyncOptions,
}

impl<C: Channel> Session<C> {
    /// Wrap an open shell channel, consume the login banner and learn the
    /// device's prompt and hostname.
    pub async fn open(channel: C, enable_password: Option<SecretString>) -> Result<Self> {
        let mut session = Self {
            channel,
            hostname: String::new(),
            prompt: String::new(),
            enable_password,
            pagination_length: None,
            pagination_width: None,
            pending_commands: 0,
            command_log: Vec::new(),
            last_output_timed_out: false,
            sync: SyncOptions::default(),
        };

        // The device pushes a banner and its first prompt unprompted; soak
        // that up before issuing anything.
        let banner = collect_response(&mut session.channel, "", &session.sync).await?;
        session.update_prompt(&banner.lines);

        // A bare return gives a clean prompt line to learn the hostname from.
        session.send_command("").await?;
        session.get_output().await?;
        session.hostname = session
            .prompt
            .strip_suffix(['>', '#'])
            .unwrap_or(&session.prompt)
            .to_string();

        debug!(
            "session open, hostname {:?}, prompt {:?}",
            session.hostname, session.prompt
        );
        Ok(session)
    }

    /// Send a command terminated by a newline. No output is read; pair with
    /// [`get_output`](Session::get_output), or use
    /// [`send_command_get_output`](Session::send_command_get_output).
    pub async fn send_command(&mut self, command: &str) -> Result<()> {
        self.send_command_with_end(command, DEFAULT_COMMAND_END).await
    }

    /// Send a command with a custom terminator (`"\r"`, or `" ?"` for
    /// completion listings).
    pub async fn send_command_with_end(&mut self, command: &str, end: &str) -> Result<()> {
        debug!("sending command {:?}", command);
        self.write_command(command, end).await
    }

    /// Send the enable secret. Logged masked, but recorded in the command
    /// log like any other command.
    pub(crate) async fn send_secret(&mut self, secret: &str) -> Result<()> {
        debug!("sending command <hidden>");
        self.write_command(secret, DEFAULT_COMMAND_END).await
    }

    async fn write_command(&mut self, command: &str, end: &str) -> Result<()> {
        let mut wire = Vec::with_capacity(command.len() + end.len());
        wire.extend_from_slice(command.as_bytes());
        wire.extend_from_slice(end.as_bytes());
        self.channel.send_raw(&wire).await?;
        self.command_log.push(command.to_string());
        self.pending_commands += 1;
        Ok(())
    }

    /// Collect the output of every command sent since the last collection,
    /// one response per command, concatenated in order. Each response is
    /// the command echo first, device output, and the new prompt line last.
    /// Returns an empty list when no command is outstanding.
    pub async fn get_output(&mut self) -> Result<Vec<String>> {
        let opts = self.sync.clone();
        self.collect_pending(&opts).await
    }

    /// As [`get_output`](Session::get_output) with an explicit per-read
    /// buffer size and idle timeout.
    pub async fn get_output_with(
        &mut self,
        buffer_size: usize,
        idle_timeout: Duration,
    ) -> Result<Vec<String>> {
        let opts = SyncOptions {
            buffer_size,
            idle_timeout,
            poll_interval: self.sync.poll_interval,
        };
        self.collect_pending(&opts).await
    }

    async fn collect_pending(&mut self, opts: &SyncOptions) -> Result<Vec<String>> {
        let mut all_lines = Vec::new();
        if self.pending_commands == 0 {
            debug!("get_output called with no command outstanding");
            return Ok(all_lines);
        }

        let mut timed_out = false;
        for _ in 0..self.pending_commands {
            let response = collect_response(&mut self.channel, &self.hostname, opts).await?;
            timed_out |= response.timed_out;
            all_lines.extend(response.lines);
        }
        self.pending_commands = 0;
        self.last_output_timed_out = timed_out;
        self.update_prompt(&all_lines);
        Ok(all_lines)
    }

    /// Send one command and return its response with the leading echo line
    /// stripped; the trailing line is the new prompt.
    pub async fn send_command_get_output(&mut self, command: &str) -> Result<Vec<String>> {
        self.send_command(command).await?;
        let mut lines = self.get_output().await?;
        if !lines.is_empty() {
            lines.remove(0);
        }
        Ok(lines)
    }

    /// Ask the device for context-sensitive completions: sends
    /// `prefix + " ?"`, then erases the partial command the device
    /// re-echoes on the next prompt line. Exactly two commands go over the
    /// wire per call; the second is `prefix.len() + 1` backspaces.
    pub async fn send_question_get_output(&mut self, command: &str) -> Result<Vec<String>> {
        let command = command.trim_end().trim_end_matches('?').trim_end();

        self.send_command_with_end(command, " ?").await?;
        let mut output = self.get_output().await?;
        if !output.is_empty() {
            output.remove(0);
        }

        // The '?' is not part of the re-echoed text but the space is.
        let backspaces = "\u{8}".repeat(command.len() + 1);
        self.send_command_get_output(&backspaces).await?;

        Ok(output)
    }

    /// Set the device's pagination length (`0` disables paging), skipping
    /// the round trip when that value is already in effect.
    pub async fn set_terminal_length(&mut self, n: u32) -> Result<Vec<String>> {
        let command = format!("terminal length {n}");
        self.set_pagination_length_with(&command, n).await
    }

    /// Set the device's terminal width, skipping the round trip when that
    /// value is already in effect.
    pub async fn set_terminal_width(&mut self, n: u32) -> Result<Vec<String>> {
        let command = format!("terminal width {n}");
        self.set_pagination_width_with(&command, n).await
    }

    pub(crate) async fn set_pagination_length_with(
        &mut self,
        command: &str,
        n: u32,
    ) -> Result<Vec<String>> {
        if self.pagination_length == Some(n) {
            return Ok(Vec::new());
        }
        let output = self.send_command_get_output(command).await?;
        self.pagination_length = Some(n);
        Ok(output)
    }

    pub(crate) async fn set_pagination_width_with(
        &mut self,
        command: &str,
        n: u32,
    ) -> Result<Vec<String>> {
        if self.pagination_width == Some(n) {
            return Ok(Vec::new());
        }
        let output = self.send_command_get_output(command).await?;
        self.pagination_width = Some(n);
        Ok(output)
    }

    /// Update the stored prompt from a response's trailing line. When the
    /// device re-echoes typed characters after the prompt (the question-mark
    /// helper causes this) the prompt is cut at the first terminator; a
    /// trailing line with no terminator leaves the prompt unchanged.
    fn update_prompt(&mut self, lines: &[String]) {
        let Some(last) = lines.last() else { return };
        if last.ends_with('>') || last.ends_with('#') {
            self.prompt = last.clone();
        } else if let Some(pos) = last.find(['>', '#']) {
            self.prompt = last[..=pos].to_string();
        }
    }

    /// The latest prompt the device printed.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The device hostname, learned from the first prompt.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Every command sent on this session, oldest first.
    pub fn command_log(&self) -> &[String] {
        &self.command_log
    }

    /// Whether the most recent output collection gave up at the idle
    /// timeout. Partial output is returned rather than raised, so this is
    /// the place to look when a response seems short or garbled.
    pub fn last_output_timed_out(&self) -> bool {
        self.last_output_timed_out
    }

    /// The current privilege mode, or `None` if the prompt is not
    /// recognizable as any mode.
    pub fn mode(&self) -> Option<Mode> {
        Mode::classify(&self.prompt)
    }

    /// Whether the shell is in unprivileged user exec mode.
    pub fn is_user_exec(&self) -> bool {
        self.mode() == Some(Mode::UserExec)
    }

    /// Whether the shell is in privileged exec mode.
    pub fn is_privileged_exec(&self) -> bool {
        self.mode() == Some(Mode::PrivilegedExec)
    }

    /// Whether the shell is in configuration mode.
    pub fn is_config_mode(&self) -> bool {
        self.mode() == Some(Mode::ConfigMode)
    }

    /// Configure the enable secret used for privilege escalation.
    pub fn set_enable_password(&mut self, secret: SecretString) {
        self.enable_password = Some(secret);
    }

    pub(crate) fn enable_password(&self) -> Option<&SecretString> {
        self.enable_password.as_ref()
    }

    pub(crate) fn pagination_length(&self) -> Option<u32> {
        self.pagination_length
    }

    /// Override the synchronizer defaults for every subsequent collection.
    pub fn set_sync_options(&mut self, sync: SyncOptions) {
        self.sync = sync;
    }

    /// Close the connection. The protocol is half-duplex, so there is
    /// nothing to flush.
    pub async fn close(mut self) -> Result<()> {
        debug!("closing session to {:?}", self.hostname);
        self.channel.close().await
    }

    #[cfg(test)]
    pub(crate) fn channel(&self) -> &C {
        &self.channel
    }

    #[cfg(test)]
    pub(crate) fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    #[cfg(test)]
    pub(crate) fn for_testing(
        channel: C,
        hostname: &str,
        prompt: &str,
        enable_password: Option<&str>,
    ) -> Self {
        Self {
            channel,
            hostname: hostname.to_string(),
            prompt: prompt.to_string(),
            enable_password: enable_password.map(|s| SecretString::from(s.to_owned())),
            pagination_length: None,
            pagination_width: None,
            pending_commands: 0,
            command_log: Vec::new(),
            last_output_timed_out: false,
            sync: SyncOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ReplayChannel;

    fn session_at(prompt: &str, responses: Vec<&[u8]>) -> Session<ReplayChannel> {
        Session::for_testing(ReplayChannel::new(responses), "hostname", prompt, None)
    }

    #[tokio::test]
    async fn test_round_trip_strips_echo_and_updates_prompt() {
        let mut session = session_at(
            "hostname>",
            vec![&b"show version\nline1\nline2\nhostname#"[..]],
        );

        let output = session.send_command_get_output("show version").await.unwrap();

        assert_eq!(output, vec!["line1", "line2", "hostname#"]);
        assert_eq!(session.prompt(), "hostname#");
    }

    #[tokio::test]
    async fn test_get_output_keeps_echo_and_prompt() {
        let mut session = session_at("hostname#", vec![&b"show clock\n12:00:00\nhostname#"[..]]);

        session.send_command("show clock").await.unwrap();
        let output = session.get_output().await.unwrap();

        assert_eq!(output, vec!["show clock", "12:00:00", "hostname#"]);
    }

    #[tokio::test]
    async fn test_get_output_without_outstanding_command_is_empty() {
        let mut session = session_at("hostname#", vec![&b"leftover\nhostname#"[..]]);

        let output = session.get_output().await.unwrap();

        assert!(output.is_empty());
        assert!(session.channel().sent_text().is_empty());
    }

    #[tokio::test]
    async fn test_collects_one_response_per_outstanding_command() {
        // The echo of the second command glues onto the first prompt line,
        // exactly as a real terminal stream does; byte-sized reads let the
        // collector stop at each boundary.
        let mut session = session_at("hostname#", vec![]);
        session
            .channel_mut()
            .push_readable(b"show clock\n12:00:00\nhostname#show users\nnobody\nhostname#");

        session.send_command("show clock").await.unwrap();
        session.send_command("show users").await.unwrap();
        let output = session
            .get_output_with(1, DEFAULT_IDLE_TIMEOUT)
            .await
            .unwrap();

        assert_eq!(
            output,
            vec![
                "show clock",
                "12:00:00",
                "hostname#",
                "show users",
                "nobody",
                "hostname#"
            ]
        );
        assert_eq!(session.command_log(), ["show clock", "show users"]);
    }

    #[tokio::test]
    async fn test_pagination_is_memoized() {
        let mut session = session_at(
            "hostname#",
            vec![
                &b"terminal length 0\nhostname#"[..],
                &b"terminal length 24\nhostname#"[..],
            ],
        );

        session.set_terminal_length(0).await.unwrap();
        session.set_terminal_length(0).await.unwrap();

        assert_eq!(session.channel().sent_text(), vec!["terminal length 0\n"]);

        // A different value goes out on the wire again
        session.set_terminal_length(24).await.unwrap();
        assert_eq!(
            session.channel().sent_text(),
            vec!["terminal length 0\n", "terminal length 24\n"]
        );
    }

    #[tokio::test]
    async fn test_terminal_width_memoized_independently() {
        let mut session = session_at(
            "hostname#",
            vec![
                &b"terminal width 200\nhostname#"[..],
                &b"terminal length 200\nhostname#"[..],
            ],
        );

        session.set_terminal_width(200).await.unwrap();
        session.set_terminal_width(200).await.unwrap();
        session.set_terminal_length(200).await.unwrap();

        assert_eq!(
            session.channel().sent_text(),
            vec!["terminal width 200\n", "terminal length 200\n"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_question_helper_sends_two_commands() {
        // The completion listing ends with the partial command re-echoed
        // after the prompt, so the first collection takes the idle path.
        let mut session = session_at(
            "hostname>",
            vec![
                &b"show run ?\n  running-config  Current operating configuration\nhostname> show run "[..],
                &b"\nhostname>"[..],
            ],
        );

        let output = session.send_question_get_output("show run").await.unwrap();

        let sent = session.channel().sent_text();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], "show run ?");
        assert_eq!(sent[1], format!("{}\n", "\u{8}".repeat(9)));
        assert_eq!(
            output,
            vec![
                "  running-config  Current operating configuration",
                "hostname> show run "
            ]
        );
        assert_eq!(session.prompt(), "hostname>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_question_helper_strips_trailing_question_mark() {
        let mut session = session_at(
            "hostname>",
            vec![&b"show run ?\ncompletions\nhostname> show run "[..], &b"\nhostname>"[..]],
        );

        session.send_question_get_output("show run?").await.unwrap();

        let sent = session.channel().sent_text();
        assert_eq!(sent[0], "show run ?");
        assert_eq!(sent[1], format!("{}\n", "\u{8}".repeat(9)));
    }

    #[tokio::test]
    async fn test_open_learns_hostname_from_first_prompt() {
        let mut channel = ReplayChannel::new(vec![&b"\nswitch01>"[..]]);
        channel.push_readable(b"Welcome to switch01\nUser Access Verification\nswitch01>");

        let session = Session::open(channel, None).await.unwrap();

        assert_eq!(session.hostname(), "switch01");
        assert_eq!(session.prompt(), "switch01>");
        assert!(session.is_user_exec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_soft_timeout_is_observable_and_resets() {
        let mut session = session_at(
            "hostname#",
            vec![&b"show tech\npartial"[..], &b"show clock\n12:00:00\nhostname#"[..]],
        );

        let output = session.send_command_get_output("show tech").await.unwrap();
        assert_eq!(output, vec!["partial"]);
        assert!(session.last_output_timed_out());

        session.send_command_get_output("show clock").await.unwrap();
        assert!(!session.last_output_timed_out());
    }

    #[tokio::test]
    async fn test_command_log_keeps_history_across_collections() {
        let mut session = session_at(
            "hostname#",
            vec![&b"a\nhostname#"[..], &b"b\nhostname#"[..]],
        );

        session.send_command_get_output("a").await.unwrap();
        session.send_command_get_output("b").await.unwrap();

        assert_eq!(session.command_log(), ["a", "b"]);
    }
}
