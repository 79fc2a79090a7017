//! Output synchronization for the interactive shell.
//!
//! The device gives no explicit end-of-message marker, so a response is
//! delimited by content alone: the echoed command up front and a trailing
//! prompt line at the end. Output can legitimately arrive in bursts
//! separated by small gaps (slow links, paged configuration dumps), so the
//! read loop runs an idle timeout that resets on every byte received rather
//! than one overall deadline.

use std::time::Duration;

use bytes::BytesMut;
use log::{trace, warn};
use memchr::memrchr;
use tokio::time::Instant;

use crate::error::Result;
use crate::transport::Channel;

/// Default per-read buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Default idle timeout for output collection.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Knobs for one output-collection cycle.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Bytes requested from the channel per read.
    pub buffer_size: usize,

    /// Idle timeout; resets whenever data arrives.
    pub idle_timeout: Duration,

    /// Sleep between polls while the channel has nothing ready.
    pub poll_interval: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            poll_interval: Duration::from_millis(25),
        }
    }
}

/// Lines collected for a single command.
#[derive(Debug)]
pub(crate) struct RawResponse {
    /// Echo line first, device output, new prompt line last (complete path).
    pub lines: Vec<String>,

    /// True when the idle clock expired before a prompt boundary was seen;
    /// `lines` then holds whatever had accumulated.
    pub timed_out: bool,
}

/// Gather one command's worth of output from the channel.
///
/// Terminates when the accumulator's last line starts with `hostname` and
/// ends with a prompt terminator, or when the idle timeout expires without
/// that happening. The timeout path returns the partial accumulation;
/// callers must treat short output as a signal, not an error.
pub(crate) async fn collect_response<C: Channel>(
    channel: &mut C,
    hostname: &str,
    opts: &SyncOptions,
) -> Result<RawResponse> {
    let mut buf = BytesMut::new();
    let mut idle_deadline = Instant::now() + opts.idle_timeout;

    loop {
        if channel.recv_ready() {
            let data = channel.recv_raw(opts.buffer_size).await?;
            if !data.is_empty() {
                buf.extend_from_slice(&data);
                idle_deadline = Instant::now() + opts.idle_timeout;
                trace!("collected {} bytes ({} buffered)", data.len(), buf.len());
            }
        } else {
            tokio::time::sleep(opts.poll_interval).await;
        }

        if ends_at_prompt(&buf, hostname) {
            return Ok(RawResponse {
                lines: split_lines(&buf),
                timed_out: false,
            });
        }

        if Instant::now() >= idle_deadline {
            warn!(
                "idle timeout ({:?}) expired without a prompt boundary, returning {} bytes of partial output",
                opts.idle_timeout,
                buf.len()
            );
            return Ok(RawResponse {
                lines: split_lines(&buf),
                timed_out: true,
            });
        }
    }
}

/// Whether the accumulator's trailing line looks like a prompt: it starts
/// with the known hostname (an unlearned hostname is the empty string, which
/// matches any line) and ends in `>` or `#`.
fn ends_at_prompt(buf: &[u8], hostname: &str) -> bool {
    let line = last_line(buf);
    if line.is_empty() {
        return false;
    }
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end_matches('\r');
    text.starts_with(hostname) && (text.ends_with('>') || text.ends_with('#'))
}

fn last_line(buf: &[u8]) -> &[u8] {
    match memrchr(b'\n', buf) {
        Some(pos) => &buf[pos + 1..],
        None => buf,
    }
}

fn split_lines(buf: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(buf)
        .lines()
        .map(str::to_owned)
        .collect()
}
