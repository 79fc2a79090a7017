//! Test doubles for driving a session from canned byte sequences.

use std::collections::VecDeque;

use crate::error::Result;
use crate::transport::Channel;

/// Replays one canned response per command sent.
///
/// Responses queue up in order and become readable when the matching
/// command goes out, mimicking the half-duplex request/response rhythm of a
/// real device. Bytes can also be staged as immediately readable (login
/// banners) or held back for a number of empty polls (slow links).
pub(crate) struct ReplayChannel {
    /// One response per future send, oldest first.
    responses: VecDeque<Vec<u8>>,

    /// Bytes readable right now.
    readable: VecDeque<u8>,

    /// Bytes released only after N polls report nothing ready.
    delayed: VecDeque<(usize, Vec<u8>)>,

    /// Raw writes, in order.
    pub sent: Vec<Vec<u8>>,
}

impl ReplayChannel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self {
            responses: responses
                .into_iter()
                .map(|r| r.as_ref().to_vec())
                .collect(),
            readable: VecDeque::new(),
            delayed: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Stage bytes as immediately readable without a command being sent.
    pub fn push_readable(&mut self, data: &[u8]) {
        self.readable.extend(data.iter().copied());
    }

    /// Stage bytes that only become readable after `polls` empty
    /// `recv_ready` checks, simulating a gap in device output.
    pub fn queue_delayed(&mut self, data: &[u8], polls: usize) {
        self.delayed.push_back((polls, data.to_vec()));
    }

    /// Everything sent so far as text, terminators included.
    pub fn sent_text(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }
}

impl Channel for ReplayChannel {
    async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        self.sent.push(data.to_vec());
        if let Some(response) = self.responses.pop_front() {
            self.readable.extend(response);
        }
        Ok(())
    }

    fn recv_ready(&mut self) -> bool {
        if self.readable.is_empty() {
            if let Some((remaining, _)) = self.delayed.front_mut() {
                if *remaining == 0 {
                    let (_, data) = self.delayed.pop_front().expect("front checked above");
                    self.readable.extend(data);
                } else {
                    *remaining -= 1;
                }
            }
        }
        !self.readable.is_empty()
    }

    async fn recv_raw(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
        let n = max_bytes.min(self.readable.len());
        Ok(self.readable.drain(..n).collect())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
