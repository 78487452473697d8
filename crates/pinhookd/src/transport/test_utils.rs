//! In-memory channel used by dispatch tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pinhook_wire::{Inbound, decode_frame};

use super::{ChannelError, ChannelTransport};

/// Shared view of what a [`ScriptedChannel`] did.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChannelActivity {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: Arc<AtomicUsize>,
    received: Arc<AtomicUsize>,
}

impl ChannelActivity {
    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().expect("sent frames mutex poisoned").clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn receive_count(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }
}

/// Channel that replays scripted frames and records outbound ones.
///
/// Once the script runs out, `receive` fails with a read error so a loop
/// that never terminates shows up as a test failure rather than a hang.
#[derive(Debug)]
pub(crate) struct ScriptedChannel {
    script: VecDeque<Result<Inbound, ChannelError>>,
    activity: ChannelActivity,
    fail_writes: bool,
}

impl ScriptedChannel {
    pub(crate) fn new() -> Self {
        Self {
            script: VecDeque::new(),
            activity: ChannelActivity::default(),
            fail_writes: false,
        }
    }

    /// Queues a raw frame, decoded the way the FIFO transport decodes it.
    pub(crate) fn push_frame(&mut self, frame: &[u8]) {
        let decoded =
            decode_frame(frame).map_err(|source| ChannelError::MalformedEnvelope { source });
        self.script.push_back(decoded);
    }

    pub(crate) fn push_error(&mut self, error: ChannelError) {
        self.script.push_back(Err(error));
    }

    pub(crate) fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    pub(crate) fn activity(&self) -> ChannelActivity {
        self.activity.clone()
    }
}

impl ChannelTransport for ScriptedChannel {
    fn receive(&mut self) -> Result<Inbound, ChannelError> {
        self.activity.received.fetch_add(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or_else(|| {
            Err(ChannelError::Read {
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"),
            })
        })
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        if self.fail_writes {
            return Err(ChannelError::Write {
                source: io::Error::new(io::ErrorKind::BrokenPipe, "no reader"),
            });
        }
        self.activity
            .sent
            .lock()
            .expect("sent frames mutex poisoned")
            .push(frame.to_vec());
        Ok(())
    }

    fn close(self) {
        self.activity.closed.fetch_add(1, Ordering::SeqCst);
    }
}
