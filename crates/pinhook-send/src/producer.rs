//! Producer side of the dispatcher's pipe pair.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};

use pinhook_config::PipeEndpoint;
use pinhook_wire::{EXIT_SENTINEL, Envelope, Inbound, MAX_FRAME_BYTES, decode_frame, encode_frame};

use crate::SendError;

/// Write end of `pipe.in` and read end of `pipe.out`.
#[derive(Debug)]
pub struct Producer {
    inbound: File,
    outbound: File,
}

impl Producer {
    /// Opens both pipes of `endpoint`.
    ///
    /// Opening `pipe.in` blocks until the dispatcher is waiting for a
    /// producer.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Open`] when either pipe cannot be opened, which
    /// usually means no dispatcher has created them yet.
    pub fn connect(endpoint: &PipeEndpoint) -> Result<Self, SendError> {
        let inbound_path = endpoint.inbound();
        let inbound = OpenOptions::new()
            .write(true)
            .open(&inbound_path)
            .map_err(|source| SendError::Open {
                path: inbound_path,
                source,
            })?;
        let outbound_path = endpoint.outbound();
        let outbound = File::open(&outbound_path).map_err(|source| SendError::Open {
            path: outbound_path,
            source,
        })?;
        Ok(Self { inbound, outbound })
    }

    /// Writes `envelope` and waits for its acknowledgement.
    ///
    /// Returns `None` without waiting when the message asks the dispatcher to
    /// exit, since no acknowledgement follows.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] when the frame cannot be encoded or written, or
    /// when the reply is missing or malformed.
    pub fn send(&mut self, envelope: &Envelope) -> Result<Option<Envelope>, SendError> {
        let frame = encode_frame(envelope)?;
        self.write_frame(&frame)?;
        if envelope.requests_exit() {
            return Ok(None);
        }
        self.receive_ack().map(Some)
    }

    /// Writes the bare exit sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Write`] when the pipe rejects the frame.
    pub fn send_sentinel(&mut self) -> Result<(), SendError> {
        self.write_frame(EXIT_SENTINEL.as_bytes())
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), SendError> {
        self.inbound
            .write_all(frame)
            .and_then(|()| self.inbound.flush())
            .map_err(|source| SendError::Write { source })
    }

    fn receive_ack(&mut self) -> Result<Envelope, SendError> {
        let mut buffer = [0_u8; MAX_FRAME_BYTES];
        loop {
            let read = match self.outbound.read(&mut buffer) {
                Ok(0) => return Err(SendError::Disconnected),
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(SendError::Read { source }),
            };
            match decode_frame(buffer.get(..read).unwrap_or_default())? {
                Inbound::Envelope(ack) => return Ok(ack),
                Inbound::Empty => {}
                Inbound::Sentinel => return Err(SendError::UnexpectedReply),
            }
        }
    }
}
