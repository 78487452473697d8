//! Two-way named pipe transport between producers and the dispatcher.
//!
//! The dispatcher reads frames from `pipe.in` and writes acknowledgements to
//! `pipe.out`. Each read yields at most one frame of up to
//! [`pinhook_wire::MAX_FRAME_BYTES`] bytes; framing relies on producers
//! writing one message per `write` call and waiting for the acknowledgement.

mod errors;
mod fifo;
#[cfg(test)]
mod test_utils;

use serde::Serialize;

use pinhook_wire::{Inbound, encode_frame};

pub use self::errors::ChannelError;
pub use self::fifo::{NamedPipeChannel, wake_reader};
#[cfg(test)]
pub(crate) use self::test_utils::{ChannelActivity, ScriptedChannel};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Bidirectional frame channel used by the dispatch loop.
pub trait ChannelTransport {
    /// Blocks until one inbound frame is available and classifies it.
    fn receive(&mut self) -> Result<Inbound, ChannelError>;

    /// Writes one already encoded frame.
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError>;

    /// Encodes `value` as JSON and writes it as one frame.
    fn send<T>(&mut self, value: &T) -> Result<(), ChannelError>
    where
        T: Serialize + ?Sized,
        Self: Sized,
    {
        let frame = encode_frame(value).map_err(ChannelError::from_encode)?;
        self.send_frame(&frame)
    }

    /// Releases both ends of the channel.
    fn close(self)
    where
        Self: Sized;
}
