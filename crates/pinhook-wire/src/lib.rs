//! Wire types exchanged over the pinhook named pipes.
//!
//! A producer writes one JSON [`Envelope`] per frame into the dispatcher's
//! inbound pipe; the dispatcher echoes the same document back on the outbound
//! pipe once every matched action has run. Frames are at most
//! [`MAX_FRAME_BYTES`] long. The reserved word [`EXIT_SENTINEL`] terminates
//! the dispatcher, either as a bare frame or inside `payload.message`.

mod envelope;
mod frame;

pub use envelope::{Envelope, Payload};
pub use frame::{EXIT_SENTINEL, Inbound, MAX_FRAME_BYTES, WireError, decode_frame, encode_frame};
