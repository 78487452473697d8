//! FIFO-backed implementation of [`ChannelTransport`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;

use camino::Utf8Path;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tracing::{debug, info};

use pinhook_config::PipeEndpoint;
use pinhook_wire::{Inbound, MAX_FRAME_BYTES, decode_frame};

use super::{ChannelError, ChannelTransport, TRANSPORT_TARGET};

/// Dispatcher side of the `pipe.in`/`pipe.out` pair.
#[derive(Debug)]
pub struct NamedPipeChannel {
    endpoint: PipeEndpoint,
    inbound: File,
    outbound: File,
}

impl NamedPipeChannel {
    /// Recreates both FIFOs and opens them.
    ///
    /// The outbound FIFO is opened read-write so the call never blocks on it
    /// and acknowledgements stay buffered until a producer reads them. The
    /// inbound FIFO is opened read-only, which blocks until a producer opens
    /// it for writing.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Unavailable`] when a FIFO cannot be removed,
    /// created or opened.
    pub fn open(endpoint: &PipeEndpoint) -> Result<Self, ChannelError> {
        let inbound_path = endpoint.inbound();
        let outbound_path = endpoint.outbound();
        recreate_fifo(&inbound_path)?;
        recreate_fifo(&outbound_path)?;

        let outbound = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .custom_flags(OFlag::O_SYNC.bits())
            .open(&outbound_path)
            .map_err(|source| unavailable(&outbound_path, source))?;

        debug!(
            target: TRANSPORT_TARGET,
            path = %inbound_path,
            "waiting for a producer"
        );
        let inbound = OpenOptions::new()
            .read(true)
            .open(&inbound_path)
            .map_err(|source| unavailable(&inbound_path, source))?;

        info!(
            target: TRANSPORT_TARGET,
            endpoint = %endpoint,
            "channel open"
        );
        Ok(Self {
            endpoint: endpoint.clone(),
            inbound,
            outbound,
        })
    }
}

impl ChannelTransport for NamedPipeChannel {
    fn receive(&mut self) -> Result<Inbound, ChannelError> {
        let mut buffer = [0_u8; MAX_FRAME_BYTES];
        let read = read_chunk_with_retry(&mut self.inbound, &mut buffer)
            .map_err(|source| ChannelError::Read { source })?;
        let frame = buffer.get(..read).unwrap_or_default();
        decode_frame(frame).map_err(|source| ChannelError::MalformedEnvelope { source })
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        if frame.len() > MAX_FRAME_BYTES {
            return Err(ChannelError::FrameTooLarge {
                size: frame.len(),
                max_size: MAX_FRAME_BYTES,
            });
        }
        self.outbound
            .write_all(frame)
            .and_then(|()| self.outbound.flush())
            .map_err(|source| ChannelError::Write { source })
    }

    fn close(self) {
        let Self { endpoint, .. } = self;
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %endpoint,
            "channel closed"
        );
    }
}

/// Unblocks a dispatcher parked on the inbound FIFO.
///
/// Opens the write end without blocking, writes a blank frame and closes it
/// again. A reader blocked in `open` or `read` returns and sees an empty
/// frame.
///
/// # Errors
///
/// Returns the IO error from opening or writing the FIFO; `ENXIO` means no
/// reader is attached.
pub fn wake_reader(endpoint: &PipeEndpoint) -> io::Result<()> {
    let mut pipe = OpenOptions::new()
        .write(true)
        .custom_flags(OFlag::O_NONBLOCK.bits())
        .open(endpoint.inbound())?;
    pipe.write_all(b"\n")
}

fn recreate_fifo(path: &Utf8Path) -> Result<(), ChannelError> {
    match fs::remove_file(path) {
        Ok(()) => debug!(target: TRANSPORT_TARGET, path = %path, "removed stale pipe"),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(unavailable(path, source)),
    }
    mkfifo(path.as_std_path(), Mode::S_IRUSR | Mode::S_IWUSR)
        .map_err(|errno| unavailable(path, io::Error::from(errno)))
}

fn unavailable(path: &Utf8Path, source: io::Error) -> ChannelError {
    ChannelError::Unavailable {
        path: path.to_path_buf(),
        source,
    }
}

fn read_chunk_with_retry(pipe: &mut File, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match pipe.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}
