//! Command-line producer for the pinhook dispatcher.
//!
//! `pinhook-send` writes one envelope per message into the dispatcher's
//! inbound pipe and prints each acknowledgement as a JSON line. The pipe
//! directory comes from `--pipe-dir` or, failing that, from the shared
//! `pinhook` configuration layers.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use clap::error::ErrorKind;
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use pinhook_config::{Config, PipeEndpoint};
use pinhook_wire::{Envelope, WireError};

mod producer;

pub use producer::Producer;

/// Producer identifier used when `--id` is not given.
pub const DEFAULT_PRODUCER_ID: &str = "pinhook-send";

const PROGRAM: &str = "pinhook-send";

#[derive(Debug, Parser)]
#[command(
    name = "pinhook-send",
    version,
    about = "Send messages to a running pinhook dispatcher"
)]
struct Cli {
    /// Configuration file consulted when `--pipe-dir` is absent.
    #[arg(long = "config-path", value_name = "FILE")]
    config_path: Option<Utf8PathBuf>,
    /// Directory holding `pipe.in` and `pipe.out`.
    #[arg(long = "pipe-dir", value_name = "DIR")]
    pipe_dir: Option<Utf8PathBuf>,
    /// Value of `payload.id` in every envelope.
    #[arg(long, value_name = "ID", default_value = DEFAULT_PRODUCER_ID)]
    id: String,
    /// Stop the dispatcher once every message has been sent.
    #[arg(long)]
    exit: bool,
    /// Messages to send, one envelope each. Sending stops after the first
    /// message containing `exit`.
    #[arg(value_name = "MESSAGE", required_unless_present = "exit")]
    messages: Vec<String>,
}

/// Errors reported by the producer.
#[derive(Debug, Error)]
pub enum SendError {
    /// The shared configuration failed to load.
    #[error("failed to load configuration: {0}")]
    Configuration(Arc<OrthoError>),
    /// The current time could not be formatted.
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    /// A pipe could not be opened.
    #[error("failed to open '{path}': {source}")]
    Open {
        /// Pipe that failed to open.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing a frame failed.
    #[error("failed to write frame: {source}")]
    Write {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Reading an acknowledgement failed.
    #[error("failed to read acknowledgement: {source}")]
    Read {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The dispatcher closed its pipe before acknowledging.
    #[error("dispatcher closed the pipe before acknowledging")]
    Disconnected,
    /// The dispatcher replied with something other than an envelope.
    #[error("unexpected reply from dispatcher")]
    UnexpectedReply,
    /// A frame could not be encoded or an acknowledgement decoded.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// Printing an acknowledgement failed.
    #[error("failed to print acknowledgement: {source}")]
    Output {
        /// Underlying IO or serialisation error.
        #[source]
        source: io::Error,
    },
}

/// Runs the producer using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };
    match execute(&cli, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM}: {error}");
            ExitCode::FAILURE
        }
    }
}

fn report_usage<W, E>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    let rendered = error.render();
    if matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    ) {
        let _ = write!(stdout, "{rendered}");
        return ExitCode::SUCCESS;
    }
    let _ = write!(stderr, "{rendered}");
    ExitCode::FAILURE
}

fn execute<W: Write>(cli: &Cli, stdout: &mut W) -> Result<(), SendError> {
    let endpoint = resolve_endpoint(cli)?;
    let mut producer = Producer::connect(&endpoint)?;
    for message in &cli.messages {
        let envelope = Envelope::new(now_rfc3339()?, cli.id.as_str(), message.as_str());
        match producer.send(&envelope)? {
            Some(ack) => print_ack(stdout, &ack)?,
            // The dispatcher stops on this message and reads nothing more.
            None => return Ok(()),
        }
    }
    if cli.exit {
        producer.send_sentinel()?;
    }
    Ok(())
}

fn resolve_endpoint(cli: &Cli) -> Result<PipeEndpoint, SendError> {
    cli.pipe_dir.as_ref().map_or_else(
        || load_endpoint(cli.config_path.as_deref()),
        |dir| Ok(PipeEndpoint::new(dir.clone())),
    )
}

fn load_endpoint(config_path: Option<&Utf8Path>) -> Result<PipeEndpoint, SendError> {
    let mut args = vec![OsString::from(PROGRAM)];
    if let Some(path) = config_path {
        args.push(OsString::from("--config-path"));
        args.push(OsString::from(path.as_str()));
    }
    Config::load_from_iter(args)
        .map(|config| config.pipe_endpoint())
        .map_err(SendError::Configuration)
}

fn now_rfc3339() -> Result<String, SendError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}

fn print_ack<W: Write>(stdout: &mut W, ack: &Envelope) -> Result<(), SendError> {
    serde_json::to_writer(&mut *stdout, ack)
        .map_err(io::Error::from)
        .and_then(|()| writeln!(stdout))
        .and_then(|()| stdout.flush())
        .map_err(|source| SendError::Output { source })
}
