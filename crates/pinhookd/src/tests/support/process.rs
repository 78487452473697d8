//! Collaborators for driving the launch plans without signals or sysfs.

use std::sync::mpsc::{self, Receiver, Sender};

use pinhook_config::Config;

use crate::actions::VirtualClock;
use crate::process::launch::Hardware;
use crate::process::shutdown::{ShutdownCloser, ShutdownSignal};

use super::keys::RecordingKeystrokeEmitter;
use super::pins::RecordingPinDriver;

#[derive(Debug)]
enum Notice {
    Signal,
    Close,
}

/// Shutdown signal raised explicitly by a test.
pub struct ScriptedShutdownSignal {
    sender: Sender<Notice>,
    receiver: Receiver<Notice>,
}

/// Handle that delivers the scripted signal.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    sender: Sender<Notice>,
}

impl ShutdownTrigger {
    /// Delivers the signal; ignored once the listener has gone away.
    pub fn fire(&self) {
        self.sender.send(Notice::Signal).ok();
    }
}

impl ScriptedShutdownSignal {
    pub fn new() -> (Self, ShutdownTrigger) {
        let (sender, receiver) = mpsc::channel();
        let trigger = ShutdownTrigger {
            sender: sender.clone(),
        };
        (Self { sender, receiver }, trigger)
    }
}

impl ShutdownSignal for ScriptedShutdownSignal {
    fn wait(&mut self) -> bool {
        matches!(self.receiver.recv(), Ok(Notice::Signal))
    }

    fn closer(&self) -> ShutdownCloser {
        let sender = self.sender.clone();
        Box::new(move || {
            sender.send(Notice::Close).ok();
        })
    }
}

/// Recording adapters shared with the test that built them.
#[derive(Clone)]
pub struct TestHardware {
    pub driver: RecordingPinDriver,
    pub emitter: RecordingKeystrokeEmitter,
    pub clock: VirtualClock,
}

impl TestHardware {
    pub fn new() -> Self {
        Self {
            driver: RecordingPinDriver::default(),
            emitter: RecordingKeystrokeEmitter::default(),
            clock: VirtualClock::new(),
        }
    }
}

impl Hardware for TestHardware {
    type Pins = RecordingPinDriver;
    type Keys = RecordingKeystrokeEmitter;
    type Clock = VirtualClock;

    fn pins(&self, _config: &Config) -> Self::Pins {
        self.driver.clone()
    }

    fn keys(&self, _config: &Config) -> Self::Keys {
        self.emitter.clone()
    }

    fn clock(&self) -> Self::Clock {
        self.clock.clone()
    }
}
