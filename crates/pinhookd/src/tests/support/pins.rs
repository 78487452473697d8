//! Pin driver test doubles.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use camino::Utf8PathBuf;
use mockall::mock;
use pinhook_rules::PinId;

use crate::hardware::{Direction, Level, PinDriver, PinError};
use crate::process::ShutdownFlag;

use super::process::ShutdownTrigger;

mock! {
    pub PinDriver {}
    impl PinDriver for PinDriver {
        fn configure(&mut self, pin: PinId, direction: Direction) -> Result<(), PinError>;
        fn write(&mut self, pin: PinId, level: Level) -> Result<(), PinError>;
        fn read(&mut self, pin: PinId) -> Result<Level, PinError>;
        fn release_all(&mut self) -> Result<(), PinError>;
    }
}

/// One call observed by [`RecordingPinDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCall {
    Configure(PinId, Direction),
    Write(PinId, Level),
    Read(PinId),
    ReleaseAll,
}

#[derive(Debug, Default)]
struct PinState {
    calls: Vec<PinCall>,
    inputs: HashMap<PinId, VecDeque<Level>>,
    failing_reads: HashSet<PinId>,
    failing_writes: HashSet<PinId>,
    stop_when_exhausted: Option<ShutdownFlag>,
    fire_when_exhausted: Option<ShutdownTrigger>,
}

/// Shared, cloneable pin driver that records every call.
///
/// Input pins replay scripted levels and read low once their script is used
/// up; an attached [`ShutdownFlag`] is raised, or a [`ShutdownTrigger`]
/// fired once, at that point so poll loops terminate deterministically.
#[derive(Debug, Clone, Default)]
pub struct RecordingPinDriver {
    state: Arc<Mutex<PinState>>,
}

fn injected_failure(pin: PinId, operation: &'static str) -> PinError {
    PinError::Io {
        pin,
        operation,
        path: Utf8PathBuf::from(format!("/fake/gpio{pin}/value")),
        source: io::Error::other("injected failure"),
    }
}

impl RecordingPinDriver {
    fn state(&self) -> MutexGuard<'_, PinState> {
        self.state.lock().expect("pin driver mutex poisoned")
    }

    pub fn script_input(&self, pin: PinId, levels: &[Level]) {
        self.state()
            .inputs
            .entry(pin)
            .or_default()
            .extend(levels.iter().copied());
    }

    pub fn stop_when_exhausted(&self, flag: ShutdownFlag) {
        self.state().stop_when_exhausted = Some(flag);
    }

    pub fn fire_when_exhausted(&self, trigger: ShutdownTrigger) {
        self.state().fire_when_exhausted = Some(trigger);
    }

    pub fn fail_reads(&self, pin: PinId) {
        self.state().failing_reads.insert(pin);
    }

    pub fn fail_writes(&self, pin: PinId) {
        self.state().failing_writes.insert(pin);
    }

    pub fn calls(&self) -> Vec<PinCall> {
        self.state().calls.clone()
    }

    pub fn writes(&self) -> Vec<(PinId, Level)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PinCall::Write(pin, level) => Some((pin, level)),
                _ => None,
            })
            .collect()
    }

    pub fn configured(&self) -> Vec<(PinId, Direction)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PinCall::Configure(pin, direction) => Some((pin, direction)),
                _ => None,
            })
            .collect()
    }

    pub fn release_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, PinCall::ReleaseAll))
            .count()
    }
}

impl PinDriver for RecordingPinDriver {
    fn configure(&mut self, pin: PinId, direction: Direction) -> Result<(), PinError> {
        self.state().calls.push(PinCall::Configure(pin, direction));
        Ok(())
    }

    fn write(&mut self, pin: PinId, level: Level) -> Result<(), PinError> {
        let mut state = self.state();
        state.calls.push(PinCall::Write(pin, level));
        if state.failing_writes.contains(&pin) {
            return Err(injected_failure(pin, "write"));
        }
        Ok(())
    }

    fn read(&mut self, pin: PinId) -> Result<Level, PinError> {
        let mut state = self.state();
        state.calls.push(PinCall::Read(pin));
        if state.failing_reads.contains(&pin) {
            return Err(injected_failure(pin, "read"));
        }
        let next = state.inputs.get_mut(&pin).and_then(VecDeque::pop_front);
        let exhausted = state.inputs.values().all(VecDeque::is_empty);
        if exhausted {
            if let Some(flag) = &state.stop_when_exhausted {
                flag.trigger();
            }
            if let Some(trigger) = state.fire_when_exhausted.take() {
                trigger.fire();
            }
        }
        Ok(next.unwrap_or(Level::Low))
    }

    fn release_all(&mut self) -> Result<(), PinError> {
        self.state().calls.push(PinCall::ReleaseAll);
        Ok(())
    }
}
