//! Keystroke emitter test doubles.

use std::io;
use std::sync::{Arc, Mutex};

use mockall::mock;

use crate::hardware::{KeystrokeEmitter, KeystrokeError};

mock! {
    pub KeystrokeEmitter {}
    impl KeystrokeEmitter for KeystrokeEmitter {
        fn emit(&mut self, keystroke: &str) -> Result<(), KeystrokeError>;
    }
}

/// Cloneable emitter that records keystrokes instead of typing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingKeystrokeEmitter {
    emitted: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl RecordingKeystrokeEmitter {
    pub fn emitted(&self) -> Vec<String> {
        self.emitted.lock().expect("emitter mutex poisoned").clone()
    }

    pub fn fail_on(&self, keystroke: &str) {
        self.failing
            .lock()
            .expect("emitter mutex poisoned")
            .push(keystroke.to_owned());
    }
}

impl KeystrokeEmitter for RecordingKeystrokeEmitter {
    fn emit(&mut self, keystroke: &str) -> Result<(), KeystrokeError> {
        let failing = self
            .failing
            .lock()
            .expect("emitter mutex poisoned")
            .iter()
            .any(|candidate| candidate == keystroke);
        if failing {
            return Err(KeystrokeError::Spawn {
                program: String::from("fake-keys"),
                keystroke: keystroke.to_owned(),
                source: io::Error::other("injected failure"),
            });
        }
        self.emitted
            .lock()
            .expect("emitter mutex poisoned")
            .push(keystroke.to_owned());
        Ok(())
    }
}
