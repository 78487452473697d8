//! Pin driver over the kernel's sysfs GPIO interface.

use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use pinhook_rules::PinId;
use tracing::{debug, info};

use super::HARDWARE_TARGET;
use super::pins::{Direction, Level, PinDriver, PinError};

/// Drives pins through `<root>/export`, `gpioN/direction`, `gpioN/value` and
/// `<root>/unexport`.
#[derive(Debug)]
pub struct SysfsPinDriver {
    root: Utf8PathBuf,
    configured: BTreeMap<PinId, Direction>,
}

impl SysfsPinDriver {
    /// Builds a driver rooted at `root`, normally `/sys/class/gpio`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            configured: BTreeMap::new(),
        }
    }

    /// Pins configured so far, with their direction.
    #[must_use]
    pub fn configured(&self) -> &BTreeMap<PinId, Direction> {
        &self.configured
    }

    fn pin_dir(&self, pin: PinId) -> Utf8PathBuf {
        self.root.join(format!("gpio{pin}"))
    }

    fn value_path(&self, pin: PinId) -> Utf8PathBuf {
        self.pin_dir(pin).join("value")
    }

    fn check(&self, pin: PinId, expected: Option<Direction>) -> Result<(), PinError> {
        match (self.configured.get(&pin), expected) {
            (None, _) => Err(PinError::Unconfigured { pin }),
            (Some(&configured), Some(wanted)) if configured != wanted => {
                Err(PinError::WrongDirection { pin, configured })
            }
            (Some(_), _) => Ok(()),
        }
    }

    fn export(&self, pin: PinId) -> Result<(), PinError> {
        if self.pin_dir(pin).exists() {
            return Ok(());
        }
        write_attribute(pin, "export", &self.root.join("export"), &pin.to_string())
    }

    fn unexport(&self, pin: PinId) -> Result<(), PinError> {
        write_attribute(pin, "unexport", &self.root.join("unexport"), &pin.to_string())
    }
}

fn write_attribute(
    pin: PinId,
    operation: &'static str,
    path: &Utf8Path,
    value: &str,
) -> Result<(), PinError> {
    fs::write(path, value).map_err(|source| PinError::Io {
        pin,
        operation,
        path: path.to_path_buf(),
        source,
    })
}

fn level_value(level: Level) -> &'static str {
    match level {
        Level::Low => "0",
        Level::High => "1",
    }
}

impl PinDriver for SysfsPinDriver {
    fn configure(&mut self, pin: PinId, direction: Direction) -> Result<(), PinError> {
        self.export(pin)?;
        let direction_path = self.pin_dir(pin).join("direction");
        write_attribute(pin, "configure", &direction_path, &direction.to_string())?;
        if direction == Direction::Output {
            write_attribute(pin, "write", &self.value_path(pin), level_value(Level::Low))?;
        }
        self.configured.insert(pin, direction);
        info!(
            target: HARDWARE_TARGET,
            pin = pin.get(),
            direction = %direction,
            "pin configured"
        );
        Ok(())
    }

    fn write(&mut self, pin: PinId, level: Level) -> Result<(), PinError> {
        self.check(pin, Some(Direction::Output))?;
        write_attribute(pin, "write", &self.value_path(pin), level_value(level))?;
        debug!(target: HARDWARE_TARGET, pin = pin.get(), %level, "pin written");
        Ok(())
    }

    fn read(&mut self, pin: PinId) -> Result<Level, PinError> {
        self.check(pin, None)?;
        let path = self.value_path(pin);
        let raw = fs::read_to_string(&path).map_err(|source| PinError::Io {
            pin,
            operation: "read",
            path: path.clone(),
            source,
        })?;
        match raw.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(PinError::InvalidValue {
                pin,
                value: other.to_owned(),
            }),
        }
    }

    fn release_all(&mut self) -> Result<(), PinError> {
        let mut first_error = None;
        for (pin, direction) in std::mem::take(&mut self.configured) {
            let outcome = if direction == Direction::Output {
                write_attribute(pin, "write", &self.value_path(pin), level_value(Level::Low))
                    .and_then(|()| self.unexport(pin))
            } else {
                self.unexport(pin)
            };
            if let Err(error) = outcome {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
