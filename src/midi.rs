// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::{fmt, sync::Arc};

use tokio::sync::mpsc::Sender;

use crate::config;

mod midir;
mod mock;

/// Errors raised by the MIDI input layer.
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("no MIDI input named {0}")]
    PortUnavailable(String),

    #[error("MIDI backend error: {0}")]
    Backend(String),

    #[error("unable to connect to {port}: {reason}")]
    Connect { port: String, reason: String },

    #[error("virtual ports are not supported on this platform")]
    VirtualPortUnsupported,
}

/// The MIDI input layer. Raw events from every open input are forwarded to
/// the sender given at construction, one message at a time.
pub trait InputLayer: std::marker::Send + std::marker::Sync {
    /// Returns the names of the inputs currently known to the backend.
    fn input_names(&self) -> Result<Vec<String>, MidiError>;

    /// Opens the input with the given name. Opening an input that is already
    /// open does nothing.
    fn open_input(&self, name: &str) -> Result<(), MidiError>;

    /// Closes open inputs that aren't in the given list, so that they can be
    /// opened again if they come back.
    fn retain_inputs(&self, names: &[String]);

    /// Creates a virtual input that other applications can send to.
    fn create_virtual_input(&self, name: &str) -> Result<(), MidiError>;

    /// Closes every open input.
    fn close_all(&self);
}

/// A MIDI device and its capabilities, for listing.
pub struct Device {
    name: String,
    input: bool,
    output: bool,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut capabilities: Vec<String> = Vec::new();
        if self.input {
            capabilities.push(String::from("Input"));
        }
        if self.output {
            capabilities.push(String::from("Output"));
        }

        write!(f, "{} ({})", self.name, capabilities.join("/"))
    }
}

/// Lists devices known to midir.
pub fn list_devices() -> Result<Vec<Device>, MidiError> {
    midir::list()
}

/// Gets the input layer described by the configuration. Events are sent to the
/// given sender.
pub fn get_input_layer(
    config: &config::Midi,
    sender: Sender<Vec<u8>>,
) -> Result<Arc<dyn InputLayer>, MidiError> {
    let client_name = config.client_name();
    if client_name.starts_with("mock") {
        return Ok(Arc::new(mock::InputLayer::get(client_name, sender)));
    }

    Ok(Arc::new(midir::InputLayer::new(client_name, sender)))
}

#[cfg(test)]
pub mod test {
    pub use super::mock::InputLayer;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_display() {
        let device = Device {
            name: "Keystation 49".into(),
            input: true,
            output: true,
        };
        assert_eq!(device.to_string(), "Keystation 49 (Input/Output)");

        let device = Device {
            name: "Sampler".into(),
            input: false,
            output: true,
        };
        assert_eq!(device.to_string(), "Sampler (Output)");
    }
}
