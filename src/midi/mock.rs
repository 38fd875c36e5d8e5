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

use std::collections::HashSet;

use parking_lot::Mutex;
use tokio::sync::mpsc::Sender;
use tracing::info;

use super::MidiError;

/// A mock input layer. Inputs are whatever the test says they are, and events
/// are injected by hand.
pub struct InputLayer {
    name: String,
    /// Events injected by tests go here.
    #[allow(dead_code)]
    sender: Sender<Vec<u8>>,
    names: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    unavailable: Mutex<HashSet<String>>,
    virtual_port: Mutex<Option<String>>,
}

impl InputLayer {
    /// Gets the given mock input layer.
    pub fn get(name: &str, sender: Sender<Vec<u8>>) -> InputLayer {
        InputLayer {
            name: name.to_string(),
            sender,
            names: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            unavailable: Mutex::new(HashSet::new()),
            virtual_port: Mutex::new(None),
        }
    }
}

#[cfg(test)]
impl InputLayer {
    /// Replaces the inputs the layer reports.
    pub fn set_input_names(&self, names: &[&str]) {
        *self.names.lock() = names.iter().map(|name| name.to_string()).collect();
    }

    /// Makes opening the given input fail.
    pub fn set_unavailable(&self, name: &str) {
        self.unavailable.lock().insert(name.to_string());
    }

    /// Returns the inputs that have been opened, in order.
    pub fn opened_inputs(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    /// Returns the virtual port, if one was created.
    pub fn virtual_port(&self) -> Option<String> {
        self.virtual_port.lock().clone()
    }

    /// Sends the mock event through to the receiver as if it arrived on an
    /// open input.
    pub async fn mock_event(&self, event: &[u8]) {
        self.sender
            .send(event.to_vec())
            .await
            .expect("error sending event");
    }
}

impl super::InputLayer for InputLayer {
    fn input_names(&self) -> Result<Vec<String>, MidiError> {
        Ok(self.names.lock().clone())
    }

    fn open_input(&self, name: &str) -> Result<(), MidiError> {
        if self.unavailable.lock().contains(name) || !self.names.lock().iter().any(|n| n == name)
        {
            return Err(MidiError::PortUnavailable(name.to_string()));
        }

        let mut opened = self.opened.lock();
        if !opened.iter().any(|n| n == name) {
            info!(layer = self.name, port = name, "Opened MIDI input (mock).");
            opened.push(name.to_string());
        }
        Ok(())
    }

    fn retain_inputs(&self, names: &[String]) {
        self.opened.lock().retain(|name| names.contains(name));
    }

    fn create_virtual_input(&self, name: &str) -> Result<(), MidiError> {
        *self.virtual_port.lock() = Some(name.to_string());
        Ok(())
    }

    fn close_all(&self) {
        self.opened.lock().clear();
        *self.virtual_port.lock() = None;
    }
}
