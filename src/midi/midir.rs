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

use std::{collections::HashMap, mem};

use midir::{MidiInput, MidiInputConnection, MidiOutput};
use parking_lot::Mutex;
use tokio::sync::mpsc::Sender;
use tracing::{debug, error, info, span, Level};

use super::{Device, MidiError};

/// The midir backed input layer.
pub struct InputLayer {
    client_name: String,
    sender: Sender<Vec<u8>>,
    connections: Mutex<HashMap<String, MidiInputConnection<()>>>,
    virtual_connection: Mutex<Option<MidiInputConnection<()>>>,
}

impl InputLayer {
    pub fn new(client_name: &str, sender: Sender<Vec<u8>>) -> InputLayer {
        InputLayer {
            client_name: client_name.to_string(),
            sender,
            connections: Mutex::new(HashMap::new()),
            virtual_connection: Mutex::new(None),
        }
    }

    fn midi_input(&self) -> Result<MidiInput, MidiError> {
        MidiInput::new(&self.client_name).map_err(|e| MidiError::Backend(e.to_string()))
    }
}

/// Builds the midir callback that forwards raw events to the sender.
fn forward(
    port_name: String,
    sender: Sender<Vec<u8>>,
) -> impl FnMut(u64, &[u8], &mut ()) + Send + 'static {
    move |_, raw_event, _| {
        if let Err(e) = sender.blocking_send(Vec::from(raw_event)) {
            error!(
                port = port_name,
                err = format!("{:?}", e),
                "Error sending MIDI event to receiver."
            );
        }
    }
}

impl super::InputLayer for InputLayer {
    fn input_names(&self) -> Result<Vec<String>, MidiError> {
        let input = self.midi_input()?;
        let mut names = input
            .ports()
            .iter()
            .map(|port| {
                input
                    .port_name(port)
                    .map_err(|e| MidiError::Backend(e.to_string()))
            })
            .collect::<Result<Vec<String>, MidiError>>()?;
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn open_input(&self, name: &str) -> Result<(), MidiError> {
        let span = span!(Level::INFO, "open input (midir)");
        let _enter = span.enter();

        let mut connections = self.connections.lock();
        if connections.contains_key(name) {
            debug!(port = name, "Input already open.");
            return Ok(());
        }

        let input = self.midi_input()?;
        let port = input
            .ports()
            .into_iter()
            .find(|port| input.port_name(port).is_ok_and(|port_name| port_name == name))
            .ok_or_else(|| MidiError::PortUnavailable(name.to_string()))?;

        let connection = input
            .connect(
                &port,
                &format!("{} input", self.client_name),
                forward(name.to_string(), self.sender.clone()),
                (),
            )
            .map_err(|e| MidiError::Connect {
                port: name.to_string(),
                reason: e.to_string(),
            })?;

        info!(port = name, "Opened MIDI input.");
        connections.insert(name.to_string(), connection);
        Ok(())
    }

    fn retain_inputs(&self, names: &[String]) {
        self.connections.lock().retain(|name, _| {
            let keep = names.contains(name);
            if !keep {
                info!(port = name.as_str(), "Closed MIDI input that went away.");
            }
            keep
        });
    }

    #[cfg(unix)]
    fn create_virtual_input(&self, name: &str) -> Result<(), MidiError> {
        use midir::os::unix::VirtualInput;

        let mut virtual_connection = self.virtual_connection.lock();
        if virtual_connection.is_some() {
            debug!(port = name, "Virtual input already created.");
            return Ok(());
        }

        let connection = self
            .midi_input()?
            .create_virtual(name, forward(name.to_string(), self.sender.clone()), ())
            .map_err(|e| MidiError::Connect {
                port: name.to_string(),
                reason: e.to_string(),
            })?;

        info!(port = name, "Created virtual MIDI input.");
        *virtual_connection = Some(connection);
        Ok(())
    }

    #[cfg(not(unix))]
    fn create_virtual_input(&self, _name: &str) -> Result<(), MidiError> {
        Err(MidiError::VirtualPortUnsupported)
    }

    fn close_all(&self) {
        // Explicitly drop the connections.
        let connections = mem::take(&mut *self.connections.lock());
        let virtual_connection = self.virtual_connection.lock().take();
        let closed = connections.len() + usize::from(virtual_connection.is_some());

        mem::drop(connections);
        mem::drop(virtual_connection);
        info!(closed, "Closed MIDI inputs.");
    }
}

/// Lists midir devices.
pub fn list() -> Result<Vec<Device>, MidiError> {
    let input =
        MidiInput::new("midi-receiver input listing").map_err(|e| MidiError::Backend(e.to_string()))?;
    let output = MidiOutput::new("midi-receiver output listing")
        .map_err(|e| MidiError::Backend(e.to_string()))?;

    let mut devices: HashMap<String, Device> = HashMap::new();

    for port in input.ports() {
        let name = input
            .port_name(&port)
            .map_err(|e| MidiError::Backend(e.to_string()))?;
        devices
            .entry(name.clone())
            .or_insert_with(|| Device {
                name,
                input: false,
                output: false,
            })
            .input = true;
    }

    for port in output.ports() {
        let name = output
            .port_name(&port)
            .map_err(|e| MidiError::Backend(e.to_string()))?;
        devices
            .entry(name.clone())
            .or_insert_with(|| Device {
                name,
                input: false,
                output: false,
            })
            .output = true;
    }

    let mut sorted_devices = devices.into_values().collect::<Vec<Device>>();
    sorted_devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sorted_devices)
}
