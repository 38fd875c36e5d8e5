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

use std::{collections::HashSet, fmt};

use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use midly::{live::LiveEvent, MidiMessage};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{to_u4, to_u7, SamplerError};

/// The notes that have been started and not yet stopped, as (note, channel).
/// Note offs are only sent for notes in the set.
#[derive(Default)]
struct SoundingNotes(Mutex<HashSet<(u8, u8)>>);

impl SoundingNotes {
    fn started(&self, note: u8, channel: u8) {
        self.0.lock().insert((note, channel));
    }

    /// Sends a note off through `note_off` if the note is sounding. Returns
    /// whether one was sent.
    fn stop<F>(&self, note: u8, channel: u8, note_off: F) -> Result<bool, SamplerError>
    where
        F: FnOnce(u8, u8) -> Result<(), SamplerError>,
    {
        let mut sounding = self.0.lock();
        if !sounding.contains(&(note, channel)) {
            return Ok(false);
        }

        note_off(note, channel)?;
        sounding.remove(&(note, channel));
        Ok(true)
    }

    /// Sends a note off for every sounding note. Notes whose note off fails
    /// stay in the set and the first error is returned.
    fn stop_all<F>(&self, mut note_off: F) -> Result<usize, SamplerError>
    where
        F: FnMut(u8, u8) -> Result<(), SamplerError>,
    {
        let mut sounding = self.0.lock();
        let mut first_err = None;
        let mut stopped = 0;

        sounding.retain(|&(note, channel)| match note_off(note, channel) {
            Ok(()) => {
                stopped += 1;
                false
            }
            Err(e) => {
                warn!(note, channel, err = %e, "Unable to stop note.");
                first_err.get_or_insert(e);
                true
            }
        });

        match first_err {
            Some(e) => Err(e),
            None => Ok(stopped),
        }
    }
}

/// A sampler instrument reached through a MIDI output port. Play and stop are
/// forwarded as note on and note off messages.
pub struct Sampler {
    name: String,
    connection: Mutex<MidiOutputConnection>,
    sounding: SoundingNotes,
}

impl Sampler {
    fn send(&self, event: LiveEvent) -> Result<(), SamplerError> {
        // Channel messages are at most 3 bytes.
        let mut buf: Vec<u8> = Vec::with_capacity(8);
        event
            .write(&mut buf)
            .map_err(|e| SamplerError::Unavailable(e.to_string()))?;
        self.connection
            .lock()
            .send(&buf)
            .map_err(|e| SamplerError::Unavailable(e.to_string()))
    }

    fn note_off(&self, note: u8, channel: u8) -> Result<(), SamplerError> {
        self.send(LiveEvent::Midi {
            channel: to_u4(channel)?,
            message: MidiMessage::NoteOff {
                key: to_u7("note", note)?,
                vel: 0.into(),
            },
        })
    }
}

impl super::Sampler for Sampler {
    fn play(&self, note: u8, velocity: u8, channel: u8) -> Result<(), SamplerError> {
        let event = LiveEvent::Midi {
            channel: to_u4(channel)?,
            message: MidiMessage::NoteOn {
                key: to_u7("note", note)?,
                vel: to_u7("velocity", velocity)?,
            },
        };

        self.send(event)?;
        self.sounding.started(note, channel);
        debug!(device = self.name, note, velocity, channel, "Note started.");
        Ok(())
    }

    fn stop(&self, note: u8, channel: u8) -> Result<(), SamplerError> {
        if self
            .sounding
            .stop(note, channel, |note, channel| self.note_off(note, channel))?
        {
            debug!(device = self.name, note, channel, "Note stopped.");
        } else {
            debug!(device = self.name, note, channel, "Note already stopped.");
        }
        Ok(())
    }

    fn stop_all(&self) -> Result<(), SamplerError> {
        let stopped = self
            .sounding
            .stop_all(|note, channel| self.note_off(note, channel))?;

        if stopped > 0 {
            info!(device = self.name, stopped, "All notes stopped.");
        }
        Ok(())
    }
}

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (MIDI out)", self.name)
    }
}

/// Connects to the MIDI output port whose name contains the given name.
pub fn get(name: &str) -> Result<Sampler, SamplerError> {
    let output = MidiOutput::new("midi-receiver sampler output")
        .map_err(|e| SamplerError::Unavailable(e.to_string()))?;

    let mut matches = output
        .ports()
        .into_iter()
        .filter_map(|port| {
            output
                .port_name(&port)
                .ok()
                .filter(|port_name| port_name.contains(name))
                .map(|port_name| (port_name, port))
        })
        .collect::<Vec<(String, MidiOutputPort)>>();

    if matches.is_empty() {
        return Err(SamplerError::Unavailable(format!(
            "no MIDI output found with name {}",
            name
        )));
    }
    if matches.len() > 1 {
        return Err(SamplerError::Unavailable(format!(
            "found too many MIDI outputs that match ({}), use a less ambiguous name",
            matches
                .iter()
                .map(|(port_name, _)| port_name.clone())
                .collect::<Vec<String>>()
                .join(", ")
        )));
    }

    // There's exactly one match at this point.
    let (port_name, port) = matches.swap_remove(0);
    let connection = output
        .connect(&port, "midi-receiver sampler")
        .map_err(|e| SamplerError::Unavailable(e.to_string()))?;

    info!(device = port_name, "Connected to sampler.");

    Ok(Sampler {
        name: port_name,
        connection: Mutex::new(connection),
        sounding: SoundingNotes::default(),
    })
}
