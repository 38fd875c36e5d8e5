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

use serde::Deserialize;

use super::DispatchError;

/// How a sampler note is derived from a controller or program number.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoteDerivation {
    /// The note is the base plus the incoming number.
    Offset { base: u8 },
    /// Always the same note regardless of the incoming number.
    Fixed { note: u8 },
}

impl NoteDerivation {
    /// Derives the note for the given controller or program number.
    pub fn derive(&self, value: u8) -> Result<u8, DispatchError> {
        let note = match self {
            NoteDerivation::Offset { base } => u16::from(*base) + u16::from(value),
            NoteDerivation::Fixed { note } => u16::from(*note),
        };

        if note > 127 {
            return Err(DispatchError::InvalidEventParameter {
                name: "derived note",
                value: note,
            });
        }
        Ok(note as u8)
    }
}

/// The policy for turning controller and program change events into notes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mapping {
    pub controller_note: NoteDerivation,
    pub program_note: NoteDerivation,
    /// Added to the incoming channel for derived notes.
    pub channel_offset: u8,
    pub controller_velocity: u8,
    pub program_velocity: u8,
    /// Controller values at or above this open the gate.
    pub gate_threshold: u8,
}

impl Default for Mapping {
    fn default() -> Self {
        Mapping {
            controller_note: NoteDerivation::Offset { base: 30 },
            program_note: NoteDerivation::Offset { base: 60 },
            channel_offset: 0,
            controller_velocity: 80,
            program_velocity: 80,
            gate_threshold: 127,
        }
    }
}

impl Mapping {
    /// The (note, channel) a controller drives.
    pub fn controller_target(&self, controller: u8, channel: u8) -> Result<(u8, u8), DispatchError> {
        Ok((
            self.controller_note.derive(controller)?,
            self.derive_channel(channel)?,
        ))
    }

    /// The (note, channel) a program change triggers.
    pub fn program_target(&self, program: u8, channel: u8) -> Result<(u8, u8), DispatchError> {
        Ok((
            self.program_note.derive(program)?,
            self.derive_channel(channel)?,
        ))
    }

    /// Returns true if the controller value counts as pressed.
    pub fn is_pressed(&self, value: u8) -> bool {
        value >= self.gate_threshold
    }

    fn derive_channel(&self, channel: u8) -> Result<u8, DispatchError> {
        let derived = u16::from(channel) + u16::from(self.channel_offset);
        if derived > 15 {
            return Err(DispatchError::InvalidEventParameter {
                name: "derived channel",
                value: derived,
            });
        }
        Ok(derived as u8)
    }
}
