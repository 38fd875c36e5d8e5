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

use std::fmt;

/// The kind of MIDI event that was most recently dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MidiEventCategory {
    NoteNumber,
    ContinuousControl,
    ProgramChange,
}

impl MidiEventCategory {
    /// The human readable name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            MidiEventCategory::NoteNumber => "Note Number",
            MidiEventCategory::ContinuousControl => "Continuous Control",
            MidiEventCategory::ProgramChange => "Program Change",
        }
    }
}

impl fmt::Display for MidiEventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of dispatching a single MIDI event, for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchResult {
    pub message: String,
    pub active: bool,
    pub category: MidiEventCategory,
}

impl DispatchResult {
    /// Channels are shown one based.
    pub(super) fn note_on(note: u8, velocity: u8, channel: u8) -> Self {
        DispatchResult {
            message: format!(
                "{}\nChannel: {}  noteOn: {}  velocity: {}",
                MidiEventCategory::NoteNumber,
                u16::from(channel) + 1,
                note,
                velocity
            ),
            active: true,
            category: MidiEventCategory::NoteNumber,
        }
    }

    pub(super) fn note_off(note: u8, velocity: u8, channel: u8) -> Self {
        DispatchResult {
            message: format!(
                "{}\nChannel: {}  noteOff: {}  velocity: {}",
                MidiEventCategory::NoteNumber,
                u16::from(channel) + 1,
                note,
                velocity
            ),
            active: false,
            category: MidiEventCategory::NoteNumber,
        }
    }

    /// Always active, even when the controller releases the gate.
    pub(super) fn controller(controller: u8, value: u8, channel: u8) -> Self {
        DispatchResult {
            message: format!(
                "{}\nChannel: {}  controller: {}  value: {}",
                MidiEventCategory::ContinuousControl,
                u16::from(channel) + 1,
                controller,
                value
            ),
            active: true,
            category: MidiEventCategory::ContinuousControl,
        }
    }

    pub(super) fn program_change(program: u8, channel: u8) -> Self {
        DispatchResult {
            message: format!(
                "{}\nChannel: {}  programChange: {}",
                MidiEventCategory::ProgramChange,
                u16::from(channel) + 1,
                program
            ),
            active: true,
            category: MidiEventCategory::ProgramChange,
        }
    }
}
