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

pub use crate::dispatch::NoteDerivation;
use crate::dispatch;

use super::ConfigError;

/// A YAML representation of how controller and program change events turn
/// into sampler notes. Everything is optional; see [`dispatch::Mapping`] for
/// the defaults.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Mapping {
    /// How the note is derived from the controller number.
    controller_note: Option<NoteDerivation>,

    /// How the note is derived from the program number.
    program_note: Option<NoteDerivation>,

    /// Added to the incoming channel for derived notes.
    channel_offset: Option<u8>,

    /// The velocity used when a controller gate opens.
    controller_velocity: Option<u8>,

    /// The velocity used for program change triggers.
    program_velocity: Option<u8>,

    /// The controller value at or above which the gate counts as pressed.
    gate_threshold: Option<u8>,
}

impl Mapping {
    /// Converts the YAML mapping into the dispatcher mapping.
    pub fn to_mapping(&self) -> Result<dispatch::Mapping, ConfigError> {
        let defaults = dispatch::Mapping::default();
        let mapping = dispatch::Mapping {
            controller_note: self.controller_note.unwrap_or(defaults.controller_note),
            program_note: self.program_note.unwrap_or(defaults.program_note),
            channel_offset: self.channel_offset.unwrap_or(defaults.channel_offset),
            controller_velocity: self
                .controller_velocity
                .unwrap_or(defaults.controller_velocity),
            program_velocity: self.program_velocity.unwrap_or(defaults.program_velocity),
            gate_threshold: self.gate_threshold.unwrap_or(defaults.gate_threshold),
        };

        for (name, value) in [
            ("controller_velocity", mapping.controller_velocity),
            ("program_velocity", mapping.program_velocity),
            ("gate_threshold", mapping.gate_threshold),
        ] {
            if value > 127 {
                return Err(ConfigError::InvalidMapping(format!(
                    "{} must be between 0 and 127, got {}",
                    name, value
                )));
            }
        }
        if mapping.channel_offset > 15 {
            return Err(ConfigError::InvalidMapping(format!(
                "channel_offset must be between 0 and 15, got {}",
                mapping.channel_offset
            )));
        }
        for (name, derivation) in [
            ("controller_note", mapping.controller_note),
            ("program_note", mapping.program_note),
        ] {
            let value = match derivation {
                NoteDerivation::Offset { base } => base,
                NoteDerivation::Fixed { note } => note,
            };
            if value > 127 {
                return Err(ConfigError::InvalidMapping(format!(
                    "{} note must be between 0 and 127, got {}",
                    name, value
                )));
            }
        }

        Ok(mapping)
    }
}
