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

use crate::{midi::MidiError, sampler::SamplerError};

/// Errors that can occur while dispatching a MIDI event. None of these reach
/// the MIDI delivery path: they're logged and the event is dropped.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("sampler unavailable: {0}")]
    SamplerUnavailable(String),

    #[error("invalid {name}: {value}")]
    InvalidEventParameter { name: &'static str, value: u16 },

    #[error("MIDI port unavailable: {0}")]
    MidiPortUnavailable(#[from] MidiError),
}

impl From<SamplerError> for DispatchError {
    fn from(e: SamplerError) -> Self {
        match e {
            SamplerError::Unavailable(reason) => DispatchError::SamplerUnavailable(reason),
            SamplerError::InvalidParameter { name, value } => {
                DispatchError::InvalidEventParameter {
                    name,
                    value: value.into(),
                }
            }
        }
    }
}
