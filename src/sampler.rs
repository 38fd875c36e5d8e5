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

use midly::num::{u4, u7};

use crate::config;

mod midi_out;
mod mock;

/// Errors raised by a sampler instrument.
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    /// The sampler or the device behind it can't be reached.
    #[error("sampler unavailable: {0}")]
    Unavailable(String),

    /// A note, velocity or channel is outside of the MIDI range.
    #[error("invalid sampler parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: u8 },
}

/// A sound generator that plays notes on request.
///
/// Implementations own their thread safety: the dispatcher and the release
/// timer call into the same sampler from different tasks without any locking
/// of their own. Stopping a note that isn't sounding and playing a note that
/// already is must both succeed.
pub trait Sampler: fmt::Display + std::marker::Send + std::marker::Sync {
    /// Starts the given note.
    fn play(&self, note: u8, velocity: u8, channel: u8) -> Result<(), SamplerError>;

    /// Stops the given note.
    fn stop(&self, note: u8, channel: u8) -> Result<(), SamplerError>;

    /// Stops every note that is still sounding.
    fn stop_all(&self) -> Result<(), SamplerError>;
}

/// Gets the sampler described by the given configuration.
pub fn get_sampler(config: &config::Sampler) -> Result<Arc<dyn Sampler>, SamplerError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Sampler::get(device)));
    }

    Ok(Arc::new(midi_out::get(device)?))
}

/// Converts a note number into a MIDI data byte.
pub(crate) fn to_u7(name: &'static str, value: u8) -> Result<u7, SamplerError> {
    u7::try_from(value).ok_or(SamplerError::InvalidParameter { name, value })
}

/// Converts a zero based channel number into a MIDI channel nibble.
pub(crate) fn to_u4(value: u8) -> Result<u4, SamplerError> {
    u4::try_from(value).ok_or(SamplerError::InvalidParameter {
        name: "channel",
        value,
    })
}

#[cfg(test)]
pub mod test {
    pub use super::mock::{Call, Sampler};
}
