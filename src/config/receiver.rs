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

use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use super::{ConfigError, Mapping, Midi, Sampler};

const DEFAULT_RELEASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_STATUS_QUEUE_SIZE: usize = 64;

/// The configuration for the MIDI receiver.
#[derive(Deserialize, Clone, Debug)]
pub struct Receiver {
    /// The MIDI input configuration.
    #[serde(default)]
    midi: Midi,

    /// The sampler to trigger.
    sampler: Sampler,

    /// The note mapping policy.
    #[serde(default)]
    mapping: Mapping,

    /// How long a program change trigger sounds before it's released.
    release_delay: Option<String>,

    /// How many status updates may wait for the display.
    status_queue_size: Option<usize>,
}

impl Receiver {
    /// New will create a new receiver configuration with the default mapping.
    pub fn new(midi: Midi, sampler: Sampler) -> Receiver {
        Receiver {
            midi,
            sampler,
            mapping: Mapping::default(),
            release_delay: None,
            status_queue_size: None,
        }
    }

    /// Returns the MIDI input configuration.
    pub fn midi(&self) -> &Midi {
        &self.midi
    }

    /// Returns the sampler configuration.
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Returns the mapping configuration.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Returns the release delay for program change triggers.
    pub fn release_delay(&self) -> Result<Duration, ConfigError> {
        match &self.release_delay {
            Some(release_delay) => parse_duration(release_delay),
            None => Ok(DEFAULT_RELEASE_DELAY),
        }
    }

    /// Returns the status queue size.
    pub fn status_queue_size(&self) -> usize {
        self.status_queue_size
            .unwrap_or(DEFAULT_STATUS_QUEUE_SIZE)
            .max(1)
    }

    /// Checks the parts of the configuration that serde can't.
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.release_delay()?;
        self.midi.scan_interval()?;
        self.mapping.to_mapping()?;
        Ok(())
    }
}

/// Parses a duration such as "500ms" or "2s".
pub(super) fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    DurationString::from_string(value.to_string())
        .map(Into::into)
        .map_err(|e| ConfigError::InvalidDuration {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
