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

//! Translation of incoming MIDI events into sampler calls.
//!
//! Every `on_*` operation validates its input, calls the sampler and, on
//! success, publishes a [`DispatchResult`] for the display. Failures publish
//! nothing. The raw event path ([`Dispatcher::process_midi_event`]) logs
//! failures and keeps going so that one bad event never stalls delivery.

use std::{sync::Arc, time::Duration};

use midly::{live::LiveEvent, MidiMessage};
use tokio::runtime::Handle;
use tracing::{debug, info, span, warn, Level};

use crate::{
    midi::InputLayer,
    release::{PendingRelease, ReleaseHandle, ReleaseScheduler},
    sampler::Sampler,
    status::StatusPublisher,
};

mod error;
mod mapping;
mod result;

pub use error::DispatchError;
pub use mapping::{Mapping, NoteDerivation};
pub use result::{DispatchResult, MidiEventCategory};

/// Dispatches MIDI events to a sampler.
pub struct Dispatcher {
    sampler: Arc<dyn Sampler>,
    inputs: Arc<dyn InputLayer>,
    mapping: Mapping,
    releases: ReleaseScheduler,
    status: StatusPublisher,
}

impl Dispatcher {
    /// Creates a new dispatcher. Deferred releases run on the given runtime.
    pub fn new(
        runtime: Handle,
        sampler: Arc<dyn Sampler>,
        inputs: Arc<dyn InputLayer>,
        mapping: Mapping,
        release_delay: Duration,
        status: StatusPublisher,
    ) -> Dispatcher {
        let releases =
            ReleaseScheduler::new(runtime, release_delay, sampler.clone(), status.clone());
        Dispatcher {
            sampler,
            inputs,
            mapping,
            releases,
            status,
        }
    }

    /// The mapping in use.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// The release scheduler in use.
    pub fn releases(&self) -> &ReleaseScheduler {
        &self.releases
    }

    /// Plays the note.
    pub fn on_note_on(
        &self,
        note: u8,
        velocity: u8,
        channel: u8,
    ) -> Result<DispatchResult, DispatchError> {
        check_data("note", note)?;
        check_data("velocity", velocity)?;
        check_channel(channel)?;

        self.sampler.play(note, velocity, channel)?;
        Ok(self.publish(DispatchResult::note_on(note, velocity, channel)))
    }

    /// Stops the note.
    pub fn on_note_off(
        &self,
        note: u8,
        velocity: u8,
        channel: u8,
    ) -> Result<DispatchResult, DispatchError> {
        check_data("note", note)?;
        check_data("velocity", velocity)?;
        check_channel(channel)?;

        self.sampler.stop(note, channel)?;
        Ok(self.publish(DispatchResult::note_off(note, velocity, channel)))
    }

    /// Treats the controller as a momentary switch: values at the top of the
    /// range play the mapped note, anything else stops it. The result stays
    /// active either way.
    pub fn on_controller(
        &self,
        controller: u8,
        value: u8,
        channel: u8,
    ) -> Result<DispatchResult, DispatchError> {
        check_data("controller", controller)?;
        check_data("value", value)?;
        check_channel(channel)?;

        let (note, target_channel) = self.mapping.controller_target(controller, channel)?;
        if self.mapping.is_pressed(value) {
            self.sampler
                .play(note, self.mapping.controller_velocity, target_channel)?;
        } else {
            self.sampler.stop(note, target_channel)?;
        }
        Ok(self.publish(DispatchResult::controller(controller, value, channel)))
    }

    /// Plays the mapped note and releases it after the configured delay, since
    /// program changes have no note off.
    pub fn on_program_change(
        &self,
        program: u8,
        channel: u8,
    ) -> Result<DispatchResult, DispatchError> {
        check_data("program", program)?;
        check_channel(channel)?;

        let (note, target_channel) = self.mapping.program_target(program, channel)?;
        self.trigger(note, target_channel)?;
        // The result has to be out before the release can mark it inactive.
        let result = self.publish(DispatchResult::program_change(program, channel));
        self.releases.schedule(PendingRelease {
            note,
            channel: target_channel,
        });
        Ok(result)
    }

    /// Plays the note now and schedules its stop. Never blocks on the stop.
    pub fn trigger_and_release(
        &self,
        note: u8,
        channel: u8,
    ) -> Result<ReleaseHandle, DispatchError> {
        self.trigger(note, channel)?;
        Ok(self.releases.schedule(PendingRelease { note, channel }))
    }

    fn trigger(&self, note: u8, channel: u8) -> Result<(), DispatchError> {
        self.sampler
            .play(note, self.mapping.program_velocity, channel)?;
        Ok(())
    }

    /// Asks the input layer to open each of the given inputs. Returns how many
    /// were opened; inputs that can't be opened are logged and skipped.
    pub fn on_setup_change(&self, input_names: &[String]) -> usize {
        let span = span!(Level::INFO, "setup change");
        let _enter = span.enter();

        info!(inputs = ?input_names, "MIDI setup changed.");

        input_names
            .iter()
            .filter(|name| match self.inputs.open_input(name) {
                Ok(()) => true,
                Err(e) => {
                    let e = DispatchError::from(e);
                    warn!(input = name.as_str(), err = %e, "Unable to open input.");
                    false
                }
            })
            .count()
    }

    /// Processes a raw MIDI message. This is the entry point for the MIDI
    /// delivery path and never fails: errors are logged and the event dropped.
    pub fn process_midi_event(&self, raw_event: &[u8]) {
        let event = match LiveEvent::parse(raw_event) {
            Ok(event) => event,
            Err(e) => {
                debug!(err = ?e, "Failed to parse MIDI event.");
                return;
            }
        };

        let (channel, message) = match event {
            LiveEvent::Midi { channel, message } => (channel.as_int(), message),
            _ => {
                debug!(event = ?event, "Ignoring non channel event.");
                return;
            }
        };

        let result = match message {
            // Note on with velocity 0 is a note off.
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => {
                self.on_note_off(key.as_int(), 0, channel)
            }
            MidiMessage::NoteOn { key, vel } => {
                self.on_note_on(key.as_int(), vel.as_int(), channel)
            }
            MidiMessage::NoteOff { key, vel } => {
                self.on_note_off(key.as_int(), vel.as_int(), channel)
            }
            MidiMessage::Controller { controller, value } => {
                self.on_controller(controller.as_int(), value.as_int(), channel)
            }
            MidiMessage::ProgramChange { program } => {
                self.on_program_change(program.as_int(), channel)
            }
            _ => {
                debug!(midi_message = ?message, "Ignoring unhandled MIDI message.");
                return;
            }
        };

        match result {
            Ok(result) => debug!(status = result.message, "Dispatched MIDI event."),
            // Channel mode controllers land here with the default offset.
            Err(
                e @ DispatchError::InvalidEventParameter {
                    name: "derived note",
                    ..
                },
            ) => debug!(err = %e, "Ignoring event outside of the mapping."),
            Err(e) => warn!(err = %e, "Dropped MIDI event."),
        }
    }

    fn publish(&self, result: DispatchResult) -> DispatchResult {
        self.status.publish(result.clone());
        result
    }
}

fn check_data(name: &'static str, value: u8) -> Result<(), DispatchError> {
    if value > 127 {
        return Err(DispatchError::InvalidEventParameter {
            name,
            value: value.into(),
        });
    }
    Ok(())
}

fn check_channel(channel: u8) -> Result<(), DispatchError> {
    if channel > 15 {
        return Err(DispatchError::InvalidEventParameter {
            name: "channel",
            value: channel.into(),
        });
    }
    Ok(())
}
