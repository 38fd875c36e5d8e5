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

use std::{
    collections::HashSet,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::info;

use super::{to_u4, to_u7, SamplerError};

/// A call made against the mock sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Play { note: u8, velocity: u8, channel: u8 },
    Stop { note: u8, channel: u8 },
    StopAll,
}

/// A mock sampler. Doesn't make any sound, but records every call.
#[derive(Clone)]
pub struct Sampler {
    name: String,
    calls: Arc<Mutex<Vec<(Instant, Call)>>>,
    sounding: Arc<Mutex<HashSet<(u8, u8)>>>,
    unavailable: Arc<AtomicBool>,
}

impl Sampler {
    /// Gets the given mock sampler.
    pub fn get(name: &str) -> Sampler {
        Sampler {
            name: name.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            sounding: Arc::new(Mutex::new(HashSet::new())),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    fn check_available(&self) -> Result<(), SamplerError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(SamplerError::Unavailable(format!(
                "{} is unavailable",
                self.name
            )));
        }
        Ok(())
    }

    fn record(&self, call: Call) {
        self.calls.lock().push((Instant::now(), call));
    }
}

#[cfg(test)]
impl Sampler {
    /// Makes every following call fail as if the device went away.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Returns the calls made so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().iter().map(|(_, call)| *call).collect()
    }

    /// Returns the calls made so far along with when they were made.
    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().clone()
    }

    /// Returns the number of stop calls made for the given note and channel.
    pub fn stop_count(&self, note: u8, channel: u8) -> usize {
        self.calls()
            .into_iter()
            .filter(|call| *call == Call::Stop { note, channel })
            .count()
    }

    /// Returns true if the given note is sounding.
    pub fn is_sounding(&self, note: u8, channel: u8) -> bool {
        self.sounding.lock().contains(&(note, channel))
    }
}

impl super::Sampler for Sampler {
    fn play(&self, note: u8, velocity: u8, channel: u8) -> Result<(), SamplerError> {
        self.check_available()?;
        to_u7("note", note)?;
        to_u7("velocity", velocity)?;
        to_u4(channel)?;

        self.record(Call::Play {
            note,
            velocity,
            channel,
        });
        self.sounding.lock().insert((note, channel));
        Ok(())
    }

    fn stop(&self, note: u8, channel: u8) -> Result<(), SamplerError> {
        self.check_available()?;
        to_u7("note", note)?;
        to_u4(channel)?;

        self.record(Call::Stop { note, channel });
        self.sounding.lock().remove(&(note, channel));
        Ok(())
    }

    fn stop_all(&self) -> Result<(), SamplerError> {
        self.check_available()?;
        self.record(Call::StopAll);
        let stopped = self.sounding.lock().drain().count();
        info!(device = self.name, stopped, "All notes stopped (mock).");
        Ok(())
    }
}

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod test {
    use crate::sampler::Sampler as _;

    use super::*;

    #[test]
    fn test_stop_twice_is_not_an_error() {
        let sampler = Sampler::get("mock-sampler");
        sampler.play(60, 100, 0).expect("play");
        assert!(sampler.is_sounding(60, 0));

        assert!(sampler.stop(60, 0).is_ok());
        assert!(sampler.stop(60, 0).is_ok());
        assert!(!sampler.is_sounding(60, 0));
        assert_eq!(sampler.stop_count(60, 0), 2);
    }

    #[test]
    fn test_play_while_playing_is_not_an_error() {
        let sampler = Sampler::get("mock-sampler");
        assert!(sampler.play(60, 100, 0).is_ok());
        assert!(sampler.play(60, 90, 0).is_ok());
        assert_eq!(sampler.calls().len(), 2);
    }

    #[test]
    fn test_unavailable() {
        let sampler = Sampler::get("mock-sampler");
        sampler.set_unavailable(true);
        assert!(matches!(
            sampler.play(60, 100, 0),
            Err(SamplerError::Unavailable(_))
        ));
        assert!(sampler.calls().is_empty());

        sampler.set_unavailable(false);
        assert!(sampler.play(60, 100, 0).is_ok());
    }

    #[test]
    fn test_stop_all() {
        let sampler = Sampler::get("mock-sampler");
        sampler.play(60, 100, 0).expect("play");
        sampler.play(61, 100, 3).expect("play");
        sampler.stop_all().expect("stop all");
        assert!(!sampler.is_sounding(60, 0));
        assert!(!sampler.is_sounding(61, 3));
        assert_eq!(sampler.calls().last(), Some(&Call::StopAll));
    }
}
