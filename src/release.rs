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

//! Deferred release of notes that have no note off of their own.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{runtime::Handle, task::AbortHandle};
use tracing::{debug, warn};

use crate::{dispatch::MidiEventCategory, sampler::Sampler, status::StatusPublisher};

/// A note waiting for its scheduled stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRelease {
    pub note: u8,
    pub channel: u8,
}

/// A handle to a scheduled release. Dropping it doesn't cancel the release.
#[derive(Clone)]
pub struct ReleaseHandle {
    pending: PendingRelease,
    released: Arc<AtomicBool>,
    abort_handle: AbortHandle,
}

impl ReleaseHandle {
    /// The note this handle releases.
    pub fn pending(&self) -> PendingRelease {
        self.pending
    }

    /// Returns true once the stop has been sent to the sampler.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Cancels the release if it hasn't happened yet. The caller then owns
    /// stopping the note.
    pub fn cancel(&self) {
        if !self.is_released() {
            self.abort_handle.abort();
        }
    }
}

/// Schedules one-shot releases on the tokio runtime.
#[derive(Clone)]
pub struct ReleaseScheduler {
    runtime: Handle,
    delay: Duration,
    sampler: Arc<dyn Sampler>,
    status: StatusPublisher,
    outstanding: Arc<AtomicUsize>,
}

/// Decrements the outstanding count even if the release task is aborted.
struct OutstandingGuard(Arc<AtomicUsize>);

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ReleaseScheduler {
    pub fn new(
        runtime: Handle,
        delay: Duration,
        sampler: Arc<dyn Sampler>,
        status: StatusPublisher,
    ) -> ReleaseScheduler {
        ReleaseScheduler {
            runtime,
            delay,
            sampler,
            status,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The delay between a trigger and its release.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The number of releases that haven't fired or been cancelled.
    pub fn pending(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Schedules the stop of the given note after the configured delay. Returns
    /// immediately. Overlapping schedules for the same note are independent.
    pub fn schedule(&self, pending: PendingRelease) -> ReleaseHandle {
        let released = Arc::new(AtomicBool::new(false));
        let delay = self.delay;
        let sampler = self.sampler.clone();
        let status = self.status.clone();

        self.outstanding.fetch_add(1, Ordering::AcqRel);
        let guard = OutstandingGuard(self.outstanding.clone());

        let join_handle = {
            let released = released.clone();
            self.runtime.spawn(async move {
                let _guard = guard;
                tokio::time::sleep(delay).await;

                if let Err(e) = sampler.stop(pending.note, pending.channel) {
                    warn!(
                        err = %e,
                        note = pending.note,
                        channel = pending.channel,
                        "Unable to release note."
                    );
                }
                released.store(true, Ordering::Release);
                status.mark_inactive(MidiEventCategory::ProgramChange);
                debug!(
                    note = pending.note,
                    channel = pending.channel,
                    "Released note."
                );
            })
        };

        ReleaseHandle {
            pending,
            released,
            abort_handle: join_handle.abort_handle(),
        }
    }
}
