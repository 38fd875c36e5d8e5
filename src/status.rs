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

//! Delivery of dispatch results from the MIDI path to the display.
//!
//! Publishing never blocks: results go through a bounded queue and are dropped
//! with a warning if the display falls behind.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::dispatch::{DispatchResult, MidiEventCategory};

/// The receiving end of the status queue, owned by the display.
pub type StatusReceiver = Receiver<DispatchResult>;

/// Publishes the latest dispatch result to the display context.
#[derive(Clone)]
pub struct StatusPublisher {
    tx: Sender<DispatchResult>,
    latest: Arc<RwLock<Option<DispatchResult>>>,
}

/// Creates a publisher and the receiver the display reads from.
pub fn channel(capacity: usize) -> (StatusPublisher, StatusReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (
        StatusPublisher {
            tx,
            latest: Arc::new(RwLock::new(None)),
        },
        rx,
    )
}

impl StatusPublisher {
    /// Hands the result to the display. Fire and forget.
    pub fn publish(&self, result: DispatchResult) {
        let mut latest = self.latest.write();
        *latest = Some(result.clone());
        self.send(result);
    }

    /// Republishes the latest result as inactive if it belongs to the given
    /// category and is still active.
    pub fn mark_inactive(&self, category: MidiEventCategory) {
        let mut latest = self.latest.write();
        let result = match latest.as_mut() {
            Some(result) if result.category == category && result.active => {
                result.active = false;
                result.clone()
            }
            _ => return,
        };
        self.send(result);
    }

    /// Returns the most recently published result.
    pub fn latest(&self) -> Option<DispatchResult> {
        self.latest.read().clone()
    }

    fn send(&self, result: DispatchResult) {
        match self.tx.try_send(result) {
            Ok(()) => {}
            Err(TrySendError::Full(result)) => {
                warn!(
                    category = %result.category,
                    "Status queue is full, dropping update."
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("No status display attached.");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn result(category: MidiEventCategory, active: bool, message: &str) -> DispatchResult {
        DispatchResult {
            message: message.to_string(),
            active,
            category,
        }
    }

    #[test]
    fn test_publish_in_order() {
        let (publisher, rx) = channel(8);
        publisher.publish(result(MidiEventCategory::NoteNumber, true, "one"));
        publisher.publish(result(MidiEventCategory::NoteNumber, true, "two"));
        publisher.publish(result(MidiEventCategory::NoteNumber, false, "three"));

        let messages: Vec<String> = rx.try_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["one", "two", "three"]);
        assert_eq!(publisher.latest().map(|r| r.message), Some("three".into()));
    }

    #[test]
    fn test_full_queue_does_not_block() {
        let (publisher, rx) = channel(1);
        publisher.publish(result(MidiEventCategory::NoteNumber, true, "kept"));
        publisher.publish(result(MidiEventCategory::NoteNumber, true, "dropped"));

        assert_eq!(rx.try_iter().count(), 1);
        // The latest result is still tracked even when the display misses it.
        assert_eq!(publisher.latest().map(|r| r.message), Some("dropped".into()));
    }

    #[test]
    fn test_disconnected_display() {
        let (publisher, rx) = channel(1);
        drop(rx);
        publisher.publish(result(MidiEventCategory::ProgramChange, true, "lost"));
        assert!(publisher.latest().is_some());
    }

    #[test]
    fn test_mark_inactive() {
        let (publisher, rx) = channel(8);
        publisher.publish(result(MidiEventCategory::ProgramChange, true, "pc"));
        publisher.mark_inactive(MidiEventCategory::ProgramChange);
        // Already inactive, nothing more to send.
        publisher.mark_inactive(MidiEventCategory::ProgramChange);

        let received: Vec<DispatchResult> = rx.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert!(received[0].active);
        assert!(!received[1].active);
        assert_eq!(received[1].message, "pc");
    }

    #[test]
    fn test_mark_inactive_other_category() {
        let (publisher, rx) = channel(8);
        publisher.publish(result(MidiEventCategory::NoteNumber, true, "note"));
        publisher.mark_inactive(MidiEventCategory::ProgramChange);

        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(publisher.latest().map(|r| r.active), Some(true));
    }
}
