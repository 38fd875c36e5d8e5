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

//! A terminal rendering of the latest dispatch result.

use std::{
    io,
    time::{Duration, Instant},
};

use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, info, span, Level};

use crate::{
    dispatch::{DispatchResult, MidiEventCategory},
    status::StatusReceiver,
};

/// How long a highlight stays up for events without a note off.
pub const FLASH_DURATION: Duration = Duration::from_millis(500);

/// Renders dispatch results and tracks the highlight state.
pub struct StatusDisplay<W: io::Write> {
    writer: W,
    highlighted: bool,
    dismiss_at: Option<Instant>,
    flash: Duration,
}

impl<W: io::Write> StatusDisplay<W> {
    pub fn new(writer: W) -> StatusDisplay<W> {
        StatusDisplay {
            writer,
            highlighted: false,
            dismiss_at: None,
            flash: FLASH_DURATION,
        }
    }

    /// Returns true if the highlight is showing.
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Renders the result and updates the highlight. Notes stay highlighted
    /// until their note off; everything else flashes.
    pub fn show(&mut self, result: &DispatchResult, now: Instant) -> io::Result<()> {
        writeln!(
            self.writer,
            "{} {}",
            if result.active { "[*]" } else { "[ ]" },
            result.message.replace('\n', " | ")
        )?;
        self.writer.flush()?;

        if !result.active {
            self.dismiss();
            return Ok(());
        }

        self.highlighted = true;
        self.dismiss_at = match result.category {
            MidiEventCategory::NoteNumber => None,
            _ => Some(now + self.flash),
        };
        Ok(())
    }

    /// Dismisses the highlight if its time has come.
    pub fn tick(&mut self, now: Instant) {
        if self.dismiss_at.is_some_and(|dismiss_at| now >= dismiss_at) {
            self.dismiss();
        }
    }

    fn dismiss(&mut self) {
        if self.highlighted {
            debug!("Highlight dismissed.");
        }
        self.highlighted = false;
        self.dismiss_at = None;
    }

    /// Renders results until the publisher side goes away.
    pub fn run(mut self, rx: StatusReceiver) -> io::Result<()> {
        let span = span!(Level::INFO, "status display");
        let _enter = span.enter();

        info!("Status display started.");

        loop {
            let received = match self.dismiss_at {
                Some(dismiss_at) => {
                    rx.recv_timeout(dismiss_at.saturating_duration_since(Instant::now()))
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(result) => self.show(&result, Instant::now())?,
                Err(RecvTimeoutError::Timeout) => self.tick(Instant::now()),
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Status display closing.");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;
    use crate::status;

    fn result(category: MidiEventCategory, active: bool, message: &str) -> DispatchResult {
        DispatchResult {
            message: message.to_string(),
            active,
            category,
        }
    }

    #[test]
    fn test_render() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut display = StatusDisplay::new(&mut out);
            display
                .show(
                    &result(
                        MidiEventCategory::NoteNumber,
                        true,
                        "Note Number\nChannel: 1  noteOn: 60  velocity: 100",
                    ),
                    Instant::now(),
                )
                .unwrap();
            display
                .show(
                    &result(
                        MidiEventCategory::NoteNumber,
                        false,
                        "Note Number\nChannel: 1  noteOff: 60  velocity: 0",
                    ),
                    Instant::now(),
                )
                .unwrap();
        }

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[*] Note Number | Channel: 1  noteOn: 60  velocity: 100\n\
             [ ] Note Number | Channel: 1  noteOff: 60  velocity: 0\n"
        );
    }

    #[test]
    fn test_note_highlight_waits_for_note_off() {
        let mut display = StatusDisplay::new(io::sink());
        let now = Instant::now();
        display
            .show(&result(MidiEventCategory::NoteNumber, true, "on"), now)
            .unwrap();
        display.tick(now + Duration::from_secs(10));
        assert!(display.is_highlighted());

        display
            .show(&result(MidiEventCategory::NoteNumber, false, "off"), now)
            .unwrap();
        assert!(!display.is_highlighted());
    }

    #[test]
    fn test_flash_dismisses() {
        let mut display = StatusDisplay::new(io::sink());
        let now = Instant::now();
        display
            .show(&result(MidiEventCategory::ContinuousControl, true, "cc"), now)
            .unwrap();
        assert!(display.is_highlighted());

        display.tick(now + Duration::from_millis(499));
        assert!(display.is_highlighted());

        display.tick(now + FLASH_DURATION);
        assert!(!display.is_highlighted());
    }

    #[test]
    fn test_run_until_disconnected() {
        let (publisher, rx) = status::channel(8);
        let join = thread::spawn(move || -> io::Result<Vec<u8>> {
            let mut out: Vec<u8> = Vec::new();
            StatusDisplay::new(&mut out).run(rx)?;
            Ok(out)
        });

        publisher.publish(result(MidiEventCategory::ProgramChange, true, "pc"));
        publisher.mark_inactive(MidiEventCategory::ProgramChange);
        drop(publisher);

        let out = join.join().expect("display thread").expect("display run");
        assert_eq!(String::from_utf8(out).unwrap(), "[*] pc\n[ ] pc\n");
    }
}
