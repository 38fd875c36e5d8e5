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

//! Wires the MIDI input layer, the dispatcher and the sampler together.

use std::{error::Error, sync::Arc, time::Duration};

use tokio::{
    runtime::Handle,
    sync::mpsc,
    task::{JoinError, JoinHandle},
    time::{self, MissedTickBehavior},
};
use tracing::{info, info_span, warn, Instrument};

use crate::{
    config,
    dispatch::Dispatcher,
    midi::InputLayer,
    sampler::Sampler,
    status::StatusPublisher,
};

/// A running receiver. Events arriving on the input layer are dispatched one
/// at a time, in arrival order.
pub struct Receiver {
    dispatcher: Arc<Dispatcher>,
    inputs: Arc<dyn InputLayer>,
    sampler: Arc<dyn Sampler>,
    events_handle: JoinHandle<()>,
    scan_handle: JoinHandle<()>,
}

impl Receiver {
    /// Starts the receiver. Must be called from within a tokio runtime.
    pub fn start(
        config: &config::Receiver,
        inputs: Arc<dyn InputLayer>,
        events_rx: mpsc::Receiver<Vec<u8>>,
        sampler: Arc<dyn Sampler>,
        status: StatusPublisher,
    ) -> Result<Receiver, Box<dyn Error>> {
        let mapping = config.mapping().to_mapping()?;
        let release_delay = config.release_delay()?;
        let scan_interval = config.midi().scan_interval()?;

        if let Some(virtual_port) = config.midi().virtual_port() {
            inputs.create_virtual_input(virtual_port)?;
        }

        let dispatcher = Arc::new(Dispatcher::new(
            Handle::current(),
            sampler.clone(),
            inputs.clone(),
            mapping,
            release_delay,
            status,
        ));

        info!(
            sampler = %sampler,
            mapping = ?dispatcher.mapping(),
            release_delay = ?dispatcher.releases().delay(),
            "Receiver starting."
        );

        let events_handle = tokio::spawn(
            dispatch_events(dispatcher.clone(), events_rx).instrument(info_span!("events")),
        );
        let scan_handle = tokio::spawn(
            scan_inputs(
                dispatcher.clone(),
                inputs.clone(),
                config.midi().clone(),
                scan_interval,
            )
            .instrument(info_span!("input scan")),
        );

        Ok(Receiver {
            dispatcher,
            inputs,
            sampler,
            events_handle,
            scan_handle,
        })
    }

    /// The dispatcher events are routed through.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Waits until the event stream ends.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.events_handle).await
    }

    /// Stops listening, closes every input and silences the sampler.
    pub fn stop(&self) {
        self.scan_handle.abort();
        self.events_handle.abort();
        self.inputs.close_all();
        if let Err(e) = self.sampler.stop_all() {
            warn!(err = %e, "Unable to stop sampler notes.");
        }
        info!(
            pending_releases = self.dispatcher.releases().pending(),
            "Receiver stopped."
        );
    }
}

async fn dispatch_events(dispatcher: Arc<Dispatcher>, mut events_rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(raw_event) = events_rx.recv().await {
        dispatcher.process_midi_event(&raw_event);
    }
    info!("MIDI event stream closed.");
}

/// Periodically looks at the inputs the backend knows about and raises a setup
/// change whenever the wanted set differs from the last one seen.
async fn scan_inputs(
    dispatcher: Arc<Dispatcher>,
    inputs: Arc<dyn InputLayer>,
    config: config::Midi,
    scan_interval: Duration,
) {
    let mut ticker = time::interval(scan_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut known: Option<Vec<String>> = None;
    loop {
        ticker.tick().await;

        let names = match inputs.input_names() {
            Ok(names) => names
                .into_iter()
                .filter(|name| config.wants_input(name))
                .collect::<Vec<String>>(),
            Err(e) => {
                warn!(err = %e, "Unable to list MIDI inputs.");
                continue;
            }
        };

        if known.as_ref() == Some(&names) {
            continue;
        }

        inputs.retain_inputs(&names);
        let opened = dispatcher.on_setup_change(&names);
        info!(wanted = names.len(), opened, "MIDI inputs updated.");
        known = Some(names);
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use super::*;
    use crate::{
        dispatch::{Mapping, MidiEventCategory},
        midi::test::InputLayer as MockInputLayer,
        sampler::test::{Call, Sampler as MockSampler},
        status,
        testutil::eventually,
    };

    fn receiver_config(virtual_port: Option<String>, inputs: Vec<String>) -> config::Receiver {
        config::Receiver::new(
            config::Midi::new("mock-midi", virtual_port, inputs).with_scan_interval("50ms"),
            config::Sampler::new("mock-sampler"),
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_receiver() -> Result<(), Box<dyn Error>> {
        let (events_tx, events_rx) = mpsc::channel(10);
        let inputs = Arc::new(MockInputLayer::get("mock-midi", events_tx));
        inputs.set_input_names(&["IAC Driver Bus 1", "Keystation 49"]);
        let sampler = MockSampler::get("mock-sampler");
        let (publisher, status_rx) = status::channel(16);

        let receiver = Receiver::start(
            &receiver_config(Some("AKMidiReceiver".into()), vec!["Keystation".into()]),
            inputs.clone(),
            events_rx,
            Arc::new(sampler.clone()),
            publisher,
        )?;

        assert_eq!(inputs.virtual_port(), Some("AKMidiReceiver".to_string()));
        assert_eq!(*receiver.dispatcher().mapping(), Mapping::default());
        eventually(
            || inputs.opened_inputs() == vec!["Keystation 49".to_string()],
            "Keystation never opened",
        );

        // Note on, channel 1.
        inputs.mock_event(&[0x90, 60, 100]).await;
        eventually(|| sampler.is_sounding(60, 0), "Note never played");
        let result = status_rx.recv()?;
        assert_eq!(result.category, MidiEventCategory::NoteNumber);
        assert!(result.active);

        // Note on with zero velocity releases it.
        inputs.mock_event(&[0x90, 60, 0]).await;
        eventually(|| !sampler.is_sounding(60, 0), "Note never stopped");
        assert!(!status_rx.recv()?.active);

        // Program change 5 on channel 2 plays note 65 and lets it go.
        inputs.mock_event(&[0xC1, 5]).await;
        eventually(|| sampler.is_sounding(65, 1), "Program never played");
        let result = status_rx.recv()?;
        assert_eq!(result.category, MidiEventCategory::ProgramChange);
        assert!(result.active);
        eventually(|| sampler.stop_count(65, 1) == 1, "Program never released");
        let result = status_rx.recv()?;
        assert_eq!(result.category, MidiEventCategory::ProgramChange);
        assert!(!result.active);
        eventually(
            || receiver.dispatcher().releases().pending() == 0,
            "Release still pending",
        );

        // Garbage is dropped without stopping the receiver.
        inputs.mock_event(&[0xF4]).await;
        inputs.mock_event(&[0xB0, 1, 127]).await;
        eventually(|| sampler.is_sounding(31, 0), "Controller never played");

        receiver.stop();
        assert!(inputs.opened_inputs().is_empty());
        assert_eq!(sampler.calls().last(), Some(&Call::StopAll));

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_inputs_come_and_go() -> Result<(), Box<dyn Error>> {
        let (events_tx, events_rx) = mpsc::channel(10);
        let inputs = Arc::new(MockInputLayer::get("mock-midi", events_tx));
        let sampler = MockSampler::get("mock-sampler");
        let (publisher, _status_rx) = status::channel(16);

        let receiver = Receiver::start(
            &receiver_config(None, vec![]),
            inputs.clone(),
            events_rx,
            Arc::new(sampler),
            publisher,
        )?;
        assert_eq!(inputs.virtual_port(), None);

        inputs.set_input_names(&["Keystation 49"]);
        eventually(
            || inputs.opened_inputs() == vec!["Keystation 49".to_string()],
            "Keystation never opened",
        );

        inputs.set_input_names(&["Keystation 49", "nanoKONTROL2"]);
        eventually(
            || inputs.opened_inputs().len() == 2,
            "nanoKONTROL2 never opened",
        );

        inputs.set_input_names(&["nanoKONTROL2"]);
        eventually(
            || inputs.opened_inputs() == vec!["nanoKONTROL2".to_string()],
            "Keystation never closed",
        );

        // Unavailable inputs are skipped, the rest still open.
        inputs.set_unavailable("Broken");
        inputs.set_input_names(&["Broken", "Keystation 49", "nanoKONTROL2"]);
        eventually(
            || inputs.opened_inputs().len() == 2,
            "Keystation never reopened",
        );
        assert!(!inputs.opened_inputs().contains(&"Broken".to_string()));

        receiver.stop();
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_join_after_stream_closes() -> Result<(), Box<dyn Error>> {
        let (events_tx, events_rx) = mpsc::channel(10);
        let (mock_tx, _mock_rx) = mpsc::channel(1);
        let inputs = Arc::new(MockInputLayer::get("mock-midi", mock_tx));
        let sampler = MockSampler::get("mock-sampler");
        let (publisher, _status_rx) = status::channel(16);

        let mut receiver = Receiver::start(
            &receiver_config(None, vec![]),
            inputs,
            events_rx,
            Arc::new(sampler.clone()),
            publisher,
        )?;

        events_tx.send(vec![0x90, 64, 90]).await?;
        drop(events_tx);
        receiver.join().await?;

        assert_eq!(
            sampler.calls(),
            vec![Call::Play {
                note: 64,
                velocity: 90,
                channel: 0
            }]
        );

        receiver.stop();
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_configuration() {
        let (events_tx, events_rx) = mpsc::channel(10);
        let inputs = Arc::new(MockInputLayer::get("mock-midi", events_tx));
        let (publisher, _status_rx) = status::channel(16);

        let config = config::Receiver::new(
            config::Midi::new("mock-midi", None, vec![]).with_scan_interval("soon"),
            config::Sampler::new("mock-sampler"),
        );

        assert!(Receiver::start(
            &config,
            inputs,
            events_rx,
            Arc::new(MockSampler::get("mock-sampler")),
            publisher,
        )
        .is_err());
    }
}
