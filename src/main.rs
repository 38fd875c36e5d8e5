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

use std::{error::Error, io, path::PathBuf, thread};

use clap::{crate_version, Parser, Subcommand};
use midi_receiver::{
    config, display::StatusDisplay, midi, receiver::Receiver, sampler, status,
};
use tokio::sync::mpsc;
use tracing::info;

/// How many raw MIDI events may queue up before the input callbacks block.
const EVENT_QUEUE_SIZE: usize = 128;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Triggers a sampled instrument from incoming MIDI."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available MIDI input/output devices.
    MidiDevices {},
    /// Start will start the receiver and show incoming events until interrupted.
    Start {
        /// The path to the receiver config.
        config_path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Start { config_path } => {
            let config = config::load(&PathBuf::from(&config_path))?;

            let (publisher, status_rx) = status::channel(config.status_queue_size());
            let display = thread::spawn(move || StatusDisplay::new(io::stdout()).run(status_rx));

            let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
            let inputs = midi::get_input_layer(config.midi(), events_tx)?;
            let sampler = sampler::get_sampler(config.sampler())?;

            let receiver = Receiver::start(&config, inputs, events_rx, sampler, publisher)?;

            tokio::signal::ctrl_c().await?;
            info!("Interrupted, shutting down.");
            receiver.stop();

            // The display exits once the last publisher is gone.
            drop(receiver);
            if let Ok(Err(e)) = tokio::task::spawn_blocking(move || display.join()).await? {
                return Err(Box::new(e) as Box<dyn Error>);
            }
        }
    }

    Ok(())
}
