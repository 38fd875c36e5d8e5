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

use serde::Deserialize;

use super::receiver::parse_duration;
use super::ConfigError;

const DEFAULT_CLIENT_NAME: &str = "midi-receiver";
const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(2);

/// A YAML representation of the MIDI input configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Midi {
    /// The client name to register with the MIDI backend. Names starting with
    /// "mock" select the mock input layer.
    client_name: Option<String>,

    /// The name of a virtual input port to create for other applications to
    /// send to.
    virtual_port: Option<String>,

    /// Fragments of input port names to open. If empty, every input is opened.
    #[serde(default)]
    inputs: Vec<String>,

    /// How often to look for inputs that have appeared or disappeared.
    scan_interval: Option<String>,
}

impl Midi {
    /// New will create a new MIDI configuration.
    pub fn new(client_name: &str, virtual_port: Option<String>, inputs: Vec<String>) -> Midi {
        Midi {
            client_name: Some(client_name.to_string()),
            virtual_port,
            inputs,
            scan_interval: None,
        }
    }

    /// Sets the port scan interval (test only).
    #[cfg(test)]
    pub fn with_scan_interval(mut self, scan_interval: &str) -> Midi {
        self.scan_interval = Some(scan_interval.to_string());
        self
    }

    /// Returns the client name from the configuration.
    pub fn client_name(&self) -> &str {
        self.client_name.as_deref().unwrap_or(DEFAULT_CLIENT_NAME)
    }

    /// Returns the virtual port name, if one should be created.
    pub fn virtual_port(&self) -> Option<&str> {
        self.virtual_port.as_deref()
    }

    /// Returns the input name fragments.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Returns true if the given port name should be opened.
    pub fn wants_input(&self, port_name: &str) -> bool {
        self.inputs.is_empty()
            || self
                .inputs
                .iter()
                .any(|fragment| port_name.contains(fragment.as_str()))
    }

    /// Returns the port scan interval.
    pub fn scan_interval(&self) -> Result<Duration, ConfigError> {
        match &self.scan_interval {
            Some(scan_interval) => parse_duration(scan_interval),
            None => Ok(DEFAULT_SCAN_INTERVAL),
        }
    }
}

#[cfg(test)]
mod test {
    use config::{Config, File, FileFormat};

    use super::*;

    #[test]
    fn test_defaults() {
        let midi: Midi = Config::builder()
            .add_source(File::from_str("{}", FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(midi.client_name(), "midi-receiver");
        assert_eq!(midi.virtual_port(), None);
        assert!(midi.inputs().is_empty());
        assert_eq!(midi.scan_interval().unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_wants_input() {
        let all = Midi::new("mock-midi", None, vec![]);
        assert!(all.wants_input("Keystation 49"));
        assert!(all.wants_input("IAC Driver Bus 1"));

        let some = Midi::new(
            "mock-midi",
            None,
            vec!["Keystation".to_string(), "nanoKONTROL".to_string()],
        );
        assert!(some.wants_input("Keystation 49"));
        assert!(some.wants_input("nanoKONTROL2 MIDI 1"));
        assert!(!some.wants_input("IAC Driver Bus 1"));
    }

    #[test]
    fn test_virtual_port() {
        let yaml = r#"
            client_name: receiver
            virtual_port: AKMidiReceiver
            scan_interval: 1s
        "#;

        let midi: Midi = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(midi.client_name(), "receiver");
        assert_eq!(midi.virtual_port(), Some("AKMidiReceiver"));
        assert_eq!(midi.scan_interval().unwrap(), Duration::from_secs(1));
    }
}
