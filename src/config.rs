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

use std::path::Path;

use config::{Config, File};

mod error;
mod mapping;
mod midi;
mod receiver;
mod sampler;

pub use error::ConfigError;
pub use mapping::{Mapping, NoteDerivation};
pub use midi::Midi;
pub use receiver::Receiver;
pub use sampler::Sampler;

/// Loads the receiver configuration from the given file. The format is
/// determined by the file extension.
pub fn load(path: &Path) -> Result<Receiver, ConfigError> {
    let receiver: Receiver = Config::builder()
        .add_source(File::from(path))
        .build()?
        .try_deserialize()?;

    // Surface bad durations and mappings at load time rather than on the first event.
    receiver.validate()?;
    Ok(receiver)
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, time::Duration};

    use super::*;

    #[test]
    fn test_load() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("receiver.yaml");
        fs::write(
            &path,
            r#"
            midi:
              client_name: mock-midi
              inputs:
                - Keystation
              scan_interval: 250ms
            sampler:
              device: mock-sampler
            mapping:
              controller_note:
                type: fixed
                note: 60
              channel_offset: 1
            release_delay: 750ms
            "#,
        )?;

        let receiver = load(&path)?;
        assert_eq!(receiver.midi().client_name(), "mock-midi");
        assert_eq!(receiver.midi().inputs(), &["Keystation".to_string()]);
        assert_eq!(receiver.midi().scan_interval()?, Duration::from_millis(250));
        assert_eq!(receiver.sampler().device(), "mock-sampler");
        assert_eq!(receiver.release_delay()?, Duration::from_millis(750));

        let mapping = receiver.mapping().to_mapping()?;
        assert_eq!(mapping.controller_note, NoteDerivation::Fixed { note: 60 });
        assert_eq!(mapping.program_note, NoteDerivation::Offset { base: 60 });
        assert_eq!(mapping.channel_offset, 1);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_load_bad_duration() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("receiver.yaml");
        fs::write(
            &path,
            r#"
            sampler:
              device: mock-sampler
            release_delay: soon
            "#,
        )?;

        assert!(matches!(
            load(&path),
            Err(ConfigError::InvalidDuration { .. })
        ));
        Ok(())
    }
}
