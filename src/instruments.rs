//! Instrument name to program code tables

use crate::error::{path_error, Error, InstrumentClass, InterpretError, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Bundled General MIDI tables
const GENERAL_MIDI_YAML: &str = include_str!("../instruments.yaml");

/// Channel reserved for percussion (1-based)
pub const PERCUSSION_CHANNEL: u8 = 10;

/// Instrument table file layout
#[derive(Debug, Deserialize)]
struct TableFile {
    instruments: HashMap<String, i64>,
    #[serde(default)]
    percussion: HashMap<String, i64>,
}

/// Read-only melodic and percussion lookup tables
#[derive(Debug, Clone, Default)]
pub struct InstrumentTables {
    melodic: HashMap<String, u8>,
    percussion: HashMap<String, u8>,
    percussion_codes: BTreeSet<u8>,
}

impl InstrumentTables {
    /// Tables shipped with the crate (General MIDI level 1)
    pub fn general_midi() -> Result<Self> {
        Self::from_yaml(GENERAL_MIDI_YAML)
    }

    /// Parse tables from YAML with `instruments` and `percussion` maps
    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: TableFile =
            serde_yaml::from_str(text).map_err(|e| Error::Instruments(e.to_string()))?;

        let melodic = normalize(file.instruments, "instruments")?;
        let percussion = normalize(file.percussion, "percussion")?;
        let percussion_codes = percussion.values().copied().collect();

        Ok(Self {
            melodic,
            percussion,
            percussion_codes,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| path_error(path, e))?;
        Self::from_yaml(&text)
    }

    /// Resolve an instrument name for the given channel.
    ///
    /// Channel 10 consults only the percussion table, every other channel
    /// only the melodic one. Names are matched case-insensitively.
    pub fn resolve(&self, name: &str, channel: u8) -> std::result::Result<u8, InterpretError> {
        let key = name.to_lowercase();
        let (table, class) = if channel == PERCUSSION_CHANNEL {
            (&self.percussion, InstrumentClass::Percussion)
        } else {
            (&self.melodic, InstrumentClass::Melodic)
        };

        table
            .get(&key)
            .copied()
            .ok_or(InterpretError::UnknownInstrument { class, name: key })
    }

    /// Whether `code` is one of the percussion table's key numbers
    pub fn is_percussion_code(&self, code: u8) -> bool {
        self.percussion_codes.contains(&code)
    }

    pub fn melodic_len(&self) -> usize {
        self.melodic.len()
    }

    pub fn percussion_len(&self) -> usize {
        self.percussion.len()
    }
}

fn normalize(raw: HashMap<String, i64>, section: &str) -> Result<HashMap<String, u8>> {
    raw.into_iter()
        .map(|(name, code)| match u8::try_from(code) {
            Ok(c) if c <= 127 => Ok((name.to_lowercase(), c)),
            _ => Err(Error::Instruments(format!(
                "{}: code {} for '{}' is outside 0-127",
                section, code, name
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_midi_tables() {
        let tables = InstrumentTables::general_midi().unwrap();
        assert_eq!(tables.melodic_len(), 128);
        assert_eq!(tables.percussion_len(), 47);
        assert_eq!(tables.resolve("acoustic_grand_piano", 1), Ok(0));
        assert_eq!(tables.resolve("Gunshot", 3), Ok(127));
        assert_eq!(tables.resolve("acoustic_snare", 10), Ok(38));
    }

    #[test]
    fn test_channel_selects_table() {
        let tables = InstrumentTables::general_midi().unwrap();
        assert_eq!(
            tables.resolve("violin", 10),
            Err(InterpretError::UnknownInstrument {
                class: InstrumentClass::Percussion,
                name: "violin".to_string(),
            })
        );
        assert_eq!(
            tables.resolve("cowbell", 2),
            Err(InterpretError::UnknownInstrument {
                class: InstrumentClass::Melodic,
                name: "cowbell".to_string(),
            })
        );
    }

    #[test]
    fn test_percussion_codes() {
        let tables = InstrumentTables::general_midi().unwrap();
        assert!(tables.is_percussion_code(35));
        assert!(tables.is_percussion_code(81));
        assert!(!tables.is_percussion_code(34));
        assert!(!tables.is_percussion_code(82));
    }

    #[test]
    fn test_custom_yaml() {
        let yaml = "instruments:\n  Lead: 80\npercussion:\n  kick: 36\n";
        let tables = InstrumentTables::from_yaml(yaml).unwrap();
        assert_eq!(tables.resolve("LEAD", 1), Ok(80));
        assert_eq!(tables.resolve("kick", 10), Ok(36));
    }

    #[test]
    fn test_out_of_range_code() {
        let yaml = "instruments:\n  loud: 128\n";
        assert!(matches!(
            InstrumentTables::from_yaml(yaml),
            Err(Error::Instruments(_))
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            InstrumentTables::from_yaml("percussion: [1, 2"),
            Err(Error::Instruments(_))
        ));
    }
}
