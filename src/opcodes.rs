//! Spectrometer USB command opcodes.

use std::collections::HashMap;

/// Request code of the spectral acquisition command.
pub const ACQUIRE_SPECTRUM: u8 = 0xAD;

/// Known command opcodes as `(hex, name)` pairs, in definition order.
///
/// Should an opcode be listed more than once, [`OpcodeTable`] lets the last
/// definition win.
pub const OPCODES: &[(&str, &str)] = &[
    ("ad", "ACQUIRE_SPECTRUM"),
    ("b2", "SET_INTEGRATION_TIME"),
    ("bf", "GET_INTEGRATION_TIME"),
    ("b6", "SET_DETECTOR_OFFSET"),
    ("c4", "GET_DETECTOR_OFFSET"),
    ("b7", "SET_DETECTOR_GAIN"),
    ("c5", "GET_DETECTOR_GAIN"),
    ("b9", "SET_DETECTOR_OFFSET_ODD"),
    ("9e", "GET_DETECTOR_OFFSET_ODD"),
    ("b8", "SET_DETECTOR_GAIN_ODD"),
    ("9f", "GET_DETECTOR_GAIN_ODD"),
    ("be", "SET_LASER_ENABLE"),
    ("e2", "GET_LASER_ENABLE"),
    ("bd", "SET_LASER_MODULATION_ENABLE"),
    ("e3", "GET_LASER_MODULATION_ENABLE"),
    ("c7", "SET_LASER_MODULATION_DURATION"),
    ("c3", "GET_LASER_MODULATION_DURATION"),
    ("c8", "SET_LASER_MODULATION_PULSE_DELAY"),
    ("ca", "GET_LASER_MODULATION_PULSE_DELAY"),
    ("c6", "SET_LASER_MODULATION_PERIOD"),
    ("cb", "GET_LASER_MODULATION_PERIOD"),
    ("db", "SET_LASER_MODULATION_PULSE_WIDTH"),
    ("dc", "GET_LASER_MODULATION_PULSE_WIDTH"),
    ("e7", "SET_LASER_TEC_SETPOINT"),
    ("e8", "GET_LASER_TEC_SETPOINT"),
    ("d5", "GET_LASER_TEMPERATURE"),
    ("d6", "SET_DETECTOR_TEC_ENABLE"),
    ("da", "GET_DETECTOR_TEC_ENABLE"),
    ("d8", "SET_DETECTOR_TEC_SETPOINT"),
    ("d9", "GET_DETECTOR_TEC_SETPOINT"),
    ("d7", "GET_DETECTOR_TEMPERATURE"),
    ("d2", "SET_TRIGGER_SOURCE"),
    ("d3", "GET_TRIGGER_SOURCE"),
    ("c0", "GET_FIRMWARE_REVISION"),
    ("b4", "GET_FPGA_REVISION"),
    ("d4", "GET_ACTUAL_FRAMES"),
    ("df", "GET_ACTUAL_INTEGRATION_TIME"),
    ("eb", "SET_HIGH_GAIN_MODE"),
    ("ec", "GET_HIGH_GAIN_MODE"),
    ("ff", "SECOND_TIER_COMMAND"),
    ("fe", "THIRD_TIER_COMMAND"),
];

/// Lookup from lowercase two digit opcode hex to command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeTable {
    names: HashMap<String, &'static str>,
}

impl OpcodeTable {
    /// Builds a table from `(hex, name)` pairs. Later pairs replace earlier ones with the same key.
    pub fn from_definitions(definitions: &[(&str, &'static str)]) -> Self {
        let names = definitions
            .iter()
            .map(|(opcode, name)| (opcode.to_ascii_lowercase(), *name))
            .collect();
        Self { names }
    }

    /// Returns the command name for an opcode, ignoring hex case.
    pub fn name(&self, opcode: &str) -> Option<&'static str> {
        self.names.get(&opcode.to_ascii_lowercase()).copied()
    }

    /// Number of distinct opcodes in the table.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table has no opcodes at all.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::from_definitions(OPCODES)
    }
}
