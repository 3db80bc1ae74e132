//! Turns the selected spectrometer's frames into symbolic records.
//!
//! Opcodes come from dissected control transfer setup data when Wireshark provides
//! it, and otherwise from a fixed position in the raw frame. Either way, an opcode is
//! only reported when the request type byte in front of it agrees with the transfer
//! direction Wireshark reports for the frame.

use std::{fmt, sync::OnceLock};

use log::trace;

use crate::{
    capture::{PacketRecord, PacketStore},
    classify::{DeviceSelection, BULK_READ_MIN_LEN},
    opcodes::OpcodeTable,
};

/// Hex character offset of the request code within a raw control setup frame (byte 29).
pub const OPCODE_HEX_OFFSET: usize = 58;

/// Hex character offset of the request type byte within a raw control setup frame (byte 28).
pub const DIRECTION_HEX_OFFSET: usize = 56;

/// Direction of a transfer relative to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Direction {
    HostToDevice,
    DeviceToHost,
}

impl Direction {
    /// The vendor request type byte expected in front of an opcode sent this way.
    pub const fn request_type_marker(self) -> &'static str {
        match self {
            Self::HostToDevice => "40",
            Self::DeviceToHost => "c0",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HostToDevice => "HOST_TO_DEVICE",
            Self::DeviceToHost => "DEVICE_TO_HOST",
        })
    }
}

/// What a frame was recognized as.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Classification {
    /// A spectrum readout.
    BulkRead,
    /// A command found in the opcode table.
    Command { name: &'static str, opcode: String },
    /// An opcode missing from the table, or no trustworthy opcode at all.
    Unknown { opcode: Option<String> },
}

impl Classification {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// Raw hex of the opcode this classification was made from, if any.
    pub fn opcode(&self) -> Option<&str> {
        match self {
            Self::BulkRead => None,
            Self::Command { opcode, .. } => Some(opcode),
            Self::Unknown { opcode } => opcode.as_deref(),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BulkRead => f.write_str("BULK_READ"),
            Self::Command { name, opcode } => write!(f, "{name} 0x{opcode}"),
            Self::Unknown { opcode: Some(opcode) } => write!(f, "unknown 0x{opcode}"),
            Self::Unknown { opcode: None } => f.write_str("unknown"),
        }
    }
}

/// A decoded spectrometer frame.
///
/// `value_raw`, `index_raw` and `combined_value` are `None` when absent or zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedFrame {
    /// Position of the frame in the capture.
    pub frame_index: usize,
    /// Seconds since the start of the capture.
    pub timestamp: Option<f64>,
    pub classification: Classification,
    pub direction: Direction,
    pub byte_length: Option<u64>,
    /// `wValue` as four hex digits.
    pub value_raw: Option<String>,
    /// `wIndex` as four hex digits.
    pub index_raw: Option<String>,
    /// `wValue | wIndex << 16`.
    ///
    /// Commands taking parameters wider than 16 bits carry the high word in `wIndex`.
    pub combined_value: Option<u64>,
}

fn default_opcodes() -> &'static OpcodeTable {
    static OPCODES: OnceLock<OpcodeTable> = OnceLock::new();
    OPCODES.get_or_init(OpcodeTable::default)
}

/// Whether a frame was exchanged with the selected device.
pub fn is_relevant(record: &PacketRecord, selection: &DeviceSelection) -> bool {
    record
        .endpoint()
        .is_some_and(|endpoint| selection.contains(endpoint))
}

/// Indices of all frames exchanged with the selected device, in capture order.
pub fn relevant_frame_indices(store: &PacketStore, selection: &DeviceSelection) -> Vec<usize> {
    store
        .iter()
        .enumerate()
        .filter(|(_, record)| is_relevant(record, selection))
        .map(|(i, _)| i)
        .collect()
}

/// All frames exchanged with the selected device, in capture order.
pub fn relevant_packets<'s>(
    store: &'s PacketStore,
    selection: &DeviceSelection,
) -> Vec<&'s PacketRecord> {
    store
        .iter()
        .filter(|record| is_relevant(record, selection))
        .collect()
}

/// Decodes a frame using the built-in opcode table.
///
/// Returns `None` if the frame does not exist, does not belong to the selected device,
/// or could not be identified and `full_decode` is false.
pub fn decode_frame(
    store: &PacketStore,
    frame_index: usize,
    selection: &DeviceSelection,
    full_decode: bool,
) -> Option<DecodedFrame> {
    decode_frame_with(default_opcodes(), store, frame_index, selection, full_decode)
}

/// Decodes a frame using a caller-supplied opcode table.
pub fn decode_frame_with(
    opcodes: &OpcodeTable,
    store: &PacketStore,
    frame_index: usize,
    selection: &DeviceSelection,
    full_decode: bool,
) -> Option<DecodedFrame> {
    let record = store.get(frame_index)?;
    if !is_relevant(record, selection) {
        return None;
    }

    let direction = if record.is_host_sourced() {
        Direction::HostToDevice
    } else {
        Direction::DeviceToHost
    };
    let byte_length = record.byte_length();
    let opcode = extract_opcode(record, direction, frame_index);

    let classification = if byte_length.is_some_and(|len| len >= BULK_READ_MIN_LEN) {
        Classification::BulkRead
    } else {
        match opcode {
            Some(opcode) => match opcodes.name(&opcode) {
                Some(name) => Classification::Command { name, opcode },
                None => Classification::Unknown {
                    opcode: Some(opcode),
                },
            },
            None => Classification::Unknown { opcode: None },
        }
    };

    if classification.is_unknown() && !full_decode {
        return None;
    }

    let w_value = record.w_value();
    let w_index = record.w_index();
    let combined_value = combine_parameters(w_value.as_deref(), w_index.as_deref());

    Some(DecodedFrame {
        frame_index,
        timestamp: record.timestamp(),
        classification,
        direction,
        byte_length,
        value_raw: w_value.filter(|hex| !is_zero_hex(hex)),
        index_raw: w_index.filter(|hex| !is_zero_hex(hex)),
        combined_value: combined_value.filter(|value| *value != 0),
    })
}

/// Reads the opcode and checks it against the request type byte preceding it.
fn extract_opcode(record: &PacketRecord, direction: Direction, frame_index: usize) -> Option<String> {
    let payload = record.payload_hex().map(str::to_ascii_lowercase);

    let opcode = record.request_code().or_else(|| {
        payload
            .as_deref()?
            .get(OPCODE_HEX_OFFSET..OPCODE_HEX_OFFSET + 2)
            .map(str::to_string)
    })?;

    let marker = payload
        .as_deref()
        .and_then(|hex| hex.get(DIRECTION_HEX_OFFSET..OPCODE_HEX_OFFSET));
    if marker != Some(direction.request_type_marker()) {
        trace!(
            "Frame {frame_index}: discarding opcode {opcode}, request type {marker:?} does not match {direction}"
        );
        return None;
    }

    Some(opcode)
}

/// Computes `w_value | w_index << 16` when both words are present and valid hex.
fn combine_parameters(w_value: Option<&str>, w_index: Option<&str>) -> Option<u64> {
    let value = u64::from_str_radix(w_value?, 16).ok()?;
    let index = u64::from_str_radix(w_index?, 16).ok()?;
    Some(value | (index << 16))
}

fn is_zero_hex(hex: &str) -> bool {
    hex.chars().all(|c| c == '0')
}
