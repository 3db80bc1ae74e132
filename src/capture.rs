//! Loading and field access for exported Wireshark packet dissections.
//!
//! A capture is the JSON produced by *File > Export Packet Dissections > As JSON* with
//! packet bytes included. Each element of the top-level array is one frame whose
//! attributes live under `_source.layers`.

use std::{fs, path::Path};

use log::debug;
use serde_json::Value;
use thiserror::Error;

use crate::path::{lookup, lookup_any, Segment};

/// Endpoint token Wireshark uses for the host side of a USB transfer.
pub const HOST: &str = "host";

const FRAME_RAW_PAYLOAD: &[Segment<'static>] = &[
    Segment::Key("_source"),
    Segment::Key("layers"),
    Segment::Key("frame_raw"),
    Segment::Index(0),
];
const FRAME_RAW_LENGTH: &[Segment<'static>] = &[
    Segment::Key("_source"),
    Segment::Key("layers"),
    Segment::Key("frame_raw"),
    Segment::Index(2),
];
const FRAME_TIME_RELATIVE: &[Segment<'static>] = &[
    Segment::Key("_source"),
    Segment::Key("layers"),
    Segment::Key("frame"),
    Segment::Key("frame.time_relative"),
];
const USB_SRC: &[Segment<'static>] = &[
    Segment::Key("_source"),
    Segment::Key("layers"),
    Segment::Key("usb"),
    Segment::Key("usb.src"),
];
const USB_DST: &[Segment<'static>] = &[
    Segment::Key("_source"),
    Segment::Key("layers"),
    Segment::Key("usb"),
    Segment::Key("usb.dst"),
];

// Setup data is a sibling of the `usb` layer in USBPcap exports and a child of it in
// older usbmon exports.
const REQUEST_CODE: &[&[Segment<'static>]] = &[
    &[
        Segment::Key("_source"),
        Segment::Key("layers"),
        Segment::Key("Setup Data"),
        Segment::Key("usb.setup.bRequest_raw"),
        Segment::Index(0),
    ],
    &[
        Segment::Key("_source"),
        Segment::Key("layers"),
        Segment::Key("usb"),
        Segment::Key("Setup Data"),
        Segment::Key("usb.setup.bRequest_raw"),
        Segment::Index(0),
    ],
];
const W_VALUE: &[&[Segment<'static>]] = &[
    &[
        Segment::Key("_source"),
        Segment::Key("layers"),
        Segment::Key("Setup Data"),
        Segment::Key("usb.setup.wValue"),
    ],
    &[
        Segment::Key("_source"),
        Segment::Key("layers"),
        Segment::Key("usb"),
        Segment::Key("Setup Data"),
        Segment::Key("usb.setup.wValue"),
    ],
];
const W_INDEX: &[&[Segment<'static>]] = &[
    &[
        Segment::Key("_source"),
        Segment::Key("layers"),
        Segment::Key("Setup Data"),
        Segment::Key("usb.setup.wIndex"),
    ],
    &[
        Segment::Key("_source"),
        Segment::Key("layers"),
        Segment::Key("usb"),
        Segment::Key("Setup Data"),
        Segment::Key("usb.setup.wIndex"),
    ],
];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Capture is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Input is not a packet capture export: {0}")]
    UnsupportedInput(String),
}

/// One captured frame.
///
/// Records are never modified after loading. All accessors return `None` when the
/// field is missing or has an unexpected shape.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketRecord {
    tree: Value,
}

impl PacketRecord {
    pub fn new(tree: Value) -> Self {
        Self { tree }
    }

    /// The full attribute tree of this frame.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Looks up an arbitrary field of this frame.
    pub fn get(&self, path: &[Segment<'_>]) -> Option<&Value> {
        lookup(&self.tree, path)
    }

    /// Raw frame bytes as a hex string.
    pub fn payload_hex(&self) -> Option<&str> {
        self.get(FRAME_RAW_PAYLOAD)?.as_str()
    }

    /// Total frame length in bytes.
    pub fn byte_length(&self) -> Option<u64> {
        self.get(FRAME_RAW_LENGTH)?.as_u64()
    }

    /// Seconds since the first frame of the capture.
    pub fn timestamp(&self) -> Option<f64> {
        match self.get(FRAME_TIME_RELATIVE)? {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.get(USB_SRC)?.as_str()
    }

    pub fn destination(&self) -> Option<&str> {
        self.get(USB_DST)?.as_str()
    }

    /// Returns the endpoint on the non-host side of the transfer, regardless of direction.
    pub fn endpoint(&self) -> Option<&str> {
        match self.source() {
            Some(HOST) => self.destination(),
            Some(source) => Some(source),
            None => None,
        }
    }

    /// Whether the frame was sent by the host.
    pub fn is_host_sourced(&self) -> bool {
        self.source() == Some(HOST)
    }

    /// Raw hex of the control transfer request code, when dissected.
    pub fn request_code(&self) -> Option<String> {
        lookup_any(&self.tree, REQUEST_CODE)
            .and_then(Value::as_str)
            .map(normalize_hex)
    }

    /// Control transfer `wValue` as four hex digits, when dissected.
    pub fn w_value(&self) -> Option<String> {
        lookup_any(&self.tree, W_VALUE)
            .and_then(Value::as_str)
            .map(normalize_hex)
    }

    /// Control transfer `wIndex` as four hex digits, when dissected.
    pub fn w_index(&self) -> Option<String> {
        lookup_any(&self.tree, W_INDEX)
            .and_then(Value::as_str)
            .map(normalize_hex)
    }
}

/// Strips a `0x` prefix, lowercases, and expands Wireshark's bare `0` to `0000`.
pub(crate) fn normalize_hex(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits == "0" {
        "0000".to_string()
    } else {
        digits.to_ascii_lowercase()
    }
}

/// The ordered frames of one capture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacketStore {
    records: Vec<PacketRecord>,
}

impl PacketStore {
    pub fn from_records(records: Vec<PacketRecord>) -> Self {
        Self { records }
    }

    /// Loads a JSON packet dissection export from disk.
    ///
    /// # Errors
    ///
    /// Files without a `.json` extension are rejected with [`LoadError::UnsupportedInput`]
    /// before they are read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            return Err(LoadError::UnsupportedInput(format!(
                "{} does not have a .json extension",
                path.display()
            )));
        }

        let text = fs::read_to_string(path)?;
        let store = Self::from_json_str(&text)?;
        debug!("Loaded {} frames from {}", store.len(), path.display());
        Ok(store)
    }

    /// Parses a JSON packet dissection export.
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self, LoadError> {
        let Value::Array(frames) = value else {
            return Err(LoadError::UnsupportedInput(
                "top level value is not an array of frames".to_string(),
            ));
        };

        let records = frames
            .into_iter()
            .enumerate()
            .map(|(i, frame)| {
                if frame.is_object() {
                    Ok(PacketRecord::new(frame))
                } else {
                    Err(LoadError::UnsupportedInput(format!(
                        "frame {i} is not an object"
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PacketRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[PacketRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &PacketRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{normalize_hex, LoadError, PacketRecord, PacketStore};
    use crate::fixtures::{control_frame, frame};

    #[test]
    fn normalizes_hex_fields() {
        assert_eq!(normalize_hex("0x0012"), "0012");
        assert_eq!(normalize_hex("0"), "0000");
        assert_eq!(normalize_hex("0x0"), "0000");
        assert_eq!(normalize_hex("AD"), "ad");
        assert_eq!(normalize_hex("0X00FF"), "00ff");
    }

    #[test]
    fn reads_frame_fields() {
        let record = PacketRecord::new(frame("2.2.0", "host", "1b00aabb", 27, "0.000125000"));

        assert_eq!(record.payload_hex(), Some("1b00aabb"));
        assert_eq!(record.byte_length(), Some(27));
        assert_eq!(record.timestamp(), Some(0.000125));
        assert_eq!(record.source(), Some("2.2.0"));
        assert_eq!(record.destination(), Some("host"));
        assert_eq!(record.endpoint(), Some("2.2.0"));
        assert!(!record.is_host_sourced());
        assert_eq!(record.request_code(), None);
    }

    #[test]
    fn endpoint_ignores_direction() {
        let to_device = PacketRecord::new(frame("host", "2.7.0", "", 28, "0"));
        assert_eq!(to_device.endpoint(), Some("2.7.0"));
        assert!(to_device.is_host_sourced());

        let unaddressed = PacketRecord::new(json!({ "_source": { "layers": {} } }));
        assert_eq!(unaddressed.endpoint(), None);
    }

    #[test]
    fn reads_setup_data_in_either_nesting() {
        let sibling = PacketRecord::new(control_frame("host", "2.2.0", "", 36, "b2", "0x0012", "0x0034"));
        assert_eq!(sibling.request_code().as_deref(), Some("b2"));
        assert_eq!(sibling.w_value().as_deref(), Some("0012"));
        assert_eq!(sibling.w_index().as_deref(), Some("0034"));

        let nested = PacketRecord::new(json!({
            "_source": { "layers": { "usb": {
                "usb.src": "host",
                "usb.dst": "2.2.0",
                "Setup Data": {
                    "usb.setup.bRequest_raw": ["AD", 29, 1, 0, 4],
                    "usb.setup.wValue": "0",
                    "usb.setup.wIndex": "0x0001"
                }
            } } }
        }));
        assert_eq!(nested.request_code().as_deref(), Some("ad"));
        assert_eq!(nested.w_value().as_deref(), Some("0000"));
        assert_eq!(nested.w_index().as_deref(), Some("0001"));
    }

    #[test]
    fn numeric_timestamp() {
        let record = PacketRecord::new(json!({
            "_source": { "layers": { "frame": { "frame.time_relative": 1.5 } } }
        }));
        assert_eq!(record.timestamp(), Some(1.5));
    }

    #[test]
    fn malformed_fields_are_absent() {
        let record = PacketRecord::new(json!({
            "_source": { "layers": {
                "frame_raw": "not an array",
                "frame": { "frame.time_relative": "soon" },
                "usb": { "usb.src": 7 }
            } }
        }));
        assert_eq!(record.payload_hex(), None);
        assert_eq!(record.byte_length(), None);
        assert_eq!(record.timestamp(), None);
        assert_eq!(record.source(), None);
        assert_eq!(record.endpoint(), None);
    }

    #[test]
    fn parses_frame_array() {
        let store = PacketStore::from_json_str(
            r#"[{"_source": {"layers": {}}}, {"_source": {"layers": {}}}]"#,
        )
        .unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get(1).is_some());
        assert!(store.get(2).is_none());
    }

    #[test]
    fn rejects_non_capture_input() {
        assert!(matches!(
            PacketStore::from_json_str(r#"{"frames": []}"#),
            Err(LoadError::UnsupportedInput(_))
        ));
        assert!(matches!(
            PacketStore::from_json_str("[1, 2]"),
            Err(LoadError::UnsupportedInput(_))
        ));
        assert!(matches!(
            PacketStore::from_json_str("[{"),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn load_requires_json_extension() {
        assert!(matches!(
            PacketStore::load("capture.pcapng"),
            Err(LoadError::UnsupportedInput(_))
        ));
        assert!(matches!(
            PacketStore::load("/nonexistent/sharktooth/capture.json"),
            Err(LoadError::Io(_))
        ));
    }
}
