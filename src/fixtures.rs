//! Synthetic capture frames shaped like Wireshark's USBPcap JSON export.

use serde_json::{json, Value};

use crate::capture::PacketStore;

/// Returns a 27 byte USBPcap pseudo-header as hex.
fn pcap_header() -> String {
    format!("1b00{}", "00".repeat(25))
}

/// Raw bytes of a control setup stage with the given request type byte and request code.
pub fn setup_payload(request_type: &str, request: &str) -> String {
    format!("{}00{request_type}{request}000000000000", pcap_header())
}

pub fn frame(src: &str, dst: &str, payload: &str, len: u64, time: &str) -> Value {
    json!({
        "_index": "packets-2023-11-14",
        "_source": {
            "layers": {
                "frame_raw": [payload, 0, len, 0, 1],
                "frame": { "frame.time_relative": time },
                "usb": { "usb.src": src, "usb.dst": dst }
            }
        }
    })
}

pub fn control_frame(
    src: &str,
    dst: &str,
    payload: &str,
    len: u64,
    request: &str,
    w_value: &str,
    w_index: &str,
) -> Value {
    let mut value = frame(src, dst, payload, len, "0.000000000");
    value["_source"]["layers"]["Setup Data"] = json!({
        "usb.setup.bRequest_raw": [request, 29, 1, 0, 4],
        "usb.setup.wValue": w_value,
        "usb.setup.wIndex": w_index,
    });
    value
}

pub fn acquire_request(src: &str, dst: &str) -> Value {
    frame(src, dst, &setup_payload("40", "ad"), 36, "0.000000000")
}

pub fn bulk_read(src: &str, dst: &str, len: u64) -> Value {
    frame(src, dst, &format!("{}01{}", pcap_header(), "ff".repeat(8)), len, "0.000000000")
}

pub fn store(frames: Vec<Value>) -> PacketStore {
    PacketStore::from_json_value(Value::Array(frames)).unwrap()
}
