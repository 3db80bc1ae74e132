//! Post-processing for Wireshark captures of USB spectrometer traffic.
//!
//! Load a capture exported with *File > Export Packet Dissections > As JSON* (packet
//! bytes included, details all expanded) into a [`PacketStore`](capture::PacketStore),
//! find the spectrometer on the bus with [`classify_device`](classify::classify_device),
//! then decode its frames with [`decode_frame`](decode::decode_frame) or list them with
//! [`format_trace`](trace::format_trace).
//!
//! The [`DeviceSelection`](classify::DeviceSelection) produced by classification is an
//! ordinary value passed into every later call, so independent captures can be
//! processed side by side. [`Session`](session::Session) bundles a capture with its
//! selection for interactive use.

pub mod capture;
pub mod classify;
pub mod decode;
pub mod opcodes;
pub mod path;
pub mod session;
pub mod trace;

#[cfg(test)]
mod fixtures;

pub use capture::{LoadError, PacketRecord, PacketStore};
pub use classify::{classify_device, ClassificationError, DeviceSelection};
pub use decode::{decode_frame, relevant_frame_indices, Classification, DecodedFrame, Direction};
pub use session::{Session, SessionError};
pub use trace::{format_trace, TraceOptions};
