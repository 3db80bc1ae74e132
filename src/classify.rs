//! Identifies the spectrometer's USB endpoints from its traffic.
//!
//! A capture contains everything on the bus, so the instrument has to be found by what
//! it does rather than configured up front. Two fingerprints are used:
//!
//! - acquisition requests, a vendor control transfer with request `0xAD` and zero
//!   `wValue`/`wIndex`, which appear as [`ACQUIRE_FINGERPRINT`] in the raw frame;
//! - spectrum readouts, bulk transfers of at least [`BULK_READ_MIN_LEN`] bytes.
//!
//! Exactly one endpoint must match each fingerprint. Captures with several
//! spectrometers attached are not supported.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use thiserror::Error;

use crate::capture::PacketStore;

/// Raw frame bytes of an acquisition setup stage: no data stage, request `0xAD`,
/// zero `wValue` and `wIndex`.
pub const ACQUIRE_FINGERPRINT: &str = "0040ad0000";

/// Smallest frame length treated as a full spectrum readout.
///
/// This is above the raw pixel payload of the smallest detectors once USB framing
/// overhead is included.
pub const BULK_READ_MIN_LEN: u64 = 2075;

/// The pair of endpoints a spectrometer communicates through.
///
/// The two addresses may be equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceSelection {
    command_address: String,
    bulk_address: String,
}

impl DeviceSelection {
    pub fn new(command_address: impl Into<String>, bulk_address: impl Into<String>) -> Self {
        Self {
            command_address: command_address.into(),
            bulk_address: bulk_address.into(),
        }
    }

    /// Endpoint that issued acquisition requests.
    pub fn command_address(&self) -> &str {
        &self.command_address
    }

    /// Endpoint that carried spectrum readouts.
    pub fn bulk_address(&self) -> &str {
        &self.bulk_address
    }

    /// Whether `endpoint` belongs to the selected device.
    pub fn contains(&self, endpoint: &str) -> bool {
        endpoint == self.command_address || endpoint == self.bulk_address
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Was not able to identify a single operating spectrometer. Found acquisition requests from {command_addresses:?} and bulk reads from {bulk_addresses:?}"
)]
pub struct ClassificationError {
    /// Distinct endpoints that made acquisition requests, sorted.
    pub command_addresses: Vec<String>,
    /// Distinct endpoints that made bulk reads, sorted.
    pub bulk_addresses: Vec<String>,
}

impl ClassificationError {
    /// No endpoint matched at least one of the fingerprints.
    pub fn is_absent(&self) -> bool {
        self.command_addresses.is_empty() || self.bulk_addresses.is_empty()
    }

    /// More than one endpoint matched at least one of the fingerprints.
    pub fn is_ambiguous(&self) -> bool {
        self.command_addresses.len() > 1 || self.bulk_addresses.len() > 1
    }
}

/// Finds the spectrometer's command and bulk endpoints.
///
/// Frames matching a fingerprint but lacking a usable endpoint are ignored.
///
/// # Errors
///
/// Returns a [`ClassificationError`] unless exactly one endpoint matches each fingerprint.
pub fn classify_device(store: &PacketStore) -> Result<DeviceSelection, ClassificationError> {
    let mut command_addresses = BTreeSet::new();
    let mut bulk_addresses = BTreeSet::new();

    for record in store.iter() {
        let is_acquire_request = record
            .payload_hex()
            .is_some_and(|hex| hex.to_ascii_lowercase().contains(ACQUIRE_FINGERPRINT));
        if is_acquire_request {
            if let Some(endpoint) = record.endpoint() {
                command_addresses.insert(endpoint);
            }
        }
    }

    for record in store.iter() {
        let is_bulk_read = record
            .byte_length()
            .is_some_and(|len| len >= BULK_READ_MIN_LEN);
        if is_bulk_read {
            if let Some(endpoint) = record.endpoint() {
                bulk_addresses.insert(endpoint);
            }
        }
    }

    debug!(
        "Found {} acquisition request endpoint(s) and {} bulk read endpoint(s) in {} frames",
        command_addresses.len(),
        bulk_addresses.len(),
        store.len()
    );

    match (command_addresses.len(), bulk_addresses.len()) {
        (1, 1) => {
            let selection = DeviceSelection::new(
                command_addresses.into_iter().next().unwrap_or_default(),
                bulk_addresses.into_iter().next().unwrap_or_default(),
            );
            info!(
                "Successfully selected spectrometer (command {}, bulk {})",
                selection.command_address(),
                selection.bulk_address()
            );
            Ok(selection)
        }
        _ => {
            let err = ClassificationError {
                command_addresses: command_addresses.into_iter().map(str::to_string).collect(),
                bulk_addresses: bulk_addresses.into_iter().map(str::to_string).collect(),
            };
            warn!("{err}");
            Err(err)
        }
    }
}
