//! A loaded capture together with the device selected from it.
//!
//! This is the state an interactive front end works against: load once, select the
//! spectrometer, then page through its traffic. Every query made before a successful
//! selection fails with [`SessionError::NotSelected`].

use std::path::Path;

use thiserror::Error;

use crate::{
    capture::{LoadError, PacketRecord, PacketStore},
    classify::{classify_device, ClassificationError, DeviceSelection},
    decode::{decode_frame, relevant_frame_indices, relevant_packets, DecodedFrame},
    trace::{decode_trace, format_trace, TraceOptions},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Spectrometer has not yet been selected")]
    NotSelected,
    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    store: PacketStore,
    selection: Option<DeviceSelection>,
}

impl Session {
    pub fn new(store: PacketStore) -> Self {
        Self {
            store,
            selection: None,
        }
    }

    /// Loads a capture export from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Ok(Self::new(PacketStore::load(path)?))
    }

    pub fn store(&self) -> &PacketStore {
        &self.store
    }

    /// Scans the capture for a spectrometer and makes it the subject of later queries.
    ///
    /// A failed scan clears any earlier selection.
    pub fn select_device(&mut self) -> Result<&DeviceSelection, SessionError> {
        self.selection = None;
        let selection = classify_device(&self.store)?;
        Ok(self.selection.insert(selection))
    }

    /// The currently selected device.
    pub fn selection(&self) -> Result<&DeviceSelection, SessionError> {
        self.selection.as_ref().ok_or(SessionError::NotSelected)
    }

    pub fn relevant_frame_indices(&self) -> Result<Vec<usize>, SessionError> {
        Ok(relevant_frame_indices(&self.store, self.selection()?))
    }

    pub fn relevant_packets(&self) -> Result<Vec<&PacketRecord>, SessionError> {
        Ok(relevant_packets(&self.store, self.selection()?))
    }

    pub fn decode_frame(
        &self,
        frame_index: usize,
        full_decode: bool,
    ) -> Result<Option<DecodedFrame>, SessionError> {
        Ok(decode_frame(
            &self.store,
            frame_index,
            self.selection()?,
            full_decode,
        ))
    }

    pub fn decode_trace(&self, options: &TraceOptions) -> Result<Vec<DecodedFrame>, SessionError> {
        Ok(decode_trace(&self.store, self.selection()?, options))
    }

    pub fn format_trace(&self, options: &TraceOptions) -> Result<Vec<String>, SessionError> {
        Ok(format_trace(&self.store, self.selection()?, options))
    }
}
