//! Human readable listings of decoded frames.

use std::fmt;

use crate::{
    capture::PacketStore,
    classify::DeviceSelection,
    decode::{decode_frame, relevant_frame_indices, DecodedFrame},
};

/// Stand-in for a field a frame did not carry.
pub const PLACEHOLDER: &str = "??";

/// Paging and filtering for [`format_trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TraceOptions {
    /// Number of relevant frames to skip.
    pub offset: usize,
    /// Maximum number of relevant frames to consider. Zero means no limit.
    pub count: usize,
    /// Leave out frames that could not be identified.
    pub skip_unknown: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            count: 0,
            skip_unknown: true,
        }
    }
}

impl TraceOptions {
    pub fn page(offset: usize, count: usize) -> Self {
        Self {
            offset,
            count,
            ..Default::default()
        }
    }
}

/// Decodes a window of the selected device's frames.
///
/// The window is taken over relevant frames before unknown frames are elided, so a
/// page may contain fewer than `count` records.
pub fn decode_trace(
    store: &PacketStore,
    selection: &DeviceSelection,
    options: &TraceOptions,
) -> Vec<DecodedFrame> {
    let limit = match options.count {
        0 => usize::MAX,
        count => count,
    };

    relevant_frame_indices(store, selection)
        .into_iter()
        .skip(options.offset)
        .take(limit)
        .filter_map(|index| decode_frame(store, index, selection, !options.skip_unknown))
        .collect()
}

/// Renders a window of the selected device's frames, one line per frame.
pub fn format_trace(
    store: &PacketStore,
    selection: &DeviceSelection,
    options: &TraceOptions,
) -> Vec<String> {
    decode_trace(store, selection, options)
        .iter()
        .map(DecodedFrame::to_string)
        .collect()
}

impl fmt::Display for DecodedFrame {
    /// `<index> <time> <classification> [<DIRECTION>] <N> bytes` followed by whichever
    /// of `value_raw=`, `index_raw=` and `value=` are present.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.frame_index)?;
        match self.timestamp {
            Some(time) => write!(f, "{time:.9}")?,
            None => f.write_str(PLACEHOLDER)?,
        }
        write!(f, " {} [{}] ", self.classification, self.direction)?;
        match self.byte_length {
            Some(len) => write!(f, "{len} bytes")?,
            None => write!(f, "{PLACEHOLDER} bytes")?,
        }

        if let Some(value_raw) = &self.value_raw {
            write!(f, " value_raw={value_raw}")?;
        }
        if let Some(index_raw) = &self.index_raw {
            write!(f, " index_raw={index_raw}")?;
        }
        if let Some(value) = self.combined_value {
            write!(f, " value={value}")?;
        }
        Ok(())
    }
}
