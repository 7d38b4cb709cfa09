//! Explicit loader states for the lazily reconstructed sub-graph.
//!
//! Instead of hidden mutable closures, every deferred field is a tagged
//! enum: `Unset` means the underlying file was never loaded ("unavailable"),
//! any other variant means loaded — possibly loaded empty. Callers check
//! [`is_set`](SectionAccessor::is_set) before invoking when the distinction
//! matters.
//!
//! Loaded variants hold either decoded values or an already-read byte buffer;
//! invoking an accessor never touches the file system. Decode and filter work
//! is repeated on every call — none of these memoize.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::codec::{self, FileBytes, StreamDecoder};
use crate::error::{DatacardError, Result};
use crate::model::{DeviceElementUse, ReferenceId, WorkingData};
use crate::spatial::{self, SerializableSpatialRecord, SpatialRecord};

/// Depth → ordered device-element-uses at that depth.
pub type SectionMap = BTreeMap<u32, Vec<DeviceElementUse>>;

/// Loader state for an operation's depth→uses mapping.
#[derive(Debug, Clone, Default)]
pub enum SectionAccessor {
    /// The section file was absent (or nothing was attached yet).
    #[default]
    Unset,
    /// The mapping is in memory. An empty map is still "loaded".
    Loaded(Arc<SectionMap>),
}

impl SectionAccessor {
    /// Wraps an in-memory mapping.
    pub fn from_map(map: SectionMap) -> Self {
        Self::Loaded(Arc::new(map))
    }

    /// False while the mapping is unavailable. "Unavailable" is not the same
    /// as "loaded empty".
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// The uses at `depth`. Unknown depths (and the unset state) yield an
    /// empty sequence.
    pub fn at_depth(&self, depth: u32) -> Vec<DeviceElementUse> {
        match self {
            Self::Unset => Vec::new(),
            Self::Loaded(map) => map.get(&depth).cloned().unwrap_or_default(),
        }
    }

    /// The shared mapping, if loaded.
    pub fn as_map(&self) -> Option<&Arc<SectionMap>> {
        match self {
            Self::Unset => None,
            Self::Loaded(map) => Some(map),
        }
    }
}

/// Loader state for one device-element-use's meters.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MeterAccessor {
    /// The meter file was absent (or nothing was attached yet).
    #[default]
    Unset,
    /// Meters attached directly, write-side.
    Loaded(Vec<WorkingData>),
    /// A filtered view over the operation's flattened meter sequence. The
    /// filter re-runs on every access; nothing is memoized.
    Filtered {
        /// The operation-wide flattened sequence, shared by every use.
        all: Arc<Vec<WorkingData>>,
        /// The owning use; only meters linked to it are visible.
        device_element_use_id: ReferenceId,
    },
}

impl MeterAccessor {
    /// False while the meters are unavailable.
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// This use's meters, in flattened-sequence order. The unset state yields
    /// an empty sequence.
    pub fn get(&self) -> Vec<WorkingData> {
        match self {
            Self::Unset => Vec::new(),
            Self::Loaded(meters) => meters.clone(),
            Self::Filtered {
                all,
                device_element_use_id,
            } => all
                .iter()
                .filter(|meter| meter.device_element_use_id == *device_element_use_id)
                .cloned()
                .collect(),
        }
    }
}

/// Loader state for an operation's spatial record stream.
#[derive(Debug, Clone, Default)]
pub enum SpatialAccessor {
    /// Neither spatial file was present (or nothing was attached yet).
    #[default]
    Unset,
    /// Records attached directly, write-side.
    Loaded(Arc<Vec<SpatialRecord>>),
    /// The compact length-prefixed stream, decoded through the meter index
    /// on every access.
    Compact {
        /// The already-read stream bytes.
        bytes: FileBytes,
        /// The ordered meter index the stream was encoded against.
        meters: Arc<Vec<WorkingData>>,
    },
    /// The legacy verbose stream, decoded directly with no index mapping.
    Legacy {
        /// The already-read stream bytes.
        bytes: FileBytes,
    },
}

impl SpatialAccessor {
    /// Wraps in-memory records.
    pub fn from_records(records: Vec<SpatialRecord>) -> Self {
        Self::Loaded(Arc::new(records))
    }

    /// False while the stream is unavailable. Check before calling
    /// [`records`](Self::records) when absence matters.
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// Decodes the full stream into rich records.
    ///
    /// Errors on the unset state; callers distinguish unavailable from empty
    /// via [`is_set`](Self::is_set).
    pub fn records(&self) -> Result<Vec<SpatialRecord>> {
        match self {
            Self::Unset => Err(DatacardError::Internal(
                "spatial accessor invoked while unset; call is_set() first".into(),
            )),
            Self::Loaded(records) => Ok(records.as_ref().clone()),
            Self::Compact { bytes, meters } => {
                StreamDecoder::<SerializableSpatialRecord>::new(bytes.as_slice())
                    .map(|compact| spatial::to_spatial_record(&compact?, meters))
                    .collect()
            }
            Self::Legacy { bytes } => codec::decode_stream(bytes.as_slice()),
        }
    }
}
