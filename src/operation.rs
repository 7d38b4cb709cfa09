//! The OperationData decomposer/recomposer.
//!
//! **Export** flattens one operation's sub-graph into three files keyed by
//! the operation's reference id: the depth→uses map (`Section{id}.adm`), the
//! flattened meter sequence (`Meter{id}.adm`) and the compact spatial stream
//! (`SpatialRecords{id}.bin`). Everything is copied into an export snapshot
//! first — the caller's graph is never mutated, including by unit backfill.
//!
//! **Import** rebuilds the sub-graph from those files, wiring loader-state
//! accessors over already-read buffers instead of materializing eagerly, and
//! falling back to the legacy verbose stream (`OperationData{id}.adm`) when
//! the compact file is absent.
//!
//! Two orderings here are load-bearing:
//!
//! - The flattened meter sequence is ordered by ascending depth, then use
//!   order within a depth, then each use's own meter order. That sequence is
//!   the index space of the compact spatial encoding; writer and reader must
//!   derive it identically.
//! - Spatial records are converted and persisted *before* the meter file is
//!   written, because conversion backfills missing meter units and the
//!   persisted meters must carry them.

use std::path::Path;
use std::sync::Arc;

use log::trace;

use crate::access::{MeterAccessor, SectionAccessor, SectionMap, SpatialAccessor};
use crate::codec::{self, FileBytes, StreamWriter};
use crate::error::Result;
use crate::model::{OperationData, WorkingData};
use crate::naming;
use crate::spatial;

/// Decomposes one operation into its auxiliary files under `documents_path`.
pub(crate) fn export_operation_data(
    operation: &OperationData,
    documents_path: &Path,
) -> Result<()> {
    trace!("exporting operation data {}", operation.id);
    let sections = collect_sections(operation);
    let mut meters = flatten_meters(&sections);
    // Order matters: converting the spatial stream backfills meter units, so
    // it must complete before the meter snapshot is persisted.
    export_spatial_records(operation, &mut meters, documents_path)?;
    export_sections_and_meters(operation, &sections, &meters, documents_path)
}

/// Queries the depth accessor for every depth 0..=max_depth.
///
/// An unset accessor yields an empty map, not an error.
fn collect_sections(operation: &OperationData) -> SectionMap {
    let mut sections = SectionMap::new();
    if !operation.device_element_uses.is_set() {
        return sections;
    }
    for depth in 0..=operation.max_depth {
        sections.insert(depth, operation.device_element_uses.at_depth(depth));
    }
    sections
}

/// Flattens every use's meters into the operation-wide ordered snapshot.
///
/// `SectionMap` iterates in ascending depth; uses keep their in-depth order;
/// each use's meters keep their own order. The resulting sequence defines the
/// compact spatial encoding's index space.
fn flatten_meters(sections: &SectionMap) -> Vec<WorkingData> {
    sections
        .values()
        .flatten()
        .flat_map(|device_element_use| device_element_use.working_data.get())
        .collect()
}

/// Converts and persists the spatial stream, backfilling units into the
/// meter snapshot as a side effect.
///
/// The compact file is written unconditionally — an unset accessor produces
/// an empty stream — so write and read stay symmetric.
fn export_spatial_records(
    operation: &OperationData,
    meters: &mut [WorkingData],
    documents_path: &Path,
) -> Result<()> {
    let path = naming::SPATIAL_RECORDS_FILE.file_path(documents_path, operation.id);
    let mut writer = StreamWriter::create(&path)?;
    if !operation.spatial_records.is_set() {
        return writer.finish();
    }
    let records = operation.spatial_records.records()?;
    let compact = spatial::to_serializable(records, meters);
    writer.write_all_records(compact)
}

fn export_sections_and_meters(
    operation: &OperationData,
    sections: &SectionMap,
    meters: &[WorkingData],
    documents_path: &Path,
) -> Result<()> {
    let section_path = naming::SECTION_FILE.file_path(documents_path, operation.id);
    codec::encode_to_file(sections, &section_path)?;
    let meter_path = naming::WORKING_DATA_FILE.file_path(documents_path, operation.id);
    codec::encode_to_file(&meters, &meter_path)
}

/// Recomposes one operation's sub-graph from its auxiliary files, wiring
/// deferred accessors in strict order: sections, then meters, then spatial.
pub(crate) fn import_operation_data(
    operation: &mut OperationData,
    documents_path: &Path,
) -> Result<()> {
    trace!("importing operation data {}", operation.id);

    // 1. Depth→uses map. An absent file leaves the accessor unset so callers
    //    can tell "unavailable" from "loaded empty".
    let section_path = naming::SECTION_FILE.file_path(documents_path, operation.id);
    let mut sections: Option<SectionMap> = if section_path.is_file() {
        Some(codec::decode_from_file(&section_path)?)
    } else {
        None
    };

    // 2. Flattened meters, decoded once and shared. Every use in the map gets
    //    a filtered view keyed by its own reference id; the filter re-runs on
    //    each access.
    let meter_path = naming::WORKING_DATA_FILE.file_path(documents_path, operation.id);
    let meters_available = meter_path.is_file();
    let meters: Arc<Vec<WorkingData>> = if meters_available {
        Arc::new(codec::decode_from_file(&meter_path)?)
    } else {
        Arc::new(Vec::new())
    };
    if meters_available {
        if let Some(map) = sections.as_mut() {
            for device_element_use in map.values_mut().flatten() {
                device_element_use.working_data = MeterAccessor::Filtered {
                    all: Arc::clone(&meters),
                    device_element_use_id: device_element_use.id,
                };
            }
        }
    }
    if let Some(map) = sections {
        operation.device_element_uses = SectionAccessor::from_map(map);
    }

    // 3. Spatial stream: prefer the compact file, fall back to the legacy
    //    verbose one; with neither present the accessor stays unset.
    let compact_path = naming::SPATIAL_RECORDS_FILE.file_path(documents_path, operation.id);
    if compact_path.is_file() {
        operation.spatial_records = SpatialAccessor::Compact {
            bytes: FileBytes::open(&compact_path)?,
            meters,
        };
    } else {
        let legacy_path = naming::OPERATION_DATA_FILE.file_path(documents_path, operation.id);
        if legacy_path.is_file() {
            operation.spatial_records = SpatialAccessor::Legacy {
                bytes: FileBytes::open(&legacy_path)?,
            };
        }
    }
    Ok(())
}
