//! The top-level documents orchestrator.
//!
//! Write: ensure the documents directory exists, then persist each of the ten
//! collections independently — one file per element, named by its kind's
//! pattern and reference id. LoggedData is the only kind with structure: its
//! operation data are decomposed into auxiliary files before the record
//! itself is written.
//!
//! Read: if the documents directory is missing, the datacard has no
//! documents (`None`). Otherwise each kind is discovered by scanning the
//! directory against its pattern and decoding every match; every collection
//! comes back `Some`, possibly empty.

use std::fs;
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec;
use crate::error::Result;
use crate::model::{Documents, LoggedData, ReferenceId};
use crate::naming::{self, DirScan, FilePattern};
use crate::operation;

/// Persists `documents` under `<data_path>/documents`. `None` collections
/// are skipped; directory creation is idempotent.
pub(crate) fn write_documents(documents: &Documents, data_path: &Path) -> Result<()> {
    let documents_path = data_path.join(naming::DOCUMENTS_FOLDER);
    fs::create_dir_all(&documents_path)?;
    debug!("writing documents to {}", documents_path.display());

    write_logged_data(&documents.logged_data, &documents_path)?;
    write_collection(
        &documents.guidance_allocations,
        naming::GUIDANCE_ALLOCATION_FILE,
        &documents_path,
        |g| g.id,
    )?;
    write_collection(&documents.plans, naming::PLAN_FILE, &documents_path, |p| p.id)?;
    write_collection(
        &documents.recommendations,
        naming::RECOMMENDATION_FILE,
        &documents_path,
        |r| r.id,
    )?;
    write_collection(&documents.summaries, naming::SUMMARY_FILE, &documents_path, |s| s.id)?;
    write_collection(
        &documents.work_records,
        naming::WORK_RECORD_FILE,
        &documents_path,
        |w| w.id,
    )?;
    write_collection(
        &documents.work_item_operations,
        naming::WORK_ITEM_OPERATION_FILE,
        &documents_path,
        |w| w.id,
    )?;
    write_collection(&documents.work_items, naming::WORK_ITEM_FILE, &documents_path, |w| w.id)?;
    write_collection(
        &documents.work_orders,
        naming::WORK_ORDER_FILE,
        &documents_path,
        |w| w.id,
    )?;
    write_collection(&documents.loads, naming::LOAD_FILE, &documents_path, |l| l.id)
}

/// Reads the documents back, or `None` when the directory does not exist.
pub(crate) fn read_documents(data_path: &Path) -> Result<Option<Documents>> {
    let documents_path = data_path.join(naming::DOCUMENTS_FOLDER);
    if !documents_path.is_dir() {
        return Ok(None);
    }
    debug!("reading documents from {}", documents_path.display());

    let documents = Documents {
        logged_data: Some(read_logged_data(&documents_path)?),
        guidance_allocations: Some(read_collection(
            &documents_path,
            naming::GUIDANCE_ALLOCATION_FILE,
        )?),
        plans: Some(read_collection(&documents_path, naming::PLAN_FILE)?),
        recommendations: Some(read_collection(&documents_path, naming::RECOMMENDATION_FILE)?),
        summaries: Some(read_collection(&documents_path, naming::SUMMARY_FILE)?),
        work_records: Some(read_collection(&documents_path, naming::WORK_RECORD_FILE)?),
        work_item_operations: Some(read_collection(
            &documents_path,
            naming::WORK_ITEM_OPERATION_FILE,
        )?),
        work_items: Some(read_collection(&documents_path, naming::WORK_ITEM_FILE)?),
        work_orders: Some(read_collection(&documents_path, naming::WORK_ORDER_FILE)?),
        loads: Some(read_collection(&documents_path, naming::LOAD_FILE)?),
    };
    Ok(Some(documents))
}

/// Writes every element of a plain collection to its own file.
fn write_collection<T, F>(
    collection: &Option<Vec<T>>,
    pattern: FilePattern,
    documents_path: &Path,
    reference_id: F,
) -> Result<()>
where
    T: Serialize,
    F: Fn(&T) -> ReferenceId,
{
    let Some(elements) = collection else {
        return Ok(());
    };
    for element in elements {
        let path = pattern.file_path(documents_path, reference_id(element));
        codec::encode_to_file(element, &path)?;
    }
    Ok(())
}

/// Decodes every file matching `pattern`, in name order.
fn read_collection<T: DeserializeOwned>(documents_path: &Path, pattern: FilePattern) -> Result<Vec<T>> {
    let mut elements = Vec::new();
    for path in DirScan::new(documents_path, pattern).iter()? {
        elements.push(codec::decode_from_file(&path)?);
    }
    Ok(elements)
}

/// LoggedData write: decompose every operation's sub-graph first, then
/// persist the record itself.
fn write_logged_data(collection: &Option<Vec<LoggedData>>, documents_path: &Path) -> Result<()> {
    let Some(elements) = collection else {
        return Ok(());
    };
    for logged_data in elements {
        for operation_data in &logged_data.operation_data {
            operation::export_operation_data(operation_data, documents_path)?;
        }
        let path = naming::LOGGED_DATA_FILE.file_path(documents_path, logged_data.id);
        codec::encode_to_file(logged_data, &path)?;
    }
    Ok(())
}

/// LoggedData read: decode each record, then recompose every operation's
/// sub-graph by wiring its deferred accessors.
fn read_logged_data(documents_path: &Path) -> Result<Vec<LoggedData>> {
    let mut elements = Vec::new();
    for path in DirScan::new(documents_path, naming::LOGGED_DATA_FILE).iter()? {
        let mut logged_data: LoggedData = codec::decode_from_file(&path)?;
        for operation_data in &mut logged_data.operation_data {
            operation::import_operation_data(operation_data, documents_path)?;
        }
        elements.push(logged_data);
    }
    Ok(elements)
}
