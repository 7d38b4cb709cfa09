//! # Datacard
//!
//! Directory-based persistence for a hierarchical agricultural-operations
//! data model. A *datacard* is one directory holding a `documents/` folder;
//! each entity instance becomes one file named by its kind and reference id,
//! and each logged operation's sub-graph (device-element hierarchy → meter
//! channels → per-point spatial measurements) is decomposed into a small set
//! of auxiliary files and recomposed lazily on read.
//!
//! ## Overview
//!
//! The write path flattens the operation-data graph: the device hierarchy is
//! collected per depth, every use's meters are flattened into one ordered
//! sequence, and the (potentially very large) spatial stream is converted to
//! a compact, meter-index-addressed encoding persisted through a
//! length-prefixed stream writer so peak memory stays bounded.
//!
//! The read path goes the other way without eagerly materializing anything
//! beyond the top records: the hierarchy, meters and spatial stream are
//! reattached as explicit loader-state accessors
//! ([`access::SectionAccessor`], [`access::MeterAccessor`],
//! [`access::SpatialAccessor`]) that decode from already-read buffers on
//! each invocation. From the caller's perspective lazy reconstruction
//! behaves exactly like eager reconstruction; an accessor left `Unset`
//! signals that the backing file was absent, which is distinct from "loaded
//! empty".
//!
//! ## Usage
//!
//! ```rust,no_run
//! use datacard::{Datacard, Documents, LoggedData};
//!
//! let documents = Documents {
//!     logged_data: Some(vec![LoggedData {
//!         id: 1,
//!         description: Some("harvest, north field".into()),
//!         field_id: None,
//!         operation_data: Vec::new(),
//!     }]),
//!     ..Documents::default()
//! };
//!
//! Datacard::save("/cards/card0", Some(&documents))?;
//! let loaded = Datacard::load("/cards/card0")?.expect("documents present");
//! # Ok::<(), datacard::DatacardError>(())
//! ```
//!
//! ## On-disk layout
//!
//! ```text
//! <root>/documents/
//!   Document{id}.adm            one per LoggedData
//!   Plan{id}.adm, Load{id}.adm, ...   one per entity of each kind
//!   Section{id}.adm             depth → device-element-uses, per operation
//!   Meter{id}.adm               flattened meter sequence, per operation
//!   SpatialRecords{id}.bin      compact length-prefixed spatial stream
//!   OperationData{id}.adm       legacy verbose stream (read fallback only)
//! ```
//!
//! No manifest enumerates files; readers discover members by pattern
//! matching, so stray files matching a pattern are included and anything
//! else is silently ignored.
//!
//! ## Safety and Error Handling
//!
//! * `unsafe` appears once, to memory-map spatial stream files; the map is
//!   read-only and the concurrency model assumes no concurrent writer.
//! * No `unwrap()` or `panic!()` in the library (enforced by clippy lints);
//!   every failure surfaces as a [`DatacardError`].
//! * File-system failures propagate unmodified; there is no retry and no
//!   partial-write rollback.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod access;
pub mod codec;
pub mod error;
pub mod naming;
pub mod spatial;

mod api;
mod documents;
mod model;
mod operation;

pub use api::Datacard;
pub use error::{DatacardError, Result};
pub use model::{
    DeviceElementUse, Documents, GuidanceAllocation, Load, LoggedData, OperationData, Plan,
    Recommendation, ReferenceId, Summary, WorkItem, WorkItemOperation, WorkOrder, WorkRecord,
    WorkingData,
};
pub use spatial::{RepresentationValue, SerializableSpatialRecord, SpatialRecord};
