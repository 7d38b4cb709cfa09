//! The documents data model persisted to a datacard.
//!
//! [`Documents`] holds ten independent collections; each is `Option<Vec<T>>`
//! so "absent" (skipped on write) stays distinct from "present but empty".
//! Every element carries a [`ReferenceId`] unique within its kind, which
//! doubles as its file name key.
//!
//! [`OperationData`], [`DeviceElementUse`] and [`WorkingData`] form the
//! decomposed sub-graph: the device-element hierarchy and spatial stream are
//! reached through explicit loader-state accessors (see [`crate::access`]),
//! never serialized inline — serde skips those fields and the decomposer
//! persists them as separate files.

use serde::{Deserialize, Serialize};

use crate::access::{MeterAccessor, SectionAccessor, SpatialAccessor};

/// Stable integer identity, scoped to an entity kind.
pub type ReferenceId = i32;

/// Container of the ten independent document collections.
///
/// `None` collections are skipped on write. After a successful read every
/// collection is `Some` (possibly empty); a missing documents directory
/// yields no `Documents` at all rather than an empty one.
#[derive(Debug, Clone, Default)]
pub struct Documents {
    /// Logged field operations, each owning operation data.
    pub logged_data: Option<Vec<LoggedData>>,
    /// Guidance pattern allocations.
    pub guidance_allocations: Option<Vec<GuidanceAllocation>>,
    /// Planned work.
    pub plans: Option<Vec<Plan>>,
    /// Agronomic recommendations.
    pub recommendations: Option<Vec<Recommendation>>,
    /// Post-operation summaries.
    pub summaries: Option<Vec<Summary>>,
    /// Work records tying logged data together.
    pub work_records: Option<Vec<WorkRecord>>,
    /// Operations planned within work items.
    pub work_item_operations: Option<Vec<WorkItemOperation>>,
    /// Work items.
    pub work_items: Option<Vec<WorkItem>>,
    /// Work orders.
    pub work_orders: Option<Vec<WorkOrder>>,
    /// Harvested or applied loads.
    pub loads: Option<Vec<Load>>,
}

/// A logged field operation: the record persisted per `Document{id}.adm`
/// file, owning an ordered sequence of operation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedData {
    /// Reference id, unique among logged data.
    pub id: ReferenceId,
    /// Free-form description.
    pub description: Option<String>,
    /// The field this operation ran on, if known.
    pub field_id: Option<ReferenceId>,
    /// Ordered operation data entries. Their hierarchy, meters and spatial
    /// records live in the per-operation auxiliary files.
    pub operation_data: Vec<OperationData>,
}

/// One continuous operation within a logged record.
///
/// The three sub-graph roots (device hierarchy, per-use meters, spatial
/// stream) are independently settable loader states, skipped by serde: the
/// record file stores only the scalar fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationData {
    /// Reference id, unique among operation data; keys the auxiliary files.
    pub id: ReferenceId,
    /// Free-form description.
    pub description: Option<String>,
    /// Inclusive upper bound on hierarchy depth. Depths 0..=`max_depth` are
    /// queried during export.
    pub max_depth: u32,
    /// Depth → device-element-uses. Unset means unavailable, not empty.
    #[serde(skip)]
    pub device_element_uses: SectionAccessor,
    /// The per-point spatial stream. Unset means unavailable, not empty.
    #[serde(skip)]
    pub spatial_records: SpatialAccessor,
}

impl OperationData {
    /// An operation with no sub-graph attached yet.
    pub fn new(id: ReferenceId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// A node in the equipment hierarchy at a given depth, owning meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceElementUse {
    /// Reference id, unique among device element uses; meters link back to
    /// it via [`WorkingData::device_element_use_id`].
    pub id: ReferenceId,
    /// The equipment configuration element this use instantiates.
    pub device_element_id: ReferenceId,
    /// Depth of this node in the hierarchy.
    pub depth: u32,
    /// Position among siblings at the same depth.
    pub order: u32,
    /// This use's meters. Unset means unavailable, not empty.
    #[serde(skip)]
    pub working_data: MeterAccessor,
}

impl DeviceElementUse {
    /// A use with no meters attached yet.
    pub fn new(id: ReferenceId, device_element_id: ReferenceId, depth: u32, order: u32) -> Self {
        Self {
            id,
            device_element_id,
            depth,
            order,
            working_data: MeterAccessor::default(),
        }
    }
}

/// A meter: one named measurement channel attached to a device-element-use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingData {
    /// Reference id, unique among meters of one operation.
    pub id: ReferenceId,
    /// The owning device-element-use.
    pub device_element_use_id: ReferenceId,
    /// Representation code, e.g. `"vrYieldWetMass"`.
    pub representation: String,
    /// Unit of measure. May start absent and be backfilled from observed
    /// spatial values during export.
    pub unit_of_measure: Option<String>,
}

/// Allocation of a guidance pattern group to a field for a span of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceAllocation {
    /// Reference id, unique among guidance allocations.
    pub id: ReferenceId,
    /// The allocated guidance group.
    pub guidance_group_id: ReferenceId,
}

/// Planned work for a growing season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Reference id, unique among plans.
    pub id: ReferenceId,
    /// Free-form description.
    pub description: Option<String>,
}

/// An agronomic recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Reference id, unique among recommendations.
    pub id: ReferenceId,
    /// Free-form description.
    pub description: Option<String>,
}

/// Post-operation summary notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Reference id, unique among summaries.
    pub id: ReferenceId,
    /// The summarized work record, if any.
    pub work_record_id: Option<ReferenceId>,
    /// Operator notes.
    pub notes: Vec<String>,
}

/// Groups logged data belonging to one piece of performed work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    /// Reference id, unique among work records.
    pub id: ReferenceId,
    /// Free-form description.
    pub description: Option<String>,
    /// Logged data produced under this record.
    pub logged_data_ids: Vec<ReferenceId>,
}

/// An operation planned within a work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemOperation {
    /// Reference id, unique among work item operations.
    pub id: ReferenceId,
    /// Free-form description.
    pub description: Option<String>,
}

/// A unit of planned work within a work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Reference id, unique among work items.
    pub id: ReferenceId,
    /// The owning work order, if any.
    pub work_order_id: Option<ReferenceId>,
}

/// An order for work to be performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Reference id, unique among work orders.
    pub id: ReferenceId,
    /// Free-form description.
    pub description: Option<String>,
}

/// A harvested or applied load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    /// Reference id, unique among loads.
    pub id: ReferenceId,
    /// Free-form description.
    pub description: Option<String>,
    /// Total quantity moved, in the load's unit.
    pub load_quantity: Option<f64>,
}
