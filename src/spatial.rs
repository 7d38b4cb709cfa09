//! Spatial record representations and the rich↔compact converter.
//!
//! A [`SpatialRecord`] is the rich per-point form: meter values keyed by the
//! meter's reference id, each optionally carrying its own unit of measure. A
//! [`SerializableSpatialRecord`] is the compact on-disk form: values addressed
//! by position in an externally agreed, ordered meter index. The compact form
//! carries no units — a unit observed on a rich value is backfilled onto the
//! meter itself during conversion, which is why the export path must convert
//! spatial records *before* persisting meters.
//!
//! A meter absent from a point's compact encoding decodes to "not present"
//! (no entry in the rich value map), never to a default that could be
//! mistaken for a real zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DatacardError, Result};
use crate::model::{ReferenceId, WorkingData};

/// One measured value at one point, with its optional unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentationValue {
    /// The measured value.
    pub value: f64,
    /// Unit of measure code, e.g. `"kg1ha-1"`. Absent when the source device
    /// did not declare one.
    pub unit_of_measure: Option<String>,
}

impl RepresentationValue {
    /// A value with no declared unit.
    pub fn bare(value: f64) -> Self {
        Self {
            value,
            unit_of_measure: None,
        }
    }

    /// A value with a unit.
    pub fn with_unit(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit_of_measure: Some(unit.into()),
        }
    }
}

/// The rich per-point record: position, timestamp and meter values keyed by
/// meter reference id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    values: BTreeMap<ReferenceId, RepresentationValue>,
}

impl SpatialRecord {
    /// A record with no meter values yet.
    pub fn new(timestamp: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            values: BTreeMap::new(),
        }
    }

    /// Sets (or replaces) the value observed for `meter_id` at this point.
    pub fn set_meter_value(&mut self, meter_id: ReferenceId, value: RepresentationValue) {
        self.values.insert(meter_id, value);
    }

    /// The value observed for `meter` at this point, or `None` if the meter
    /// reported nothing here.
    pub fn meter_value(&self, meter: &WorkingData) -> Option<&RepresentationValue> {
        self.values.get(&meter.id)
    }

    /// Like [`SpatialRecord::meter_value`] but keyed by raw id.
    pub fn meter_value_by_id(&self, meter_id: ReferenceId) -> Option<&RepresentationValue> {
        self.values.get(&meter_id)
    }

    /// Number of meters with a value at this point.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}

/// One compact value: position of the meter in the agreed index, plus the
/// bare measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexedValue {
    /// Position of the owning meter in the flattened meter sequence.
    pub meter_index: u32,
    /// The measured value.
    pub value: f64,
}

/// The compact per-point form stored in the length-prefixed spatial stream.
///
/// Meters without a value at this point simply have no entry in `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableSpatialRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    /// Present meter values, in index order.
    pub values: Vec<IndexedValue>,
}

/// Iterator adapter converting rich records to compact ones against an
/// ordered meter snapshot.
///
/// Conversion is streaming so the export path never buffers the compact
/// sequence. As a side effect, a meter with no declared unit picks up the
/// unit of the first rich value observed for it; the caller persists the
/// snapshot *after* draining this iterator so the backfilled unit lands in
/// the meter file.
#[derive(Debug)]
pub struct ToSerializable<'a, I> {
    records: I,
    meters: &'a mut [WorkingData],
}

/// Starts a rich→compact conversion over `records` using `meters` as the
/// index space (slice order defines the indices).
pub fn to_serializable<I>(records: I, meters: &mut [WorkingData]) -> ToSerializable<'_, I::IntoIter>
where
    I: IntoIterator<Item = SpatialRecord>,
{
    ToSerializable {
        records: records.into_iter(),
        meters,
    }
}

impl<'a, I: Iterator<Item = SpatialRecord>> Iterator for ToSerializable<'a, I> {
    type Item = SerializableSpatialRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        let mut values = Vec::new();
        for (slot, meter) in self.meters.iter_mut().enumerate() {
            let Some(observed) = record.meter_value_by_id(meter.id) else {
                continue;
            };
            if meter.unit_of_measure.is_none() && observed.unit_of_measure.is_some() {
                meter.unit_of_measure = observed.unit_of_measure.clone();
            }
            values.push(IndexedValue {
                meter_index: slot as u32,
                value: observed.value,
            });
        }
        Some(SerializableSpatialRecord {
            timestamp: record.timestamp,
            latitude: record.latitude,
            longitude: record.longitude,
            values,
        })
    }
}

/// Converts one compact record back to the rich form.
///
/// `meters` must be the same ordered sequence the record was encoded against.
/// Restored values carry the owning meter's unit. An index past the end of
/// `meters` means the stream and the meter file disagree.
pub fn to_spatial_record(
    compact: &SerializableSpatialRecord,
    meters: &[WorkingData],
) -> Result<SpatialRecord> {
    let mut record = SpatialRecord::new(compact.timestamp, compact.latitude, compact.longitude);
    for indexed in &compact.values {
        let meter = meters.get(indexed.meter_index as usize).ok_or_else(|| {
            DatacardError::Format(format!(
                "spatial value references meter index {} but only {} meters are on record",
                indexed.meter_index,
                meters.len()
            ))
        })?;
        record.set_meter_value(
            meter.id,
            RepresentationValue {
                value: indexed.value,
                unit_of_measure: meter.unit_of_measure.clone(),
            },
        );
    }
    Ok(record)
}
