//! Core decomposer/recomposer round trips: hierarchy, meter flattening and
//! filtering, spatial encoding, unit backfill and the legacy fallback.

#![allow(missing_docs)]

use datacard::access::{MeterAccessor, SectionAccessor, SectionMap, SpatialAccessor};
use datacard::codec::StreamWriter;
use datacard::{
    Datacard, DeviceElementUse, Documents, LoggedData, OperationData, RepresentationValue,
    SpatialRecord, WorkingData,
};
use tempfile::tempdir;

fn meter(id: i32, use_id: i32, representation: &str, unit: Option<&str>) -> WorkingData {
    WorkingData {
        id,
        device_element_use_id: use_id,
        representation: representation.into(),
        unit_of_measure: unit.map(str::to_owned),
    }
}

fn use_with_meters(
    id: i32,
    device_element_id: i32,
    depth: u32,
    order: u32,
    meters: Vec<WorkingData>,
) -> DeviceElementUse {
    let mut device_element_use = DeviceElementUse::new(id, device_element_id, depth, order);
    device_element_use.working_data = MeterAccessor::Loaded(meters);
    device_element_use
}

/// Machine at depth 0, two sections at depth 1, one row unit at depth 2.
fn sample_operation() -> OperationData {
    let mut sections = SectionMap::new();
    sections.insert(
        0,
        vec![use_with_meters(
            100,
            10,
            0,
            0,
            vec![meter(1000, 100, "vrYieldWetMass", None)],
        )],
    );
    sections.insert(
        1,
        vec![
            use_with_meters(
                110,
                11,
                1,
                0,
                vec![
                    meter(1100, 110, "vrAppRateVolume", Some("l1ha-1")),
                    meter(1101, 110, "vrSectionStatus", None),
                ],
            ),
            use_with_meters(111, 12, 1, 1, vec![meter(1110, 111, "vrSectionStatus", None)]),
        ],
    );
    sections.insert(2, vec![use_with_meters(120, 13, 2, 0, Vec::new())]);

    let mut point_a = SpatialRecord::new(1_700_000_000_000, 44.92, -93.21);
    point_a.set_meter_value(1000, RepresentationValue::with_unit(182.4, "kg1ha-1"));
    point_a.set_meter_value(1100, RepresentationValue::with_unit(12.1, "gal1ac-1"));
    point_a.set_meter_value(1101, RepresentationValue::bare(1.0));
    let mut point_b = SpatialRecord::new(1_700_000_001_000, 44.93, -93.21);
    point_b.set_meter_value(1000, RepresentationValue::with_unit(179.9, "kg1ha-1"));
    point_b.set_meter_value(1110, RepresentationValue::bare(0.0));

    let mut operation = OperationData::new(7);
    operation.max_depth = 2;
    operation.device_element_uses = SectionAccessor::from_map(sections);
    operation.spatial_records = SpatialAccessor::from_records(vec![point_a, point_b]);
    operation
}

fn save_and_load(operation: OperationData) -> LoggedData {
    let documents = Documents {
        logged_data: Some(vec![LoggedData {
            id: 1,
            description: None,
            field_id: None,
            operation_data: vec![operation],
        }]),
        ..Documents::default()
    };
    let card = tempdir().unwrap();
    Datacard::save(card.path(), Some(&documents)).unwrap();
    let mut loaded = Datacard::load(card.path()).unwrap().unwrap();
    loaded.logged_data.take().unwrap().remove(0)
}

#[test]
fn hierarchy_round_trips_per_depth() {
    let logged = save_and_load(sample_operation());
    let operation = &logged.operation_data[0];
    assert_eq!(operation.id, 7);
    assert_eq!(operation.max_depth, 2);

    assert!(operation.device_element_uses.is_set());
    let ids_at = |depth: u32| -> Vec<i32> {
        operation
            .device_element_uses
            .at_depth(depth)
            .iter()
            .map(|u| u.id)
            .collect()
    };
    assert_eq!(ids_at(0), vec![100]);
    assert_eq!(ids_at(1), vec![110, 111]);
    assert_eq!(ids_at(2), vec![120]);
    assert_eq!(ids_at(9), Vec::<i32>::new());
}

#[test]
fn meters_are_filtered_to_their_owning_use() {
    let logged = save_and_load(sample_operation());
    let operation = &logged.operation_data[0];

    let uses = operation.device_element_uses.at_depth(1);
    let first: Vec<i32> = uses[0].working_data.get().iter().map(|m| m.id).collect();
    let second: Vec<i32> = uses[1].working_data.get().iter().map(|m| m.id).collect();
    assert_eq!(first, vec![1100, 1101]);
    assert_eq!(second, vec![1110]);

    let depth_two = operation.device_element_uses.at_depth(2);
    assert!(depth_two[0].working_data.is_set());
    assert!(depth_two[0].working_data.get().is_empty());
}

#[test]
fn flattened_meter_file_is_ordered_depth_then_use_then_meter() {
    let documents = Documents {
        logged_data: Some(vec![LoggedData {
            id: 1,
            description: None,
            field_id: None,
            operation_data: vec![sample_operation()],
        }]),
        ..Documents::default()
    };
    let card = tempdir().unwrap();
    Datacard::save(card.path(), Some(&documents)).unwrap();

    let meter_file = card.path().join("documents").join("Meter7.adm");
    let flat: Vec<WorkingData> = datacard::codec::decode_from_file(&meter_file).unwrap();
    let ids: Vec<i32> = flat.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1000, 1100, 1101, 1110]);
}

#[test]
fn spatial_values_round_trip_per_meter() {
    let logged = save_and_load(sample_operation());
    let operation = &logged.operation_data[0];

    assert!(operation.spatial_records.is_set());
    let records = operation.spatial_records.records().unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].timestamp, 1_700_000_000_000);
    assert_eq!(records[0].meter_value_by_id(1000).unwrap().value, 182.4);
    assert_eq!(records[0].meter_value_by_id(1100).unwrap().value, 12.1);
    assert_eq!(records[0].meter_value_by_id(1101).unwrap().value, 1.0);
    // Meter 1110 reported nothing at the first point: explicitly not
    // present, never a zero.
    assert!(records[0].meter_value_by_id(1110).is_none());

    assert_eq!(records[1].meter_value_by_id(1000).unwrap().value, 179.9);
    assert_eq!(records[1].meter_value_by_id(1110).unwrap().value, 0.0);
}

#[test]
fn decode_work_repeats_but_results_are_identical() {
    let logged = save_and_load(sample_operation());
    let operation = &logged.operation_data[0];
    let first = operation.spatial_records.records().unwrap();
    let second = operation.spatial_records.records().unwrap();
    assert_eq!(first, second);
}

#[test]
fn backfilled_unit_lands_in_meter_file_without_mutating_caller() {
    let operation = sample_operation();
    let documents = Documents {
        logged_data: Some(vec![LoggedData {
            id: 1,
            description: None,
            field_id: None,
            operation_data: vec![operation],
        }]),
        ..Documents::default()
    };
    let card = tempdir().unwrap();
    Datacard::save(card.path(), Some(&documents)).unwrap();

    // The caller's graph is untouched: meter 1000 still has no unit.
    let caller_op = &documents.logged_data.as_ref().unwrap()[0].operation_data[0];
    let caller_uses = caller_op.device_element_uses.at_depth(0);
    let caller_meters = caller_uses[0].working_data.get();
    assert_eq!(caller_meters[0].id, 1000);
    assert!(caller_meters[0].unit_of_measure.is_none());

    // The persisted meter carries the unit observed in the spatial stream.
    let meter_file = card.path().join("documents").join("Meter7.adm");
    let flat: Vec<WorkingData> = datacard::codec::decode_from_file(&meter_file).unwrap();
    assert_eq!(flat[0].id, 1000);
    assert_eq!(flat[0].unit_of_measure.as_deref(), Some("kg1ha-1"));

    // A declared unit is never overwritten by an observed one.
    assert_eq!(flat[1].id, 1100);
    assert_eq!(flat[1].unit_of_measure.as_deref(), Some("l1ha-1"));

    // And the reconstructed spatial values carry the backfilled unit.
    let loaded = Datacard::load(card.path()).unwrap().unwrap();
    let records = loaded.logged_data.unwrap()[0].operation_data[0]
        .spatial_records
        .records()
        .unwrap();
    assert_eq!(
        records[0].meter_value_by_id(1000).unwrap().unit_of_measure.as_deref(),
        Some("kg1ha-1")
    );
}

#[test]
fn empty_compact_stream_is_written_even_without_spatial_data() {
    let mut operation = OperationData::new(3);
    operation.max_depth = 0;
    let documents = Documents {
        logged_data: Some(vec![LoggedData {
            id: 1,
            description: None,
            field_id: None,
            operation_data: vec![operation],
        }]),
        ..Documents::default()
    };
    let card = tempdir().unwrap();
    Datacard::save(card.path(), Some(&documents)).unwrap();

    let stream = card.path().join("documents").join("SpatialRecords3.bin");
    assert!(stream.is_file());
    assert_eq!(std::fs::metadata(&stream).unwrap().len(), 0);

    // Read side: the stream is present, so the accessor is loaded-empty.
    let loaded = Datacard::load(card.path()).unwrap().unwrap();
    let operation = &loaded.logged_data.unwrap()[0].operation_data[0];
    assert!(operation.spatial_records.is_set());
    assert!(operation.spatial_records.records().unwrap().is_empty());
}

#[test]
fn legacy_spatial_file_is_used_when_compact_stream_is_absent() {
    let card = tempdir().unwrap();
    let documents_path = card.path().join("documents");
    std::fs::create_dir_all(&documents_path).unwrap();

    // A datacard produced by an older exporter: the logged-data record and a
    // verbose per-point stream, no compact file, no section or meter files.
    let logged = LoggedData {
        id: 4,
        description: None,
        field_id: None,
        operation_data: vec![OperationData::new(9)],
    };
    datacard::codec::encode_to_file(&logged, &documents_path.join("Document4.adm")).unwrap();

    let mut point = SpatialRecord::new(1_600_000_000_000, 51.5, -0.1);
    point.set_meter_value(1, RepresentationValue::with_unit(3.5, "t1ha-1"));
    let mut writer = StreamWriter::create(&documents_path.join("OperationData9.adm")).unwrap();
    writer.write_all_records(vec![point.clone()]).unwrap();

    let loaded = Datacard::load(card.path()).unwrap().unwrap();
    let operation = &loaded.logged_data.unwrap()[0].operation_data[0];

    // No section file: the hierarchy is unavailable, not empty.
    assert!(!operation.device_element_uses.is_set());

    // But the legacy stream decodes directly, with no index mapping.
    assert!(operation.spatial_records.is_set());
    assert_eq!(operation.spatial_records.records().unwrap(), vec![point]);
}

#[test]
fn unset_accessors_signal_unavailable_not_empty() {
    let operation = OperationData::new(1);
    assert!(!operation.device_element_uses.is_set());
    assert!(!operation.spatial_records.is_set());
    // Depth queries degrade to empty, but invoking the spatial accessor
    // while unset is a contract violation and errors.
    assert!(operation.device_element_uses.at_depth(0).is_empty());
    assert!(operation.spatial_records.records().is_err());
}
