//! Base codec behavior: whole-object files and length-prefixed streams.

#![allow(missing_docs)]

use datacard::codec::{self, FileBytes, StreamWriter};
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    seq: u32,
    payload: String,
}

#[test]
fn whole_object_files_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("record.adm");
    let record = Record {
        seq: 9,
        payload: "alpha".into(),
    };
    codec::encode_to_file(&record, &path).unwrap();
    let loaded: Record = codec::decode_from_file(&path).unwrap();
    assert_eq!(loaded, record);
}

#[test]
fn length_prefixed_stream_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stream.bin");

    let records: Vec<Record> = (0..100)
        .map(|seq| Record {
            seq,
            payload: format!("point {seq}"),
        })
        .collect();
    let mut writer = StreamWriter::create(&path).unwrap();
    writer.write_all_records(records.clone()).unwrap();

    let bytes = FileBytes::open(&path).unwrap();
    let decoded: Vec<Record> = codec::decode_stream(bytes.as_slice()).unwrap();
    assert_eq!(decoded, records);
}

#[test]
fn empty_stream_decodes_to_no_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    let mut writer = StreamWriter::create(&path).unwrap();
    writer.finish().unwrap();

    let bytes = FileBytes::open(&path).unwrap();
    assert!(bytes.as_slice().is_empty());
    let decoded: Vec<Record> = codec::decode_stream(bytes.as_slice()).unwrap();
    assert!(decoded.is_empty());
}

#[test]
fn truncated_stream_is_a_format_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("truncated.bin");
    let mut writer = StreamWriter::create(&path).unwrap();
    writer
        .write_all_records(vec![Record {
            seq: 1,
            payload: "x".into(),
        }])
        .unwrap();

    // Chop the tail off the single record's payload.
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 1);
    let decoded: Result<Vec<Record>, _> = codec::decode_stream(&bytes);
    assert!(decoded.is_err());

    // A dangling prefix with no payload at all is also rejected.
    let decoded: Result<Vec<Record>, _> = codec::decode_stream(&[0xFF, 0x00]);
    assert!(decoded.is_err());
}
