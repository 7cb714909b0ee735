// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end routing through an entity: threshold, fan-out, bus and file.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::unbounded;
use logship::Entity;
use logship::RecordMeta;
use logship::Severity;
use logship::SinkHandle;
use logship::Trunk;
use logship::sink::testing::CaptureSink;
use logship::sink::testing::FlakySink;
use tempfile::TempDir;

fn raw_format(_meta: &RecordMeta<'_>, message: &str) -> Vec<u8> {
    message.as_bytes().to_vec()
}

#[test]
fn test_threshold_applies_across_severities() {
    let capture = Arc::new(CaptureSink::new());
    let entity = Entity::new("app");
    entity
        .set_format(raw_format)
        .set_threshold(Severity::Read)
        .set_sinks(vec![SinkHandle::from_arc(capture.clone())]);

    let severities = [
        Severity::Trace,
        Severity::Write,
        Severity::Read,
        Severity::Info,
        Severity::Debug,
        Severity::Warn,
        Severity::Error,
    ];
    for severity in severities {
        entity.emit(severity, severity.as_str()).unwrap();
    }

    let delivered: Vec<String> = capture
        .records()
        .into_iter()
        .map(|record| String::from_utf8(record).unwrap())
        .collect();
    assert_eq!(delivered, vec!["READ", "INFO", "DEBUG", "WARN", "ERROR"]);
}

#[test]
fn test_records_reach_every_sink_past_a_dead_one() {
    let first = Arc::new(CaptureSink::new());
    let dead = Arc::new(FlakySink::broken());
    let last = Arc::new(CaptureSink::new());
    let entity = Entity::new("app");
    entity.set_format(raw_format).set_retry(3).set_sinks(vec![
        SinkHandle::from_arc(first.clone()),
        SinkHandle::from_arc(dead.clone()),
        SinkHandle::from_arc(last.clone()),
    ]);

    for i in 0..10 {
        entity.emit(Severity::Info, &format!("record {i}")).unwrap();
    }

    assert_eq!(first.records().len(), 10);
    assert_eq!(last.records().len(), 10);
    // the dead sink burned retry + 1 attempts per record
    assert_eq!(dead.attempts(), 40);
}

#[test]
fn test_entity_republishes_through_the_trunk() {
    let trunk = Arc::new(Trunk::new());
    let (out, seen) = unbounded();
    trunk.subscribe(64, move |record| out.send(record).unwrap());

    let entity = Entity::new("app");
    entity.set_format(raw_format).set_sinks(vec![]);
    entity.write_to_trunk(&trunk);

    entity.emit(Severity::Info, "over the bus").unwrap();
    assert_eq!(
        seen.recv_timeout(Duration::from_secs(5)).unwrap(),
        b"over the bus"
    );
}

#[test]
fn test_entity_writes_rotated_file_with_name_substitution() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let pattern = temp_dir.path().join("{name}.log");

    let entity = Entity::new("audit");
    entity.set_format(raw_format).set_sinks(vec![]);
    entity.write_to_file(pattern.to_str().unwrap());

    entity.emit(Severity::Info, "persisted\n").unwrap();
    entity.flush();

    let contents = fs::read(temp_dir.path().join("audit.log")).unwrap();
    assert_eq!(contents, b"persisted\n");
}
