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

//! Named log streams routing records to their sinks.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use colored::Color;
use colored::Colorize;

use crate::format::Format;
use crate::format::RecordMeta;
use crate::format::TextFormat;
use crate::level::Severity;
use crate::sink::SinkHandle;
use crate::sink::console::Console;
use crate::sink::file::FileSink;
use crate::sink::http::HttpSink;
use crate::sink::tcp::TcpClient;
use crate::sink::tcp::TcpServer;
use crate::trunk::Trunk;

/// A named logical log stream with its own threshold, sinks and formatting
/// hints.
///
/// An entity owns an ordered list of [`SinkHandle`]s and routes every
/// accepted record to each of them in turn, retrying a failing sink a
/// bounded number of times without ever letting one sink's failure abort
/// delivery to the others. Producers never observe sink-level failures as
/// logging failures: the severity gate is the only deterministic
/// accept/reject decision.
///
/// Configuration may change at any time and takes effect on the next write;
/// the sink list is never mutated concurrently with an in-flight write.
///
/// # Examples
///
/// ```
/// use logship::Entity;
/// use logship::Severity;
///
/// let entity = Entity::new("info");
/// entity.set_threshold(Severity::Info).set_tags(["tcp"]);
/// entity.emit(Severity::Info, "connection established").unwrap();
/// entity.emit(Severity::Trace, "dropped by the gate").unwrap();
/// ```
pub struct Entity {
    name: String,
    state: RwLock<EntityState>,
}

struct EntityState {
    tags: Vec<String>,
    color: Color,
    show_color: bool,
    threshold: Severity,
    retry: usize,
    sinks: Vec<SinkHandle>,
    format: Arc<dyn Format>,
}

impl Entity {
    /// Creates an entity writing to a color-capable console sink, accepting
    /// every severity.
    pub fn new(name: impl Into<String>) -> Entity {
        Entity {
            name: name.into(),
            state: RwLock::new(EntityState {
                tags: Vec::new(),
                color: Color::White,
                show_color: true,
                threshold: Severity::All,
                retry: 0,
                sinks: vec![SinkHandle::new(Console::new()).with_color()],
                format: Arc::new(TextFormat),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold(&self) -> Severity {
        self.state().threshold
    }

    /// Whether a record at `severity` would currently be accepted.
    pub fn allows(&self, severity: Severity) -> bool {
        self.state().threshold.allows(severity)
    }

    /// Sets the minimum severity delivered. Affects subsequent calls only.
    pub fn set_threshold(&self, threshold: Severity) -> &Entity {
        self.state_mut().threshold = threshold;
        self
    }

    pub fn set_tags<I>(&self, tags: I) -> &Entity
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.state_mut().tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_color(&self, color: Color) -> &Entity {
        self.state_mut().color = color;
        self
    }

    pub fn set_show_color(&self, show: bool) -> &Entity {
        self.state_mut().show_color = show;
        self
    }

    /// Sets how many times a failing sink write is immediately retried.
    ///
    /// This is a bounded immediate retry, not a backoff; reconnect pacing
    /// belongs to the TCP sinks themselves.
    pub fn set_retry(&self, retry: usize) -> &Entity {
        self.state_mut().retry = retry;
        self
    }

    pub fn set_format(&self, format: impl Format) -> &Entity {
        self.state_mut().format = Arc::new(format);
        self
    }

    /// Replaces the sink list. Takes effect on the next write.
    pub fn set_sinks(&self, sinks: Vec<SinkHandle>) -> &Entity {
        self.state_mut().sinks = sinks;
        self
    }

    /// Appends a sink. Takes effect on the next write.
    pub fn add_sink(&self, sink: SinkHandle) -> &Entity {
        self.state_mut().sinks.push(sink);
        self
    }

    /// Appends a color-capable console sink.
    pub fn write_to_console(&self) -> &Entity {
        self.add_sink(SinkHandle::new(Console::new()).with_color())
    }

    /// Appends a rotating file sink; `{name}` in the pattern becomes this
    /// entity's name.
    pub fn write_to_file(&self, pattern: &str) -> &Entity {
        let pattern = pattern.replace("{name}", &self.name);
        self.add_sink(SinkHandle::new(FileSink::new(pattern)))
    }

    /// Appends the bus as a sink: every accepted record is republished to
    /// its subscribers.
    pub fn write_to_trunk(&self, trunk: &Arc<Trunk>) -> &Entity {
        self.add_sink(SinkHandle::new(trunk.clone()))
    }

    /// Appends a TCP client sink; `colored` opts the peer into color
    /// escapes.
    pub fn write_to_tcp_client(&self, addr: &str, colored: bool) -> io::Result<&Entity> {
        let handle = SinkHandle::new(TcpClient::connect(addr)?);
        Ok(self.add_sink(if colored { handle.with_color() } else { handle }))
    }

    /// Appends a TCP broadcast server sink on `port`.
    pub fn write_to_tcp_server(&self, port: u16, colored: bool) -> io::Result<&Entity> {
        let handle = SinkHandle::new(TcpServer::bind(port)?);
        Ok(self.add_sink(if colored { handle.with_color() } else { handle }))
    }

    /// Appends an HTTP sink with a fixed method and URL.
    pub fn write_to_http(&self, method: &str, url: &str, colored: bool) -> anyhow::Result<&Entity> {
        let handle = SinkHandle::new(HttpSink::new(method, url)?);
        Ok(self.add_sink(if colored { handle.with_color() } else { handle }))
    }

    /// Renders `message` through the entity's formatter and routes the
    /// record.
    pub fn emit(&self, severity: Severity, message: &str) -> anyhow::Result<usize> {
        let state = self.state();
        if !state.threshold.allows(severity) {
            return Ok(0);
        }
        let meta = RecordMeta {
            name: &self.name,
            tags: &state.tags,
            severity,
        };
        let record = state.format.render(&meta, message);
        self.fan_out(&state, &record)
    }

    /// Routes an already-rendered record to every sink.
    ///
    /// Each sink gets up to `retry + 1` immediate attempts, stopping at the
    /// first success; one sink exhausting its retries never aborts delivery
    /// to the sinks after it. Partial failures are not aggregated — the
    /// return value is the last attempt's result for the last sink
    /// processed, so callers needing per-sink status must use separate
    /// sinks.
    pub fn produce(&self, severity: Severity, record: &[u8]) -> anyhow::Result<usize> {
        let state = self.state();
        if !state.threshold.allows(severity) {
            return Ok(0);
        }
        self.fan_out(&state, record)
    }

    /// Emits at error severity, flushes every sink, and exits the process.
    pub fn fatal(&self, message: &str) -> ! {
        let _ = self.emit(Severity::Error, message);
        self.flush();
        std::process::exit(1);
    }

    /// Flushes every sink.
    pub fn flush(&self) {
        for handle in &self.state().sinks {
            handle.sink().flush();
        }
    }

    fn fan_out(&self, state: &EntityState, record: &[u8]) -> anyhow::Result<usize> {
        let mut last = Ok(0);
        for handle in &state.sinks {
            let decorated;
            let payload = if state.show_color && handle.supports_color() {
                // decoration goes to a copy; other sinks see the bytes as-is
                decorated = colorize(record, state.color);
                decorated.as_slice()
            } else {
                record
            };
            for _ in 0..=state.retry {
                last = handle.sink().write(payload);
                if last.is_ok() {
                    break;
                }
            }
        }
        last
    }

    fn state(&self) -> RwLockReadGuard<'_, EntityState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, EntityState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("threshold", &state.threshold)
            .field("sinks", &state.sinks.len())
            .finish_non_exhaustive()
    }
}

fn colorize(record: &[u8], color: Color) -> Vec<u8> {
    let text = String::from_utf8_lossy(record);
    format!("{}", text.as_ref().color(color)).into_bytes()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use colored::Color;

    use super::Entity;
    use crate::format::RecordMeta;
    use crate::level::Severity;
    use crate::sink::SinkHandle;
    use crate::sink::testing::CaptureSink;
    use crate::sink::testing::FlakySink;

    /// A formatter that passes the message through untouched.
    fn raw_format(_meta: &RecordMeta<'_>, message: &str) -> Vec<u8> {
        message.as_bytes().to_vec()
    }

    fn capture_entity(name: &str) -> (Entity, Arc<CaptureSink>) {
        let capture = Arc::new(CaptureSink::new());
        let entity = Entity::new(name);
        entity
            .set_format(raw_format)
            .set_sinks(vec![SinkHandle::from_arc(capture.clone())]);
        (entity, capture)
    }

    #[test]
    fn test_threshold_gates_delivery() {
        let (entity, capture) = capture_entity("gated");
        entity.set_threshold(Severity::Warn);

        assert_eq!(entity.emit(Severity::Info, "below").unwrap(), 0);
        assert!(entity.emit(Severity::Warn, "at").unwrap() > 0);
        assert!(entity.emit(Severity::Error, "above").unwrap() > 0);
        assert_eq!(capture.records(), vec![b"at".to_vec(), b"above".to_vec()]);

        // runtime change affects subsequent calls only
        entity.set_threshold(Severity::All);
        assert!(entity.emit(Severity::Info, "now passes").unwrap() > 0);
        assert_eq!(capture.records().len(), 3);
    }

    #[test]
    fn test_fan_out_survives_broken_sink() {
        let broken = Arc::new(FlakySink::broken());
        let capture = Arc::new(CaptureSink::new());
        let entity = Entity::new("independent");
        entity.set_format(raw_format).set_sinks(vec![
            SinkHandle::from_arc(broken.clone()),
            SinkHandle::from_arc(capture.clone()),
        ]);

        // last sink succeeded, so the route reports success
        assert!(entity.emit(Severity::Info, "through").is_ok());
        assert_eq!(capture.records(), vec![b"through".to_vec()]);
        assert_eq!(broken.attempts(), 1);
    }

    #[test]
    fn test_result_is_last_sinks_result() {
        let capture = Arc::new(CaptureSink::new());
        let broken = Arc::new(FlakySink::broken());
        let entity = Entity::new("last-result");
        entity.set_format(raw_format).set_sinks(vec![
            SinkHandle::from_arc(capture.clone()),
            SinkHandle::from_arc(broken),
        ]);

        assert!(entity.emit(Severity::Info, "partial").is_err());
        // the healthy sink still received the record
        assert_eq!(capture.records(), vec![b"partial".to_vec()]);
    }

    #[test]
    fn test_retry_is_bounded_and_immediate() {
        let flaky = Arc::new(FlakySink::new(2));
        let entity = Entity::new("retry");
        entity
            .set_format(raw_format)
            .set_retry(2)
            .set_sinks(vec![SinkHandle::from_arc(flaky.clone())]);

        assert!(entity.emit(Severity::Info, "third time lucky").is_ok());
        assert_eq!(flaky.attempts(), 3);
        assert_eq!(flaky.records(), vec![b"third time lucky".to_vec()]);

        let broken = Arc::new(FlakySink::broken());
        entity
            .set_retry(1)
            .set_sinks(vec![SinkHandle::from_arc(broken.clone())]);
        assert!(entity.emit(Severity::Info, "never lands").is_err());
        assert_eq!(broken.attempts(), 2);
    }

    #[test]
    fn test_color_decorates_copies_only() {
        colored::control::set_override(true);

        let plain = Arc::new(CaptureSink::new());
        let decorated = Arc::new(CaptureSink::new());
        let entity = Entity::new("colorful");
        entity
            .set_format(raw_format)
            .set_color(Color::Red)
            .set_sinks(vec![
                SinkHandle::from_arc(plain.clone()),
                SinkHandle::from_arc(decorated.clone()).with_color(),
            ]);

        entity.emit(Severity::Info, "tinted").unwrap();
        assert_eq!(plain.records(), vec![b"tinted".to_vec()]);
        let records = decorated.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].starts_with(b"\x1b["));
        assert!(records[0] != b"tinted".to_vec());

        // the flag on the entity wins over the sink capability
        entity.set_show_color(false);
        entity.emit(Severity::Info, "plain now").unwrap();
        assert_eq!(decorated.records()[1], b"plain now".to_vec());
    }

    #[test]
    fn test_produce_routes_rendered_bytes() {
        let (entity, capture) = capture_entity("pre-rendered");
        entity.set_threshold(Severity::Read);
        assert_eq!(entity.produce(Severity::Trace, b"gated").unwrap(), 0);
        assert!(entity.produce(Severity::Read, b"raw bytes\n").unwrap() > 0);
        assert_eq!(capture.records(), vec![b"raw bytes\n".to_vec()]);
    }
}
