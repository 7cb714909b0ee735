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

//! Bridge forwarding records from the log crate into an [`Entity`].

use std::sync::Arc;

use crate::entity::Entity;
use crate::error::SetupError;
use crate::level::Severity;

/// A [`log::Log`] implementation routing through one entity.
#[derive(Debug)]
pub struct EntityLogger {
    entity: Arc<Entity>,
}

impl EntityLogger {
    pub fn new(entity: Arc<Entity>) -> EntityLogger {
        EntityLogger { entity }
    }
}

fn severity(level: log::Level) -> Severity {
    match level {
        log::Level::Error => Severity::Error,
        log::Level::Warn => Severity::Warn,
        log::Level::Info => Severity::Info,
        log::Level::Debug => Severity::Debug,
        log::Level::Trace => Severity::Trace,
    }
}

impl log::Log for EntityLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.entity.allows(severity(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("{}: {}", record.target(), record.args());
        let _ = self.entity.emit(severity(record.level()), &message);
    }

    fn flush(&self) {
        self.entity.flush();
    }
}

/// Installs an [`EntityLogger`] as the log crate global logger.
///
/// This should be called early in the execution of a Rust program; any log
/// events that occur before installation are ignored. The global maximum
/// level is set to `Trace` so that the entity's own threshold is the only
/// gate; call [`log::set_max_level`] afterwards to override.
///
/// # Errors
///
/// Returns an error if the log crate global logger has already been set.
pub fn try_setup(entity: Arc<Entity>) -> Result<(), SetupError> {
    log::set_boxed_logger(Box::new(EntityLogger::new(entity)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use log::Log;

    use super::EntityLogger;
    use crate::entity::Entity;
    use crate::format::RecordMeta;
    use crate::level::Severity;
    use crate::sink::SinkHandle;
    use crate::sink::testing::CaptureSink;

    #[test]
    fn test_log_records_route_through_entity() {
        let capture = Arc::new(CaptureSink::new());
        let entity = Arc::new(Entity::new("bridged"));
        entity
            .set_format(|_meta: &RecordMeta<'_>, message: &str| message.as_bytes().to_vec())
            .set_threshold(Severity::Warn)
            .set_sinks(vec![SinkHandle::from_arc(capture.clone())]);

        let logger = EntityLogger::new(entity);
        logger.log(
            &log::Record::builder()
                .args(format_args!("it works"))
                .level(log::Level::Warn)
                .target("app")
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .args(format_args!("gated"))
                .level(log::Level::Info)
                .target("app")
                .build(),
        );

        assert_eq!(capture.records(), vec![b"app: it works".to_vec()]);
    }
}
