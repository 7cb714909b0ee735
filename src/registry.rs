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

//! An explicit registry of named entities.
//!
//! The registry is an object the application owns and injects where needed;
//! there is no process-wide registry, only lazy creation-by-name within the
//! one you hold.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use colored::Color;

use crate::entity::Entity;
use crate::format::Format;
use crate::level::Severity;
use crate::sink::SinkHandle;

/// Directory the preset error stream writes under.
pub const DEFAULT_LOG_DIR: &str = "./output/logs/";

/// File pattern of the preset error stream, relative to the log directory.
pub const DEFAULT_FILE_PATTERN: &str = "%Y-%m-%d/{name}_%H.log";

/// A collection of named [`Entity`] instances with lazy creation.
///
/// # Examples
///
/// ```
/// use logship::Registry;
/// use logship::Severity;
///
/// let registry = Registry::new();
/// let payments = registry.get_or_create("payments");
/// payments.emit(Severity::Info, "captured").unwrap();
/// assert!(registry.get("payments").is_some());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    entities: Mutex<HashMap<String, Arc<Entity>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Creates a registry seeded with the preset streams: `trace` (blue),
    /// `info` (cyan), `debug` (yellow), `warn` (magenta) and `error` (red,
    /// additionally persisted under [`DEFAULT_LOG_DIR`]).
    pub fn with_presets() -> Registry {
        let registry = Registry::new();
        registry.get_or_create("trace").set_color(Color::Blue);
        registry.get_or_create("info").set_color(Color::Cyan);
        registry.get_or_create("debug").set_color(Color::Yellow);
        registry.get_or_create("warn").set_color(Color::Magenta);
        registry
            .get_or_create("error")
            .set_color(Color::Red)
            .write_to_file(&format!("{DEFAULT_LOG_DIR}{DEFAULT_FILE_PATTERN}"));
        registry
    }

    pub fn get(&self, name: &str) -> Option<Arc<Entity>> {
        self.entities().get(name).cloned()
    }

    /// Returns the named entity, creating it with defaults on first lookup.
    pub fn get_or_create(&self, name: &str) -> Arc<Entity> {
        self.entities()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Entity::new(name)))
            .clone()
    }

    /// Sets every entity's threshold.
    pub fn set_threshold(&self, threshold: Severity) {
        for entity in self.entities().values() {
            entity.set_threshold(threshold);
        }
    }

    /// Toggles color decoration on every entity.
    pub fn set_show_color(&self, show: bool) {
        for entity in self.entities().values() {
            entity.set_show_color(show);
        }
    }

    /// Appends the same sink to every entity.
    pub fn add_sink(&self, sink: SinkHandle) {
        for entity in self.entities().values() {
            entity.add_sink(sink.clone());
        }
    }

    /// Replaces every entity's formatter.
    pub fn set_format(&self, format: impl Format + Clone) {
        for entity in self.entities().values() {
            entity.set_format(format.clone());
        }
    }

    fn entities(&self) -> MutexGuard<'_, HashMap<String, Arc<Entity>>> {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
