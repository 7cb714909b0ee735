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

//! The regex/substring output filter gating console output.

use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use regex::bytes::Regex;

/// A byte-record predicate.
///
/// [`Filter::valid`] returns true when the filter is disabled, when no
/// pattern is configured, or when the pattern matches the raw record bytes.
/// Configuring a pattern enables the filter; [`Filter::clear`] disables it
/// again. All mutation goes through shared references so that the
/// interactive console reader can retune a filter that sinks already hold.
#[derive(Debug, Default)]
pub struct Filter {
    enabled: AtomicBool,
    pattern: RwLock<Option<Regex>>,
}

impl Filter {
    pub fn new() -> Filter {
        Filter::default()
    }

    /// Enables or disables the filter without touching the pattern.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Installs a pre-compiled pattern and enables the filter.
    pub fn set_regex(&self, pattern: Regex) {
        *self
            .pattern
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(pattern);
        self.set_enabled(true);
    }

    /// Installs a substring search by compiling `.*substring.*`.
    ///
    /// The substring is interpolated into the pattern as-is: regex
    /// metacharacters in it keep their regex meaning, so `set_like("a.b")`
    /// also matches `"axb"`. This mirrors the substring search the filter
    /// has always shipped with and is deliberately left untouched.
    pub fn set_like(&self, like: &str) -> Result<(), regex::Error> {
        let pattern = Regex::new(&format!(".*{like}.*"))?;
        self.set_regex(pattern);
        Ok(())
    }

    /// Drops the pattern and disables the filter.
    pub fn clear(&self) {
        *self
            .pattern
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.set_enabled(false);
    }

    /// Whether `record` passes the filter.
    pub fn valid(&self, record: &[u8]) -> bool {
        if !self.enabled.load(Ordering::Relaxed) {
            return true;
        }
        match &*self.pattern.read().unwrap_or_else(PoisonError::into_inner) {
            None => true,
            Some(pattern) => pattern.is_match(record),
        }
    }
}
