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

//! Sinks for exercising routing in tests.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use anyhow::bail;

use crate::sink::Sink;

/// A sink that stores every record it accepts.
#[derive(Debug, Default)]
pub struct CaptureSink {
    records: Mutex<Vec<Vec<u8>>>,
}

impl CaptureSink {
    pub fn new() -> CaptureSink {
        CaptureSink::default()
    }

    /// All records accepted so far.
    pub fn records(&self) -> Vec<Vec<u8>> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Sink for CaptureSink {
    fn write(&self, record: &[u8]) -> anyhow::Result<usize> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.to_vec());
        Ok(record.len())
    }
}

/// A sink that fails a fixed number of writes before accepting, counting
/// every attempt. Zero remaining failures makes it permanently broken when
/// constructed with [`FlakySink::broken`].
#[derive(Debug)]
pub struct FlakySink {
    attempts: AtomicUsize,
    failures_left: AtomicUsize,
    permanently_broken: bool,
    inner: CaptureSink,
}

impl FlakySink {
    /// Fails the first `failures` writes, then accepts.
    pub fn new(failures: usize) -> FlakySink {
        FlakySink {
            attempts: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
            permanently_broken: false,
            inner: CaptureSink::new(),
        }
    }

    /// Fails every write.
    pub fn broken() -> FlakySink {
        FlakySink {
            attempts: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            permanently_broken: true,
            inner: CaptureSink::new(),
        }
    }

    /// Total write attempts observed.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Records that made it past the failure window.
    pub fn records(&self) -> Vec<Vec<u8>> {
        self.inner.records()
    }
}

impl Sink for FlakySink {
    fn write(&self, record: &[u8]) -> anyhow::Result<usize> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.permanently_broken {
            bail!("sink is permanently broken");
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok();
        if failing {
            bail!("sink is temporarily broken");
        }
        self.inner.write(record)
    }
}
