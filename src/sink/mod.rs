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

//! Destinations for log records.

use std::fmt;
use std::sync::Arc;

pub mod console;
pub mod file;
pub mod http;
pub mod tcp;
pub mod testing;

/// Capacity of the delivery queue backing each network sink.
pub(crate) const DELIVERY_QUEUE_CAPACITY: usize = 100;

/// A destination capable of accepting a byte record.
///
/// Records are immutable: a sink never mutates the bytes it is handed, and
/// decorations (color escapes) are applied to copies upstream.
pub trait Sink: fmt::Debug + Send + Sync + 'static {
    /// Accepts one record, reporting the number of bytes taken.
    ///
    /// Asynchronous sinks report success as soon as the record is queued;
    /// actual delivery is best-effort.
    fn write(&self, record: &[u8]) -> anyhow::Result<usize>;

    /// Flushes any buffered records.
    fn flush(&self) {}
}

/// A sink plus its explicit capabilities, as held by an
/// [`Entity`](crate::Entity)'s sink list.
///
/// The `colored` flag is fixed at construction; an entity decorates the
/// record copy for a handle only when both its own color flag and this flag
/// are set.
#[derive(Debug, Clone)]
pub struct SinkHandle {
    sink: Arc<dyn Sink>,
    colored: bool,
}

impl SinkHandle {
    pub fn new(sink: impl Sink) -> SinkHandle {
        SinkHandle::from_arc(Arc::new(sink))
    }

    pub fn from_arc(sink: Arc<dyn Sink>) -> SinkHandle {
        SinkHandle {
            sink,
            colored: false,
        }
    }

    /// Marks the sink as accepting color-decorated records.
    #[must_use]
    pub fn with_color(mut self) -> SinkHandle {
        self.colored = true;
        self
    }

    pub fn supports_color(&self) -> bool {
        self.colored
    }

    pub fn sink(&self) -> &dyn Sink {
        &*self.sink
    }
}
