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

//! Logship is the transport and dispatch core of a log-shipping library: it
//! fans formatted records from named log entities out to heterogeneous,
//! independently failing sinks — console, rotating files, TCP peers, HTTP
//! endpoints and an in-process publish/subscribe bus — without letting a
//! slow or dead sink stall the producer.
//!
//! # Overview
//!
//! An [`Entity`] is a named log stream with a severity threshold and an
//! ordered list of sinks. Accepted records are written to every sink with a
//! bounded per-sink retry; network sinks queue records into their own
//! bounded [`AsyncQueue`] so delivery never blocks the caller, dropping
//! records instead of applying backpressure. The [`Trunk`] bus redistributes
//! records to in-process subscribers with the same best-effort semantics.
//!
//! # Examples
//!
//! Route a stream to the console and a rotating file:
//!
//! ```no_run
//! use logship::Entity;
//! use logship::Severity;
//!
//! let entity = Entity::new("app");
//! entity
//!     .set_threshold(Severity::Info)
//!     .write_to_file("logs/%Y-%m-%d/app_%H.log");
//!
//! entity.emit(Severity::Info, "service started").unwrap();
//! ```
//!
//! Fan out to in-process subscribers through the bus:
//!
//! ```
//! use std::sync::Arc;
//!
//! use logship::Entity;
//! use logship::Severity;
//! use logship::Trunk;
//!
//! let trunk = Arc::new(Trunk::new());
//! trunk.subscribe(64, |record| {
//!     let _ = record;
//! });
//!
//! let entity = Entity::new("app");
//! entity.write_to_trunk(&trunk);
//! entity.emit(Severity::Info, "published too").unwrap();
//! ```

pub mod bridge;
pub mod sink;

mod cancel;
mod entity;
mod error;
mod filter;
mod format;
mod level;
mod queue;
mod registry;
mod trunk;

pub use entity::Entity;
pub use error::QueueError;
pub use error::SetupError;
pub use filter::Filter;
pub use format::Format;
pub use format::RecordMeta;
pub use format::TextFormat;
pub use level::Severity;
pub use queue::AsyncQueue;
pub use registry::DEFAULT_FILE_PATTERN;
pub use registry::DEFAULT_LOG_DIR;
pub use registry::Registry;
pub use sink::Sink;
pub use sink::SinkHandle;
pub use trunk::Trunk;
