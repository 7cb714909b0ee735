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

use log::SetLoggerError;

/// Errors returned by [`AsyncQueue`](crate::AsyncQueue) enqueue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue's cancellation fired while an enqueue was in flight.
    #[error("delivery queue cancelled")]
    Cancelled,
    /// The consumer loop has exited and the queue accepts no more payloads.
    #[error("delivery queue closed")]
    Closed,
}

/// Errors raised while installing the log crate bridge.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to perform IO action: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to set up logger: {0}")]
    SetLogger(SetLoggerError),
}

impl From<SetLoggerError> for SetupError {
    fn from(value: SetLoggerError) -> Self {
        SetupError::SetLogger(value)
    }
}
