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

//! The bounded asynchronous delivery queue shared by all network sinks.
//!
//! An [`AsyncQueue`] decouples a producer from a potentially slow sink: a
//! bounded FIFO feeds exactly one background consumer thread, which invokes a
//! caller-supplied handler per payload. Producers choose between a
//! best-effort enqueue that never blocks and a blocking enqueue that fails on
//! cancellation.
//!
//! # Examples
//!
//! ```
//! use logship::AsyncQueue;
//!
//! let queue: AsyncQueue<Vec<u8>> = AsyncQueue::spawn("doc-queue", 16, |seq, payload| {
//!     let _ = (seq, payload);
//! });
//! queue.try_enqueue(b"hello".to_vec()).unwrap();
//! queue.cancel();
//! ```

mod worker;

use std::fmt;

use crossbeam_channel::Sender;
use crossbeam_channel::TrySendError;
use crossbeam_channel::bounded;
use crossbeam_channel::select;

use crate::cancel::CancelToken;
use crate::cancel::Cancellation;
use crate::cancel::cancel_pair;
use crate::error::QueueError;
use worker::Worker;

/// A bounded FIFO with a single background consumer.
///
/// Delivery order matches enqueue order. The handler receives a sequence
/// number local to the queue, monotonically increasing by one per delivered
/// payload, so a downstream consumer can observe gaps after overload.
///
/// Cancelling the queue stops the consumer loop without draining; payloads
/// still buffered at that point are dropped.
pub struct AsyncQueue<T = Vec<u8>> {
    sender: Sender<T>,
    cancellation: Cancellation,
    token: CancelToken,
}

impl<T: Send + 'static> AsyncQueue<T> {
    /// Spawns the consumer thread and returns the producer handle.
    pub fn spawn<F>(name: &str, capacity: usize, handler: F) -> AsyncQueue<T>
    where
        F: FnMut(u64, T) + Send + 'static,
    {
        let (sender, receiver) = bounded(capacity);
        let (cancellation, token) = cancel_pair();
        Worker::new(receiver, token.clone(), handler).spawn(name);
        AsyncQueue {
            sender,
            cancellation,
            token,
        }
    }

    /// Enqueues without ever blocking the caller.
    ///
    /// Drop-newest semantics: when the queue is full the incoming payload is
    /// silently discarded, and once the queue is cancelled every payload is
    /// discarded. The only reportable failure is a consumer loop that has
    /// exited on its own.
    pub fn try_enqueue(&self, payload: T) -> Result<(), QueueError> {
        if self.token.is_cancelled() {
            return Ok(());
        }
        match self.sender.try_send(payload) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(QueueError::Closed),
        }
    }

    /// Enqueues, blocking until the payload is accepted or the queue is
    /// cancelled.
    pub fn enqueue(&self, payload: T) -> Result<(), QueueError> {
        select! {
            send(self.sender, payload) -> res => res.map_err(|_| QueueError::Closed),
            recv(self.token.done()) -> _ => Err(QueueError::Cancelled),
        }
    }

    /// Stops the consumer loop. Buffered payloads are not drained.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl<T> fmt::Debug for AsyncQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncQueue")
            .field("capacity", &self.sender.capacity())
            .field("pending", &self.sender.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use crossbeam_channel::unbounded;

    use super::AsyncQueue;

    #[test]
    fn test_fifo_order_and_sequence() {
        let (out, seen) = unbounded();
        let queue = AsyncQueue::spawn("test-fifo", 8, move |seq, payload: u32| {
            out.send((seq, payload)).unwrap();
        });

        for i in 0..32u32 {
            queue.enqueue(i).unwrap();
        }
        for i in 0..32u64 {
            let (seq, payload) = seen.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(seq, i);
            assert_eq!(payload, i as u32);
        }
    }

    #[test]
    fn test_try_enqueue_never_blocks_on_overflow() {
        let capacity = 4;
        let (gate_tx, gate_rx) = unbounded::<()>();
        let (out, seen) = unbounded();
        let queue = AsyncQueue::spawn("test-overflow", capacity, move |_seq, payload: u32| {
            // park until the producer finished flooding the queue
            let _ = gate_rx.recv();
            out.send(payload).unwrap();
        });

        for i in 0..64u32 {
            queue.try_enqueue(i).unwrap();
        }
        // release the consumer; everything not already buffered was dropped
        drop(gate_tx);

        let mut delivered = 0;
        while seen.recv_timeout(Duration::from_millis(500)).is_ok() {
            delivered += 1;
        }
        assert!(delivered > 0);
        // at most the buffered payloads plus the one the consumer already held
        assert!(delivered <= capacity + 1, "delivered {delivered}");
    }

    #[test]
    fn test_enqueue_fails_after_cancel() {
        let queue = AsyncQueue::spawn("test-cancel", 0, |_seq, _payload: u32| {});
        queue.cancel();
        assert!(queue.is_cancelled());
        thread::sleep(Duration::from_millis(50));
        assert!(queue.enqueue(1).is_err());
    }

    #[test]
    fn test_try_enqueue_discards_after_cancel() {
        let queue = AsyncQueue::spawn("test-cancel-try", 4, |_seq, _payload: u32| {});
        queue.cancel();
        assert!(queue.try_enqueue(1).is_ok());
    }
}
