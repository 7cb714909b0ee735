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

//! The in-process publish/subscribe bus.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use jiff::Timestamp;

use crate::queue::AsyncQueue;
use crate::sink::Sink;

/// An in-process fan-out bus for byte records.
///
/// Publishers post records; each subscriber runs its own consumer loop over
/// its own bounded buffer, so a slow subscriber only ever loses its own
/// messages (drop-if-full) and never delays the publisher or its peers.
///
/// # Examples
///
/// ```
/// use logship::Trunk;
///
/// let trunk = Trunk::new();
/// let key = trunk.subscribe(16, |record| {
///     let _ = record;
/// });
/// trunk.publish([b"broadcast".as_slice()]);
/// assert!(trunk.unsubscribe(&key));
/// assert!(!trunk.unsubscribe(&key));
/// ```
#[derive(Debug, Default)]
pub struct Trunk {
    subscribers: Mutex<Vec<Subscription>>,
}

#[derive(Debug)]
struct Subscription {
    key: String,
    buffer: AsyncQueue,
}

impl Trunk {
    pub fn new() -> Trunk {
        Trunk::default()
    }

    /// Posts records to every live subscriber, never blocking.
    ///
    /// A subscriber whose buffer is full misses the record; the others still
    /// receive it.
    pub fn publish<I>(&self, records: I)
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let subscribers = self.subscribers();
        for record in records {
            let record = record.as_ref();
            for subscription in subscribers.iter() {
                let _ = subscription.buffer.try_enqueue(record.to_vec());
            }
        }
    }

    /// Registers a subscriber with its own consumer loop and buffer.
    ///
    /// Returns an opaque key unique per call, even for repeat registrations
    /// of the same handler.
    pub fn subscribe<F>(&self, buffer: usize, handler: F) -> String
    where
        F: FnMut(Vec<u8>) + Send + 'static,
    {
        let mut handler = Box::new(handler);
        let key = format!(
            "{:p}-{:p}-{}",
            std::ptr::from_ref(self),
            std::ptr::from_ref(&*handler),
            Timestamp::now().as_nanosecond(),
        );
        let buffer = AsyncQueue::spawn("logship-trunk-sub", buffer, move |_seq, record| {
            handler(record)
        });
        self.subscribers().push(Subscription {
            key: key.clone(),
            buffer,
        });
        key
    }

    /// Removes a subscription and stops its consumer loop.
    ///
    /// Records already buffered may still reach the handler. Idempotent: a
    /// second call with the same key returns false.
    pub fn unsubscribe(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        let mut subscribers = self.subscribers();
        match subscribers.iter().position(|s| s.key == key) {
            Some(pos) => {
                let subscription = subscribers.remove(pos);
                subscription.buffer.cancel();
                true
            }
            None => false,
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sink for Arc<Trunk> {
    fn write(&self, record: &[u8]) -> anyhow::Result<usize> {
        self.publish([record]);
        Ok(record.len())
    }
}
