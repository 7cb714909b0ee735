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

use std::sync::Mutex;
use std::sync::PoisonError;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::TryRecvError;
use crossbeam_channel::bounded;

/// A message type that is never sent; the channel only ever disconnects.
pub(crate) enum Never {}

/// Creates a linked cancellation pair.
///
/// The channel carries no messages. Cancelling drops the sender, which makes
/// every clone of the token observe the disconnect — both by polling
/// [`CancelToken::is_cancelled`] and by selecting on [`CancelToken::done`],
/// which becomes permanently ready.
pub(crate) fn cancel_pair() -> (Cancellation, CancelToken) {
    let (keep, done) = bounded::<Never>(0);
    let cancellation = Cancellation {
        keep: Mutex::new(Some(keep)),
    };
    (cancellation, CancelToken { done })
}

/// The owning half of a cancellation pair.
#[derive(Debug)]
pub(crate) struct Cancellation {
    keep: Mutex<Option<Sender<Never>>>,
}

impl Cancellation {
    /// Fires the cancellation. Idempotent.
    pub(crate) fn cancel(&self) {
        self.keep
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// The observing half of a cancellation pair.
#[derive(Debug, Clone)]
pub(crate) struct CancelToken {
    done: Receiver<Never>,
}

impl CancelToken {
    pub(crate) fn is_cancelled(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// A receiver that becomes ready once the cancellation fires; for use in
    /// `select!` arms.
    pub(crate) fn done(&self) -> &Receiver<Never> {
        &self.done
    }
}
