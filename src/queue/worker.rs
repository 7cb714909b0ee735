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

use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::select;

use crate::cancel::CancelToken;

pub(crate) struct Worker<T, F> {
    receiver: Receiver<T>,
    token: CancelToken,
    handler: F,
}

impl<T, F> Worker<T, F>
where
    T: Send + 'static,
    F: FnMut(u64, T) + Send + 'static,
{
    pub(crate) fn new(receiver: Receiver<T>, token: CancelToken, handler: F) -> Worker<T, F> {
        Worker {
            receiver,
            token,
            handler,
        }
    }

    fn run(&mut self) {
        let mut seq = 0u64;
        loop {
            select! {
                recv(self.receiver) -> payload => match payload {
                    Ok(payload) => {
                        (self.handler)(seq, payload);
                        seq += 1;
                    }
                    // every producer handle dropped
                    Err(_) => break,
                },
                recv(self.token.done()) -> _ => break,
            }
        }
    }

    pub(crate) fn spawn(mut self, name: &str) -> JoinHandle<()> {
        std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || self.run())
            .expect("failed to spawn the delivery queue worker thread")
    }
}
