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

//! The console sink.

use std::io::BufRead;
use std::io::Write;
use std::sync::Arc;
use std::sync::Once;

use crate::filter::Filter;
use crate::sink::Sink;

/// A sink that prints records to stdout, gated by a shared [`Filter`].
///
/// Records rejected by the filter are swallowed while still reporting their
/// full length, so producers never observe filtering.
///
/// # Examples
///
/// ```
/// use logship::sink::console::Console;
///
/// let console = Console::new();
/// console.filter().set_like("payments").unwrap();
/// ```
#[derive(Debug)]
pub struct Console {
    filter: Arc<Filter>,
    input_reader: Once,
}

impl Default for Console {
    fn default() -> Console {
        Console {
            filter: Arc::default(),
            input_reader: Once::new(),
        }
    }
}

impl Console {
    pub fn new() -> Console {
        Console::default()
    }

    /// The filter gating this console's output.
    pub fn filter(&self) -> Arc<Filter> {
        self.filter.clone()
    }

    /// Spawns the interactive filter reader, once per console.
    ///
    /// Each line read from stdin becomes the active substring filter; an
    /// empty line clears it. Lines that fail to compile leave the previous
    /// filter in place.
    pub fn read_filter_input(&self) {
        self.input_reader.call_once(|| {
            let filter = self.filter.clone();
            std::thread::Builder::new()
                .name("logship-filter-input".to_string())
                .spawn(move || {
                    let stdin = std::io::stdin();
                    for line in stdin.lock().lines() {
                        let Ok(line) = line else { break };
                        let line = line.trim();
                        if line.is_empty() {
                            filter.clear();
                        } else {
                            let _ = filter.set_like(line);
                        }
                    }
                })
                .expect("failed to spawn the filter input reader thread");
        });
    }
}

impl Sink for Console {
    fn write(&self, record: &[u8]) -> anyhow::Result<usize> {
        if self.filter.valid(record) {
            std::io::stdout().write_all(record)?;
        }
        Ok(record.len())
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}
