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

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::select;
use jiff::Zoned;
use jiff::fmt::strtime;

use crate::cancel::Cancellation;
use crate::cancel::cancel_pair;

/// Length of a `%Y-%m-%d` directory name.
const DATE_NAME_LEN: usize = 10;

/// A background sweeper that deletes expired date-named log directories.
///
/// Every interval it removes subdirectories of the root whose `YYYY-MM-DD`
/// name sorts at or before now minus the retention duration. A zero
/// retention disables the sweeper entirely — no thread is spawned.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use logship::sink::file::RetentionSweeper;
///
/// let sweeper = RetentionSweeper::spawn("./output/logs", Duration::from_secs(7 * 24 * 3600));
/// // ... on shutdown:
/// sweeper.shutdown();
/// ```
#[derive(Debug)]
pub struct RetentionSweeper {
    cancellation: Cancellation,
}

impl RetentionSweeper {
    /// Spawns a sweeper that runs hourly.
    pub fn spawn(root: impl Into<PathBuf>, retention: Duration) -> RetentionSweeper {
        RetentionSweeper::with_interval(root, retention, Duration::from_secs(3600))
    }

    /// Spawns a sweeper with an explicit sweep interval.
    pub fn with_interval(
        root: impl Into<PathBuf>,
        retention: Duration,
        interval: Duration,
    ) -> RetentionSweeper {
        let (cancellation, token) = cancel_pair();
        if !retention.is_zero() {
            let root = root.into();
            std::thread::Builder::new()
                .name("logship-retention".to_string())
                .spawn(move || {
                    loop {
                        select! {
                            recv(token.done()) -> _ => break,
                            default(interval) => {
                                if let Err(err) = sweep(&root, retention) {
                                    eprintln!("failed to sweep expired logs: {err}");
                                }
                            }
                        }
                    }
                })
                .expect("failed to spawn the retention sweeper thread");
        }
        RetentionSweeper { cancellation }
    }

    /// Stops the sweeper loop.
    pub fn shutdown(&self) {
        self.cancellation.cancel();
    }
}

/// Removes every date-named subdirectory at or before the cutoff.
fn sweep(root: &Path, retention: Duration) -> anyhow::Result<()> {
    let cutoff = cutoff_date(retention)?;
    let entries = fs::read_dir(root)
        .with_context(|| format!("failed to read log directory {}", root.display()))?;
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.len() == DATE_NAME_LEN && name <= cutoff.as_str() {
            let _ = fs::remove_dir_all(entry.path());
        }
    }
    Ok(())
}

fn cutoff_date(retention: Duration) -> anyhow::Result<String> {
    let cutoff = Zoned::now()
        .checked_sub(retention)
        .context("retention duration out of range")?;
    strtime::format("%Y-%m-%d", &cutoff).context("failed to format retention cutoff")
}
