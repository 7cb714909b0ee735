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

use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use anyhow::Context;
use anyhow::bail;
use jiff::Zoned;
use jiff::fmt::strtime;

use crate::sink::Sink;
use crate::sink::file::clock::Clock;

/// A sink that appends records to files rotated by time pattern and size.
///
/// The target path is the configured `strftime` pattern formatted against
/// the current wall clock, so a pattern like `logs/%Y-%m-%d/app_%H.log`
/// rolls to a new file every hour. When a maximum size is configured, a
/// shard suffix (`app_15-2.log`) distinguishes successive files of the same
/// period; shard indices reset to 0 whenever the time-derived path changes.
///
/// Rotation happens lazily on write, and the whole rotate+write sequence is
/// serialized per sink instance.
///
/// # Examples
///
/// ```no_run
/// use logship::sink::file::FileSink;
///
/// let sink = FileSink::builder("logs/%Y-%m-%d/app_%H.log")
///     .max_size(64 * 1024 * 1024)
///     .build();
/// ```
#[derive(Debug)]
pub struct FileSink {
    state: Mutex<FileState>,
}

impl FileSink {
    /// Creates a sink with no size limit.
    pub fn new(pattern: impl Into<String>) -> FileSink {
        FileSink::builder(pattern).build()
    }

    /// Creates a new [`FileSinkBuilder`].
    #[must_use]
    pub fn builder(pattern: impl Into<String>) -> FileSinkBuilder {
        FileSinkBuilder::new(pattern)
    }
}

impl Sink for FileSink {
    fn write(&self, record: &[u8]) -> anyhow::Result<usize> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_record(record)
    }

    fn flush(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = state.file.as_mut() {
            let _ = file.flush();
        }
    }
}

/// A builder for configuring [`FileSink`].
#[derive(Debug)]
pub struct FileSinkBuilder {
    pattern: String,
    max_size: Option<u64>,
    clock: Clock,
}

impl FileSinkBuilder {
    fn new(pattern: impl Into<String>) -> FileSinkBuilder {
        FileSinkBuilder {
            pattern: pattern.into(),
            max_size: None,
            clock: Clock::DefaultClock,
        }
    }

    /// Sets the maximum size of one shard in bytes.
    ///
    /// The check runs before each write, so a shard only grows past the
    /// limit when a single record alone exceeds it.
    #[must_use]
    pub fn max_size(mut self, bytes: u64) -> FileSinkBuilder {
        self.max_size = Some(bytes);
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> FileSinkBuilder {
        self.clock = clock;
        self
    }

    /// Builds the [`FileSink`]. The first file is opened lazily on the
    /// first write.
    pub fn build(self) -> FileSink {
        FileSink {
            state: Mutex::new(FileState {
                pattern: self.pattern,
                max_size: self.max_size,
                clock: self.clock,
                file: None,
                path: PathBuf::new(),
                size: 0,
                shard: 0,
                cached_origin: PathBuf::new(),
                cached_at: None,
            }),
        }
    }
}

#[derive(Debug)]
struct FileState {
    pattern: String,
    max_size: Option<u64>,
    clock: Clock,

    file: Option<File>,
    path: PathBuf,
    size: u64,
    shard: u32,

    cached_origin: PathBuf,
    cached_at: Option<Zoned>,
}

impl FileState {
    fn write_record(&mut self, record: &[u8]) -> anyhow::Result<usize> {
        self.rotate_if_needed(record.len() as u64)?;
        let Some(file) = self.file.as_mut() else {
            bail!("no open log file for pattern {}", self.pattern);
        };
        let n = file
            .write(record)
            .with_context(|| format!("failed to write log file {}", self.path.display()))?;
        self.size += n as u64;
        Ok(n)
    }

    /// The pattern formatted against "now", recomputed only when the
    /// wall-clock minute, hour or day has moved since the last write.
    fn origin(&mut self) -> anyhow::Result<PathBuf> {
        let now = self.clock.now();
        if let Some(last) = &self.cached_at {
            if last.minute() == now.minute()
                && last.hour() == now.hour()
                && last.day() == now.day()
            {
                return Ok(self.cached_origin.clone());
            }
        }
        let formatted = strtime::format(&self.pattern, &now)
            .with_context(|| format!("invalid log file pattern {}", self.pattern))?;
        self.cached_at = Some(now);
        self.cached_origin = PathBuf::from(formatted);
        Ok(self.cached_origin.clone())
    }

    fn rotate_if_needed(&mut self, incoming: u64) -> anyhow::Result<()> {
        let origin = self.origin()?;
        if origin.as_os_str().is_empty() {
            bail!("empty log file pattern");
        }

        let candidate = shard_path(&origin, self.shard);
        let oversize = self
            .max_size
            .is_some_and(|max| self.size + incoming > max);
        if self.file.is_some() && candidate == self.path && !oversize {
            return Ok(());
        }

        self.file = None;
        self.shard = 0;
        let path = loop {
            let path = shard_path(&origin, self.shard);
            match fs::metadata(&path) {
                Err(err) if err.kind() == io::ErrorKind::NotFound => break path,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to stat log file {}", path.display()));
                }
                Ok(meta) => {
                    let newest = !shard_path(&origin, self.shard + 1).exists();
                    // the newest existing shard is reopened while it still
                    // has room, so a restarted process keeps appending to it
                    if newest && self.max_size.is_none_or(|max| meta.len() < max) {
                        break path;
                    }
                }
            }
            self.shard += 1;
        };
        self.open(path)
    }

    fn open(&mut self, path: PathBuf) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            }
        }
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("failed to stat log file {}", path.display()))?
            .len();

        self.path = path;
        self.file = Some(file);
        self.size = size;
        Ok(())
    }
}

/// Inserts the shard suffix before the extension: `app.log` -> `app-2.log`.
fn shard_path(origin: &Path, shard: u32) -> PathBuf {
    if shard == 0 {
        return origin.to_path_buf();
    }
    let stem = origin
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or_default();
    let name = match origin.extension().and_then(OsStr::to_str) {
        Some(ext) => format!("{stem}-{shard}.{ext}"),
        None => format!("{stem}-{shard}"),
    };
    origin.with_file_name(name)
}
