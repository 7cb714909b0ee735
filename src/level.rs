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

use std::fmt;

/// An ordered record severity.
///
/// A record is delivered only if its severity is at least the owning
/// [`Entity`](crate::Entity)'s threshold. The two sentinels bound the range:
/// a threshold of [`Severity::All`] accepts every record, a threshold of
/// [`Severity::Off`] accepts none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    /// Threshold sentinel: accept everything.
    All = 0,
    Trace = 1,
    Write = 2,
    Read = 3,
    Info = 4,
    Debug = 5,
    Warn = 6,
    Error = 7,
    /// Threshold sentinel: accept nothing.
    Off = 255,
}

impl Severity {
    /// Whether a record at `severity` passes this threshold.
    pub fn allows(self, severity: Severity) -> bool {
        severity >= self
    }

    /// Parses a severity name, case-insensitively.
    ///
    /// Unknown names fall back to [`Severity::All`].
    pub fn parse(s: &str) -> Severity {
        match s.to_ascii_lowercase().as_str() {
            "all" => Severity::All,
            "trace" => Severity::Trace,
            "write" => Severity::Write,
            "read" => Severity::Read,
            "info" => Severity::Info,
            "debug" => Severity::Debug,
            "warn" => Severity::Warn,
            "err" | "error" => Severity::Error,
            "none" | "off" => Severity::Off,
            _ => Severity::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::All => "ALL",
            Severity::Trace => "TRACE",
            Severity::Write => "WRITE",
            Severity::Read => "READ",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Off => "OFF",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Severity;

    #[test]
    fn test_severity_order() {
        assert!(Severity::All < Severity::Trace);
        assert!(Severity::Trace < Severity::Write);
        assert!(Severity::Write < Severity::Read);
        assert!(Severity::Read < Severity::Info);
        assert!(Severity::Info < Severity::Debug);
        assert!(Severity::Debug < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Off);
    }

    #[test]
    fn test_threshold_sentinels() {
        for severity in [
            Severity::Trace,
            Severity::Write,
            Severity::Read,
            Severity::Info,
            Severity::Debug,
            Severity::Warn,
            Severity::Error,
        ] {
            assert!(Severity::All.allows(severity));
            assert!(!Severity::Off.allows(severity));
        }
        assert!(Severity::Warn.allows(Severity::Warn));
        assert!(Severity::Warn.allows(Severity::Error));
        assert!(!Severity::Warn.allows(Severity::Info));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Severity::parse("ERROR"), Severity::Error);
        assert_eq!(Severity::parse("err"), Severity::Error);
        assert_eq!(Severity::parse("Warn"), Severity::Warn);
        assert_eq!(Severity::parse("none"), Severity::Off);
        assert_eq!(Severity::parse("bogus"), Severity::All);
    }
}
