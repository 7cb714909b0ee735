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

//! The seam between the dispatch core and the human-readable formatter.
//!
//! Rendering a record into a display string is the formatter's business, not
//! the core's; the core only requires that something turns a message into
//! the byte record handed to the sinks. [`TextFormat`] is the stock
//! implementation; closures with the right shape implement [`Format`] too.

use std::fmt::Write as _;

use jiff::Zoned;

use crate::level::Severity;

/// Entity-side context available to a formatter.
#[derive(Debug, Clone, Copy)]
pub struct RecordMeta<'a> {
    /// The producing entity's name.
    pub name: &'a str,
    /// The producing entity's tags.
    pub tags: &'a [String],
    /// The record's severity.
    pub severity: Severity,
}

/// Renders a message into the byte record delivered to sinks.
pub trait Format: Send + Sync + 'static {
    fn render(&self, meta: &RecordMeta<'_>, message: &str) -> Vec<u8>;
}

impl<F> Format for F
where
    F: Fn(&RecordMeta<'_>, &str) -> Vec<u8> + Send + Sync + 'static,
{
    fn render(&self, meta: &RecordMeta<'_>, message: &str) -> Vec<u8> {
        (self)(meta, message)
    }
}

/// The default text format.
///
/// Output shape:
///
/// ```text
/// [info] 2024-08-11 22:44:57 [tcp] connection established
/// ```
///
/// Records are newline-terminated so that byte-stream consumers (the TCP
/// sinks write records without framing) can delimit them.
#[derive(Debug, Default, Clone)]
pub struct TextFormat;

impl Format for TextFormat {
    fn render(&self, meta: &RecordMeta<'_>, message: &str) -> Vec<u8> {
        let mut out = String::with_capacity(message.len() + 32);
        if !meta.name.is_empty() {
            let _ = write!(out, "[{}] ", meta.name);
        }
        let _ = write!(out, "{}", Zoned::now().strftime("%Y-%m-%d %H:%M:%S"));
        for tag in meta.tags {
            let _ = write!(out, " [{tag}]");
        }
        let _ = write!(out, " {message}");
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::Format;
    use super::RecordMeta;
    use super::TextFormat;
    use crate::level::Severity;

    #[test]
    fn test_text_format_shape() {
        let tags = vec!["tcp".to_string()];
        let meta = RecordMeta {
            name: "info",
            tags: &tags,
            severity: Severity::Info,
        };
        let record = TextFormat.render(&meta, "connection established");
        let text = String::from_utf8(record).unwrap();
        assert!(text.starts_with("[info] "));
        assert!(text.contains("[tcp]"));
        assert!(text.ends_with("connection established\n"));
    }

    #[test]
    fn test_text_format_keeps_single_newline() {
        let meta = RecordMeta {
            name: "",
            tags: &[],
            severity: Severity::Debug,
        };
        let record = TextFormat.render(&meta, "already terminated\n");
        let text = String::from_utf8(record).unwrap();
        assert!(text.ends_with("already terminated\n"));
        assert!(!text.ends_with("\n\n"));
    }

    #[test]
    fn test_closures_are_formats() {
        let format = |_meta: &RecordMeta<'_>, message: &str| message.as_bytes().to_vec();
        let meta = RecordMeta {
            name: "raw",
            tags: &[],
            severity: Severity::Info,
        };
        assert_eq!(format.render(&meta, "as-is"), b"as-is");
    }
}
