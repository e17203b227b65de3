//! Structured JSON logger (SPEC_FULL §A.1)
//!
//! One line per event, synchronous, unbuffered, alphabetical field
//! ordering. A process-wide minimum severity gate backs the
//! `GET/POST /v1/system/log-level` endpoints (§4.7, §6.1).

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

pub fn set_level(level: Severity) {
    MIN_SEVERITY.store(level as u8, Ordering::Relaxed);
}

pub fn level() -> Severity {
    match MIN_SEVERITY.load(Ordering::Relaxed) {
        0 => Severity::Trace,
        1 => Severity::Debug,
        2 => Severity::Info,
        3 => Severity::Warn,
        _ => Severity::Error,
    }
}

/// Logs one event if `severity` meets the current gate. Fields are sorted
/// alphabetically by key so two calls with the same fields in different
/// order produce byte-identical lines.
pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
    if severity < level() {
        return;
    }
    let mut writer: Box<dyn Write> = if severity >= Severity::Error {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };
    write_line(severity, event, fields, &mut writer);
}

fn write_line<W: Write>(severity: Severity, event: &str, fields: &[(&str, &str)], writer: &mut W) {
    let mut output = String::with_capacity(256);
    output.push('{');

    output.push_str("\"event\":\"");
    escape_json_string(&mut output, event);
    output.push('"');

    output.push_str(",\"severity\":\"");
    output.push_str(severity.as_str());
    output.push('"');

    let mut sorted_fields: Vec<_> = fields.iter().collect();
    sorted_fields.sort_by_key(|(k, _)| *k);

    for (key, value) in sorted_fields {
        output.push_str(",\"");
        escape_json_string(&mut output, key);
        output.push_str("\":\"");
        escape_json_string(&mut output, value);
        output.push('"');
    }

    output.push('}');
    output.push('\n');

    let _ = writer.write_all(output.as_bytes());
    let _ = writer.flush();
}

fn escape_json_string(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => output.push_str(&format!("\\u{:04x}", c as u32)),
            c => output.push(c),
        }
    }
}

#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    write_line(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Error);
    }

    #[test]
    fn parses_level_case_insensitively() {
        assert_eq!(Severity::parse("WARN"), Some(Severity::Warn));
        assert_eq!(Severity::parse("bogus"), None);
    }

    #[test]
    fn json_output_is_one_line_with_sorted_fields() {
        let output = capture_log(Severity::Info, "TEST", &[("zebra", "1"), ("apple", "2")]);
        assert_eq!(output.chars().filter(|c| *c == '\n').count(), 1);
        let apple_pos = output.find("apple").unwrap();
        let zebra_pos = output.find("zebra").unwrap();
        assert!(apple_pos < zebra_pos);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "TEST");
        assert_eq!(parsed["severity"], "info");
    }

    #[test]
    fn escapes_control_characters() {
        let output = capture_log(Severity::Info, "TEST", &[("message", "a\"b\nc")]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["message"], "a\"b\nc");
    }
}
